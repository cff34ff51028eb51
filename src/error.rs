use thiserror::Error;

/// Main error type for the Lecture-Compositor library
#[derive(Error, Debug)]
pub enum SyncError {
    #[error("Audio processing error: {0}")]
    Audio(#[from] AudioError),

    #[error("Slide processing error: {0}")]
    Slide(#[from] SlideError),

    #[error("Planning error: {0}")]
    Plan(#[from] PlanError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Render sink error: {reason}")]
    Render { reason: String },

    #[error("Run cancelled between pipeline stages")]
    Cancelled,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Audio-specific errors
#[derive(Error, Debug)]
pub enum AudioError {
    #[error("Failed to load audio file: {path}")]
    LoadFailed { path: String },

    #[error("Unsupported audio format: {format}")]
    UnsupportedFormat { format: String },

    /// The track is too short or too featureless to yield at least one
    /// beat interval. Fatal: the whole run aborts.
    #[error("Audio unusable for synchronization: {reason}")]
    InsufficientAudio { reason: String },

    #[error("Audio analysis failed: {reason}")]
    AnalysisFailed { reason: String },
}

/// Slide-specific errors
#[derive(Error, Debug)]
pub enum SlideError {
    /// A single slide failed to decode. Recovered at the batch boundary:
    /// the slide is dropped from the pool and the run continues.
    #[error("Failed to decode slide image: {path}")]
    ImageDecode { path: String },

    #[error("No usable slide images: {reason}")]
    NoUsableImages { reason: String },

    #[error("Slide classification failed: {reason}")]
    ClassificationFailed { reason: String },
}

/// Planner and timeline errors
#[derive(Error, Debug)]
pub enum PlanError {
    /// The assembled timeline has a gap, overlap, or coverage defect.
    /// Indicates a bug in an upstream stage; never repaired silently.
    #[error("Timeline consistency violation: {detail}")]
    TimelineConsistency { detail: String },

    #[error("Invalid planning parameters: {details}")]
    InvalidParameters { details: String },
}

/// Configuration-specific errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to parse configuration file: {path}")]
    ParseFailed { path: String },

    #[error("Invalid configuration value: {key} = {value}")]
    InvalidValue { key: String, value: String },

    #[error("Configuration file not found: {path}")]
    FileNotFound { path: String },
}

/// Convenience type alias for Results using SyncError
pub type Result<T> = std::result::Result<T, SyncError>;

impl SyncError {
    /// True for errors where the run may succeed on retry with the same
    /// inputs (transient IO, momentarily unreadable files).
    pub fn is_recoverable(&self) -> bool {
        match self {
            Self::Io(_) => true,
            Self::Audio(AudioError::LoadFailed { .. }) => true,
            _ => false,
        }
    }

    /// Get a user-friendly error message
    pub fn user_message(&self) -> String {
        match self {
            Self::Audio(AudioError::LoadFailed { path }) => {
                format!("Could not load audio file '{}'. Please check the file exists and is a supported format.", path)
            }
            Self::Audio(AudioError::InsufficientAudio { reason }) => {
                format!("The audio track cannot be synchronized: {}. Try a longer recording.", reason)
            }
            Self::Slide(SlideError::NoUsableImages { reason }) => {
                format!("No slides could be used: {}. Check the slides folder.", reason)
            }
            Self::Config(ConfigError::FileNotFound { path }) => {
                format!("Configuration file '{}' not found.", path)
            }
            _ => self.to_string(),
        }
    }
}
