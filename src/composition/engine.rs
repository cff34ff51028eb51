use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tracing::{debug, info};

use crate::{
    audio::{AudioLoader, FeatureExtractor},
    config::Config,
    error::{Result, SyncError},
    render::RenderSink,
    slides::{classify_batch, SlideImage, SlideLoader},
    sync::{EffectParameterizer, EffectParams, Planner, RenderPlan, TimelineAssembler},
};

/// Main engine orchestrating the synchronization pipeline
///
/// The pipeline is a single-pass batch computation:
/// 1. Audio Feature Extraction - beats, per-beat energy and brightness
/// 2. Slide Classification - per-image brightness/contrast categories
/// 3. Synchronization Planning - beat intervals bound to slides
/// 4. Effect Parameterization - zoom and fade per segment
/// 5. Timeline Assembly - verified segment sequence for the render sink
///
/// No stage re-enters an earlier one. The run is cancellable between
/// stages through an optional shared flag.
pub struct CompositionEngine {
    config: Config,
    cancel: Option<Arc<AtomicBool>>,
}

impl CompositionEngine {
    /// Create an engine with the given configuration
    pub fn new(config: Config) -> Self {
        Self { config, cancel: None }
    }

    /// Attach a cancellation flag checked at stage boundaries
    pub fn with_cancel_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.cancel = Some(flag);
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Plan a composition from file paths, using the bundled loaders
    pub async fn plan_from_files<P: AsRef<Path>>(
        &self,
        audio_path: P,
        slides_dir: P,
    ) -> Result<RenderPlan> {
        let audio_path = audio_path.as_ref();
        let slides_dir = slides_dir.as_ref();

        info!("🎬 Starting Lecture-Compositor planning");
        info!("   Audio: {:?}", audio_path);
        info!("   Slides: {:?}", slides_dir);

        let audio = AudioLoader::load(audio_path).await?;
        info!(
            "   Loaded: {:.1}s, {} Hz, {} channels",
            audio.duration, audio.sample_rate, audio.channels
        );
        self.checkpoint()?;

        let slides = SlideLoader::load_directory(slides_dir).await?;
        info!("   Slides discovered: {}", slides.len());
        self.checkpoint()?;

        self.plan_from_samples(&audio.mono_samples(), audio.sample_rate, &slides)
    }

    /// Plan a composition from a decoded mono waveform and decoded slides.
    ///
    /// This is the core entry point: everything upstream (audio decode,
    /// slide decode) and downstream (encoding) is an external collaborator.
    pub fn plan_from_samples(
        &self,
        samples: &[f32],
        sample_rate: u32,
        slides: &[SlideImage],
    ) -> Result<RenderPlan> {
        self.config.validate()?;

        // Stage 1: Audio feature extraction
        info!("🎵 Step 1: Extracting audio features...");
        let extractor = FeatureExtractor::with_config(self.config.audio.clone());
        let profile = extractor.extract(samples, sample_rate)?;
        info!(
            "   ✅ {} beats over {:.1}s",
            profile.beat_count(),
            profile.duration()
        );
        self.checkpoint()?;

        // Stage 2: Slide classification (parallel fan-out, single join)
        info!("🖼️  Step 2: Classifying {} slides...", slides.len());
        let pool = classify_batch(slides, &self.config.classifier)?;
        info!("   ✅ Pool of {} classified slides", pool.len());
        self.checkpoint()?;

        // Stage 3: Synchronization planning
        info!("⏱️  Step 3: Planning slide sequence...");
        let planner = Planner::new(&profile, &pool, &self.config.planner);
        let planned = planner.plan()?;
        info!("   ✅ {} intervals planned", planned.len());
        self.checkpoint()?;

        // Stage 4: Effect parameterization
        info!("🎨 Step 4: Deriving effect parameters...");
        let parameterizer = EffectParameterizer::new(
            self.config.effects.clone(),
            profile.energy(),
        );
        let params: Vec<EffectParams> = planned
            .iter()
            .map(|p| parameterizer.parameterize(p.interval.energy, p.interval.duration()))
            .collect();
        self.checkpoint()?;

        // Stage 5: Timeline assembly and verification
        info!("🧩 Step 5: Assembling timeline...");
        let assembler = TimelineAssembler::new(self.config.planner.merge_repeats);
        let segments = assembler.assemble(
            &planned,
            &params,
            &pool,
            &parameterizer,
            profile.duration(),
        )?;
        info!("   ✅ {} segments covering {:.1}s", segments.len(), profile.duration());

        for segment in &segments {
            debug!(
                "   {:.2}s +{:.2}s  {} (zoom {:.2}, fade {:.2}s)",
                segment.start, segment.duration, segment.image_id, segment.zoom, segment.fade
            );
        }

        Ok(RenderPlan {
            segments,
            audio_duration: profile.duration(),
            fps: self.config.output.fps,
        })
    }

    /// Plan and hand the result to a render sink
    pub async fn compose<P: AsRef<Path>>(
        &self,
        audio_path: P,
        slides_dir: P,
        output_path: P,
        sink: &dyn RenderSink,
    ) -> Result<()> {
        let audio_path = audio_path.as_ref();
        let output_path = output_path.as_ref();

        let plan = self.plan_from_files(audio_path, slides_dir.as_ref()).await?;
        self.checkpoint()?;

        info!("📤 Handing {} segments to '{}' sink", plan.segments.len(), sink.name());
        sink.render(&plan, audio_path, output_path)?;

        info!("🎉 Plan complete! Output saved to: {:?}", output_path);
        Ok(())
    }

    fn checkpoint(&self) -> Result<()> {
        if self.cancel.as_ref().is_some_and(|flag| flag.load(Ordering::Relaxed)) {
            return Err(SyncError::Cancelled);
        }
        Ok(())
    }
}
