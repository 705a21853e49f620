//! Command-line interface and the batch job runner
//!
//! A run processes one or more samples files; every named job builds its
//! model once and then produces its requested outputs, retrying fresh
//! attempts on contradiction. Job failures are reported and skipped so one
//! bad exemplar never aborts the batch.

use crate::io::animation::GifRecorder;
use crate::io::config::{
    DEFAULT_ATTEMPTS, DEFAULT_SEED, OverlappingJob, TiledJob, UPSCALE, load_samples,
    load_tile_catalog,
};
use crate::io::error::Result;
use crate::io::image::{export_png, load_paletted_image, load_tile_bitmap, upscale};
use crate::io::progress::ProgressManager;
use crate::model::Model;
use crate::model::overlapping::OverlappingModel;
use crate::model::pattern::extract_patterns;
use crate::model::tiled::TileModel;
use crate::solver::observe::RunStatus;
use crate::solver::run::{FrameSink, create_output, run};
use clap::Parser;
use rand::{Rng, SeedableRng, rngs::StdRng};
use std::path::{Path, PathBuf};

/// Command-line arguments for the generation tool
#[derive(Parser)]
#[command(name = "wavetiler")]
#[command(
    version,
    about = "Generate images with the wave function collapse algorithm"
)]
pub struct Cli {
    /// Samples files naming the jobs to run
    #[arg(value_name = "JOBS")]
    pub jobs: Vec<PathBuf>,

    /// Export an animated GIF of the collapse process per attempt
    #[arg(short, long)]
    pub gif: bool,

    /// Master random seed for reproducible batches
    #[arg(short, long, default_value_t = DEFAULT_SEED)]
    pub seed: u64,

    /// Attempts per requested output before giving up on it
    #[arg(short, long, default_value_t = DEFAULT_ATTEMPTS)]
    pub attempts: usize,

    /// Directory receiving generated images
    #[arg(short, long, default_value = "output")]
    pub out_dir: PathBuf,

    /// Suppress progress output
    #[arg(short, long)]
    pub quiet: bool,
}

impl Cli {
    /// Check if progress should be displayed
    pub const fn should_show_progress(&self) -> bool {
        !self.quiet
    }
}

/// Runs every job of every samples file handed to the CLI
pub struct JobRunner {
    cli: Cli,
    progress: Option<ProgressManager>,
    master_rng: StdRng,
}

impl JobRunner {
    /// Create a runner from parsed CLI arguments
    pub fn new(cli: Cli) -> Self {
        let progress = cli.should_show_progress().then(ProgressManager::new);
        let master_rng = StdRng::seed_from_u64(cli.seed);

        Self {
            cli,
            progress,
            master_rng,
        }
    }

    /// Process all samples files
    ///
    /// Per-job failures are reported and skipped; a failure of one samples
    /// file does not stop the others.
    ///
    /// # Errors
    ///
    /// Returns an error only for failures outside any single job, such as
    /// an unwritable output directory discovered while exporting.
    pub fn process(&mut self) -> Result<()> {
        let files = if self.cli.jobs.is_empty() {
            vec![PathBuf::from("samples.json")]
        } else {
            self.cli.jobs.clone()
        };

        for file in &files {
            if let Err(error) = self.run_samples_file(file) {
                self.note(&format!("{}: {error}", file.display()));
            }
        }

        if let Some(ref progress) = self.progress {
            progress.finish();
        }

        Ok(())
    }

    fn run_samples_file(&mut self, path: &Path) -> Result<()> {
        let samples = load_samples(path)?;

        let overlapping: Vec<(String, OverlappingJob)> = samples
            .overlapping
            .iter()
            .map(|(name, job)| (name.clone(), job.clone()))
            .collect();
        for (name, job) in overlapping {
            if let Err(error) = self.run_overlapping(&samples.image_dir, &name, &job) {
                self.note(&format!("{name}: job failed: {error}"));
            }
        }

        let tiled: Vec<(String, TiledJob)> = samples
            .tiled
            .iter()
            .map(|(name, job)| (name.clone(), job.clone()))
            .collect();
        for (name, job) in tiled {
            if let Err(error) = self.run_tiled(&samples.image_dir, &name, &job) {
                self.note(&format!("{name}: job failed: {error}"));
            }
        }

        Ok(())
    }

    fn run_overlapping(&mut self, image_dir: &Path, name: &str, job: &OverlappingJob) -> Result<()> {
        let sample = load_paletted_image(&image_dir.join(&job.image))?;
        let extracted = extract_patterns(
            &sample,
            job.n,
            job.periodic_in,
            job.symmetry,
            job.foundation,
        )?;
        let model = OverlappingModel::new(
            &extracted.prevalence,
            sample.palette,
            job.n,
            job.periodic_out,
            job.width,
            job.height,
            extracted.foundation,
        )?;

        self.run_and_write(name, &model, job.limit, job.screenshots)
    }

    fn run_tiled(&mut self, image_dir: &Path, name: &str, job: &TiledJob) -> Result<()> {
        let root = image_dir.join(&job.subdir);
        let catalog = load_tile_catalog(&root.join("data.json"))?;
        let tile_size = catalog.tile_size;
        let loader =
            |tile_name: &str| load_tile_bitmap(&root.join(format!("{tile_name}.png")), tile_size);
        let model = TileModel::new(
            &catalog,
            job.subset.as_deref(),
            job.width,
            job.height,
            job.periodic,
            &loader,
        )?;

        self.run_and_write(name, &model, job.limit, job.screenshots)
    }

    /// Produce the requested outputs for one built model
    fn run_and_write(
        &mut self,
        name: &str,
        model: &dyn Model,
        limit: usize,
        screenshots: usize,
    ) -> Result<()> {
        if let Some(ref mut progress) = self.progress {
            progress.start_job(name, screenshots);
        }

        for index in 0..screenshots {
            for _attempt in 0..self.cli.attempts.max(1) {
                let seed = self.master_rng.random::<u64>();
                let mut output = create_output(model);
                let mut recorder = self.cli.gif.then(|| GifRecorder::new(UPSCALE));

                let report = run(
                    model,
                    &mut output,
                    seed,
                    limit,
                    recorder.as_mut().map(|r| r as &mut dyn FrameSink),
                )?;

                if let Some(rec) = recorder {
                    if rec.frame_count() > 0 {
                        rec.export(&self.cli.out_dir.join(format!("{name}_{index}.gif")))?;
                    }
                }

                self.note(&format!(
                    "{name}: {} after {} iterations (seed {seed})",
                    report.status.label(),
                    report.iterations
                ));

                if report.status == RunStatus::Success {
                    let image = model.image(&output);
                    export_png(
                        &upscale(&image, UPSCALE),
                        &self.cli.out_dir.join(format!("{name}_{index}.png")),
                    )?;
                    break;
                }
            }

            if let Some(ref progress) = self.progress {
                progress.record_output();
            }
        }

        if let Some(ref mut progress) = self.progress {
            progress.finish_job();
        }

        Ok(())
    }

    // Allow print for user feedback when progress display is suppressed
    #[allow(clippy::print_stderr)]
    fn note(&self, text: &str) {
        match self.progress {
            Some(ref progress) => progress.note(text),
            None => eprintln!("{text}"),
        }
    }
}
