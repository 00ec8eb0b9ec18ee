// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Stage sequencing: slices, volume, isosurface, OBJ file.
//!
//! Each stage materializes its full output before the next one starts. The
//! whole run executes inside a rayon pool sized by `threads` when set.

use crate::config::ReconConfig;
use crate::error::{ReconError, ReconResult};
use crate::geometry::{MarchingCubes, Mesh, Volume, VolumeBuilder};
use crate::io::{export_obj, SliceSource};
use crate::progress::{ProgressSink, SilentProgress};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tracing::{info, warn};

fn serialize_duration<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_f64(duration.as_secs_f64())
}

fn deserialize_duration<'de, D>(deserializer: D) -> Result<Duration, D::Error>
where
    D: Deserializer<'de>,
{
    let secs = f64::deserialize(deserializer)?;
    Ok(Duration::from_secs_f64(secs))
}

/// Wall-clock time spent in each stage, serialized as seconds
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct StageTimings {
    #[serde(serialize_with = "serialize_duration", deserialize_with = "deserialize_duration")]
    pub load: Duration,
    #[serde(serialize_with = "serialize_duration", deserialize_with = "deserialize_duration")]
    pub build: Duration,
    #[serde(serialize_with = "serialize_duration", deserialize_with = "deserialize_duration")]
    pub extract: Duration,
    #[serde(serialize_with = "serialize_duration", deserialize_with = "deserialize_duration")]
    pub export: Duration,
}

impl StageTimings {
    pub fn total(&self) -> Duration {
        self.load + self.build + self.extract + self.export
    }
}

/// Summary of a finished run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineReport {
    pub input: PathBuf,
    pub output: PathBuf,
    pub slice_count: usize,
    pub first_slice: PathBuf,
    pub last_slice: PathBuf,
    /// Slice size after resizing, `(width, height)`
    pub slice_dims: (u32, u32),
    /// `[rows, slices, columns]`, padding included
    pub volume_dims: [usize; 3],
    pub iso_level: f32,
    pub vertex_count: usize,
    pub triangle_count: usize,
    pub timings: StageTimings,
}

/// One reconstruction run over a validated configuration
pub struct Pipeline<'a> {
    config: &'a ReconConfig,
    progress: &'a dyn ProgressSink,
}

impl<'a> Pipeline<'a> {
    pub fn new(config: &'a ReconConfig, progress: &'a dyn ProgressSink) -> Self {
        Self { config, progress }
    }

    /// Run every stage and write the output file
    pub fn run(&self) -> ReconResult<PipelineReport> {
        match self.config.threads {
            Some(threads) => {
                let pool = rayon::ThreadPoolBuilder::new()
                    .num_threads(threads)
                    .build()?;
                pool.install(|| self.run_stages())
            }
            None => self.run_stages(),
        }
    }

    /// Extract the isosurface of an assembled volume
    pub fn extract(&self, volume: &Volume<u8>) -> ReconResult<Mesh> {
        MarchingCubes::new(self.config.iso_level).extract_with_progress(volume, self.progress)
    }

    fn run_stages(&self) -> ReconResult<PipelineReport> {
        let config = self.config;
        let mut timings = StageTimings::default();

        let start = Instant::now();
        let slices = SliceSource::from_config(config).load(self.progress)?;
        timings.load = start.elapsed();

        let (Some(first), Some(last)) = (slices.first(), slices.last()) else {
            return Err(ReconError::EmptyInput {
                dir: config.input.clone(),
            });
        };
        let first_slice = first.path.clone();
        let last_slice = last.path.clone();
        let slice_dims = first.pixels.dimensions();
        let slice_count = slices.len();

        let start = Instant::now();
        let volume = VolumeBuilder::new(config.padding).build(&slices)?;
        drop(slices);
        timings.build = start.elapsed();
        info!(dims = ?volume.dims(), padding = config.padding, "volume ready");

        let start = Instant::now();
        let mesh = self.extract(&volume)?;
        mesh.validate_indices()?;
        timings.extract = start.elapsed();
        if mesh.is_empty() {
            warn!(
                iso_level = config.iso_level,
                "no surface crossed the iso level, writing an empty mesh"
            );
        }

        let start = Instant::now();
        export_obj(&mesh, &config.output, self.progress)?;
        timings.export = start.elapsed();

        info!(
            output = %config.output.display(),
            total_ms = timings.total().as_millis() as u64,
            "reconstruction finished"
        );

        Ok(PipelineReport {
            input: config.input.clone(),
            output: config.output.clone(),
            slice_count,
            first_slice,
            last_slice,
            slice_dims,
            volume_dims: volume.dims(),
            iso_level: config.iso_level,
            vertex_count: mesh.vertex_count(),
            triangle_count: mesh.triangle_count(),
            timings,
        })
    }
}

/// Validate `config` and run the pipeline without progress output
pub fn reconstruct(config: &ReconConfig) -> ReconResult<PipelineReport> {
    let config = config.clone().validate()?;
    Pipeline::new(&config, &SilentProgress).run()
}
