// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Tomomesh
//!
//! Reconstructs a triangulated surface from a stack of grayscale
//! cross-section images: the slices are assembled into a scalar volume, the
//! surface at an iso-level is extracted with marching cubes and the result is
//! written as a Wavefront OBJ text file.

pub mod cli;
pub mod config;
pub mod error;
pub mod geometry;
pub mod io;
pub mod pipeline;
pub mod progress;
pub mod utils;

pub use config::{ReconConfig, ResizeFilter};
pub use error::{ReconError, ReconResult};
pub use geometry::{analyze, marching_cubes, MarchingCubes, Mesh, MeshStats, Volume, VolumeBuilder};
pub use io::{export_obj, import_obj, SliceSource, DEFAULT_HEADER};
pub use pipeline::{reconstruct, Pipeline, PipelineReport, StageTimings};
pub use progress::{ConsoleProgress, ProgressSink, SilentProgress, Stage};
