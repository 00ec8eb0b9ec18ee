// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Error types for the reconstruction pipeline

use std::path::PathBuf;
use thiserror::Error;

/// Errors that abort a reconstruction run.
#[derive(Debug, Error)]
pub enum ReconError {
    /// A directory entry cannot be ordered, or the input is otherwise unusable.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// The slice range selected no files.
    #[error("No slices found in {}", dir.display())]
    EmptyInput { dir: PathBuf },

    /// A slice does not match the canonical stack size after resizing.
    #[error(
        "Slice {} is {}x{} after resize, expected {}x{}",
        path.display(),
        found.0,
        found.1,
        expected.0,
        expected.1
    )]
    DimensionMismatch {
        path: PathBuf,
        expected: (u32, u32),
        found: (u32, u32),
    },

    /// Fewer than two samples along an axis: no cells to march.
    #[error("Volume {dims:?} has fewer than 2 samples along an axis")]
    DegenerateVolume { dims: [usize; 3] },

    /// Zero samples along an axis.
    #[error("Volume {dims:?} is empty")]
    EmptyVolume { dims: [usize; 3] },

    /// File system failure.
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Image decoding failure.
    #[error("Failed to decode image {}: {source}", path.display())]
    Image {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    /// Configuration rejected by validation.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// The worker pool could not be created.
    #[error("Failed to build worker pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

impl ReconError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Result type for reconstruction operations.
pub type ReconResult<T> = std::result::Result<T, ReconError>;
