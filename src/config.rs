// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Run configuration

use crate::error::{ReconError, ReconResult};
use image::imageops::FilterType;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// File looked up in the working directory when no config path is given.
pub const DEFAULT_CONFIG_FILE: &str = "tomomesh.toml";

/// Resampling filter used when scaling slices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResizeFilter {
    Nearest,
    #[default]
    Bilinear,
}

impl ResizeFilter {
    pub fn filter_type(self) -> FilterType {
        match self {
            ResizeFilter::Nearest => FilterType::Nearest,
            ResizeFilter::Bilinear => FilterType::Triangle,
        }
    }
}

impl FromStr for ResizeFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "nearest" => Ok(ResizeFilter::Nearest),
            "bilinear" | "linear" => Ok(ResizeFilter::Bilinear),
            other => Err(format!("unknown resize filter '{}' (nearest, bilinear)", other)),
        }
    }
}

impl fmt::Display for ResizeFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResizeFilter::Nearest => write!(f, "nearest"),
            ResizeFilter::Bilinear => write!(f, "bilinear"),
        }
    }
}

/// Reconstruction parameters.
///
/// Built once at startup, validated with [`ReconConfig::validate`], then only
/// borrowed by the pipeline stages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReconConfig {
    /// Directory holding the image sequence
    pub input: PathBuf,
    /// Destination mesh file
    pub output: PathBuf,
    /// First slice to include (out-of-range values fall back to 0)
    pub start: usize,
    /// Number of slices to include, 0 for all remaining
    pub count: usize,
    /// Scale factor applied to both slice axes
    pub resolution: f32,
    /// Scalar threshold of the extracted surface
    pub iso_level: f32,
    /// Surround the stack with zero-valued slices and borders
    pub padding: bool,
    /// Resampling filter for the resize step
    pub resize_filter: ResizeFilter,
    /// Worker threads, `None` for the rayon default
    pub threads: Option<usize>,
}

impl Default for ReconConfig {
    fn default() -> Self {
        Self {
            input: PathBuf::from("data"),
            output: PathBuf::from("mesh.obj"),
            start: 0,
            count: 0,
            resolution: 0.5,
            iso_level: 127.0,
            padding: true,
            resize_filter: ResizeFilter::Bilinear,
            threads: None,
        }
    }
}

impl ReconConfig {
    /// Load configuration from a TOML file
    pub fn from_file(path: impl AsRef<Path>) -> ReconResult<Self> {
        let path = path.as_ref();
        let content =
            std::fs::read_to_string(path).map_err(|e| ReconError::io(path, e))?;
        toml::from_str(&content).map_err(|e| {
            ReconError::InvalidConfig(format!("{}: {}", path.display(), e))
        })
    }

    /// Load defaults, then `tomomesh.toml` if present, then environment overrides
    pub fn load() -> ReconResult<Self> {
        let config = if Path::new(DEFAULT_CONFIG_FILE).exists() {
            Self::from_file(DEFAULT_CONFIG_FILE)?
        } else {
            Self::default()
        };
        config.with_env_overrides()
    }

    /// Apply `TOMOMESH_*` environment variables on top of this configuration
    pub fn with_env_overrides(self) -> ReconResult<Self> {
        self.with_overrides(|key| std::env::var(key).ok())
    }

    fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> ReconResult<Self> {
        if let Some(input) = lookup("TOMOMESH_INPUT") {
            self.input = PathBuf::from(input);
        }
        if let Some(output) = lookup("TOMOMESH_OUTPUT") {
            self.output = PathBuf::from(output);
        }
        if let Some(iso) = lookup("TOMOMESH_ISO_LEVEL") {
            self.iso_level = parse_env("TOMOMESH_ISO_LEVEL", &iso)?;
        }
        if let Some(resolution) = lookup("TOMOMESH_RESOLUTION") {
            self.resolution = parse_env("TOMOMESH_RESOLUTION", &resolution)?;
        }
        if let Some(threads) = lookup("TOMOMESH_THREADS") {
            self.threads = Some(parse_env("TOMOMESH_THREADS", &threads)?);
        }
        Ok(self)
    }

    /// Save configuration to a TOML file
    pub fn save(&self, path: impl AsRef<Path>) -> ReconResult<()> {
        let path = path.as_ref();
        let content = toml::to_string_pretty(self)
            .map_err(|e| ReconError::InvalidConfig(e.to_string()))?;
        std::fs::write(path, content).map_err(|e| ReconError::io(path, e))
    }

    /// Check parameter ranges; the returned config is the one the pipeline runs with
    pub fn validate(self) -> ReconResult<Self> {
        if self.input.as_os_str().is_empty() {
            return Err(ReconError::InvalidConfig("input path is empty".into()));
        }
        if self.output.as_os_str().is_empty() {
            return Err(ReconError::InvalidConfig("output path is empty".into()));
        }
        if !self.resolution.is_finite() || self.resolution <= 0.0 {
            return Err(ReconError::InvalidConfig(format!(
                "resolution multiplier must be a positive number, got {}",
                self.resolution
            )));
        }
        if !self.iso_level.is_finite() {
            return Err(ReconError::InvalidConfig(format!(
                "iso level must be finite, got {}",
                self.iso_level
            )));
        }
        if self.threads == Some(0) {
            return Err(ReconError::InvalidConfig("threads must be at least 1".into()));
        }
        Ok(self)
    }
}

fn parse_env<T: FromStr>(key: &str, value: &str) -> ReconResult<T> {
    value
        .trim()
        .parse()
        .map_err(|_| ReconError::InvalidConfig(format!("{} has invalid value '{}'", key, value)))
}
