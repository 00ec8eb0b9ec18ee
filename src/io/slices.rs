// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Image sequence discovery and decoding

use crate::config::{ReconConfig, ResizeFilter};
use crate::error::{ReconError, ReconResult};
use crate::progress::{ProgressSink, Stage};
use image::{imageops, GrayImage, ImageFormat};
use rayon::prelude::*;
use std::ops::Range;
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use walkdir::WalkDir;

/// One decoded grayscale cross-section
#[derive(Debug, Clone)]
pub struct Slice {
    pub path: PathBuf,
    pub pixels: GrayImage,
}

impl Slice {
    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }
}

/// Numeric index embedded in a file name: all digits, concatenated.
///
/// `"img_012.png"` gives 12, `"scan2_0007.tif"` gives 20007.
pub fn sort_key(name: &str) -> ReconResult<u64> {
    let digits: String = name.chars().filter(char::is_ascii_digit).collect();
    if digits.is_empty() {
        return Err(ReconError::InvalidInput(format!(
            "file name '{}' contains no digits to order by",
            name
        )));
    }
    digits.parse().map_err(|_| {
        ReconError::InvalidInput(format!("index in file name '{}' is too large", name))
    })
}

/// Order paths by the numeric index of their file names.
///
/// Two files with the same index cannot be ordered and are rejected.
pub fn order_by_index(paths: Vec<PathBuf>) -> ReconResult<Vec<PathBuf>> {
    let mut keyed = paths
        .into_iter()
        .map(|path| {
            let name = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            sort_key(&name).map(|key| (key, path))
        })
        .collect::<ReconResult<Vec<_>>>()?;

    keyed.sort_by_key(|(key, _)| *key);

    if let Some(pair) = keyed.windows(2).find(|pair| pair[0].0 == pair[1].0) {
        return Err(ReconError::InvalidInput(format!(
            "{} and {} share slice index {}",
            pair[0].1.display(),
            pair[1].1.display(),
            pair[0].0
        )));
    }

    Ok(keyed.into_iter().map(|(_, path)| path).collect())
}

/// Slice range selected from `file_count` sorted files.
///
/// `start` is honored only when it addresses an existing file; otherwise the
/// range starts at 0. A `count` of 0 selects everything after `start`.
pub fn select_range(file_count: usize, start: usize, count: usize) -> Range<usize> {
    let start = if start < file_count { start } else { 0 };
    let end = if count == 0 {
        file_count
    } else {
        start.saturating_add(count).min(file_count)
    };
    start..end
}

/// Size of a `width` x `height` image scaled by `factor`, rounded to whole pixels
pub fn scaled_dimensions(width: u32, height: u32, factor: f32) -> (u32, u32) {
    let scale = |n: u32| (n as f64 * factor as f64).round() as u32;
    (scale(width), scale(height))
}

/// Ordered, bounded image sequence from a directory
#[derive(Debug, Clone)]
pub struct SliceSource {
    dir: PathBuf,
    start: usize,
    count: usize,
    resolution: f32,
    filter: ResizeFilter,
}

impl SliceSource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            start: 0,
            count: 0,
            resolution: 1.0,
            filter: ResizeFilter::default(),
        }
    }

    pub fn from_config(config: &ReconConfig) -> Self {
        Self::new(&config.input)
            .with_range(config.start, config.count)
            .with_resolution(config.resolution, config.resize_filter)
    }

    pub fn with_range(mut self, start: usize, count: usize) -> Self {
        self.start = start;
        self.count = count;
        self
    }

    pub fn with_resolution(mut self, resolution: f32, filter: ResizeFilter) -> Self {
        self.resolution = resolution;
        self.filter = filter;
        self
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Sorted and range-limited image paths
    pub fn discover(&self) -> ReconResult<Vec<PathBuf>> {
        if !self.dir.is_dir() {
            return Err(ReconError::InvalidInput(format!(
                "input directory not found: {}",
                self.dir.display()
            )));
        }

        let mut candidates = Vec::new();
        for entry in WalkDir::new(&self.dir).min_depth(1).max_depth(1) {
            let entry = entry.map_err(|e| ReconError::io(&self.dir, e.into()))?;
            if !entry.file_type().is_file() || is_hidden(entry.path()) {
                continue;
            }
            if ImageFormat::from_path(entry.path()).is_err() {
                debug!(path = %entry.path().display(), "skipping non-image entry");
                continue;
            }
            candidates.push(entry.into_path());
        }

        let ordered = order_by_index(candidates)?;
        let range = select_range(ordered.len(), self.start, self.count);
        let selected = ordered[range].to_vec();

        if selected.is_empty() {
            return Err(ReconError::EmptyInput {
                dir: self.dir.clone(),
            });
        }
        Ok(selected)
    }

    /// Discover, decode and resize the selected slices, in index order
    pub fn load(&self, progress: &dyn ProgressSink) -> ReconResult<Vec<Slice>> {
        let paths = self.discover()?;
        if let (Some(first), Some(last)) = (paths.first(), paths.last()) {
            info!(
                count = paths.len(),
                first = %first.display(),
                last = %last.display(),
                "loading slices"
            );
        }

        progress.start(Stage::LoadSlices, paths.len() as u64);
        let slices = paths
            .par_iter()
            .map(|path| {
                let slice = decode_slice(path, self.resolution, self.filter);
                progress.advance(1);
                slice
            })
            .collect::<ReconResult<Vec<_>>>();
        progress.finish();
        let slices = slices?;

        check_uniform(&slices)?;
        Ok(slices)
    }
}

/// Decode one image to 8-bit grayscale and scale it by `resolution`
pub fn decode_slice(path: &Path, resolution: f32, filter: ResizeFilter) -> ReconResult<Slice> {
    let pixels = image::open(path)
        .map_err(|source| ReconError::Image {
            path: path.to_path_buf(),
            source,
        })?
        .into_luma8();

    let (width, height) = scaled_dimensions(pixels.width(), pixels.height(), resolution);
    if width == 0 || height == 0 {
        return Err(ReconError::InvalidInput(format!(
            "resolution {} scales {} ({}x{}) to zero pixels",
            resolution,
            path.display(),
            pixels.width(),
            pixels.height()
        )));
    }

    let pixels = if (width, height) == pixels.dimensions() {
        pixels
    } else {
        imageops::resize(&pixels, width, height, filter.filter_type())
    };

    Ok(Slice {
        path: path.to_path_buf(),
        pixels,
    })
}

/// Every slice must match the first one's size
fn check_uniform(slices: &[Slice]) -> ReconResult<()> {
    let Some(first) = slices.first() else {
        return Ok(());
    };
    let expected = first.pixels.dimensions();
    for slice in &slices[1..] {
        let found = slice.pixels.dimensions();
        if found != expected {
            return Err(ReconError::DimensionMismatch {
                path: slice.path.clone(),
                expected,
                found,
            });
        }
    }
    Ok(())
}

fn is_hidden(path: &Path) -> bool {
    path.file_name()
        .map(|name| name.to_string_lossy().starts_with('.'))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progress::SilentProgress;
    use image::Luma;
    use tempfile::TempDir;

    fn names(paths: &[PathBuf]) -> Vec<String> {
        paths
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect()
    }

    fn write_png(dir: &Path, name: &str, width: u32, height: u32, value: u8) {
        GrayImage::from_pixel(width, height, Luma([value]))
            .save(dir.join(name))
            .unwrap();
    }

    #[test]
    fn test_sort_key() {
        assert_eq!(sort_key("img_012.png").unwrap(), 12);
        assert_eq!(sort_key("7.tif").unwrap(), 7);
        assert_eq!(sort_key("scan2_0007.png").unwrap(), 20007);
        assert!(matches!(
            sort_key("thumbnail.png"),
            Err(ReconError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_numeric_order() {
        let paths = vec!["2.png", "10.png", "1.png"]
            .into_iter()
            .map(PathBuf::from)
            .collect();
        let ordered = order_by_index(paths).unwrap();
        assert_eq!(names(&ordered), vec!["1.png", "2.png", "10.png"]);
    }

    #[test]
    fn test_duplicate_index_rejected() {
        let paths = vec![PathBuf::from("a_01.png"), PathBuf::from("b_1.png")];
        assert!(matches!(
            order_by_index(paths),
            Err(ReconError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_select_range() {
        assert_eq!(select_range(10, 0, 0), 0..10);
        assert_eq!(select_range(10, 3, 4), 3..7);
        assert_eq!(select_range(10, 1, 2), 1..3);
        // Count past the end is capped
        assert_eq!(select_range(10, 8, 5), 8..10);
        // Out-of-range start falls back to 0
        assert_eq!(select_range(10, 15, 0), 0..10);
        assert_eq!(select_range(10, 15, 3), 0..3);
        assert_eq!(select_range(0, 0, 0), 0..0);
    }

    #[test]
    fn test_scaled_dimensions() {
        assert_eq!(scaled_dimensions(100, 50, 0.5), (50, 25));
        assert_eq!(scaled_dimensions(15, 9, 0.1), (2, 1));
        assert_eq!(scaled_dimensions(7, 7, 1.0), (7, 7));
    }

    #[test]
    fn test_discover_skips_non_images() {
        let dir = TempDir::new().unwrap();
        write_png(dir.path(), "slice_10.png", 4, 4, 0);
        write_png(dir.path(), "slice_2.png", 4, 4, 0);
        std::fs::write(dir.path().join("notes.txt"), "scan settings").unwrap();
        std::fs::write(dir.path().join(".DS_Store"), "").unwrap();
        std::fs::create_dir(dir.path().join("3.png")).unwrap();

        let paths = SliceSource::new(dir.path()).discover().unwrap();
        assert_eq!(names(&paths), vec!["slice_2.png", "slice_10.png"]);
    }

    #[test]
    fn test_discover_empty_directory() {
        let dir = TempDir::new().unwrap();
        let err = SliceSource::new(dir.path()).discover().unwrap_err();
        assert!(matches!(err, ReconError::EmptyInput { .. }));
    }

    #[test]
    fn test_missing_directory() {
        let err = SliceSource::new("/definitely/not/here").discover().unwrap_err();
        assert!(matches!(err, ReconError::InvalidInput(_)));
    }

    #[test]
    fn test_load_resizes_in_order() {
        let dir = TempDir::new().unwrap();
        for i in 0..4u8 {
            write_png(dir.path(), &format!("{}.png", i), 8, 6, i * 10);
        }

        let slices = SliceSource::new(dir.path())
            .with_range(1, 2)
            .with_resolution(0.5, ResizeFilter::Nearest)
            .load(&SilentProgress)
            .unwrap();

        assert_eq!(slices.len(), 2);
        assert_eq!(slices[0].pixels.dimensions(), (4, 3));
        assert_eq!(slices[0].pixels.get_pixel(0, 0).0[0], 10);
        assert_eq!(slices[1].pixels.get_pixel(3, 2).0[0], 20);
    }

    #[test]
    fn test_load_rejects_mismatched_sizes() {
        let dir = TempDir::new().unwrap();
        write_png(dir.path(), "1.png", 8, 8, 0);
        write_png(dir.path(), "2.png", 8, 10, 0);

        let err = SliceSource::new(dir.path())
            .load(&SilentProgress)
            .unwrap_err();
        assert!(matches!(err, ReconError::DimensionMismatch { .. }));
    }
}
