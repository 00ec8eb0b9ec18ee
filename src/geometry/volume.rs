// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Scalar volumes and their assembly from image slices.
//!
//! Axis convention: a volume has dimensions `[nx, ny, nz]` stored row-major
//! (`z` fastest). When assembled from slices, `x` is the image row, `y` is the
//! slice position in the stack and `z` is the image column, so a mesh vertex
//! `(x, y, z)` maps back to pixel `(row = x, column = z)` of slice `y`
//! (minus one on every axis when padding is enabled).

use crate::error::{ReconError, ReconResult};
use crate::io::Slice;
use tracing::debug;

/// Sample type a volume can hold
pub trait Scalar: Copy + Default + Send + Sync + 'static {
    fn to_f32(self) -> f32;
}

impl Scalar for u8 {
    fn to_f32(self) -> f32 {
        self as f32
    }
}

impl Scalar for u16 {
    fn to_f32(self) -> f32 {
        self as f32
    }
}

impl Scalar for f32 {
    fn to_f32(self) -> f32 {
        self
    }
}

/// Dense 3D grid of scalar samples
#[derive(Debug, Clone, PartialEq)]
pub struct Volume<T = u8> {
    dims: [usize; 3],
    data: Vec<T>,
}

impl<T: Scalar> Volume<T> {
    /// Zero-filled volume
    pub fn zeros(dims: [usize; 3]) -> ReconResult<Self> {
        check_dims(dims)?;
        Ok(Self {
            dims,
            data: vec![T::default(); dims[0] * dims[1] * dims[2]],
        })
    }

    /// Wrap an existing row-major buffer
    pub fn from_vec(dims: [usize; 3], data: Vec<T>) -> ReconResult<Self> {
        check_dims(dims)?;
        let expected = dims[0] * dims[1] * dims[2];
        if data.len() != expected {
            return Err(ReconError::InvalidInput(format!(
                "volume {:?} needs {} samples, got {}",
                dims,
                expected,
                data.len()
            )));
        }
        Ok(Self { dims, data })
    }

    /// Sample `f(x, y, z)` at every grid point
    pub fn from_fn(dims: [usize; 3], mut f: impl FnMut(usize, usize, usize) -> T) -> ReconResult<Self> {
        check_dims(dims)?;
        let mut data = Vec::with_capacity(dims[0] * dims[1] * dims[2]);
        for x in 0..dims[0] {
            for y in 0..dims[1] {
                for z in 0..dims[2] {
                    data.push(f(x, y, z));
                }
            }
        }
        Ok(Self { dims, data })
    }

    pub fn dims(&self) -> [usize; 3] {
        self.dims
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn as_slice(&self) -> &[T] {
        &self.data
    }

    #[inline]
    pub fn index(&self, x: usize, y: usize, z: usize) -> usize {
        (x * self.dims[1] + y) * self.dims[2] + z
    }

    #[inline]
    pub fn get(&self, x: usize, y: usize, z: usize) -> T {
        self.data[self.index(x, y, z)]
    }

    /// Sample as `f32`
    #[inline]
    pub fn value(&self, x: usize, y: usize, z: usize) -> f32 {
        self.get(x, y, z).to_f32()
    }

    pub fn set(&mut self, x: usize, y: usize, z: usize, value: T) {
        let index = self.index(x, y, z);
        self.data[index] = value;
    }
}

fn check_dims(dims: [usize; 3]) -> ReconResult<()> {
    if dims.iter().any(|&d| d == 0) {
        return Err(ReconError::EmptyVolume { dims });
    }
    Ok(())
}

/// Stacks equal-sized slices into a [`Volume`]
#[derive(Debug, Clone, Copy, Default)]
pub struct VolumeBuilder {
    padding: bool,
}

impl VolumeBuilder {
    pub fn new(padding: bool) -> Self {
        Self { padding }
    }

    /// Volume dimensions for `count` slices of `width` x `height` pixels
    pub fn output_dims(&self, count: usize, width: u32, height: u32) -> [usize; 3] {
        let pad = if self.padding { 2 } else { 0 };
        [
            height as usize + pad,
            count + pad,
            width as usize + pad,
        ]
    }

    /// Assemble the volume.
    ///
    /// The first slice fixes the canonical size; every other slice must match
    /// it. With padding, the stack gains an all-zero slice at both ends and a
    /// one-voxel zero border around every slice.
    pub fn build(&self, slices: &[Slice]) -> ReconResult<Volume<u8>> {
        let Some(first) = slices.first() else {
            return Err(ReconError::EmptyVolume {
                dims: self.output_dims(0, 0, 0),
            });
        };
        let (width, height) = first.pixels.dimensions();
        let dims = self.output_dims(slices.len(), width, height);
        let mut volume = Volume::<u8>::zeros(dims)?;

        let offset = usize::from(self.padding);
        let [_, ny, nz] = dims;
        for (depth, slice) in slices.iter().enumerate() {
            let found = slice.pixels.dimensions();
            if found != (width, height) {
                return Err(ReconError::DimensionMismatch {
                    path: slice.path.clone(),
                    expected: (width, height),
                    found,
                });
            }

            let y = depth + offset;
            for (column, row, pixel) in slice.pixels.enumerate_pixels() {
                let x = row as usize + offset;
                let z = column as usize + offset;
                volume.data[(x * ny + y) * nz + z] = pixel.0[0];
            }
        }

        debug!(?dims, padding = self.padding, "assembled volume");
        Ok(volume)
    }
}
