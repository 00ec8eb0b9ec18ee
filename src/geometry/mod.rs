// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Geometry module - volumes, isosurface extraction and mesh representation

mod analytics;
mod bbox;
pub mod marching_cubes;
mod mesh;
mod volume;

pub use analytics::{analyze, MeshStats};
pub use bbox::BoundingBox;
pub use marching_cubes::{marching_cubes, MarchingCubes};
pub use mesh::{Mesh, Triangle, Vertex};
pub use volume::{Scalar, Volume, VolumeBuilder};
