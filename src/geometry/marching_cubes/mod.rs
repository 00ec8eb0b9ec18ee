// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Isosurface extraction with marching cubes.
//!
//! A cell spans grid points `[x, x+1] x [y, y+1] x [z, z+1]`. Corner `k` sets
//! bit `k` of the cube index when its sample is below the iso-level, so the
//! solid side of the surface is `value >= iso` and triangle normals point
//! towards lower values.
//!
//! Extraction runs in two parallel passes over `x` layers. The first computes
//! one vertex per crossed grid edge, owned by the layer of the edge's lower
//! endpoint, so cells sharing an edge share its vertex. The second triangulates
//! the cells of each layer against those vertices. Per-layer buffers are
//! concatenated in layer order, which makes the output identical to a
//! sequential `x, y, z` scan whatever the number of workers.
//!
//! Vertex order: all edge crossings in layer order, then the interior
//! vertices of cells whose contours are fanned around a centroid.

mod cases;

pub use cases::{
    ambiguous_faces, case_table, solids_joined, triangulate, CellCase, CENTER, MAX_TRIANGLES,
};

use crate::error::{ReconError, ReconResult};
use crate::geometry::{Mesh, Scalar, Triangle, Vertex, Volume};
use crate::progress::{ProgressSink, SilentProgress, Stage};
use crate::utils::math::{clamp, lerp};
use ahash::AHashMap;
use nalgebra::{Point3, Vector3};
use cases::{CORNERS, EDGE_ORIGINS, FACES};
use rayon::prelude::*;
use std::time::Instant;
use tracing::{debug, info};

/// Marching cubes extractor for a fixed iso-level
#[derive(Debug, Clone, Copy)]
pub struct MarchingCubes {
    iso_level: f32,
}

/// Marks a triangle index that refers to a layer's interior vertices
const INTERIOR: usize = 1 << (usize::BITS - 1);

/// Crossing vertices owned by one `x` layer of grid points
struct LayerVertices {
    vertices: Vec<Vertex>,
    /// Local grid edge key to local vertex index
    lookup: AHashMap<usize, usize>,
}

/// Triangles of one `x` layer of cells
struct LayerSurface {
    triangles: Vec<Triangle>,
    /// Contour centroids, referenced as `INTERIOR | local index`
    interior: Vec<Vertex>,
}

impl MarchingCubes {
    pub fn new(iso_level: f32) -> Self {
        Self { iso_level }
    }

    pub fn iso_level(&self) -> f32 {
        self.iso_level
    }

    /// Extract the isosurface without progress reporting
    pub fn extract<T: Scalar>(&self, volume: &Volume<T>) -> ReconResult<Mesh> {
        self.extract_with_progress(volume, &SilentProgress)
    }

    /// Extract the isosurface, reporting one tick per cell layer
    pub fn extract_with_progress<T: Scalar>(
        &self,
        volume: &Volume<T>,
        progress: &dyn ProgressSink,
    ) -> ReconResult<Mesh> {
        let dims = volume.dims();
        if dims.iter().any(|&d| d < 2) {
            return Err(ReconError::DegenerateVolume { dims });
        }

        let start = Instant::now();
        let [nx, _, _] = dims;

        let layers: Vec<LayerVertices> = (0..nx)
            .into_par_iter()
            .map(|x| self.layer_vertices(volume, x))
            .collect();

        let mut offsets = Vec::with_capacity(layers.len());
        let mut vertex_count = 0;
        for layer in &layers {
            offsets.push(vertex_count);
            vertex_count += layer.vertices.len();
        }
        debug!(vertex_count, "computed edge crossings");

        progress.start(Stage::Extract, (nx - 1) as u64);
        let surfaces = (0..nx - 1)
            .into_par_iter()
            .map(|x| {
                let surface = self.layer_surface(volume, x, &layers, &offsets);
                progress.advance(1);
                surface
            })
            .collect::<ReconResult<Vec<LayerSurface>>>();
        progress.finish();
        let surfaces = surfaces?;

        let interior_count: usize = surfaces.iter().map(|s| s.interior.len()).sum();
        let triangle_count = surfaces.iter().map(|s| s.triangles.len()).sum();
        let mut mesh = Mesh::with_capacity(vertex_count + interior_count, triangle_count);
        for layer in layers {
            mesh.vertices.extend(layer.vertices);
        }
        for surface in surfaces {
            let base = mesh.vertices.len();
            mesh.triangles.extend(surface.triangles.into_iter().map(|triangle| {
                Triangle::new(triangle.indices.map(|i| {
                    if i & INTERIOR != 0 {
                        base + (i & !INTERIOR)
                    } else {
                        i
                    }
                }))
            }));
            mesh.vertices.extend(surface.interior);
        }
        if interior_count > 0 {
            debug!(interior_count, "fanned contours around interior vertices");
        }

        info!(
            iso_level = self.iso_level,
            vertices = mesh.vertex_count(),
            triangles = mesh.triangle_count(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "marching cubes finished"
        );
        Ok(mesh)
    }

    fn layer_vertices<T: Scalar>(&self, volume: &Volume<T>, x: usize) -> LayerVertices {
        let [nx, ny, nz] = volume.dims();
        let iso = self.iso_level;
        let mut vertices = Vec::new();
        let mut lookup = AHashMap::new();

        for y in 0..ny {
            for z in 0..nz {
                let value = volume.value(x, y, z);
                let below = value < iso;
                let neighbours = [
                    (x + 1 < nx).then(|| volume.value(x + 1, y, z)),
                    (y + 1 < ny).then(|| volume.value(x, y + 1, z)),
                    (z + 1 < nz).then(|| volume.value(x, y, z + 1)),
                ];

                for (axis, neighbour) in neighbours.into_iter().enumerate() {
                    let Some(other) = neighbour else { continue };
                    if (other < iso) == below {
                        continue;
                    }
                    let t = crossing(value, other, iso);
                    let mut position = [x as f32, y as f32, z as f32];
                    position[axis] = lerp(position[axis], position[axis] + 1.0, t);

                    lookup.insert(edge_key(ny, nz, y, z, axis), vertices.len());
                    vertices.push(Vertex::new(position[0], position[1], position[2]));
                }
            }
        }

        LayerVertices { vertices, lookup }
    }

    fn layer_surface<T: Scalar>(
        &self,
        volume: &Volume<T>,
        x: usize,
        layers: &[LayerVertices],
        offsets: &[usize],
    ) -> ReconResult<LayerSurface> {
        let [_, ny, nz] = volume.dims();
        let iso = self.iso_level;
        let table = case_table();
        let mut surface = LayerSurface {
            triangles: Vec::new(),
            interior: Vec::new(),
        };

        for y in 0..ny - 1 {
            for z in 0..nz - 1 {
                let mut values = [0.0f32; 8];
                let mut cube_index = 0u8;
                for (k, [dx, dy, dz]) in CORNERS.iter().enumerate() {
                    values[k] = volume.value(x + dx, y + dy, z + dz);
                    if values[k] < iso {
                        cube_index |= 1 << k;
                    }
                }
                if cube_index == 0 || cube_index == 0xff {
                    continue;
                }

                let joined = joined_faces(table.ambiguous(cube_index), &values, iso);
                let resolved;
                let case = if joined == 0 {
                    table.case(cube_index)
                } else {
                    resolved = triangulate(cube_index, joined);
                    &resolved
                };

                // (layer, local index) of the crossing on a cube edge
                let locate = |edge: u8| -> ReconResult<(usize, usize)> {
                    let ([dx, dy, dz], axis) = EDGE_ORIGINS[edge as usize];
                    let layer = x + dx;
                    let key = edge_key(ny, nz, y + dy, z + dz, axis);
                    let local = layers[layer].lookup.get(&key).ok_or_else(|| {
                        ReconError::InvalidInput(format!(
                            "no crossing vertex for edge {} of cell ({}, {}, {})",
                            edge, x, y, z
                        ))
                    })?;
                    Ok((layer, *local))
                };

                let first_interior = surface.interior.len();
                for k in 0..case.center_count() {
                    let contour = case.center_contour(k);
                    let mut sum = Vector3::zeros();
                    for &edge in contour {
                        let (layer, local) = locate(edge)?;
                        sum += layers[layer].vertices[local].position.coords;
                    }
                    let center = Point3::from(sum / contour.len() as f32);
                    surface.interior.push(Vertex::from(center));
                }

                for ids in case.triangles() {
                    let mut indices = [0usize; 3];
                    for (slot, &id) in indices.iter_mut().zip(ids) {
                        *slot = if id >= CENTER {
                            INTERIOR | (first_interior + (id - CENTER) as usize)
                        } else {
                            let (layer, local) = locate(id)?;
                            offsets[layer] + local
                        };
                    }
                    surface.triangles.push(Triangle::new(indices));
                }
            }
        }

        Ok(surface)
    }
}

/// Extract the isosurface of `volume` at `iso_level`
pub fn marching_cubes<T: Scalar>(volume: &Volume<T>, iso_level: f32) -> ReconResult<Mesh> {
    MarchingCubes::new(iso_level).extract(volume)
}

/// Interpolation parameter of the iso crossing between samples `v1` and `v2`
#[inline]
fn crossing(v1: f32, v2: f32, iso: f32) -> f32 {
    let delta = v2 - v1;
    if delta == 0.0 {
        return 0.5;
    }
    clamp((iso - v1) / delta, 0.0, 1.0)
}

/// Edge key within an `x` layer
#[inline]
fn edge_key(ny: usize, nz: usize, y: usize, z: usize, axis: usize) -> usize {
    debug_assert!(y < ny && z < nz);
    (y * nz + z) * 3 + axis
}

/// Decide every ambiguous face of a cell
fn joined_faces(ambiguous: u8, values: &[f32; 8], iso: f32) -> u8 {
    let mut joined = 0;
    for (f, face) in FACES.iter().enumerate() {
        if ambiguous & (1 << f) != 0 && solids_joined(face.map(|c| values[c]), iso) {
            joined |= 1 << f;
        }
    }
    joined
}
