// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Mesh statistics and topology checks

use super::{BoundingBox, Mesh};
use ahash::AHashMap;
use serde::{Deserialize, Serialize};

/// Geometry and topology statistics of a mesh
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MeshStats {
    pub vertex_count: usize,
    pub triangle_count: usize,
    /// Distinct undirected edges
    pub edge_count: usize,
    /// Edges used by exactly one triangle
    pub boundary_edges: usize,
    /// Edges used by more than two triangles
    pub non_manifold_edges: usize,
    /// Directed edges used twice in the same direction (inconsistent winding)
    pub inconsistent_edges: usize,
    /// V - E + F
    pub euler_characteristic: i64,
    /// Signed enclosed volume; positive for outward-facing winding
    pub signed_volume: f64,
    pub surface_area: f64,
    pub bbox: BoundingBox,
    pub is_watertight: bool,
}

impl MeshStats {
    /// Number of handles of a closed orientable surface, if the mesh is one connected piece
    pub fn genus(&self) -> Option<i64> {
        if !self.is_watertight || (2 - self.euler_characteristic) % 2 != 0 {
            return None;
        }
        Some((2 - self.euler_characteristic) / 2)
    }
}

/// Analyze mesh geometry and compute statistics
pub fn analyze(mesh: &Mesh) -> MeshStats {
    let mut undirected: AHashMap<(usize, usize), usize> = AHashMap::new();
    let mut directed: AHashMap<(usize, usize), usize> = AHashMap::new();

    for triangle in &mesh.triangles {
        let indices = triangle.indices;
        for i in 0..3 {
            let a = indices[i];
            let b = indices[(i + 1) % 3];
            let edge = if a < b { (a, b) } else { (b, a) };
            *undirected.entry(edge).or_insert(0) += 1;
            *directed.entry((a, b)).or_insert(0) += 1;
        }
    }

    let boundary_edges = undirected.values().filter(|&&n| n == 1).count();
    let non_manifold_edges = undirected.values().filter(|&&n| n > 2).count();
    let inconsistent_edges = directed.values().filter(|&&n| n > 1).count();
    let edge_count = undirected.len();

    let (signed_volume, surface_area) = volume_and_area(mesh);

    MeshStats {
        vertex_count: mesh.vertex_count(),
        triangle_count: mesh.triangle_count(),
        edge_count,
        boundary_edges,
        non_manifold_edges,
        inconsistent_edges,
        euler_characteristic: mesh.vertex_count() as i64 - edge_count as i64
            + mesh.triangle_count() as i64,
        signed_volume,
        surface_area,
        bbox: mesh.bounding_box(),
        is_watertight: !mesh.triangles.is_empty()
            && boundary_edges == 0
            && non_manifold_edges == 0,
    }
}

fn volume_and_area(mesh: &Mesh) -> (f64, f64) {
    let mut volume = 0.0;
    let mut area = 0.0;

    for triangle in &mesh.triangles {
        let [i0, i1, i2] = triangle.indices;
        let (Some(v0), Some(v1), Some(v2)) = (
            mesh.vertices.get(i0),
            mesh.vertices.get(i1),
            mesh.vertices.get(i2),
        ) else {
            continue;
        };
        let p0 = v0.position.coords.cast::<f64>();
        let p1 = v1.position.coords.cast::<f64>();
        let p2 = v2.position.coords.cast::<f64>();

        // Signed volume of tetrahedron formed by triangle and origin
        volume += p0.dot(&p1.cross(&p2)) / 6.0;
        area += (p1 - p0).cross(&(p2 - p0)).norm() / 2.0;
    }

    (volume, area)
}
