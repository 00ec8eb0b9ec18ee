// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Cell configurations and their triangulations.
//!
//! Instead of a hand-copied connectivity table, each of the 256 corner
//! configurations is triangulated by tracing the surface contour around the
//! six cube faces. On every face the contour segments separate the solid
//! corners (value >= iso) from the empty ones. A face with two diagonal solid
//! corners is ambiguous: the segments may either isolate each solid corner or
//! join them across the face. The precomputed table isolates them; cells with
//! an ambiguous face consult [`solids_joined`] and are re-traced with the
//! decided pairing. Both cells sharing a face evaluate the decider on the same
//! four samples, so neighbouring cells always agree and the surface stays
//! closed.
//!
//! Segments are oriented so that, looking at a face from outside the cube, the
//! solid corners lie to the right. Chaining them gives closed loops whose fan
//! triangulation has normals pointing from solid towards empty space. Fan
//! diagonals never run along a cube face, so the only edges two cells share
//! are the contour segments on their common face.

use std::sync::OnceLock;

/// Corner offsets `(dx, dy, dz)`
pub const CORNERS: [[usize; 3]; 8] = [
    [0, 0, 0],
    [1, 0, 0],
    [1, 1, 0],
    [0, 1, 0],
    [0, 0, 1],
    [1, 0, 1],
    [1, 1, 1],
    [0, 1, 1],
];

/// Cube edges as corner pairs
pub const EDGES: [[usize; 2]; 12] = [
    [0, 1],
    [1, 2],
    [2, 3],
    [3, 0],
    [4, 5],
    [5, 6],
    [6, 7],
    [7, 4],
    [0, 4],
    [1, 5],
    [2, 6],
    [3, 7],
];

/// Grid edge behind each cube edge: offset of its lower endpoint and its axis
pub const EDGE_ORIGINS: [([usize; 3], usize); 12] = [
    ([0, 0, 0], 0),
    ([1, 0, 0], 1),
    ([0, 1, 0], 0),
    ([0, 0, 0], 1),
    ([0, 0, 1], 0),
    ([1, 0, 1], 1),
    ([0, 1, 1], 0),
    ([0, 0, 1], 1),
    ([0, 0, 0], 2),
    ([1, 0, 0], 2),
    ([1, 1, 0], 2),
    ([0, 1, 0], 2),
];

/// Faces as corners counter-clockwise seen from outside, lowest grid corner first
pub const FACES: [[usize; 4]; 6] = [
    [0, 3, 2, 1], // z = 0
    [4, 5, 6, 7], // z = 1
    [0, 1, 5, 4], // y = 0
    [3, 7, 6, 2], // y = 1
    [0, 4, 7, 3], // x = 0
    [1, 2, 6, 5], // x = 1
];

/// Upper bound of triangles per cell: twelve crossed edges fanned around a centre
pub const MAX_TRIANGLES: usize = 12;

/// First vertex id that names an interior vertex instead of a cube edge
pub const CENTER: u8 = 12;

/// A contour fanned around its centre has at least five vertices
const MAX_CENTERS: usize = 2;

/// Triangles of one cell.
///
/// Vertex ids below [`CENTER`] are cube edges. Id `CENTER + k` is the
/// centroid of the `k`-th contour returned by [`CellCase::center_contour`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CellCase {
    len: u8,
    triangles: [[u8; 3]; MAX_TRIANGLES],
    centers: u8,
    center_lens: [u8; MAX_CENTERS],
    center_contours: [[u8; 12]; MAX_CENTERS],
}

impl CellCase {
    pub fn triangles(&self) -> &[[u8; 3]] {
        &self.triangles[..self.len as usize]
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Number of interior vertices this cell needs
    pub fn center_count(&self) -> usize {
        self.centers as usize
    }

    /// Cube edges whose crossings average to interior vertex `k`
    pub fn center_contour(&self, k: usize) -> &[u8] {
        &self.center_contours[k][..self.center_lens[k] as usize]
    }

    fn push(&mut self, triangle: [u8; 3]) {
        self.triangles[self.len as usize] = triangle;
        self.len += 1;
    }

    fn add_center(&mut self, contour: &[u8]) -> u8 {
        let k = self.centers as usize;
        self.center_contours[k][..contour.len()].copy_from_slice(contour);
        self.center_lens[k] = contour.len() as u8;
        self.centers += 1;
        CENTER + k as u8
    }

    /// Triangulate a closed contour without a diagonal along a cube face.
    ///
    /// A diagonal between two crossings of the same face could be produced
    /// by the neighbouring cell as well, leaving an edge with four triangles.
    /// The fan apex is the first contour vertex whose diagonals all cross the
    /// cell interior; without one, the contour is fanned around its centroid.
    fn fill(&mut self, contour: &[u8]) {
        let len = contour.len();
        let apex = (0..len).find(|&p| {
            (0..len).all(|j| {
                let gap = (j + len - p) % len;
                gap <= 1 || gap == len - 1 || !on_common_face(contour[p], contour[j])
            })
        });

        match apex {
            Some(p) => {
                for i in 1..len - 1 {
                    self.push([contour[p], contour[(p + i) % len], contour[(p + i + 1) % len]]);
                }
            }
            None => {
                debug_assert!((self.centers as usize) < MAX_CENTERS);
                let center = self.add_center(contour);
                for i in 0..len {
                    self.push([center, contour[i], contour[(i + 1) % len]]);
                }
            }
        }
    }
}

/// Default triangulations plus the ambiguous faces of every configuration
pub struct CaseTable {
    cases: [CellCase; 256],
    ambiguous: [u8; 256],
}

impl CaseTable {
    fn generate() -> Self {
        let mut cases = [CellCase::default(); 256];
        let mut ambiguous = [0u8; 256];
        for index in 0..256 {
            let cube_index = index as u8;
            cases[index] = triangulate(cube_index, 0);
            ambiguous[index] = ambiguous_faces(cube_index);
        }
        Self { cases, ambiguous }
    }

    /// Triangulation with every ambiguous face left separated
    pub fn case(&self, cube_index: u8) -> &CellCase {
        &self.cases[cube_index as usize]
    }

    /// Bit `f` set when face `f` of this configuration is ambiguous
    pub fn ambiguous(&self, cube_index: u8) -> u8 {
        self.ambiguous[cube_index as usize]
    }
}

/// The shared table, generated on first use
pub fn case_table() -> &'static CaseTable {
    static TABLE: OnceLock<CaseTable> = OnceLock::new();
    TABLE.get_or_init(CaseTable::generate)
}

#[inline]
fn is_solid(cube_index: u8, corner: usize) -> bool {
    cube_index & (1 << corner) == 0
}

fn edge_between(a: usize, b: usize) -> usize {
    EDGES
        .iter()
        .position(|&[p, q]| (p == a && q == b) || (p == b && q == a))
        .unwrap_or_else(|| unreachable!("corners {} and {} are not adjacent", a, b))
}

/// Both cube edges lie on the same face
fn on_common_face(a: u8, b: u8) -> bool {
    let [p, q] = EDGES[a as usize];
    let [r, t] = EDGES[b as usize];
    FACES
        .iter()
        .any(|face| [p, q, r, t].iter().all(|corner| face.contains(corner)))
}

/// Faces whose solid corners sit on one diagonal only
pub fn ambiguous_faces(cube_index: u8) -> u8 {
    let mut mask = 0;
    for (f, face) in FACES.iter().enumerate() {
        let s = face.map(|corner| is_solid(cube_index, corner));
        if s[0] == s[2] && s[1] == s[3] && s[0] != s[1] {
            mask |= 1 << f;
        }
    }
    mask
}

/// Asymptotic decider for an ambiguous face.
///
/// `values` are the face samples in [`FACES`] order. The bilinear interpolant
/// has a saddle at `(ac - bd) / (a + c - b - d)`; the solid corners connect
/// across the face when the saddle itself is solid. Diagonals are combined in
/// a fixed order so both cells sharing the face compute identical bits.
pub fn solids_joined(values: [f32; 4], iso_level: f32) -> bool {
    let [a, b, c, d] = values.map(f64::from);
    let denominator = (a + c) - (b + d);
    if denominator == 0.0 {
        return false;
    }
    let saddle = (a * c - b * d) / denominator;
    saddle >= f64::from(iso_level)
}

/// Trace the contour of a configuration.
///
/// Bit `k` of `cube_index` is set when corner `k` is below the iso-level.
/// Bit `f` of `joined_faces` joins the solid corners of ambiguous face `f`.
pub fn triangulate(cube_index: u8, joined_faces: u8) -> CellCase {
    // next[e]: edge the contour moves to after crossing edge e
    let mut next = [usize::MAX; 12];

    for (f, face) in FACES.iter().enumerate() {
        let mut crossings = [(0usize, false); 4];
        let mut n = 0;
        for i in 0..4 {
            let a = face[i];
            let b = face[(i + 1) % 4];
            let (solid_a, solid_b) = (is_solid(cube_index, a), is_solid(cube_index, b));
            if solid_a != solid_b {
                // (edge, entering the solid region when walking counter-clockwise)
                crossings[n] = (edge_between(a, b), solid_b);
                n += 1;
            }
        }

        let join = joined_faces & (1 << f) != 0;
        for i in 0..n {
            let (edge, entering) = crossings[i];
            if !entering {
                continue;
            }
            let partner = if join {
                crossings[(i + n - 1) % n].0
            } else {
                crossings[(i + 1) % n].0
            };
            next[edge] = partner;
        }
    }

    let mut case = CellCase::default();
    let mut visited = [false; 12];
    for start in 0..12 {
        if next[start] == usize::MAX || visited[start] {
            continue;
        }

        let mut contour = [0u8; 12];
        let mut len = 0;
        let mut edge = start;
        while !visited[edge] && len < 12 {
            visited[edge] = true;
            contour[len] = edge as u8;
            len += 1;
            edge = next[edge];
        }

        if len >= 3 {
            case.fill(&contour[..len]);
        }
    }
    case
}

#[cfg(test)]
mod tests {
    use super::*;

    fn crossed_edges(cube_index: u8) -> Vec<usize> {
        (0..12)
            .filter(|&e| {
                let [a, b] = EDGES[e];
                is_solid(cube_index, a) != is_solid(cube_index, b)
            })
            .collect()
    }

    #[test]
    fn test_uniform_cells_are_empty() {
        let table = case_table();
        assert!(table.case(0).is_empty());
        assert!(table.case(255).is_empty());
    }

    #[test]
    fn test_single_solid_corner() {
        // Only corner 0 solid
        let case = case_table().case(0b1111_1110);
        assert_eq!(case.triangles(), &[[0, 3, 8]]);
    }

    #[test]
    fn test_single_empty_corner_is_flipped() {
        // Only corner 0 empty: same edges, opposite winding
        let case = case_table().case(0b0000_0001);
        assert_eq!(case.triangles(), &[[0, 8, 3]]);
    }

    #[test]
    fn test_edge_origins_match_edges() {
        for (e, &[a, b]) in EDGES.iter().enumerate() {
            let (origin, axis) = EDGE_ORIGINS[e];
            let (pa, pb) = (CORNERS[a], CORNERS[b]);
            let low = if pa[axis] < pb[axis] { pa } else { pb };
            assert_eq!(low, origin, "edge {}", e);
            for k in 0..3 {
                if k != axis {
                    assert_eq!(pa[k], pb[k], "edge {} leaves axis {}", e, axis);
                }
            }
        }
    }

    #[test]
    fn test_faces_share_coordinate() {
        for face in FACES {
            let shared = (0..3)
                .filter(|&k| face.iter().all(|&c| CORNERS[c][k] == CORNERS[face[0]][k]))
                .count();
            assert_eq!(shared, 1);
            // Lowest grid corner leads, highest sits opposite
            let sum = |c: usize| CORNERS[c].iter().sum::<usize>();
            assert!(face.iter().all(|&c| sum(face[0]) <= sum(c)));
            assert!(face.iter().all(|&c| sum(face[2]) >= sum(c)));
        }
    }

    #[test]
    fn test_triangles_cover_exactly_the_crossed_edges() {
        for index in 0..=255u8 {
            let ambiguous = ambiguous_faces(index);
            // Every subset of the ambiguous faces
            let mut joined = ambiguous;
            loop {
                let case = triangulate(index, joined);
                let mut used: Vec<usize> = case
                    .triangles()
                    .iter()
                    .flat_map(|t| t.iter().filter(|&&e| e < CENTER).map(|&e| e as usize))
                    .collect();
                used.sort_unstable();
                used.dedup();
                assert_eq!(used, crossed_edges(index), "case {} joined {:06b}", index, joined);

                if joined == 0 {
                    break;
                }
                joined = (joined - 1) & ambiguous;
            }
        }
    }

    #[test]
    fn test_complement_flips_winding() {
        for index in 0..=255u8 {
            if ambiguous_faces(index) != 0 {
                continue;
            }
            let case = triangulate(index, 0);
            let flipped = triangulate(!index, 0);
            assert_eq!(case.triangles().len(), flipped.triangles().len());
            for &[a, b, c] in case.triangles() {
                assert!(
                    flipped.triangles().contains(&[a, c, b]),
                    "case {} triangle {:?}",
                    index,
                    [a, b, c]
                );
            }
        }
    }

    #[test]
    fn test_ambiguous_faces() {
        // Corners 0 and 2 solid on face z = 0, everything else empty
        let index = !0b0000_0101u8;
        assert_eq!(ambiguous_faces(index), 0b0000_0001);
        assert_eq!(ambiguous_faces(0), 0);
        assert_eq!(ambiguous_faces(0b1111_1110), 0);
    }

    #[test]
    fn test_join_changes_topology() {
        let index = !0b0000_0101u8;
        let separated = triangulate(index, 0);
        let joined = triangulate(index, 0b1);
        // Two corner triangles versus one band across the face
        assert_eq!(separated.triangles().len(), 2);
        assert_eq!(joined.triangles().len(), 4);
    }

    #[test]
    fn test_no_diagonal_along_a_face() {
        for index in 0..=255u8 {
            let ambiguous = ambiguous_faces(index);
            let mut joined = ambiguous;
            loop {
                let case = triangulate(index, joined);
                for a in 0..CENTER {
                    for b in a + 1..CENTER {
                        if !on_common_face(a, b) {
                            continue;
                        }
                        let uses = case
                            .triangles()
                            .iter()
                            .filter(|t| t.contains(&a) && t.contains(&b))
                            .count();
                        assert!(uses <= 1, "case {} joined {:06b} edge {}-{}", index, joined, a, b);
                    }
                }
                for k in 0..case.center_count() {
                    assert!(case.center_contour(k).len() >= 5);
                }

                if joined == 0 {
                    break;
                }
                joined = (joined - 1) & ambiguous;
            }
        }
    }

    #[test]
    fn test_asymptotic_decider() {
        // Strong solid diagonal: saddle above iso
        assert!(solids_joined([200.0, 100.0, 200.0, 100.0], 127.0));
        // Weak solid diagonal: saddle below iso
        assert!(!solids_joined([130.0, 0.0, 130.0, 0.0], 127.0));
        // Independent of which diagonal holds the solid corners
        assert_eq!(
            solids_joined([10.0, 150.0, 20.0, 160.0], 127.0),
            solids_joined([150.0, 20.0, 160.0, 10.0], 127.0)
        );
    }
}
