// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Wavefront OBJ text export and import.
//!
//! Output layout: one `#` header line, `v x y z` lines with two decimals, then
//! `f i j k` lines with 1-based indices. No normals, texture coordinates or
//! materials.

use crate::error::{ReconError, ReconResult};
use crate::geometry::{Mesh, Triangle, Vertex};
use crate::progress::{ProgressSink, Stage};
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;
use tracing::info;

/// Header comment written when none is given
pub const DEFAULT_HEADER: &str = "obj file exported from tomomesh marching cubes";

/// Number of progress ticks for a full export
const PROGRESS_TICKS: u64 = 100;

/// Emits one export tick per 1% of written lines
struct Ticker<'a> {
    progress: &'a dyn ProgressSink,
    step: usize,
    written: usize,
    emitted: u64,
}

impl<'a> Ticker<'a> {
    fn start(progress: &'a dyn ProgressSink, total: usize) -> Self {
        let step = total / PROGRESS_TICKS as usize;
        // Fewer lines than ticks: a single completion event
        progress.start(Stage::Export, if step == 0 { 1 } else { PROGRESS_TICKS });
        Self {
            progress,
            step,
            written: 0,
            emitted: 0,
        }
    }

    #[inline]
    fn tick(&mut self) {
        self.written += 1;
        if self.step != 0 && self.written % self.step == 0 && self.emitted < PROGRESS_TICKS {
            self.progress.advance(1);
            self.emitted += 1;
        }
    }

    fn finish(self) {
        let total = if self.step == 0 { 1 } else { PROGRESS_TICKS };
        if self.emitted < total {
            self.progress.advance(total - self.emitted);
        }
        self.progress.finish();
    }
}

/// Stream `mesh` as OBJ text, preserving vertex and triangle order
pub fn write_obj<W: Write>(
    mesh: &Mesh,
    mut out: W,
    header: &str,
    progress: &dyn ProgressSink,
) -> std::io::Result<()> {
    let header = header.replace(['\r', '\n'], " ");
    writeln!(out, "# {}", header)?;

    let mut ticker = Ticker::start(progress, mesh.vertex_count() + mesh.triangle_count());

    for vertex in &mesh.vertices {
        let p = vertex.position;
        writeln!(out, "v {:.2} {:.2} {:.2}", p.x, p.y, p.z)?;
        ticker.tick();
    }

    for triangle in &mesh.triangles {
        let [a, b, c] = triangle.indices;
        writeln!(out, "f {} {} {}", a + 1, b + 1, c + 1)?;
        ticker.tick();
    }

    out.flush()?;
    ticker.finish();
    Ok(())
}

/// Write `mesh` to an OBJ file
pub fn export_obj(mesh: &Mesh, path: impl AsRef<Path>, progress: &dyn ProgressSink) -> ReconResult<()> {
    let path = path.as_ref();
    info!(path = %path.display(), "exporting mesh");
    let file = File::create(path).map_err(|e| ReconError::io(path, e))?;
    write_obj(mesh, BufWriter::new(file), DEFAULT_HEADER, progress)
        .map_err(|e| ReconError::io(path, e))
}

/// Parse OBJ text into a mesh.
///
/// Reads `v` and `f` records; polygon faces are fan-triangulated and
/// `index/uv/normal` tokens keep only the vertex index. Other records are
/// ignored.
pub fn read_obj<R: BufRead>(reader: R) -> ReconResult<Mesh> {
    let mut mesh = Mesh::new();
    let mut faces: Vec<(usize, Vec<usize>)> = Vec::new();

    for (number, line) in reader.lines().enumerate() {
        let number = number + 1;
        let line = line.map_err(|e| ReconError::io("<obj stream>", e))?;
        let mut tokens = line.split_whitespace();

        match tokens.next() {
            Some("v") => {
                let mut coords = [0.0f32; 3];
                for coord in coords.iter_mut() {
                    *coord = tokens
                        .next()
                        .and_then(|t| t.parse().ok())
                        .ok_or_else(|| parse_error(number, "vertex needs three coordinates"))?;
                }
                mesh.add_vertex(Vertex::new(coords[0], coords[1], coords[2]));
            }
            Some("f") => {
                let indices = tokens
                    .map(|token| parse_face_index(token, number))
                    .collect::<ReconResult<Vec<_>>>()?;
                if indices.len() < 3 {
                    return Err(parse_error(number, "face needs at least three vertices"));
                }
                faces.push((number, indices));
            }
            _ => {}
        }
    }

    for (number, indices) in faces {
        for i in 1..indices.len() - 1 {
            mesh.add_triangle(Triangle::new([indices[0], indices[i], indices[i + 1]]));
        }
        if let Some(&bad) = indices.iter().find(|&&i| i >= mesh.vertex_count()) {
            return Err(parse_error(
                number,
                &format!("vertex {} does not exist", bad + 1),
            ));
        }
    }

    Ok(mesh)
}

/// Read an OBJ file
pub fn import_obj(path: impl AsRef<Path>) -> ReconResult<Mesh> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|e| ReconError::io(path, e))?;
    read_obj(BufReader::new(file)).map_err(|e| match e {
        ReconError::Io { source, .. } => ReconError::io(path, source),
        ReconError::InvalidInput(message) => {
            ReconError::InvalidInput(format!("{}: {}", path.display(), message))
        }
        other => other,
    })
}

fn parse_face_index(token: &str, line: usize) -> ReconResult<usize> {
    let index = token.split('/').next().unwrap_or(token);
    match index.parse::<usize>() {
        Ok(i) if i > 0 => Ok(i - 1),
        _ => Err(parse_error(line, &format!("invalid face index '{}'", token))),
    }
}

fn parse_error(line: usize, message: &str) -> ReconError {
    ReconError::InvalidInput(format!("line {}: {}", line, message))
}
