// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Topology of extracted surfaces on synthetic and random fields

use anyhow::Result;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tomomesh::geometry::Volume;
use tomomesh::{analyze, marching_cubes, MarchingCubes};

/// Random field with a zero border, so every surface is closed
fn noise(dims: [usize; 3], seed: u64) -> Result<Volume<u8>> {
    let mut rng = StdRng::seed_from_u64(seed);
    Ok(Volume::from_fn(dims, |x, y, z| {
        let border = x == 0 || y == 0 || z == 0
            || x == dims[0] - 1
            || y == dims[1] - 1
            || z == dims[2] - 1;
        if border {
            0
        } else {
            rng.gen::<u8>()
        }
    })?)
}

#[test]
fn test_random_fields_are_watertight() -> Result<()> {
    for seed in 0..6 {
        let volume = noise([12, 10, 11], seed)?;
        for iso in [40.0, 127.0, 127.5, 200.0] {
            let mesh = marching_cubes(&volume, iso)?;
            mesh.validate_indices()?;

            let stats = analyze(&mesh);
            assert!(stats.is_watertight, "seed {} iso {}", seed, iso);
            assert_eq!(stats.non_manifold_edges, 0, "seed {} iso {}", seed, iso);
            assert_eq!(stats.inconsistent_edges, 0, "seed {} iso {}", seed, iso);
            assert!(stats.signed_volume > 0.0, "seed {} iso {}", seed, iso);
        }
    }
    Ok(())
}

#[test]
fn test_checkerboard_is_watertight() -> Result<()> {
    // Every interior face is ambiguous
    let volume = Volume::from_fn([8, 8, 8], |x, y, z| {
        let inside = (1..7).contains(&x) && (1..7).contains(&y) && (1..7).contains(&z);
        if inside && (x + y + z) % 2 == 0 {
            250u8
        } else {
            0
        }
    })?;

    for iso in [60.0, 127.0, 240.0] {
        let stats = analyze(&marching_cubes(&volume, iso)?);
        assert!(stats.is_watertight, "iso {}", iso);
        assert_eq!(stats.inconsistent_edges, 0, "iso {}", iso);
    }
    Ok(())
}

#[test]
fn test_torus_genus() -> Result<()> {
    let (major, minor) = (6.0f32, 2.2f32);
    let volume = Volume::from_fn([22, 22, 12], |x, y, z| {
        let (px, py, pz) = (x as f32 - 10.6, y as f32 - 10.4, z as f32 - 5.7);
        let ring = (px * px + py * py).sqrt() - major;
        minor - (ring * ring + pz * pz).sqrt()
    })?;

    let stats = analyze(&marching_cubes(&volume, 0.0)?);
    assert!(stats.is_watertight);
    assert_eq!(stats.genus(), Some(1));
    Ok(())
}

#[test]
fn test_u16_and_u8_fields_agree() -> Result<()> {
    let narrow = noise([9, 9, 9], 42)?;
    let wide = Volume::from_vec(
        narrow.dims(),
        narrow.as_slice().iter().map(|&v| u16::from(v)).collect(),
    )?;

    let extractor = MarchingCubes::new(90.0);
    assert_eq!(extractor.extract(&narrow)?, extractor.extract(&wide)?);
    Ok(())
}
