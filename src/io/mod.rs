// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! I/O module - slice loading and mesh export

mod obj;
mod slices;

pub use obj::{export_obj, import_obj, read_obj, write_obj, DEFAULT_HEADER};
pub use slices::{
    decode_slice, order_by_index, scaled_dimensions, select_range, sort_key, Slice, SliceSource,
};
