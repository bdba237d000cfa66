// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
//! The per-object transform table.

use super::{BufferRef, Location};
use crate::bittricks::align_up;
use crate::error::{ResourceError, ResourceKind};

/**
Transform records stored at a fixed, aligned stride.

Uniform-range bindings must start at a device-specific alignment, so records are spaced at
`record_size` rounded up to that alignment while each binding still covers one record.
*/
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransformTable {
    pub buffer: BufferRef,
    pub aligned_stride: u64,
    pub record_size: u64,
    pub count: u32,
}

impl TransformTable {
    /// `offset_alignment` is the device's minimum uniform offset alignment.
    pub fn new(buffer: BufferRef, record_size: u64, offset_alignment: u64, count: u32) -> Self {
        TransformTable {
            buffer,
            aligned_stride: align_up(record_size, offset_alignment),
            record_size,
            count,
        }
    }

    pub fn locate(&self, matrix_index: u32) -> Result<Location, ResourceError> {
        if matrix_index >= self.count {
            return Err(ResourceError::OutOfRange {
                kind: ResourceKind::Transform,
                index: matrix_index,
                len: self.count,
            });
        }
        Ok(Location::new(
            self.buffer,
            self.aligned_stride * matrix_index as u64,
            self.record_size,
        ))
    }
}
