// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
//! Geometry records and their resolved form.

use crate::draw_list::IndexWidth;
use crate::error::ResourceError;
use std::num::NonZeroU32;

/// Sizes used to convert byte offsets into element offsets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VertexLayoutSizes {
    /// Stride of the position stream.
    pub vertex_size: NonZeroU32,
    /// Stride of the attribute stream.
    pub attribute_size: NonZeroU32,
    /// Size of one primitive-group descriptor.
    pub group_descriptor_size: NonZeroU32,
}

impl VertexLayoutSizes {
    /// Returns `None` if any size is zero.
    pub fn new(vertex_size: u32, attribute_size: u32, group_descriptor_size: u32) -> Option<Self> {
        Some(VertexLayoutSizes {
            vertex_size: NonZeroU32::new(vertex_size)?,
            attribute_size: NonZeroU32::new(attribute_size)?,
            group_descriptor_size: NonZeroU32::new(group_descriptor_size)?,
        })
    }
}

/**
Where one geometry's data lives inside its chunk.

All offsets are in bytes. The vertex and attribute streams must start at the same vertex
slot (`vertex_offset / vertex_size == attribute_offset / attribute_size`); the allocator that
fills chunks is expected to guarantee this.
*/
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GeometryRecord {
    pub chunk_index: u32,
    pub vertex_offset: u32,
    pub attribute_offset: u32,
    pub group_descriptor_offset: u32,
    pub primitive_offset: u32,
    pub index_offset: u32,
}

impl GeometryRecord {
    pub(crate) fn offsets(
        &self,
        geometry_index: u32,
        layout: &VertexLayoutSizes,
        index_width: IndexWidth,
    ) -> Result<GeometryOffsets, ResourceError> {
        let vertex_slot = self.vertex_offset / layout.vertex_size.get();
        let attribute_slot = self.attribute_offset / layout.attribute_size.get();
        if vertex_slot != attribute_slot {
            return Err(ResourceError::InconsistentGeometryLayout {
                geometry: geometry_index,
                vertex_slot,
                attribute_slot,
            });
        }
        Ok(GeometryOffsets {
            group_descriptor: self.group_descriptor_offset / layout.group_descriptor_size.get(),
            primitive: self.primitive_offset,
            index: self.index_offset / index_width.byte_size(),
            vertex: vertex_slot,
        })
    }
}

/**
The element offsets a draw reads its geometry through.

These four values derive from one chunk and are always written together as a single
uniform update; a partially updated set would point different streams at different geometry.
*/
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GeometryOffsets {
    /// First primitive-group descriptor.
    pub group_descriptor: u32,
    /// Byte offset of the primitive data.
    pub primitive: u32,
    /// First index, in units of the index width.
    pub index: u32,
    /// First vertex, shared by the vertex and attribute streams.
    pub vertex: u32,
}

impl GeometryOffsets {
    pub const fn as_uniform(&self) -> [u32; 4] {
        [self.group_descriptor, self.primitive, self.index, self.vertex]
    }
}

/// Identity of a chunk binding record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ChunkKey {
    pub chunk_index: u32,
    pub index_width: IndexWidth,
}

/// A geometry resolved for one index width.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GeometryDescriptor {
    pub key: ChunkKey,
    /// The chunk's binding record.
    pub chunk: super::Location,
    pub offsets: GeometryOffsets,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mismatched_streams_are_rejected() {
        let layout = VertexLayoutSizes::new(16, 8, 16).unwrap();
        let record = GeometryRecord {
            chunk_index: 0,
            vertex_offset: 32,
            attribute_offset: 24,
            group_descriptor_offset: 0,
            primitive_offset: 0,
            index_offset: 0,
        };
        assert_eq!(
            record.offsets(5, &layout, IndexWidth::U32),
            Err(ResourceError::InconsistentGeometryLayout {
                geometry: 5,
                vertex_slot: 2,
                attribute_slot: 3
            })
        );
    }

    #[test]
    fn zero_sizes_are_rejected() {
        assert!(VertexLayoutSizes::new(0, 8, 16).is_none());
        assert!(VertexLayoutSizes::new(16, 8, 0).is_none());
    }
}
