// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
/*!
The per-frame resource-table snapshot and the locator over it.

Draw items reference resources by logical index. [`ResourceTables`] maps those indices to
physical [`Location`]s: a buffer, a byte offset into it and a size. Every buffer is described
by a [`BufferRef`] carrying both the handle used by table-style binding and the raw device
address used by direct addressing, so the same snapshot serves either binding mode.

Resolution is pure. An index beyond what was uploaded for the frame is an upstream bug and
resolves to [`ResourceError::OutOfRange`].

# Example

```
use meshlet_dispatch::resources::*;
use meshlet_dispatch::draw_list::IndexWidth;

let buffer = BufferRef::new(BufferHandle(1), DeviceAddress(0x1000));
let mut tables = ResourceTables::new(
    VertexLayoutSizes::new(16, 8, 16).unwrap(),
    TableLayout::new(buffer, 64, 64),
    TransformTable::new(BufferRef::new(BufferHandle(2), DeviceAddress(0x8000)), 128, 256, 4),
    Location::new(BufferRef::new(BufferHandle(3), DeviceAddress(0x9000)), 0, 256),
);
let geometry = tables.push_geometry(GeometryRecord {
    chunk_index: 0,
    vertex_offset: 32,
    attribute_offset: 16,
    group_descriptor_offset: 64,
    primitive_offset: 12,
    index_offset: 8,
}).unwrap();
let descriptor = tables.locate_geometry(geometry, IndexWidth::U16).unwrap();
assert_eq!(descriptor.offsets.as_uniform(), [4, 12, 4, 2]);
assert_eq!(tables.locate_transform(3).unwrap().offset, 768);
```
*/

mod geometry;
mod transform;

pub use geometry::{
    ChunkKey, GeometryDescriptor, GeometryOffsets, GeometryRecord, VertexLayoutSizes,
};
pub use transform::TransformTable;

use crate::draw_list::IndexWidth;
use crate::error::{ResourceError, ResourceKind};
use std::fmt::Display;

/// Handle of a buffer for table-style binding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BufferHandle(pub u32);

/// Raw GPU virtual address of a buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DeviceAddress(pub u64);

impl DeviceAddress {
    /// The empty address, used to clear an address slot.
    pub const NULL: DeviceAddress = DeviceAddress(0);

    pub const fn offset(self, bytes: u64) -> DeviceAddress {
        DeviceAddress(self.0 + bytes)
    }
}

impl Display for DeviceAddress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:#x}", self.0)
    }
}

/// A GPU-resident buffer, as seen by both binding modes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BufferRef {
    pub handle: BufferHandle,
    pub address: DeviceAddress,
}

impl BufferRef {
    pub const fn new(handle: BufferHandle, address: DeviceAddress) -> Self {
        BufferRef { handle, address }
    }
}

/// A byte range within a buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Location {
    pub buffer: BufferRef,
    pub offset: u64,
    pub size: u64,
}

impl Location {
    pub const fn new(buffer: BufferRef, offset: u64, size: u64) -> Self {
        Location { buffer, offset, size }
    }

    /// Device address of the first byte of the range.
    pub const fn address(&self) -> DeviceAddress {
        self.buffer.address.offset(self.offset)
    }
}

/// A table of fixed-size records laid out at a fixed stride in one buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableLayout {
    pub buffer: BufferRef,
    pub stride: u64,
    pub record_size: u64,
}

impl TableLayout {
    pub const fn new(buffer: BufferRef, stride: u64, record_size: u64) -> Self {
        TableLayout {
            buffer,
            stride,
            record_size,
        }
    }

    pub const fn record(&self, index: u64) -> Location {
        Location::new(self.buffer, self.stride * index, self.record_size)
    }
}

/**
Physical locations of everything a frame's draw list may reference.

The snapshot is built by the caller after uploading the frame's resources and is read-only
while a draw list is traversed.
*/
#[derive(Debug, Clone)]
pub struct ResourceTables {
    layout: VertexLayoutSizes,
    geometries: Vec<GeometryRecord>,
    chunk_count: u32,
    geometry_table: TableLayout,
    transforms: TransformTable,
    scene_view: Location,
    scene_stats: Option<Location>,
}

impl ResourceTables {
    /**
    Creates an empty snapshot.

    # Parameters
    * `layout` - element sizes used to turn byte offsets into element offsets
    * `geometry_table` - the table of geometry binding records. Depending on
      [`crate::config::GeometryViews`] it holds one record per chunk and index width,
      or one record per geometry.
    * `transforms` - the per-object transform table
    * `scene_view` - the frame-global view block, bound once per traversal
    */
    pub fn new(
        layout: VertexLayoutSizes,
        geometry_table: TableLayout,
        transforms: TransformTable,
        scene_view: Location,
    ) -> Self {
        ResourceTables {
            layout,
            geometries: Vec::new(),
            chunk_count: 0,
            geometry_table,
            transforms,
            scene_view,
            scene_stats: None,
        }
    }

    /// Adds the frame-global statistics buffer. It is bound for the whole traversal and
    /// unbound with the other slots at the end.
    pub fn with_scene_stats(mut self, scene_stats: Location) -> Self {
        self.scene_stats = Some(scene_stats);
        self
    }

    /// Adds a geometry and returns its index.
    ///
    /// Returns `None`, leaving the snapshot unchanged, if the geometry could not be addressed:
    /// the snapshot already holds `u32::MAX` geometries, or `record.chunk_index` is `u32::MAX`.
    pub fn push_geometry(&mut self, record: GeometryRecord) -> Option<u32> {
        let index = u32::try_from(self.geometries.len()).ok().filter(|&i| i < u32::MAX)?;
        let chunk_end = record.chunk_index.checked_add(1)?;
        self.chunk_count = self.chunk_count.max(chunk_end);
        self.geometries.push(record);
        Some(index)
    }

    /// Declares chunks that no geometry references yet.
    pub fn reserve_chunks(&mut self, chunk_count: u32) {
        self.chunk_count = self.chunk_count.max(chunk_count);
    }

    pub fn geometry_count(&self) -> u32 {
        //push_geometry keeps the length below u32::MAX
        u32::try_from(self.geometries.len()).unwrap_or(u32::MAX)
    }

    pub fn chunk_count(&self) -> u32 {
        self.chunk_count
    }

    pub fn layout(&self) -> &VertexLayoutSizes {
        &self.layout
    }

    pub fn transforms(&self) -> &TransformTable {
        &self.transforms
    }

    pub fn scene_view(&self) -> Location {
        self.scene_view
    }

    pub fn scene_stats(&self) -> Option<Location> {
        self.scene_stats
    }

    fn geometry_record(&self, geometry_index: u32) -> Result<&GeometryRecord, ResourceError> {
        self.geometries
            .get(geometry_index as usize)
            .ok_or(ResourceError::OutOfRange {
                kind: ResourceKind::Geometry,
                index: geometry_index,
                len: self.geometry_count(),
            })
    }

    /// Locates the binding record of a chunk for one index width.
    ///
    /// Narrow and wide records of a chunk are adjacent: record `chunk * 2 + narrow`.
    pub fn locate_chunk(
        &self,
        chunk_index: u32,
        index_width: IndexWidth,
    ) -> Result<Location, ResourceError> {
        if chunk_index >= self.chunk_count {
            return Err(ResourceError::OutOfRange {
                kind: ResourceKind::Chunk,
                index: chunk_index,
                len: self.chunk_count,
            });
        }
        let record = chunk_index as u64 * 2 + u64::from(index_width.is_narrow());
        Ok(self.geometry_table.record(record))
    }

    /// Locates the per-geometry binding record of a geometry.
    pub fn locate_geometry_view(&self, geometry_index: u32) -> Result<Location, ResourceError> {
        self.geometry_record(geometry_index)?;
        Ok(self.geometry_table.record(geometry_index as u64))
    }

    /**
    Resolves a geometry to its chunk binding and element offsets.

    Fails with [`ResourceError::InconsistentGeometryLayout`] if the geometry's vertex and
    attribute data do not start at the same vertex slot; the offsets update carries only one
    vertex offset for both.
    */
    pub fn locate_geometry(
        &self,
        geometry_index: u32,
        index_width: IndexWidth,
    ) -> Result<GeometryDescriptor, ResourceError> {
        let record = self.geometry_record(geometry_index)?;
        let offsets = record.offsets(geometry_index, &self.layout, index_width)?;
        let chunk = self.locate_chunk(record.chunk_index, index_width)?;
        Ok(GeometryDescriptor {
            key: ChunkKey {
                chunk_index: record.chunk_index,
                index_width,
            },
            chunk,
            offsets,
        })
    }

    /// Locates the transform record for `matrix_index`.
    pub fn locate_transform(&self, matrix_index: u32) -> Result<Location, ResourceError> {
        self.transforms.locate(matrix_index)
    }
}
