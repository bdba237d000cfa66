// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
//! Draw items and the per-frame draw list.
//!
//! A [`DrawItem`] is one mesh-shader style draw. It references shared resources by index
//! (a geometry and a transform) and covers a contiguous range of primitive groups.
//! Draw items are produced once per frame by whatever culls and sorts the scene; the
//! dispatcher only ever reads them.
//!
//! # Example
//!
//! ```
//! use meshlet_dispatch::draw_list::{DrawItem, DrawList, IndexWidth, PrimitiveGroupRange};
//!
//! let mut list = DrawList::new();
//! list.push(DrawItem::new(0, 0, PrimitiveGroupRange::new(0, 4).unwrap()));
//! list.push(
//!     DrawItem::new(1, 0, PrimitiveGroupRange::new(4, 64).unwrap())
//!         .with_task_stage(true)
//!         .with_index_width(IndexWidth::U16),
//! );
//! assert_eq!(list.len(), 2);
//! ```

use std::fmt::Display;
use std::num::NonZeroU32;
use std::ops::Deref;

/// Which program the draw runs through.
///
/// The task variant runs an extra stage ahead of the mesh stage that partitions and culls
/// primitive groups itself, so it is launched differently (see [`DrawItem::launch`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProgramVariant {
    /// Mesh stage only.
    Mesh,
    /// Task stage followed by the mesh stage.
    MeshTask,
}

impl ProgramVariant {
    pub const fn uses_task_stage(self) -> bool {
        matches!(self, ProgramVariant::MeshTask)
    }
}

impl Display for ProgramVariant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProgramVariant::Mesh => write!(f, "mesh"),
            ProgramVariant::MeshTask => write!(f, "mesh+task"),
        }
    }
}

/// Width of the indices a geometry was built with.
///
/// Narrow and wide variants of one chunk live in different physical sub-ranges, so the
/// width is part of the geometry's binding identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum IndexWidth {
    U16,
    #[default]
    U32,
}

impl IndexWidth {
    /// Size of one index, in bytes.
    pub const fn byte_size(self) -> u32 {
        match self {
            IndexWidth::U16 => 2,
            IndexWidth::U32 => 4,
        }
    }

    pub const fn is_narrow(self) -> bool {
        matches!(self, IndexWidth::U16)
    }
}

/// A contiguous, non-empty range of primitive-group descriptors.
///
/// The last group of the range is always addressable as a `u32`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PrimitiveGroupRange {
    offset: u32,
    count: NonZeroU32,
}

impl PrimitiveGroupRange {
    /// Returns `None` for an empty range, or one whose last group lies past `u32::MAX`.
    pub fn new(offset: u32, count: u32) -> Option<Self> {
        let count = NonZeroU32::new(count)?;
        offset.checked_add(count.get() - 1)?;
        Some(PrimitiveGroupRange { offset, count })
    }

    pub const fn offset(&self) -> u32 {
        self.offset
    }

    pub const fn count(&self) -> NonZeroU32 {
        self.count
    }

    /// Index of the last group in the range.
    ///
    /// The task stage consumes the range as `[first, last]` rather than `(offset, count)`.
    pub const fn last_inclusive(&self) -> u32 {
        self.offset + (self.count.get() - 1)
    }
}

/// How a draw item is launched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Launch {
    /// First work group, relative to whatever payload the program reads.
    pub first: u32,
    pub count: u32,
}

/// One draw in the render list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DrawItem {
    /// Index into the geometry table.
    pub geometry_index: u32,
    /// Index into the per-object transform table.
    pub matrix_index: u32,
    pub uses_task_stage: bool,
    pub index_width: IndexWidth,
    pub primitive_groups: PrimitiveGroupRange,
}

impl DrawItem {
    /// A mesh-only draw with 32-bit indices.
    pub fn new(
        geometry_index: u32,
        matrix_index: u32,
        primitive_groups: PrimitiveGroupRange,
    ) -> Self {
        DrawItem {
            geometry_index,
            matrix_index,
            uses_task_stage: false,
            index_width: IndexWidth::U32,
            primitive_groups,
        }
    }

    pub fn with_task_stage(mut self, uses_task_stage: bool) -> Self {
        self.uses_task_stage = uses_task_stage;
        self
    }

    pub fn with_index_width(mut self, index_width: IndexWidth) -> Self {
        self.index_width = index_width;
        self
    }

    pub const fn program_variant(&self) -> ProgramVariant {
        if self.uses_task_stage {
            ProgramVariant::MeshTask
        } else {
            ProgramVariant::Mesh
        }
    }

    /**
    Computes the launch for this item.

    Mesh-only draws launch one work group per primitive group, starting at the range offset.

    Task draws launch `ceil(count / workgroup_width)` groups starting at zero; each task
    group re-derives absolute indices from the range payload bound just before the draw.
    */
    pub fn launch(&self, workgroup_width: NonZeroU32) -> Launch {
        let count = self.primitive_groups.count().get();
        if self.uses_task_stage {
            Launch {
                first: 0,
                count: count.div_ceil(workgroup_width.get()),
            }
        } else {
            Launch {
                first: self.primitive_groups.offset(),
                count,
            }
        }
    }
}

/**
An ordered, per-frame list of draw items.

This is a thin wrapper over `Vec<DrawItem>`; it derefs to a slice so it can be passed
anywhere a `&[DrawItem]` is expected.
*/
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DrawList {
    items: Vec<DrawItem>,
}

impl DrawList {
    pub fn new() -> Self {
        DrawList { items: Vec::new() }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        DrawList {
            items: Vec::with_capacity(capacity),
        }
    }

    pub fn push(&mut self, item: DrawItem) {
        self.items.push(item);
    }

    /// Empties the list while keeping its allocation for the next frame.
    pub fn clear(&mut self) {
        self.items.clear();
    }

    pub fn as_slice(&self) -> &[DrawItem] {
        &self.items
    }
}

impl Deref for DrawList {
    type Target = [DrawItem];
    fn deref(&self) -> &Self::Target {
        &self.items
    }
}

impl From<Vec<DrawItem>> for DrawList {
    fn from(items: Vec<DrawItem>) -> Self {
        DrawList { items }
    }
}

impl FromIterator<DrawItem> for DrawList {
    fn from_iter<I: IntoIterator<Item = DrawItem>>(iter: I) -> Self {
        DrawList {
            items: iter.into_iter().collect(),
        }
    }
}

impl Extend<DrawItem> for DrawList {
    fn extend<I: IntoIterator<Item = DrawItem>>(&mut self, iter: I) {
        self.items.extend(iter);
    }
}
