// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
//! Binding slots and uniform locations the dispatcher writes to.

use std::fmt::Display;

/**
A resource slot consulted by draws.

Each slot holds one buffer range at a time; binding a new range supersedes the previous one.
*/
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Slot {
    /// The frame-global view block.
    SceneView,
    /// The current object's transform record.
    Object,
    /// The current geometry binding record.
    Geometry,
    /// The frame-global statistics buffer the programs write into.
    SceneStats,
}

impl Slot {
    /// Every slot, in binding order.
    pub const ALL: [Slot; 4] = [Slot::SceneView, Slot::Object, Slot::Geometry, Slot::SceneStats];

    /// The uniform slots, in binding order. Only these can be bound by device address.
    pub const UNIFORM: [Slot; 3] = [Slot::SceneView, Slot::Object, Slot::Geometry];

    /// Whether the slot is a uniform slot, as opposed to a storage slot.
    pub const fn is_uniform(self) -> bool {
        !matches!(self, Slot::SceneStats)
    }

    /// Binding number the programs declare for this slot.
    pub const fn binding(self) -> u32 {
        match self {
            Slot::SceneView => 0,
            Slot::Object => 1,
            Slot::Geometry => 2,
            Slot::SceneStats => 3,
        }
    }
}

impl Display for Slot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Slot::SceneView => write!(f, "scene view slot"),
            Slot::Object => write!(f, "object slot"),
            Slot::Geometry => write!(f, "geometry slot"),
            Slot::SceneStats => write!(f, "scene stats slot"),
        }
    }
}

/// A 4 x u32 uniform written directly, without a buffer binding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UniformLocation {
    /// `[group descriptor, primitive, index, vertex]` offsets of the current geometry.
    GeometryOffsets,
    /// `[first group, last group, 0, 0]` for the task stage.
    TaskRange,
}

impl UniformLocation {
    pub const fn location(self) -> u32 {
        match self {
            UniformLocation::GeometryOffsets => 0,
            UniformLocation::TaskRange => 1,
        }
    }

    /// Byte offset of this uniform in a packed push-constant block.
    pub const fn byte_offset(self) -> u32 {
        self.location() * 16
    }
}
