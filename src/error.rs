// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
//! Error types.
//!
//! Every error aborts the current traversal only. Nothing in this crate retries; the caller
//! decides whether to skip the frame or give up.

use crate::bindings::BindingMode;
use crate::bindings::slot::Slot;
use std::fmt::Display;

/// The resource table an index was resolved against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    Geometry,
    Chunk,
    Transform,
}

impl Display for ResourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ResourceKind::Geometry => write!(f, "geometry"),
            ResourceKind::Chunk => write!(f, "chunk"),
            ResourceKind::Transform => write!(f, "transform"),
        }
    }
}

/// Failure to resolve a logical resource index.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ResourceError {
    /// The index is beyond the table built for this frame.
    OutOfRange { kind: ResourceKind, index: u32, len: u32 },
    /// The geometry's vertex and attribute streams start at different vertex slots.
    InconsistentGeometryLayout {
        geometry: u32,
        vertex_slot: u32,
        attribute_slot: u32,
    },
}

impl Display for ResourceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ResourceError::OutOfRange { kind, index, len } => {
                write!(f, "{kind} index {index} out of range (table has {len})")
            }
            ResourceError::InconsistentGeometryLayout {
                geometry,
                vertex_slot,
                attribute_slot,
            } => write!(
                f,
                "geometry {geometry} starts at vertex slot {vertex_slot} \
                 but attribute slot {attribute_slot}"
            ),
        }
    }
}

/// A command target failed to apply a command.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TargetError {
    #[error("command target does not support {operation}")]
    Unsupported { operation: &'static str },
    #[error("{operation} on {slot} rejected: {reason}")]
    Rejected {
        operation: &'static str,
        slot: Slot,
        reason: String,
    },
    #[error("{operation} failed: {reason}")]
    Failed {
        operation: &'static str,
        reason: String,
    },
}

/// Why a traversal was aborted.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum TraversalError {
    #[error("draw item {item} references {kind} {index}, but the frame's table has {len}")]
    OutOfRange {
        item: usize,
        kind: ResourceKind,
        index: u32,
        len: u32,
    },
    #[error(
        "draw item {item}: geometry {geometry} starts at vertex slot {vertex_slot} \
         but attribute slot {attribute_slot}"
    )]
    InconsistentGeometryLayout {
        item: usize,
        geometry: u32,
        vertex_slot: u32,
        attribute_slot: u32,
    },
    /// `item` is `None` for failures in the frame prologue or epilogue.
    #[error("binding strategy failed (draw item {item:?})")]
    StrategyBinding {
        item: Option<usize>,
        #[source]
        source: TargetError,
    },
    #[error("binding mode {mode} is not supported by this command target")]
    UnsupportedBindingMode { mode: BindingMode },
}

impl TraversalError {
    pub(crate) fn from_resource(item: usize, error: ResourceError) -> Self {
        match error {
            ResourceError::OutOfRange { kind, index, len } => TraversalError::OutOfRange {
                item,
                kind,
                index,
                len,
            },
            ResourceError::InconsistentGeometryLayout {
                geometry,
                vertex_slot,
                attribute_slot,
            } => TraversalError::InconsistentGeometryLayout {
                item,
                geometry,
                vertex_slot,
                attribute_slot,
            },
        }
    }

    pub(crate) fn strategy(item: Option<usize>, source: TargetError) -> Self {
        TraversalError::StrategyBinding { item, source }
    }

    /// Position of the draw item the traversal stopped at, if any.
    pub fn item(&self) -> Option<usize> {
        match self {
            TraversalError::OutOfRange { item, .. }
            | TraversalError::InconsistentGeometryLayout { item, .. } => Some(*item),
            TraversalError::StrategyBinding { item, .. } => *item,
            TraversalError::UnsupportedBindingMode { .. } => None,
        }
    }
}
