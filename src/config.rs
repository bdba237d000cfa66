// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
//! Dispatcher configuration.
//!
//! Everything here is fixed when a renderer is initialized. A [`DispatchConfig`] is plain data;
//! build one with struct-update syntax over [`Default`].
//!
//! ```
//! use meshlet_dispatch::bindings::BindingMode;
//! use meshlet_dispatch::config::{DispatchConfig, GeometryViews};
//!
//! let config = DispatchConfig {
//!     binding_mode: BindingMode::DirectAddressing,
//!     geometry_views: GeometryViews::PerGeometry,
//!     ..DispatchConfig::default()
//! };
//! assert_eq!(config.task_workgroup_width.get(), 32);
//! ```

use crate::bindings::BindingMode;
use std::num::NonZeroU32;

/// How the geometry binding table is organized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum GeometryViews {
    /// One record per chunk and index width. Geometries sharing a chunk share a record and
    /// are told apart by a separate offsets update.
    #[default]
    PerChunk,
    /// One record per geometry, carrying its offsets. No offsets update is issued.
    PerGeometry,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DispatchConfig {
    pub binding_mode: BindingMode,
    pub geometry_views: GeometryViews,
    /// Primitive groups handled by one task-stage work group. Must match the task program.
    pub task_workgroup_width: NonZeroU32,
    /// Revert every slot to unbound after a successful traversal.
    pub unbind_on_finish: bool,
}

impl DispatchConfig {
    pub const DEFAULT_TASK_WORKGROUP_WIDTH: NonZeroU32 = NonZeroU32::new(32).unwrap();
}

impl Default for DispatchConfig {
    fn default() -> Self {
        DispatchConfig {
            binding_mode: BindingMode::default(),
            geometry_views: GeometryViews::default(),
            task_workgroup_width: Self::DEFAULT_TASK_WORKGROUP_WIDTH,
            unbind_on_finish: true,
        }
    }
}
