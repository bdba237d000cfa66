// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
//! Per-traversal counters.
//!
//! These exist for diagnosis only. The dispatcher never reads them back.

use crate::bindings::state_cache::Category;
use std::fmt::Display;

/// What one traversal emitted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct FrameStats {
    /// Geometry transitions: offset updates, or record binds for per-geometry views.
    pub geometry_rebinds: u32,
    /// Binds of a geometry table record.
    pub geometry_table_binds: u32,
    pub transform_rebinds: u32,
    pub variant_switches: u32,
    pub total_draws: u32,
}

impl FrameStats {
    /// Binds and program switches, in total.
    pub fn state_changes(&self) -> u32 {
        self.geometry_rebinds
            + self.geometry_table_binds
            + self.transform_rebinds
            + self.variant_switches
    }
}

impl Display for FrameStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} draws, {} geometry ({} table), {} transform, {} program",
            self.total_draws,
            self.geometry_rebinds,
            self.geometry_table_binds,
            self.transform_rebinds,
            self.variant_switches
        )
    }
}

/// Accumulates [`FrameStats`] during a traversal.
#[derive(Debug, Default)]
pub struct StatsAccumulator {
    stats: FrameStats,
}

impl StatsAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_rebind(&mut self, category: Category) {
        let counter = match category {
            Category::Program => &mut self.stats.variant_switches,
            Category::Geometry => &mut self.stats.geometry_rebinds,
            Category::GeometryTable => &mut self.stats.geometry_table_binds,
            Category::Transform => &mut self.stats.transform_rebinds,
        };
        *counter += 1;
    }

    pub fn record_draw(&mut self) {
        self.stats.total_draws += 1;
    }

    pub fn snapshot(&self) -> FrameStats {
        self.stats
    }

    pub fn reset(&mut self) {
        self.stats = FrameStats::default();
    }
}
