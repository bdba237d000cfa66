// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
/*!
Tracks what is currently bound, per category.

The cache answers one question: does this identity need to be (re)bound? Answering also
records the identity as bound, so the caller must issue the bind whenever the answer is `true`.

Every category starts out holding no identity at all. Since no real identity compares equal
to "nothing", the first query in each category always reports a rebind, whatever the
identity happens to be.

# Example

```
use meshlet_dispatch::bindings::state_cache::{BindingState, TransformKey};
use meshlet_dispatch::draw_list::ProgramVariant;

let mut state = BindingState::new();
assert!(state.needs_rebind(ProgramVariant::Mesh));
assert!(!state.needs_rebind(ProgramVariant::Mesh));
assert!(state.needs_rebind(ProgramVariant::MeshTask));
//categories are independent
assert!(state.needs_rebind(TransformKey(0)));
```
*/

use crate::draw_list::{IndexWidth, ProgramVariant};
use crate::resources::ChunkKey;
use std::fmt::Display;

/// Independently varying binding categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    /// Mesh vs. mesh+task program.
    Program,
    /// Geometry offsets, keyed on geometry and index width.
    Geometry,
    /// The geometry binding record.
    GeometryTable,
    /// The per-object transform record.
    Transform,
}

impl Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Category::Program => write!(f, "program"),
            Category::Geometry => write!(f, "geometry"),
            Category::GeometryTable => write!(f, "geometry table"),
            Category::Transform => write!(f, "transform"),
        }
    }
}

/// Identity of a geometry binding. The index width is part of it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GeometryKey {
    pub geometry_index: u32,
    pub index_width: IndexWidth,
}

/// Identity of a transform binding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TransformKey(pub u32);

pub(crate) mod sealed {
    pub trait Sealed {}
    impl Sealed for crate::draw_list::ProgramVariant {}
    impl Sealed for super::GeometryKey {}
    impl Sealed for crate::resources::ChunkKey {}
    impl Sealed for super::TransformKey {}
}

/// A type usable as the identity of one category.
pub trait CacheKey: Copy + PartialEq + sealed::Sealed {
    const CATEGORY: Category;
    #[doc(hidden)]
    fn marker(state: &mut BindingState) -> &mut Option<Self>;
}

impl CacheKey for ProgramVariant {
    const CATEGORY: Category = Category::Program;
    fn marker(state: &mut BindingState) -> &mut Option<Self> {
        &mut state.program
    }
}

impl CacheKey for GeometryKey {
    const CATEGORY: Category = Category::Geometry;
    fn marker(state: &mut BindingState) -> &mut Option<Self> {
        &mut state.geometry
    }
}

impl CacheKey for ChunkKey {
    const CATEGORY: Category = Category::GeometryTable;
    fn marker(state: &mut BindingState) -> &mut Option<Self> {
        &mut state.chunk
    }
}

impl CacheKey for TransformKey {
    const CATEGORY: Category = Category::Transform;
    fn marker(state: &mut BindingState) -> &mut Option<Self> {
        &mut state.transform
    }
}

/**
The last identity applied in each category.

One of these is created for every traversal and dropped at its end; no binding is assumed
to survive from one traversal to the next.
*/
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BindingState {
    program: Option<ProgramVariant>,
    geometry: Option<GeometryKey>,
    chunk: Option<ChunkKey>,
    transform: Option<TransformKey>,
}

impl BindingState {
    /// A cold state: every category will report a rebind.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns whether `key` differs from the bound identity of its category, and records
    /// `key` as bound.
    pub fn needs_rebind<K: CacheKey>(&mut self, key: K) -> bool {
        let marker = K::marker(self);
        if *marker == Some(key) {
            false
        } else {
            *marker = Some(key);
            true
        }
    }

    /// Returns the category to its cold state.
    pub fn invalidate(&mut self, category: Category) {
        match category {
            Category::Program => self.program = None,
            Category::Geometry => self.geometry = None,
            Category::GeometryTable => self.chunk = None,
            Category::Transform => self.transform = None,
        }
    }
}
