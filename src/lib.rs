// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
/*! meshlet_dispatch turns a frame's draw list into the minimal stream of binding and draw
commands for mesh-shader rendering.

A renderer that draws thousands of meshlet-based objects per frame spends much of its CPU
time on redundant state changes: consecutive draws very often share a program, a geometry
chunk or a transform. This crate walks the draw list once, remembers what is bound, and only
emits the commands that actually change something.

| Category  | Identity                      | On change                                          |
|-----------|-------------------------------|----------------------------------------------------|
| Program   | mesh vs. mesh+task            | select the program                                 |
| Geometry  | geometry index, index width   | bind the chunk record (if it changed), write offsets |
| Transform | matrix index                  | bind the transform record                          |

Each draw item produces exactly one draw.

# Binding modes

Where the target supports raw device addresses, bindings can be registered by address
([`BindingMode::DirectAddressing`]). Otherwise, slots are pointed at sub-ranges of table
buffers ([`BindingMode::IndexedTable`]). The mode is chosen once, in [`DispatchConfig`], and
both modes make identical decisions.

# Backends

Commands go to a [`imp::CommandTarget`]. [`imp::recording::Recorder`] keeps them as values;
with the default `backend_wgpu` feature, `imp::wgpu::WgpuTarget` replays them into a
[wgpu](https://wgpu.rs) render pass.

# Example

```
use meshlet_dispatch::{BindingStrategy, DispatchConfig, Dispatcher, DrawItem, DrawList};
use meshlet_dispatch::draw_list::PrimitiveGroupRange;
use meshlet_dispatch::imp::recording::Recorder;
use meshlet_dispatch::resources::*;

let buffer = |h: u32| BufferRef::new(BufferHandle(h), DeviceAddress(u64::from(h) << 20));
let mut tables = ResourceTables::new(
    VertexLayoutSizes::new(16, 16, 16).unwrap(),
    TableLayout::new(buffer(1), 256, 64),
    TransformTable::new(buffer(2), 128, 256, 8),
    Location::new(buffer(3), 0, 256),
);
let geometry = tables.push_geometry(GeometryRecord {
    chunk_index: 0,
    vertex_offset: 0,
    attribute_offset: 0,
    group_descriptor_offset: 0,
    primitive_offset: 0,
    index_offset: 0,
}).unwrap();

let mut list = DrawList::new();
for matrix in 0..8 {
    list.push(DrawItem::new(geometry, matrix, PrimitiveGroupRange::new(0, 16).unwrap()));
}

let mut dispatcher = Dispatcher::new(DispatchConfig::default(), Recorder::new()).unwrap();
let stats = dispatcher.traverse(&list, &tables).unwrap();
assert_eq!(stats.geometry_rebinds, 1);
assert_eq!(stats.transform_rebinds, 8);
assert_eq!(dispatcher.strategy().target().draw_count(), 8);
```
*/

pub mod bindings;
pub mod config;
pub mod draw_list;
pub mod error;
pub mod imp;
pub mod resources;
pub mod stats;
pub mod traversal;
mod bittricks;

pub use bindings::{BindingMode, BindingStrategy};
pub use config::{DispatchConfig, GeometryViews};
pub use draw_list::{DrawItem, DrawList};
pub use error::TraversalError;
pub use resources::ResourceTables;
pub use stats::FrameStats;
pub use traversal::Dispatcher;
