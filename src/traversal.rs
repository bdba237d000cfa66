// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
/*!
The draw-list traversal.

A [`Dispatcher`] walks a draw list once, in submission order, and for every item:

1. selects the item's program if it differs from the current one,
2. rebinds geometry if `(geometry, index width)` changed, binding a new table record only
   when the record itself changed,
3. rebinds the transform if the matrix index changed,
4. passes the task stage its `[first, last]` group range, for task items,
5. issues exactly one draw.

The binding state starts cold for every traversal, so the first item binds every category.
All of an item's resources are resolved before any of its commands are emitted: an item that
fails to resolve leaves no trace in the command stream. Commands already emitted for earlier
items are not rolled back.

# Example

```
use meshlet_dispatch::config::DispatchConfig;
use meshlet_dispatch::draw_list::{DrawItem, PrimitiveGroupRange};
use meshlet_dispatch::imp::recording::Recorder;
use meshlet_dispatch::resources::*;
use meshlet_dispatch::traversal::Dispatcher;

let buffer = |h: u32| BufferRef::new(BufferHandle(h), DeviceAddress(u64::from(h) << 20));
let mut tables = ResourceTables::new(
    VertexLayoutSizes::new(16, 16, 16).unwrap(),
    TableLayout::new(buffer(1), 256, 64),
    TransformTable::new(buffer(2), 128, 256, 1),
    Location::new(buffer(3), 0, 256),
);
for chunk_index in 0..2 {
    tables.push_geometry(GeometryRecord {
        chunk_index,
        vertex_offset: 0,
        attribute_offset: 0,
        group_descriptor_offset: 0,
        primitive_offset: 0,
        index_offset: 0,
    });
}

let range = |offset, count| PrimitiveGroupRange::new(offset, count).unwrap();
let list = [
    DrawItem::new(0, 0, range(0, 4)),
    DrawItem::new(0, 0, range(4, 4)),
    DrawItem::new(1, 0, range(0, 2)),
];

let mut dispatcher = Dispatcher::new(DispatchConfig::default(), Recorder::new()).unwrap();
let stats = dispatcher.traverse(&list, &tables).unwrap();
assert_eq!(stats.geometry_rebinds, 2);
assert_eq!(stats.transform_rebinds, 1);
assert_eq!(stats.variant_switches, 1);
assert_eq!(stats.total_draws, 3);
```
*/

use crate::bindings::binding_mode::{Binder, BindingStrategy};
use crate::bindings::slot::Slot;
use crate::bindings::state_cache::{BindingState, CacheKey, Category, GeometryKey, TransformKey};
use crate::config::{DispatchConfig, GeometryViews};
use crate::draw_list::{DrawItem, ProgramVariant};
use crate::error::{ResourceError, TraversalError};
use crate::imp::CommandTarget;
use crate::resources::{GeometryOffsets, Location, ResourceTables};
use crate::stats::{FrameStats, StatsAccumulator};

/// What one item needs beyond its draw.
#[derive(Debug, Default)]
struct ItemPlan {
    program: Option<ProgramVariant>,
    geometry_changed: bool,
    geometry_table: Option<Location>,
    geometry_offsets: Option<GeometryOffsets>,
    transform: Option<Location>,
}

/// Decides which categories an item changes and resolves their resources.
///
/// Records the item's identities in `state`, so a failed plan leaves `state` unusable; the
/// traversal is over at that point anyway.
fn plan_item(
    state: &mut BindingState,
    item: &DrawItem,
    tables: &ResourceTables,
    geometry_views: GeometryViews,
) -> Result<ItemPlan, ResourceError> {
    let mut plan = ItemPlan::default();

    let variant = item.program_variant();
    if state.needs_rebind(variant) {
        plan.program = Some(variant);
    }

    let geometry = GeometryKey {
        geometry_index: item.geometry_index,
        index_width: item.index_width,
    };
    if state.needs_rebind(geometry) {
        plan.geometry_changed = true;
        match geometry_views {
            GeometryViews::PerChunk => {
                let descriptor = tables.locate_geometry(item.geometry_index, item.index_width)?;
                if state.needs_rebind(descriptor.key) {
                    plan.geometry_table = Some(descriptor.chunk);
                }
                plan.geometry_offsets = Some(descriptor.offsets);
            }
            GeometryViews::PerGeometry => {
                plan.geometry_table = Some(tables.locate_geometry_view(item.geometry_index)?);
            }
        }
    }

    if state.needs_rebind(TransformKey(item.matrix_index)) {
        plan.transform = Some(tables.locate_transform(item.matrix_index)?);
    }

    Ok(plan)
}

/**
Turns draw lists into deduplicated binding and draw commands.

A dispatcher owns its [`BindingStrategy`], and through it the command target. It keeps no
binding state between traversals; each call to [`traverse`](Self::traverse) starts cold.
Independent draw lists (for example, one per viewport) can use independent dispatchers.
*/
#[derive(Debug)]
pub struct Dispatcher<S> {
    strategy: S,
    config: DispatchConfig,
}

impl<T: CommandTarget> Dispatcher<Binder<T>> {
    /// Builds the strategy `config.binding_mode` names, over `target`.
    ///
    /// Fails if `target` cannot serve that mode.
    pub fn new(config: DispatchConfig, target: T) -> Result<Self, TraversalError> {
        let strategy = Binder::new(config.binding_mode, target).inspect_err(|e| {
            logwise::error_sync!(
                "meshlet_dispatch: can't create dispatcher: {err}",
                err = logwise::privacy::LogIt(e)
            );
        })?;
        Ok(Self::with_strategy(config, strategy))
    }
}

impl<S: BindingStrategy> Dispatcher<S> {
    /// Uses an already-built strategy. `config.binding_mode` is replaced by the strategy's mode.
    pub fn with_strategy(mut config: DispatchConfig, strategy: S) -> Self {
        config.binding_mode = strategy.mode();
        logwise::info_sync!(
            "meshlet_dispatch: dispatcher ready ({mode}, views {views}, task width {width})",
            mode = strategy.mode().name(),
            views = logwise::privacy::LogIt(&config.geometry_views),
            width = config.task_workgroup_width.get()
        );
        Dispatcher { strategy, config }
    }

    pub fn config(&self) -> &DispatchConfig {
        &self.config
    }

    pub fn strategy(&self) -> &S {
        &self.strategy
    }

    pub fn strategy_mut(&mut self) -> &mut S {
        &mut self.strategy
    }

    pub fn into_strategy(self) -> S {
        self.strategy
    }

    /**
    Emits the commands for one draw list.

    Returns the frame's counters, or the first error. On error, commands already emitted
    stay emitted and the slots are left as they are.
    */
    pub fn traverse(
        &mut self,
        draw_list: &[DrawItem],
        tables: &ResourceTables,
    ) -> Result<FrameStats, TraversalError> {
        let _traverse_interval = logwise::perfwarn_begin!("meshlet_dispatch::traverse");
        let mut state = BindingState::new();
        let mut stats = StatsAccumulator::new();

        let scene_stats = tables.scene_stats();
        self.strategy
            .begin_frame(&tables.scene_view(), scene_stats.as_ref())
            .map_err(|e| TraversalError::strategy(None, e))?;

        for (index, item) in draw_list.iter().enumerate() {
            let result = self.dispatch_item(&mut state, &mut stats, index, item, tables);
            if let Err(err) = result {
                logwise::warn_sync!(
                    "meshlet_dispatch: traversal aborted at item {index} of {len}: {err}",
                    index = index,
                    len = draw_list.len(),
                    err = logwise::privacy::LogIt(&err)
                );
                return Err(err);
            }
        }

        if self.config.unbind_on_finish {
            self.strategy
                .end_frame(scene_stats.is_some())
                .map_err(|e| TraversalError::strategy(None, e))?;
        }

        let stats = stats.snapshot();
        logwise::trace_sync!(
            "meshlet_dispatch: traversed {draws} draws with {changes} state changes",
            draws = stats.total_draws,
            changes = stats.state_changes()
        );
        Ok(stats)
    }

    fn dispatch_item(
        &mut self,
        state: &mut BindingState,
        stats: &mut StatsAccumulator,
        index: usize,
        item: &DrawItem,
        tables: &ResourceTables,
    ) -> Result<(), TraversalError> {
        let plan = plan_item(state, item, tables, self.config.geometry_views)
            .map_err(|e| TraversalError::from_resource(index, e))?;
        let strategy = &mut self.strategy;
        let fail = |e| TraversalError::strategy(Some(index), e);

        if let Some(variant) = plan.program {
            strategy.select_program(variant).map_err(fail)?;
            stats.record_rebind(ProgramVariant::CATEGORY);
        }
        if let Some(geometry_record) = plan.geometry_table {
            logwise::trace_sync!(
                "meshlet_dispatch: item {index} binds geometry record at {offset}",
                index = index,
                offset = geometry_record.offset
            );
            strategy.bind(Slot::Geometry, &geometry_record).map_err(fail)?;
            stats.record_rebind(Category::GeometryTable);
        }
        if let Some(offsets) = plan.geometry_offsets {
            strategy.set_geometry_offsets(&offsets).map_err(fail)?;
        }
        if plan.geometry_changed {
            stats.record_rebind(GeometryKey::CATEGORY);
        }
        if let Some(transform_record) = plan.transform {
            strategy.bind(Slot::Object, &transform_record).map_err(fail)?;
            stats.record_rebind(TransformKey::CATEGORY);
        }
        if item.uses_task_stage {
            strategy.set_task_range(&item.primitive_groups).map_err(fail)?;
        }
        strategy
            .draw(item.launch(self.config.task_workgroup_width))
            .map_err(fail)?;
        stats.record_draw();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bindings::BindingMode;
    use crate::bindings::slot::UniformLocation;
    use crate::draw_list::{IndexWidth, PrimitiveGroupRange};
    use crate::imp::recording::{Command, Recorder};
    use crate::resources::{
        BufferHandle, BufferRef, DeviceAddress, GeometryRecord, TableLayout, TransformTable,
        VertexLayoutSizes,
    };

    fn tables() -> ResourceTables {
        let mut tables = ResourceTables::new(
            VertexLayoutSizes::new(16, 16, 16).unwrap(),
            TableLayout::new(BufferRef::new(BufferHandle(1), DeviceAddress(0x10000)), 256, 64),
            TransformTable::new(
                BufferRef::new(BufferHandle(2), DeviceAddress(0x20000)),
                128,
                256,
                4,
            ),
            Location::new(BufferRef::new(BufferHandle(3), DeviceAddress(0x30000)), 0, 256),
        );
        //geometries 0 and 1 share chunk 0; geometry 2 is alone in chunk 1
        for (chunk_index, vertex_offset) in [(0, 0), (0, 320), (1, 0)] {
            tables.push_geometry(GeometryRecord {
                chunk_index,
                vertex_offset,
                attribute_offset: vertex_offset,
                group_descriptor_offset: 16 * vertex_offset,
                primitive_offset: 0,
                index_offset: 64,
            });
        }
        tables
    }

    fn item(geometry: u32, matrix: u32) -> DrawItem {
        DrawItem::new(geometry, matrix, PrimitiveGroupRange::new(0, 8).unwrap())
    }

    fn run(
        config: DispatchConfig,
        list: &[DrawItem],
    ) -> (Result<FrameStats, TraversalError>, Vec<Command>) {
        let mut dispatcher = Dispatcher::new(config, Recorder::new()).unwrap();
        let result = dispatcher.traverse(list, &tables());
        (result, dispatcher.into_strategy().into_target().take_commands())
    }

    #[test]
    fn shared_chunk_skips_record_bind_but_updates_offsets() {
        let (result, commands) = run(DispatchConfig::default(), &[item(0, 0), item(1, 0)]);
        let stats = result.unwrap();
        assert_eq!(stats.geometry_rebinds, 2);
        assert_eq!(stats.geometry_table_binds, 1);
        let offsets: Vec<_> = commands
            .iter()
            .filter_map(|c| match c {
                Command::SetUniform {
                    location: UniformLocation::GeometryOffsets,
                    value,
                } => Some(*value),
                _ => None,
            })
            .collect();
        assert_eq!(offsets, vec![[0, 0, 16, 0], [320, 0, 16, 20]]);
    }

    #[test]
    fn per_geometry_views_bind_one_record_per_geometry() {
        let config = DispatchConfig {
            geometry_views: GeometryViews::PerGeometry,
            ..DispatchConfig::default()
        };
        let (result, commands) = run(config, &[item(0, 0), item(1, 0), item(1, 0)]);
        let stats = result.unwrap();
        assert_eq!(stats.geometry_rebinds, 2);
        assert_eq!(stats.geometry_table_binds, 2);
        assert!(!commands.iter().any(|c| matches!(
            c,
            Command::SetUniform {
                location: UniformLocation::GeometryOffsets,
                ..
            }
        )));
        assert!(commands.contains(&Command::BindTableRange {
            slot: Slot::Geometry,
            buffer: BufferHandle(1),
            offset: 256,
            size: 64
        }));
    }

    #[test]
    fn exact_command_stream() {
        let list = [
            item(2, 1),
            item(2, 1).with_task_stage(true),
            item(2, 1).with_index_width(IndexWidth::U16),
        ];
        let (result, commands) = run(DispatchConfig::default(), &list);
        result.unwrap();
        let geometry_record = |offset| Command::BindTableRange {
            slot: Slot::Geometry,
            buffer: BufferHandle(1),
            offset,
            size: 64,
        };
        assert_eq!(
            commands,
            vec![
                Command::BindTableRange {
                    slot: Slot::SceneView,
                    buffer: BufferHandle(3),
                    offset: 0,
                    size: 256
                },
                //item 0
                Command::UseProgram(ProgramVariant::Mesh),
                geometry_record(2 * 256),
                Command::SetUniform {
                    location: UniformLocation::GeometryOffsets,
                    value: [0, 0, 16, 0]
                },
                Command::BindTableRange {
                    slot: Slot::Object,
                    buffer: BufferHandle(2),
                    offset: 256,
                    size: 128
                },
                Command::DrawMeshTasks { first: 0, count: 8 },
                //item 1
                Command::UseProgram(ProgramVariant::MeshTask),
                Command::SetUniform {
                    location: UniformLocation::TaskRange,
                    value: [0, 7, 0, 0]
                },
                Command::DrawMeshTasks { first: 0, count: 1 },
                //item 2
                Command::UseProgram(ProgramVariant::Mesh),
                geometry_record(3 * 256),
                Command::SetUniform {
                    location: UniformLocation::GeometryOffsets,
                    value: [0, 0, 32, 0]
                },
                Command::DrawMeshTasks { first: 0, count: 8 },
                //epilogue
                Command::Unbind(Slot::SceneView),
                Command::Unbind(Slot::Object),
                Command::Unbind(Slot::Geometry),
            ]
        );
    }

    #[test]
    fn unbind_on_finish_can_be_disabled() {
        let config = DispatchConfig {
            unbind_on_finish: false,
            ..DispatchConfig::default()
        };
        let (result, commands) = run(config, &[item(0, 0)]);
        result.unwrap();
        assert!(!commands.iter().any(|c| matches!(c, Command::Unbind(_))));
    }

    #[test]
    fn empty_list_still_brackets_the_frame() {
        let (result, commands) = run(DispatchConfig::default(), &[]);
        assert_eq!(result.unwrap(), FrameStats::default());
        assert_eq!(commands.len(), 4);
        assert_eq!(commands.iter().filter(|c| matches!(c, Command::Unbind(_))).count(), 3);
    }

    #[test]
    fn scene_stats_are_bound_first_and_unbound_first() {
        let stats_buffer = BufferRef::new(BufferHandle(4), DeviceAddress(0x40000));
        let tables = tables().with_scene_stats(Location::new(stats_buffer, 0, 64));
        let mut dispatcher = Dispatcher::new(DispatchConfig::default(), Recorder::new()).unwrap();
        dispatcher.traverse(&[item(0, 0)], &tables).unwrap();
        let commands = dispatcher.into_strategy().into_target().take_commands();
        assert_eq!(
            commands[0],
            Command::BindTableRange {
                slot: Slot::SceneStats,
                buffer: BufferHandle(4),
                offset: 0,
                size: 64
            }
        );
        assert_eq!(commands[1].slot(), Some(Slot::SceneView));
        let tail = &commands[commands.len() - 4..];
        assert_eq!(
            tail,
            &[
                Command::Unbind(Slot::SceneStats),
                Command::Unbind(Slot::SceneView),
                Command::Unbind(Slot::Object),
                Command::Unbind(Slot::Geometry),
            ]
        );
    }

    #[test]
    fn custom_workgroup_width() {
        let config = DispatchConfig {
            task_workgroup_width: std::num::NonZeroU32::new(4).unwrap(),
            ..DispatchConfig::default()
        };
        let (result, commands) = run(config, &[item(0, 0).with_task_stage(true)]);
        result.unwrap();
        assert!(commands.contains(&Command::DrawMeshTasks { first: 0, count: 2 }));
    }

    #[test]
    fn with_strategy_adopts_strategy_mode() {
        let strategy = Binder::new(BindingMode::DirectAddressing, Recorder::new()).unwrap();
        let dispatcher = Dispatcher::with_strategy(DispatchConfig::default(), strategy);
        assert_eq!(dispatcher.config().binding_mode, BindingMode::DirectAddressing);
    }
}
