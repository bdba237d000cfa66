// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
/*!
The two ways a binding reaches the GPU.

The dispatcher decides *what* to bind and *when*; a [`BindingStrategy`] decides *how*.

| Mode              | A bind is                                        | Unbind                  |
|-------------------|--------------------------------------------------|-------------------------|
| Direct addressing | registering a raw device address and size        | register the null range |
| Indexed table     | pointing a slot at a sub-range of a table buffer | clear the slot          |

Both modes see the same sequence of decisions; only the commands sent to the
[`CommandTarget`] differ. The mode is chosen once, when the strategy is built, and the
dispatcher never looks at it again.
*/

use crate::bindings::slot::{Slot, UniformLocation};
use crate::draw_list::{Launch, PrimitiveGroupRange, ProgramVariant};
use crate::error::{TargetError, TraversalError};
use crate::imp::CommandTarget;
use crate::resources::{DeviceAddress, GeometryOffsets, Location};
use std::fmt::Display;

/// Selects a [`BindingStrategy`] at initialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum BindingMode {
    /// Resources are referenced by raw device address. Requires target support.
    DirectAddressing,
    /// Resources are referenced through slots bound to table sub-ranges.
    #[default]
    IndexedTable,
}

impl BindingMode {
    /// Short name for diagnostics.
    pub const fn name(self) -> &'static str {
        match self {
            BindingMode::DirectAddressing => "mesh bindless",
            BindingMode::IndexedTable => "mesh",
        }
    }
}

impl Display for BindingMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/**
Applies binding decisions to a command target.

Implementors provide [`bind`](Self::bind) and [`unbind`](Self::unbind); everything else
is shared between modes and has a default implementation.
*/
pub trait BindingStrategy {
    type Target: CommandTarget;

    fn mode(&self) -> BindingMode;
    fn target(&self) -> &Self::Target;
    fn target_mut(&mut self) -> &mut Self::Target;

    /// Makes `location` visible at `slot`, superseding whatever was there.
    fn bind(&mut self, slot: Slot, location: &Location) -> Result<(), TargetError>;

    /// Reverts `slot` to unbound.
    fn unbind(&mut self, slot: Slot) -> Result<(), TargetError>;

    /// Binds frame-global state ahead of the first draw: the statistics buffer, if the frame
    /// has one, then the scene view.
    fn begin_frame(
        &mut self,
        scene_view: &Location,
        scene_stats: Option<&Location>,
    ) -> Result<(), TargetError> {
        if let Some(scene_stats) = scene_stats {
            self.bind(Slot::SceneStats, scene_stats)?;
        }
        self.bind(Slot::SceneView, scene_view)
    }

    /// Reverts every slot so later passes don't observe traversal state.
    ///
    /// `scene_stats_bound` must match whether [`begin_frame`](Self::begin_frame) bound a
    /// statistics buffer.
    fn end_frame(&mut self, scene_stats_bound: bool) -> Result<(), TargetError> {
        if scene_stats_bound {
            self.unbind(Slot::SceneStats)?;
        }
        for slot in Slot::UNIFORM {
            self.unbind(slot)?;
        }
        Ok(())
    }

    fn select_program(&mut self, variant: ProgramVariant) -> Result<(), TargetError> {
        self.target_mut().use_program(variant)
    }

    /// Writes all four geometry offsets in one update.
    fn set_geometry_offsets(&mut self, offsets: &GeometryOffsets) -> Result<(), TargetError> {
        self.target_mut()
            .set_uniform(UniformLocation::GeometryOffsets, offsets.as_uniform())
    }

    /// Hands the task stage its primitive-group range as `[first, last]`.
    fn set_task_range(&mut self, range: &PrimitiveGroupRange) -> Result<(), TargetError> {
        self.target_mut().set_uniform(
            UniformLocation::TaskRange,
            [range.offset(), range.last_inclusive(), 0, 0],
        )
    }

    fn draw(&mut self, launch: Launch) -> Result<(), TargetError> {
        self.target_mut().draw_mesh_tasks(launch.first, launch.count)
    }
}

/// Binds by registering device addresses.
#[derive(Debug)]
pub struct DirectAddressing<T> {
    target: T,
}

impl<T: CommandTarget> DirectAddressing<T> {
    /// Fails if `target` cannot consume raw device addresses.
    pub fn new(target: T) -> Result<Self, TraversalError> {
        if !target.supports_direct_addressing() {
            return Err(TraversalError::UnsupportedBindingMode {
                mode: BindingMode::DirectAddressing,
            });
        }
        Ok(DirectAddressing { target })
    }

    pub fn into_target(self) -> T {
        self.target
    }
}

impl<T: CommandTarget> BindingStrategy for DirectAddressing<T> {
    type Target = T;

    fn mode(&self) -> BindingMode {
        BindingMode::DirectAddressing
    }
    fn target(&self) -> &T {
        &self.target
    }
    fn target_mut(&mut self) -> &mut T {
        &mut self.target
    }

    //storage slots have no address form and are bound by table in either mode
    fn bind(&mut self, slot: Slot, location: &Location) -> Result<(), TargetError> {
        if slot.is_uniform() {
            self.target
                .set_address_range(slot, location.address(), location.size)
        } else {
            self.target
                .bind_table_range(slot, location.buffer.handle, location.offset, location.size)
        }
    }

    fn unbind(&mut self, slot: Slot) -> Result<(), TargetError> {
        if slot.is_uniform() {
            self.target.set_address_range(slot, DeviceAddress::NULL, 0)
        } else {
            self.target.unbind(slot)
        }
    }

    //address slots may hold stale ranges from an earlier pass; clear them before the scene view
    fn begin_frame(
        &mut self,
        scene_view: &Location,
        scene_stats: Option<&Location>,
    ) -> Result<(), TargetError> {
        if let Some(scene_stats) = scene_stats {
            self.bind(Slot::SceneStats, scene_stats)?;
        }
        for slot in Slot::UNIFORM {
            self.unbind(slot)?;
        }
        self.bind(Slot::SceneView, scene_view)
    }
}

/// Binds by pointing slots at table sub-ranges.
#[derive(Debug)]
pub struct IndexedTable<T> {
    target: T,
}

impl<T: CommandTarget> IndexedTable<T> {
    pub fn new(target: T) -> Self {
        IndexedTable { target }
    }

    pub fn into_target(self) -> T {
        self.target
    }
}

impl<T: CommandTarget> BindingStrategy for IndexedTable<T> {
    type Target = T;

    fn mode(&self) -> BindingMode {
        BindingMode::IndexedTable
    }
    fn target(&self) -> &T {
        &self.target
    }
    fn target_mut(&mut self) -> &mut T {
        &mut self.target
    }

    fn bind(&mut self, slot: Slot, location: &Location) -> Result<(), TargetError> {
        self.target
            .bind_table_range(slot, location.buffer.handle, location.offset, location.size)
    }

    fn unbind(&mut self, slot: Slot) -> Result<(), TargetError> {
        self.target.unbind(slot)
    }
}

/**
A strategy picked from a [`BindingMode`] at runtime.

# Example

```
use meshlet_dispatch::bindings::{Binder, BindingMode, BindingStrategy};
use meshlet_dispatch::imp::recording::Recorder;

let binder = Binder::new(BindingMode::DirectAddressing, Recorder::new()).unwrap();
assert_eq!(binder.mode(), BindingMode::DirectAddressing);

//a target without device addresses can only use the indexed table
let refused = Binder::new(BindingMode::DirectAddressing, Recorder::without_direct_addressing());
assert!(refused.is_err());
```
*/
#[derive(Debug)]
pub enum Binder<T> {
    DirectAddressing(DirectAddressing<T>),
    IndexedTable(IndexedTable<T>),
}

impl<T: CommandTarget> Binder<T> {
    pub fn new(mode: BindingMode, target: T) -> Result<Self, TraversalError> {
        match mode {
            BindingMode::DirectAddressing => {
                DirectAddressing::new(target).map(Binder::DirectAddressing)
            }
            BindingMode::IndexedTable => Ok(Binder::IndexedTable(IndexedTable::new(target))),
        }
    }

    pub fn into_target(self) -> T {
        match self {
            Binder::DirectAddressing(s) => s.into_target(),
            Binder::IndexedTable(s) => s.into_target(),
        }
    }
}

impl<T: CommandTarget> BindingStrategy for Binder<T> {
    type Target = T;

    fn mode(&self) -> BindingMode {
        match self {
            Binder::DirectAddressing(s) => s.mode(),
            Binder::IndexedTable(s) => s.mode(),
        }
    }
    fn target(&self) -> &T {
        match self {
            Binder::DirectAddressing(s) => s.target(),
            Binder::IndexedTable(s) => s.target(),
        }
    }
    fn target_mut(&mut self) -> &mut T {
        match self {
            Binder::DirectAddressing(s) => s.target_mut(),
            Binder::IndexedTable(s) => s.target_mut(),
        }
    }
    fn bind(&mut self, slot: Slot, location: &Location) -> Result<(), TargetError> {
        match self {
            Binder::DirectAddressing(s) => s.bind(slot, location),
            Binder::IndexedTable(s) => s.bind(slot, location),
        }
    }
    fn unbind(&mut self, slot: Slot) -> Result<(), TargetError> {
        match self {
            Binder::DirectAddressing(s) => s.unbind(slot),
            Binder::IndexedTable(s) => s.unbind(slot),
        }
    }
    fn begin_frame(
        &mut self,
        scene_view: &Location,
        scene_stats: Option<&Location>,
    ) -> Result<(), TargetError> {
        match self {
            Binder::DirectAddressing(s) => s.begin_frame(scene_view, scene_stats),
            Binder::IndexedTable(s) => s.begin_frame(scene_view, scene_stats),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imp::recording::{Command, Recorder};
    use crate::resources::{BufferHandle, BufferRef};

    fn location() -> Location {
        Location::new(BufferRef::new(BufferHandle(7), DeviceAddress(0x4000)), 512, 64)
    }

    #[test]
    fn direct_addressing_registers_addresses() {
        let mut s = DirectAddressing::new(Recorder::new()).unwrap();
        s.bind(Slot::Object, &location()).unwrap();
        s.unbind(Slot::Object).unwrap();
        assert_eq!(
            s.target().commands(),
            &[
                Command::SetAddressRange {
                    slot: Slot::Object,
                    address: DeviceAddress(0x4200),
                    size: 64
                },
                Command::SetAddressRange {
                    slot: Slot::Object,
                    address: DeviceAddress::NULL,
                    size: 0
                },
            ]
        );
    }

    #[test]
    fn indexed_table_binds_ranges() {
        let mut s = IndexedTable::new(Recorder::new());
        s.bind(Slot::Geometry, &location()).unwrap();
        s.unbind(Slot::Geometry).unwrap();
        assert_eq!(
            s.target().commands(),
            &[
                Command::BindTableRange {
                    slot: Slot::Geometry,
                    buffer: BufferHandle(7),
                    offset: 512,
                    size: 64
                },
                Command::Unbind(Slot::Geometry),
            ]
        );
    }

    #[test]
    fn direct_begin_frame_clears_every_slot_first() {
        let mut s = DirectAddressing::new(Recorder::new()).unwrap();
        s.begin_frame(&location(), None).unwrap();
        let commands = s.target().commands();
        assert_eq!(commands.len(), 4);
        for (command, slot) in commands.iter().zip(Slot::UNIFORM) {
            assert_eq!(
                *command,
                Command::SetAddressRange {
                    slot,
                    address: DeviceAddress::NULL,
                    size: 0
                }
            );
        }
        assert_eq!(
            commands[3],
            Command::SetAddressRange {
                slot: Slot::SceneView,
                address: DeviceAddress(0x4200),
                size: 64
            }
        );
    }

    #[test]
    fn scene_stats_bracket_the_frame_by_table_in_both_modes() {
        let stats = Location::new(BufferRef::new(BufferHandle(9), DeviceAddress(0x9000)), 0, 32);
        let stats_bind = Command::BindTableRange {
            slot: Slot::SceneStats,
            buffer: BufferHandle(9),
            offset: 0,
            size: 32,
        };
        for mode in [BindingMode::DirectAddressing, BindingMode::IndexedTable] {
            let mut binder = Binder::new(mode, Recorder::new()).unwrap();
            binder.begin_frame(&location(), Some(&stats)).unwrap();
            binder.end_frame(true).unwrap();
            let commands = binder.into_target().take_commands();
            assert_eq!(commands[0], stats_bind);
            let unbinds: Vec<_> = commands
                .iter()
                .skip(1)
                .filter_map(|c| match c {
                    Command::Unbind(slot) => Some(*slot),
                    _ => None,
                })
                .collect();
            match mode {
                //uniform slots are cleared by null address; only the storage slot is unbound
                BindingMode::DirectAddressing => assert_eq!(unbinds, vec![Slot::SceneStats]),
                BindingMode::IndexedTable => assert_eq!(
                    unbinds,
                    vec![Slot::SceneStats, Slot::SceneView, Slot::Object, Slot::Geometry]
                ),
            }
        }
    }

    #[test]
    fn frame_without_scene_stats_leaves_the_slot_alone() {
        let mut s = IndexedTable::new(Recorder::new());
        s.begin_frame(&location(), None).unwrap();
        s.end_frame(false).unwrap();
        assert!(s.target().commands().iter().all(|c| c.slot() != Some(Slot::SceneStats)));
        assert_eq!(s.target().commands().len(), 4);
    }

    #[test]
    fn task_range_is_inclusive() {
        let mut s = IndexedTable::new(Recorder::new());
        s.set_task_range(&PrimitiveGroupRange::new(10, 5).unwrap()).unwrap();
        assert_eq!(
            s.target().commands(),
            &[Command::SetUniform {
                location: UniformLocation::TaskRange,
                value: [10, 14, 0, 0]
            }]
        );
    }

    #[test]
    fn task_range_ending_at_u32_max_is_exact() {
        let mut s = IndexedTable::new(Recorder::new());
        s.set_task_range(&PrimitiveGroupRange::new(u32::MAX - 3, 4).unwrap()).unwrap();
        assert_eq!(
            s.target().commands(),
            &[Command::SetUniform {
                location: UniformLocation::TaskRange,
                value: [u32::MAX - 3, u32::MAX, 0, 0]
            }]
        );
    }

    #[test]
    fn binder_delegates_to_selected_mode() {
        let mut binder = Binder::new(BindingMode::IndexedTable, Recorder::new()).unwrap();
        assert_eq!(binder.mode(), BindingMode::IndexedTable);
        binder.bind(Slot::SceneView, &location()).unwrap();
        let recorder = binder.into_target();
        assert!(matches!(recorder.commands()[0], Command::BindTableRange { .. }));
    }

    #[test]
    fn unsupported_direct_addressing_is_refused() {
        let err = DirectAddressing::new(Recorder::without_direct_addressing()).unwrap_err();
        assert_eq!(
            err,
            TraversalError::UnsupportedBindingMode {
                mode: BindingMode::DirectAddressing
            }
        );
    }
}
