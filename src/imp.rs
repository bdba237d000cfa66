// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
/*!
Command targets: where binding and draw commands finally go.

A target is the thin layer over a graphics API. It is handed to a
[`BindingStrategy`](crate::bindings::BindingStrategy) at construction and receives
already-deduplicated commands in submission order.

* [`recording::Recorder`] keeps the commands as values. It backs the tests and is handy
  for inspecting what a draw list turns into.
* `wgpu::WgpuTarget` (feature `backend_wgpu`) replays them into a `wgpu::RenderPass`.
*/

use crate::bindings::slot::{Slot, UniformLocation};
use crate::draw_list::ProgramVariant;
use crate::error::TargetError;
use crate::resources::{BufferHandle, DeviceAddress};

pub mod recording;

#[cfg(feature = "backend_wgpu")]
pub mod wgpu;

/// The graphics-command surface the dispatcher needs.
pub trait CommandTarget {
    /// Whether [`set_address_range`](Self::set_address_range) is available.
    fn supports_direct_addressing(&self) -> bool;

    fn use_program(&mut self, variant: ProgramVariant) -> Result<(), TargetError>;

    /// Binds `size` bytes of `buffer`, starting at `offset`, to `slot`.
    fn bind_table_range(
        &mut self,
        slot: Slot,
        buffer: BufferHandle,
        offset: u64,
        size: u64,
    ) -> Result<(), TargetError>;

    /// Registers a raw address range for `slot`. A null address with size 0 clears it.
    fn set_address_range(
        &mut self,
        slot: Slot,
        address: DeviceAddress,
        size: u64,
    ) -> Result<(), TargetError>;

    fn set_uniform(
        &mut self,
        location: UniformLocation,
        value: [u32; 4],
    ) -> Result<(), TargetError>;

    /// Launches `count` work groups starting at `first`.
    fn draw_mesh_tasks(&mut self, first: u32, count: u32) -> Result<(), TargetError>;

    fn unbind(&mut self, slot: Slot) -> Result<(), TargetError>;
}

impl<T: CommandTarget + ?Sized> CommandTarget for &mut T {
    fn supports_direct_addressing(&self) -> bool {
        (**self).supports_direct_addressing()
    }
    fn use_program(&mut self, variant: ProgramVariant) -> Result<(), TargetError> {
        (**self).use_program(variant)
    }
    fn bind_table_range(
        &mut self,
        slot: Slot,
        buffer: BufferHandle,
        offset: u64,
        size: u64,
    ) -> Result<(), TargetError> {
        (**self).bind_table_range(slot, buffer, offset, size)
    }
    fn set_address_range(
        &mut self,
        slot: Slot,
        address: DeviceAddress,
        size: u64,
    ) -> Result<(), TargetError> {
        (**self).set_address_range(slot, address, size)
    }
    fn set_uniform(
        &mut self,
        location: UniformLocation,
        value: [u32; 4],
    ) -> Result<(), TargetError> {
        (**self).set_uniform(location, value)
    }
    fn draw_mesh_tasks(&mut self, first: u32, count: u32) -> Result<(), TargetError> {
        (**self).draw_mesh_tasks(first, count)
    }
    fn unbind(&mut self, slot: Slot) -> Result<(), TargetError> {
        (**self).unbind(slot)
    }
}
