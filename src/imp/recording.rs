// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
//! A command target that records instead of rendering.

use crate::bindings::slot::{Slot, UniformLocation};
use crate::draw_list::ProgramVariant;
use crate::error::TargetError;
use crate::imp::CommandTarget;
use crate::resources::{BufferHandle, DeviceAddress};

/// One command as received by a target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Command {
    UseProgram(ProgramVariant),
    BindTableRange {
        slot: Slot,
        buffer: BufferHandle,
        offset: u64,
        size: u64,
    },
    SetAddressRange {
        slot: Slot,
        address: DeviceAddress,
        size: u64,
    },
    SetUniform {
        location: UniformLocation,
        value: [u32; 4],
    },
    DrawMeshTasks {
        first: u32,
        count: u32,
    },
    Unbind(Slot),
}

impl Command {
    pub fn is_draw(&self) -> bool {
        matches!(self, Command::DrawMeshTasks { .. })
    }

    /// The slot a bind, address or unbind command affects.
    pub fn slot(&self) -> Option<Slot> {
        match self {
            Command::BindTableRange { slot, .. }
            | Command::SetAddressRange { slot, .. }
            | Command::Unbind(slot) => Some(*slot),
            _ => None,
        }
    }
}

/**
Records every command it receives.

A recorder can refuse direct addressing, to stand in for targets without device addresses,
and can be told to fail a specific command, to exercise error paths.
*/
#[derive(Debug, Clone, Default)]
pub struct Recorder {
    commands: Vec<Command>,
    no_direct_addressing: bool,
    fail_at: Option<usize>,
}

impl Recorder {
    /// A recorder that accepts every command, including address ranges.
    pub fn new() -> Self {
        Recorder::default()
    }

    pub fn without_direct_addressing() -> Self {
        Recorder {
            no_direct_addressing: true,
            ..Recorder::default()
        }
    }

    /// Fails the command at position `index` (counting from 0) instead of recording it.
    pub fn failing_at(mut self, index: usize) -> Self {
        self.fail_at = Some(index);
        self
    }

    pub fn commands(&self) -> &[Command] {
        &self.commands
    }

    pub fn take_commands(&mut self) -> Vec<Command> {
        std::mem::take(&mut self.commands)
    }

    pub fn draw_count(&self) -> usize {
        self.commands.iter().filter(|c| c.is_draw()).count()
    }

    fn record(&mut self, operation: &'static str, command: Command) -> Result<(), TargetError> {
        if self.fail_at == Some(self.commands.len()) {
            return Err(TargetError::Failed {
                operation,
                reason: format!("injected failure at command {}", self.commands.len()),
            });
        }
        self.commands.push(command);
        Ok(())
    }
}

impl CommandTarget for Recorder {
    fn supports_direct_addressing(&self) -> bool {
        !self.no_direct_addressing
    }

    fn use_program(&mut self, variant: ProgramVariant) -> Result<(), TargetError> {
        self.record("use_program", Command::UseProgram(variant))
    }

    fn bind_table_range(
        &mut self,
        slot: Slot,
        buffer: BufferHandle,
        offset: u64,
        size: u64,
    ) -> Result<(), TargetError> {
        self.record(
            "bind_table_range",
            Command::BindTableRange {
                slot,
                buffer,
                offset,
                size,
            },
        )
    }

    fn set_address_range(
        &mut self,
        slot: Slot,
        address: DeviceAddress,
        size: u64,
    ) -> Result<(), TargetError> {
        if self.no_direct_addressing {
            return Err(TargetError::Unsupported {
                operation: "set_address_range",
            });
        }
        self.record("set_address_range", Command::SetAddressRange { slot, address, size })
    }

    fn set_uniform(
        &mut self,
        location: UniformLocation,
        value: [u32; 4],
    ) -> Result<(), TargetError> {
        self.record("set_uniform", Command::SetUniform { location, value })
    }

    fn draw_mesh_tasks(&mut self, first: u32, count: u32) -> Result<(), TargetError> {
        self.record("draw_mesh_tasks", Command::DrawMeshTasks { first, count })
    }

    fn unbind(&mut self, slot: Slot) -> Result<(), TargetError> {
        self.record("unbind", Command::Unbind(slot))
    }
}
