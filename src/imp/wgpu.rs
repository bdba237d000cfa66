// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
/*!
A command target that records into a `wgpu::RenderPass`.

wgpu has no raw device addresses, so this target only supports the indexed-table mode.
Each [`Slot`] is a bind group at group index [`Slot::binding`] with a single buffer entry at
a dynamic offset; binding a table range sets that group with the range's offset. The uniform
slots use uniform buffers. The scene stats slot is a writable storage buffer and is optional.
Uniforms go through push constants. A mesh-task launch becomes an instanced draw with one
instance per work group, `vertices_per_group` vertices each; the programs pull vertex data
from the bound geometry record.
*/

use crate::bindings::slot::{Slot, UniformLocation};
use crate::draw_list::ProgramVariant;
use crate::error::TargetError;
use crate::imp::CommandTarget;
use crate::resources::{BufferHandle, DeviceAddress};
use wgpu::{BindGroupLayoutEntry, BindingType, BufferBindingType, PushConstantRange, ShaderStages};

const PUSH_CONSTANT_STAGES: ShaderStages = ShaderStages::VERTEX_FRAGMENT;

/// A bind group built over one table buffer, for one slot.
#[derive(Debug)]
pub struct SlotBinding {
    /// The table buffer the group was created over.
    pub buffer: BufferHandle,
    pub bind_group: wgpu::BindGroup,
    /// Binding size the group's layout declares. Every bound range must have this size.
    pub binding_size: u64,
}

impl SlotBinding {
    /// The layout entry the uniform slots' bind group layouts are created from.
    pub fn layout_entry(binding_size: u64) -> BindGroupLayoutEntry {
        Self::entry(BufferBindingType::Uniform, binding_size)
    }

    /// The layout entry for [`Slot::SceneStats`], which the programs write into.
    pub fn storage_layout_entry(binding_size: u64) -> BindGroupLayoutEntry {
        Self::entry(BufferBindingType::Storage { read_only: false }, binding_size)
    }

    fn entry(ty: BufferBindingType, binding_size: u64) -> BindGroupLayoutEntry {
        BindGroupLayoutEntry {
            binding: 0,
            visibility: ShaderStages::VERTEX_FRAGMENT,
            ty: BindingType::Buffer {
                ty,
                has_dynamic_offset: true,
                min_binding_size: wgpu::BufferSize::new(binding_size),
            },
            count: None,
        }
    }
}

/// Pipelines and bind groups a [`WgpuTarget`] draws with.
#[derive(Debug)]
pub struct WgpuBindings {
    pub mesh_pipeline: wgpu::RenderPipeline,
    pub mesh_task_pipeline: wgpu::RenderPipeline,
    pub scene_view: SlotBinding,
    pub object: SlotBinding,
    pub geometry: SlotBinding,
    /// Only needed when the resource tables carry a scene stats buffer.
    pub scene_stats: Option<SlotBinding>,
    /// Vertices emitted per launched work group.
    pub vertices_per_group: u32,
}

impl WgpuBindings {
    /// The push-constant range pipeline layouts must declare for the dispatcher's uniforms.
    pub fn push_constant_range() -> PushConstantRange {
        PushConstantRange {
            stages: PUSH_CONSTANT_STAGES,
            range: 0..UniformLocation::TaskRange.byte_offset() + 16,
        }
    }

    fn slot(&self, slot: Slot) -> Result<&SlotBinding, TargetError> {
        match slot {
            Slot::SceneView => Ok(&self.scene_view),
            Slot::Object => Ok(&self.object),
            Slot::Geometry => Ok(&self.geometry),
            Slot::SceneStats => self.scene_stats.as_ref().ok_or_else(|| TargetError::Rejected {
                operation: "bind_table_range",
                slot,
                reason: "no bind group for this slot".to_string(),
            }),
        }
    }
}

/// Replays commands into a render pass for the duration of one traversal.
pub struct WgpuTarget<'a, 'pass> {
    pass: &'a mut wgpu::RenderPass<'pass>,
    bindings: &'a WgpuBindings,
}

impl<'a, 'pass> WgpuTarget<'a, 'pass> {
    pub fn new(pass: &'a mut wgpu::RenderPass<'pass>, bindings: &'a WgpuBindings) -> Self {
        WgpuTarget { pass, bindings }
    }
}

impl CommandTarget for WgpuTarget<'_, '_> {
    fn supports_direct_addressing(&self) -> bool {
        false
    }

    fn use_program(&mut self, variant: ProgramVariant) -> Result<(), TargetError> {
        let pipeline = match variant {
            ProgramVariant::Mesh => &self.bindings.mesh_pipeline,
            ProgramVariant::MeshTask => &self.bindings.mesh_task_pipeline,
        };
        self.pass.set_pipeline(pipeline);
        Ok(())
    }

    fn bind_table_range(
        &mut self,
        slot: Slot,
        buffer: BufferHandle,
        offset: u64,
        size: u64,
    ) -> Result<(), TargetError> {
        let binding = self.bindings.slot(slot)?;
        if binding.buffer != buffer {
            return Err(TargetError::Rejected {
                operation: "bind_table_range",
                slot,
                reason: format!("bind group was built over {:?}, not {:?}", binding.buffer, buffer),
            });
        }
        if binding.binding_size != size {
            return Err(TargetError::Rejected {
                operation: "bind_table_range",
                slot,
                reason: format!(
                    "range size {} does not match binding size {}",
                    size, binding.binding_size
                ),
            });
        }
        let dynamic_offset = u32::try_from(offset).map_err(|_| TargetError::Rejected {
            operation: "bind_table_range",
            slot,
            reason: format!("offset {offset} does not fit a dynamic offset"),
        })?;
        self.pass
            .set_bind_group(slot.binding(), &binding.bind_group, &[dynamic_offset]);
        Ok(())
    }

    fn set_address_range(
        &mut self,
        _slot: Slot,
        _address: DeviceAddress,
        _size: u64,
    ) -> Result<(), TargetError> {
        Err(TargetError::Unsupported {
            operation: "set_address_range",
        })
    }

    fn set_uniform(
        &mut self,
        location: UniformLocation,
        value: [u32; 4],
    ) -> Result<(), TargetError> {
        let mut bytes = [0u8; 16];
        for (chunk, v) in bytes.chunks_exact_mut(4).zip(value) {
            chunk.copy_from_slice(&v.to_ne_bytes());
        }
        self.pass
            .set_push_constants(PUSH_CONSTANT_STAGES, location.byte_offset(), &bytes);
        Ok(())
    }

    fn draw_mesh_tasks(&mut self, first: u32, count: u32) -> Result<(), TargetError> {
        let end = first.checked_add(count).ok_or_else(|| TargetError::Failed {
            operation: "draw_mesh_tasks",
            reason: format!("launch {first}+{count} overflows"),
        })?;
        self.pass.draw(0..self.bindings.vertices_per_group, first..end);
        Ok(())
    }

    fn unbind(&mut self, _slot: Slot) -> Result<(), TargetError> {
        //bind groups set on a pass do not outlive it
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slot_layout_uses_dynamic_uniform_offsets() {
        let entry = SlotBinding::layout_entry(64);
        assert_eq!(entry.binding, 0);
        assert_eq!(entry.visibility, ShaderStages::VERTEX_FRAGMENT);
        assert_eq!(entry.count, None);
        match entry.ty {
            BindingType::Buffer {
                ty,
                has_dynamic_offset,
                min_binding_size,
            } => {
                assert_eq!(ty, BufferBindingType::Uniform);
                assert!(has_dynamic_offset);
                assert_eq!(min_binding_size.map(|s| s.get()), Some(64));
            }
            other => panic!("unexpected binding type {other:?}"),
        }
    }

    #[test]
    fn scene_stats_layout_is_writable_storage() {
        let entry = SlotBinding::storage_layout_entry(48);
        assert!(matches!(
            entry.ty,
            BindingType::Buffer {
                ty: BufferBindingType::Storage { read_only: false },
                has_dynamic_offset: true,
                ..
            }
        ));
    }

    #[test]
    fn push_constants_cover_both_uniforms() {
        let range = WgpuBindings::push_constant_range();
        assert_eq!(range.stages, PUSH_CONSTANT_STAGES);
        assert_eq!(range.range, 0..32);
        assert!(range.range.contains(&UniformLocation::GeometryOffsets.byte_offset()));
        assert!(range.range.contains(&UniformLocation::TaskRange.byte_offset()));
    }
}
