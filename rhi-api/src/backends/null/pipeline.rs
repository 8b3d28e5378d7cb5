use super::{next_null_object_id, RhiDeviceContextNull, SPIRV_MAGIC_NUMBER};
use crate::{
    RhiGraphicsPipelineDef, RhiPipelineStage, RhiPrimitiveTopology, RhiResult,
    RhiShaderStageFlags,
};

/// Checks what a SPIR-V consumer would reject before parsing: word alignment and the magic number
pub fn validate_spirv(bytecode: &[u8]) -> Result<(), String> {
    if bytecode.len() % 4 != 0 || bytecode.len() < 20 {
        return Err(format!(
            "SPIR-V must be a whole number of words with a 5 word header, got {} bytes",
            bytecode.len()
        ));
    }

    let magic = u32::from_le_bytes([bytecode[0], bytecode[1], bytecode[2], bytecode[3]]);
    if magic != SPIRV_MAGIC_NUMBER {
        return Err(format!("bad SPIR-V magic number {:#010x}", magic));
    }

    Ok(())
}

#[derive(Debug)]
pub struct RhiPipelineNull {
    device_context: RhiDeviceContextNull,
    pipeline_id: u64,
    pipeline_layout_id: u64,
    shader_stages: RhiShaderStageFlags,
    primitive_topology: RhiPrimitiveTopology,
    vertex_buffer_strides: Vec<u32>,
}

impl RhiPipelineNull {
    pub fn new(
        device_context: &RhiDeviceContextNull,
        pipeline_def: &RhiGraphicsPipelineDef,
    ) -> RhiResult<Self> {
        for &stage in RhiPipelineStage::CONSTRUCTION_ORDER.iter() {
            pipeline_def.validate_stage(stage)?;

            match stage {
                RhiPipelineStage::ShaderStages => {
                    for stage_def in &pipeline_def.shader.shader_def().stages {
                        validate_spirv(&stage_def.bytecode).map_err(|reason| {
                            stage.error(format!("{:?}: {}", stage_def.shader_stage, reason))
                        })?;
                    }
                }
                RhiPipelineStage::VertexInput => {
                    let max_attributes = device_context.device_info().max_vertex_attribute_count;
                    if pipeline_def.vertex_layout.attributes.len() > max_attributes as usize {
                        return Err(stage.error(format!(
                            "{} vertex attributes exceeds the device limit of {}",
                            pipeline_def.vertex_layout.attributes.len(),
                            max_attributes
                        )));
                    }
                }
                _ => {}
            }
        }

        let pipeline_id = next_null_object_id();
        let pipeline_layout_id = next_null_object_id();
        log::trace!(
            "Created null pipeline {} with layout {}",
            pipeline_id,
            pipeline_layout_id
        );

        Ok(RhiPipelineNull {
            device_context: device_context.clone(),
            pipeline_id,
            pipeline_layout_id,
            shader_stages: pipeline_def.shader.shader_def().stage_flags(),
            primitive_topology: pipeline_def.primitive_topology,
            vertex_buffer_strides: pipeline_def
                .vertex_layout
                .buffers
                .iter()
                .map(|x| x.stride)
                .collect(),
        })
    }

    /// Replaces this pipeline only if the new one is fully built
    pub(crate) fn rebuild(
        &mut self,
        pipeline_def: &RhiGraphicsPipelineDef,
    ) -> RhiResult<()> {
        let rebuilt = RhiPipelineNull::new(&self.device_context, pipeline_def)?;
        *self = rebuilt;
        Ok(())
    }

    pub fn pipeline_id(&self) -> u64 {
        self.pipeline_id
    }

    pub fn pipeline_layout_id(&self) -> u64 {
        self.pipeline_layout_id
    }

    pub fn shader_stages(&self) -> RhiShaderStageFlags {
        self.shader_stages
    }

    pub fn primitive_topology(&self) -> RhiPrimitiveTopology {
        self.primitive_topology
    }

    pub fn vertex_buffer_strides(&self) -> &[u32] {
        &self.vertex_buffer_strides
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spirv_header_checks() {
        let mut module = SPIRV_MAGIC_NUMBER.to_le_bytes().to_vec();
        module.extend_from_slice(&[0; 16]);
        assert!(validate_spirv(&module).is_ok());

        module.push(0);
        assert!(validate_spirv(&module).is_err());

        let bad_magic = vec![0xAB; 20];
        assert!(validate_spirv(&bad_magic).is_err());
    }
}
