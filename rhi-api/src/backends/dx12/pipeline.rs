use super::internal::{conversions, d3d, d3d12, dxgi};
use super::RhiDeviceContextDx12;
use crate::{
    RhiError, RhiGraphicsPipelineDef, RhiPipelineLayoutDef, RhiPipelineStage, RhiResourceKind,
    RhiResourceType, RhiResult, RhiShaderDef, RhiShaderStageFlags, RhiVertexAttributeRate,
    RhiVertexLayout, MAX_DESCRIPTOR_SETS, MAX_RENDER_TARGET_ATTACHMENTS,
    MAX_VERTEX_INPUT_BINDINGS,
};
use std::ffi::CString;
use windows::core::Interface;

/// Push constants are root constants at register b0 in the space after the last descriptor set
pub const PUSH_CONSTANT_REGISTER_SPACE: u32 = MAX_DESCRIPTOR_SETS as u32;

const DXBC_MAGIC: &[u8; 4] = b"DXBC";

// "TEXCOORD1" -> ("TEXCOORD", 1)
fn split_hlsl_semantic(semantic: &str) -> Option<(&str, u32)> {
    let name = semantic.trim_end_matches(|c: char| c.is_ascii_digit());
    if name.is_empty() {
        return None;
    }

    let index = &semantic[name.len()..];
    if index.is_empty() {
        Some((name, 0))
    } else {
        index.parse::<u32>().ok().map(|index| (name, index))
    }
}

fn shader_bytecode(
    shader_def: &RhiShaderDef,
    shader_stage: RhiShaderStageFlags,
) -> RhiResult<Option<d3d12::D3D12_SHADER_BYTECODE>> {
    let stage = RhiPipelineStage::ShaderStages;
    let stage_def = match shader_def
        .stages
        .iter()
        .find(|x| x.shader_stage.intersects(shader_stage))
    {
        Some(stage_def) => stage_def,
        None => return Ok(None),
    };

    if !stage_def.bytecode.starts_with(DXBC_MAGIC) {
        return Err(stage.error(format!(
            "{:?}: bytecode is not a DXBC/DXIL container",
            stage_def.shader_stage
        )));
    }

    Ok(Some(d3d12::D3D12_SHADER_BYTECODE {
        pShaderBytecode: stage_def.bytecode.as_ptr() as *const std::ffi::c_void,
        BytecodeLength: stage_def.bytecode.len(),
    }))
}

// The returned elements point into `semantic_names`, which must outlive them
fn create_input_elements(
    vertex_layout: &RhiVertexLayout,
    semantic_names: &mut Vec<CString>,
) -> RhiResult<Vec<d3d12::D3D12_INPUT_ELEMENT_DESC>> {
    let stage = RhiPipelineStage::VertexInput;
    let mut input_elements = Vec::with_capacity(vertex_layout.attributes.len());

    for vertex_attribute in &vertex_layout.attributes {
        let (semantic_name, semantic_index) = split_hlsl_semantic(&vertex_attribute.hlsl_semantic)
            .ok_or_else(|| {
                stage.error(format!(
                    "attribute at location {} has invalid hlsl semantic {:?}",
                    vertex_attribute.location, vertex_attribute.hlsl_semantic
                ))
            })?;

        let semantic_name = CString::new(semantic_name).map_err(|_| {
            stage.error(format!(
                "hlsl semantic {:?} contains a nul byte",
                vertex_attribute.hlsl_semantic
            ))
        })?;

        // CString contents don't move when the vec grows
        let semantic_name_ptr = semantic_name.as_ptr();
        semantic_names.push(semantic_name);

        let rate = vertex_layout.buffers[vertex_attribute.buffer_index as usize].rate;
        input_elements.push(d3d12::D3D12_INPUT_ELEMENT_DESC {
            SemanticName: windows::core::PCSTR::from_raw(semantic_name_ptr as *const u8),
            SemanticIndex: semantic_index,
            Format: vertex_attribute.format.into(),
            InputSlot: vertex_attribute.buffer_index,
            AlignedByteOffset: vertex_attribute.byte_offset,
            InputSlotClass: rate.into(),
            InstanceDataStepRate: match rate {
                RhiVertexAttributeRate::Vertex => 0,
                RhiVertexAttributeRate::Instance => 1,
            },
        });
    }

    Ok(input_elements)
}

fn descriptor_range(
    range_type: d3d12::D3D12_DESCRIPTOR_RANGE_TYPE,
    register: u32,
    register_space: u32,
    count: u32,
) -> d3d12::D3D12_DESCRIPTOR_RANGE1 {
    d3d12::D3D12_DESCRIPTOR_RANGE1 {
        RangeType: range_type,
        NumDescriptors: count,
        BaseShaderRegister: register,
        RegisterSpace: register_space,
        Flags: d3d12::D3D12_DESCRIPTOR_RANGE_FLAG_NONE,
        OffsetInDescriptorsFromTableStart: d3d12::D3D12_DESCRIPTOR_RANGE_OFFSET_APPEND,
    }
}

// One descriptor table per set for views and one for samplers, since samplers live in their
// own heap. Set N uses register space N.
fn create_root_signature(
    device: &d3d12::ID3D12Device,
    layout_def: &RhiPipelineLayoutDef,
) -> RhiResult<d3d12::ID3D12RootSignature> {
    let stage = RhiPipelineStage::Layout;

    // (ranges, visibility) per table. Filled completely before any pointer into it is taken.
    let mut tables: Vec<(Vec<d3d12::D3D12_DESCRIPTOR_RANGE1>, RhiShaderStageFlags)> = vec![];
    for set_index in 0..layout_def.set_count() {
        let mut view_ranges = vec![];
        let mut view_stages = RhiShaderStageFlags::empty();
        let mut sampler_ranges = vec![];
        let mut sampler_stages = RhiShaderStageFlags::empty();

        for binding in &layout_def.bindings {
            if binding.set_index as usize != set_index {
                continue;
            }

            let range_type = conversions::resource_type_descriptor_range_type(
                binding.resource_type,
            )
            .ok_or_else(|| {
                stage.error(format!(
                    "binding {}:{} has unbindable resource type {:?}",
                    binding.set_index, binding.binding, binding.resource_type
                ))
            })?;

            let range = descriptor_range(
                range_type,
                binding.binding,
                binding.set_index,
                binding.element_count,
            );

            if binding.resource_type == RhiResourceType::SAMPLER {
                sampler_ranges.push(range);
                sampler_stages |= binding.stage_flags;
            } else {
                view_ranges.push(range);
                view_stages |= binding.stage_flags;
            }
        }

        if !view_ranges.is_empty() {
            tables.push((view_ranges, view_stages));
        }

        if !sampler_ranges.is_empty() {
            tables.push((sampler_ranges, sampler_stages));
        }
    }

    let mut root_params = Vec::with_capacity(tables.len() + 1);
    for (ranges, stages) in &tables {
        let mut root_param = d3d12::D3D12_ROOT_PARAMETER1 {
            ParameterType: d3d12::D3D12_ROOT_PARAMETER_TYPE_DESCRIPTOR_TABLE,
            ShaderVisibility: (*stages).into(),
            ..Default::default()
        };
        root_param.Anonymous.DescriptorTable = d3d12::D3D12_ROOT_DESCRIPTOR_TABLE1 {
            NumDescriptorRanges: ranges.len() as u32,
            pDescriptorRanges: ranges.as_ptr(),
        };
        root_params.push(root_param);
    }

    if layout_def.push_constant_size > 0 {
        let mut root_param = d3d12::D3D12_ROOT_PARAMETER1 {
            ParameterType: d3d12::D3D12_ROOT_PARAMETER_TYPE_32BIT_CONSTANTS,
            ShaderVisibility: layout_def.push_constant_stages.into(),
            ..Default::default()
        };
        root_param.Anonymous.Constants = d3d12::D3D12_ROOT_CONSTANTS {
            ShaderRegister: 0,
            RegisterSpace: PUSH_CONSTANT_REGISTER_SPACE,
            Num32BitValues: rhi_base::memory::round_size_up_to_alignment_u32(
                layout_def.push_constant_size,
                4,
            ) / 4,
        };
        root_params.push(root_param);
    }

    let mut root_sig_desc = d3d12::D3D12_VERSIONED_ROOT_SIGNATURE_DESC {
        Version: d3d12::D3D_ROOT_SIGNATURE_VERSION_1_1,
        ..Default::default()
    };
    root_sig_desc.Anonymous.Desc_1_1 = d3d12::D3D12_ROOT_SIGNATURE_DESC1 {
        NumParameters: root_params.len() as u32,
        pParameters: if root_params.is_empty() {
            std::ptr::null()
        } else {
            root_params.as_ptr()
        },
        NumStaticSamplers: 0,
        pStaticSamplers: std::ptr::null(),
        Flags: d3d12::D3D12_ROOT_SIGNATURE_FLAG_ALLOW_INPUT_ASSEMBLER_INPUT_LAYOUT,
    };

    let mut root_sig_blob: Option<d3d::ID3DBlob> = None;
    let mut root_sig_error: Option<d3d::ID3DBlob> = None;
    unsafe {
        let result = d3d12::D3D12SerializeVersionedRootSignature(
            &root_sig_desc,
            &mut root_sig_blob,
            Some(&mut root_sig_error),
        );

        if let Some(root_sig_error) = &root_sig_error {
            let message = std::slice::from_raw_parts(
                root_sig_error.GetBufferPointer() as *const u8,
                root_sig_error.GetBufferSize(),
            );
            return Err(stage.error(format!(
                "root signature serialization failed: {}",
                String::from_utf8_lossy(message)
            )));
        }

        result.map_err(|e| stage.error(e.to_string()))?;

        let root_sig_blob =
            root_sig_blob.ok_or_else(|| stage.error("root signature serialized to nothing"))?;
        let root_sig_bytes = std::slice::from_raw_parts(
            root_sig_blob.GetBufferPointer() as *const u8,
            root_sig_blob.GetBufferSize(),
        );

        device
            .CreateRootSignature(0, root_sig_bytes)
            .map_err(|e| stage.error(e.to_string()))
    }
}

/// A graphics pipeline state with the root signature it was built against. Topology and vertex
/// strides are kept here because D3D12 sets them on the command list rather than the PSO.
#[derive(Debug)]
pub struct RhiPipelineDx12 {
    device_context: RhiDeviceContextDx12,
    root_signature: d3d12::ID3D12RootSignature,
    pipeline: d3d12::ID3D12PipelineState,
    topology: d3d::D3D_PRIMITIVE_TOPOLOGY,
    vertex_buffer_strides: [u32; MAX_VERTEX_INPUT_BINDINGS],
}

// D3D12 pipeline state and root signature objects are free-threaded
unsafe impl Send for RhiPipelineDx12 {}
unsafe impl Sync for RhiPipelineDx12 {}

impl RhiPipelineDx12 {
    pub fn dx12_root_signature(&self) -> &d3d12::ID3D12RootSignature {
        &self.root_signature
    }

    pub fn dx12_pipeline_state(&self) -> &d3d12::ID3D12PipelineState {
        &self.pipeline
    }

    pub fn topology(&self) -> d3d::D3D_PRIMITIVE_TOPOLOGY {
        self.topology
    }

    pub fn vertex_buffer_strides(&self) -> &[u32; MAX_VERTEX_INPUT_BINDINGS] {
        &self.vertex_buffer_strides
    }

    pub fn pipeline_id(&self) -> u64 {
        self.pipeline.as_raw() as u64
    }

    pub fn pipeline_layout_id(&self) -> u64 {
        self.root_signature.as_raw() as u64
    }

    pub fn new(
        device_context: &RhiDeviceContextDx12,
        pipeline_def: &RhiGraphicsPipelineDef,
    ) -> RhiResult<Self> {
        let device = device_context.d3d12_device();
        let render_pass_def = pipeline_def.render_pass.render_pass_def();
        let shader_def = pipeline_def.shader.shader_def();

        let mut vs_bytecode = None;
        let mut ps_bytecode = None;
        let mut semantic_names = vec![];
        let mut input_elements = vec![];
        let mut root_signature = None;

        for &stage in RhiPipelineStage::CONSTRUCTION_ORDER.iter() {
            pipeline_def.validate_stage(stage)?;

            match stage {
                RhiPipelineStage::ShaderStages => {
                    vs_bytecode = shader_bytecode(shader_def, RhiShaderStageFlags::VERTEX)?;
                    ps_bytecode = shader_bytecode(shader_def, RhiShaderStageFlags::FRAGMENT)?;
                }
                RhiPipelineStage::VertexInput => {
                    let max_attributes = device_context.device_info().max_vertex_attribute_count;
                    let attribute_count = pipeline_def.vertex_layout.attributes.len();
                    if attribute_count > max_attributes as usize {
                        return Err(stage.error(format!(
                            "{} vertex attributes exceeds the device limit of {}",
                            attribute_count, max_attributes
                        )));
                    }

                    input_elements =
                        create_input_elements(pipeline_def.vertex_layout, &mut semantic_names)?;
                }
                RhiPipelineStage::Layout => {
                    root_signature = Some(create_root_signature(device, pipeline_def.layout)?);
                }
                _ => {}
            }
        }

        let root_signature = root_signature
            .ok_or_else(|| RhiPipelineStage::Layout.error("root signature was not created"))?;

        let mut vertex_buffer_strides = [0; MAX_VERTEX_INPUT_BINDINGS];
        for (i, vertex_buffer) in pipeline_def.vertex_layout.buffers.iter().enumerate() {
            vertex_buffer_strides[i] = vertex_buffer.stride;
        }

        let input_layout_desc = if input_elements.is_empty() {
            d3d12::D3D12_INPUT_LAYOUT_DESC::default()
        } else {
            d3d12::D3D12_INPUT_LAYOUT_DESC {
                pInputElementDescs: input_elements.as_ptr(),
                NumElements: input_elements.len() as u32,
            }
        };

        let render_target_count = render_pass_def
            .color_attachment_count()
            .min(MAX_RENDER_TARGET_ATTACHMENTS);
        let mut rtv_formats = [dxgi::Common::DXGI_FORMAT_UNKNOWN; MAX_RENDER_TARGET_ATTACHMENTS];
        for (i, color_attachment) in render_pass_def
            .color_attachments
            .iter()
            .take(render_target_count)
            .enumerate()
        {
            rtv_formats[i] = color_attachment.format.into();
        }

        let pipeline_state_desc = d3d12::D3D12_GRAPHICS_PIPELINE_STATE_DESC {
            pRootSignature: ::windows::core::ManuallyDrop::new(&root_signature),
            VS: vs_bytecode.unwrap_or_default(),
            PS: ps_bytecode.unwrap_or_default(),
            DS: Default::default(),
            HS: Default::default(),
            GS: Default::default(),
            StreamOutput: Default::default(),
            BlendState: conversions::blend_state_blend_desc(
                pipeline_def.blend_state,
                render_target_count,
            ),
            SampleMask: u32::MAX,
            RasterizerState: conversions::rasterizer_state_rasterizer_desc(
                pipeline_def.rasterizer_state,
            ),
            DepthStencilState: conversions::depth_state_depth_stencil_desc(
                pipeline_def.depth_state,
            ),
            InputLayout: input_layout_desc,
            IBStripCutValue: d3d12::D3D12_INDEX_BUFFER_STRIP_CUT_VALUE_DISABLED,
            PrimitiveTopologyType: pipeline_def.primitive_topology.into(),
            NumRenderTargets: render_target_count as u32,
            RTVFormats: rtv_formats,
            DSVFormat: render_pass_def
                .depth_stencil_format()
                .map(|x| x.into())
                .unwrap_or(dxgi::Common::DXGI_FORMAT_UNKNOWN),
            SampleDesc: pipeline_def.sample_count.into(),
            NodeMask: 0,
            CachedPSO: Default::default(),
            Flags: d3d12::D3D12_PIPELINE_STATE_FLAG_NONE,
        };

        let pipeline: d3d12::ID3D12PipelineState =
            unsafe { device.CreateGraphicsPipelineState(&pipeline_state_desc) }.map_err(|e| {
                RhiError::resource_creation(
                    RhiResourceKind::Pipeline,
                    format!("CreateGraphicsPipelineState failed: {}", e),
                )
            })?;

        log::trace!(
            "Created dx12 pipeline {:?} with root signature {:?}",
            pipeline,
            root_signature
        );

        Ok(RhiPipelineDx12 {
            device_context: device_context.clone(),
            root_signature,
            pipeline,
            topology: pipeline_def.primitive_topology.into(),
            vertex_buffer_strides,
        })
    }

    /// Replaces this pipeline only if the new one is fully built
    pub(crate) fn rebuild(
        &mut self,
        pipeline_def: &RhiGraphicsPipelineDef,
    ) -> RhiResult<()> {
        let rebuilt = RhiPipelineDx12::new(&self.device_context, pipeline_def)?;
        *self = rebuilt;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hlsl_semantics_split_trailing_index() {
        assert_eq!(split_hlsl_semantic("POSITION"), Some(("POSITION", 0)));
        assert_eq!(split_hlsl_semantic("TEXCOORD1"), Some(("TEXCOORD", 1)));
        assert_eq!(split_hlsl_semantic("COLOR12"), Some(("COLOR", 12)));
        assert_eq!(split_hlsl_semantic("123"), None);
        assert_eq!(split_hlsl_semantic(""), None);
    }
}
