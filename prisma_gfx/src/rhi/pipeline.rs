/// GraphicsPipeline - compiled shader stages plus vertex-input layout
///
/// Realized as one driver program object plus one cached vertex-array
/// configuration. Immutable after successful creation; to change shaders or
/// vertex layout, destroy and reconstruct.

use std::cell::RefCell;
use std::rc::Rc;

use crate::error::{Error, Result};
use crate::gfx_error;
use crate::rhi::{
    DescriptorSetLayoutInfo, Driver, ProgramHandle, ShaderModule, ShaderStage,
    VertexArrayHandle,
};

/// Primitive topology
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrimitiveTopology {
    /// Triangle list
    TriangleList,
    /// Triangle strip
    TriangleStrip,
    /// Line list
    LineList,
    /// Point list
    PointList,
}

/// Index buffer element type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexType {
    /// 16-bit indices (max 65535 vertices)
    U16,
    /// 32-bit indices (max ~4 billion vertices)
    U32,
}

impl IndexType {
    /// Size in bytes of one index element
    pub fn size_bytes(&self) -> u32 {
        match self {
            IndexType::U16 => 2,
            IndexType::U32 => 4,
        }
    }
}

/// Scalar type of one vertex attribute component
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScalarType {
    /// 32-bit float
    F32,
    /// 32-bit unsigned integer
    U32,
    /// 16-bit unsigned integer
    U16,
    /// 8-bit unsigned integer
    U8,
}

/// Vertex attribute description
#[derive(Debug, Clone, Copy)]
pub struct VertexInputAttribute {
    /// Attribute location in the shader
    pub location: u32,
    /// Vertex-buffer binding slot the attribute reads from
    pub binding: u32,
    /// Number of components (1-4)
    pub components: u32,
    /// Scalar type of each component
    pub scalar: ScalarType,
    /// Whether integer components are normalized to [0, 1]
    pub normalized: bool,
    /// Offset in bytes within the vertex record
    pub offset: u32,
}

/// Vertex-buffer binding description
#[derive(Debug, Clone, Copy)]
pub struct VertexInputBinding {
    /// Binding slot index
    pub binding: u32,
    /// Stride in bytes between consecutive vertex records
    pub stride: u32,
}

/// How a buffer's bytes decompose into per-vertex attributes
#[derive(Debug, Clone, Default)]
pub struct VertexInputDescription {
    /// Vertex-buffer bindings
    pub bindings: Vec<VertexInputBinding>,
    /// Vertex attributes; each must reference a declared binding
    pub attributes: Vec<VertexInputAttribute>,
}

/// Descriptor for creating a graphics pipeline
#[derive(Debug, Clone)]
pub struct GraphicsPipelineDesc {
    /// Vertex shader source text (loaded by the caller's file collaborator)
    pub vertex_source: String,
    /// Fragment shader source text
    pub fragment_source: String,
    /// Vertex input layout
    pub vertex_input: VertexInputDescription,
    /// Resource layout the shader program expects; descriptor sets bound with
    /// this pipeline are checked against it
    pub descriptor_layout: DescriptorSetLayoutInfo,
}

/// Creation state of a pipeline
enum PipelineState {
    /// `create()` not called yet
    Pending,
    /// Created successfully; immutable from here on
    Created {
        program: ProgramHandle,
        vertex_array: VertexArrayHandle,
    },
    /// Creation failed; the pipeline is permanently unusable
    Failed,
}

/// Immutable draw configuration
///
/// `create()` compiles both stages, links one program and builds the
/// vertex-array configuration, exactly once. A second `create()` after
/// success is a no-op returning success (nothing is recompiled or leaked);
/// after a failure it keeps returning the failure.
pub struct GraphicsPipeline {
    driver: Rc<dyn Driver>,
    desc: GraphicsPipelineDesc,
    state: RefCell<PipelineState>,
}

impl GraphicsPipeline {
    /// Construct a pipeline from its description (no driver work yet)
    pub fn new(driver: Rc<dyn Driver>, desc: GraphicsPipelineDesc) -> Rc<Self> {
        Rc::new(Self {
            driver,
            desc,
            state: RefCell::new(PipelineState::Pending),
        })
    }

    /// Compile, link and build the vertex-array configuration
    pub fn create(&self) -> Result<()> {
        match *self.state.borrow() {
            PipelineState::Created { .. } => return Ok(()),
            PipelineState::Failed => {
                return Err(Error::InvalidOperation(
                    "pipeline creation already failed permanently".to_string(),
                ));
            }
            PipelineState::Pending => {}
        }

        match self.create_inner() {
            Ok((program, vertex_array)) => {
                *self.state.borrow_mut() = PipelineState::Created {
                    program,
                    vertex_array,
                };
                Ok(())
            }
            Err(e) => {
                *self.state.borrow_mut() = PipelineState::Failed;
                Err(e)
            }
        }
    }

    fn create_inner(&self) -> Result<(ProgramHandle, VertexArrayHandle)> {
        // Every attribute must reference a declared vertex-buffer binding
        for attribute in &self.desc.vertex_input.attributes {
            let declared = self
                .desc
                .vertex_input
                .bindings
                .iter()
                .any(|b| b.binding == attribute.binding);
            if !declared {
                gfx_error!(
                    "prisma::pipeline",
                    "attribute at location {} references undeclared vertex binding {}",
                    attribute.location,
                    attribute.binding
                );
                return Err(Error::InvalidResource(format!(
                    "vertex attribute location {} references undeclared binding {}",
                    attribute.location, attribute.binding
                )));
            }
        }

        // Stage compilation; modules are only needed until the link below
        let vertex = ShaderModule::compile(
            self.driver.clone(),
            ShaderStage::Vertex,
            &self.desc.vertex_source,
        )?;
        let fragment = ShaderModule::compile(
            self.driver.clone(),
            ShaderStage::Fragment,
            &self.desc.fragment_source,
        )?;

        let program = self.driver.create_program();
        if let Err(link_log) = self
            .driver
            .link_program(program, &[vertex.handle(), fragment.handle()])
        {
            gfx_error!(
                "prisma::pipeline",
                "program {} failed to link:\n{}",
                program,
                link_log
            );
            self.driver.destroy_program(program);
            return Err(Error::ProgramLinkFailed(format!(
                "program {}: {}",
                program, link_log
            )));
        }

        let vertex_array = self.driver.create_vertex_array();
        for attribute in &self.desc.vertex_input.attributes {
            self.driver
                .configure_vertex_attribute(vertex_array, attribute);
        }

        Ok((program, vertex_array))
    }

    /// Whether `create()` has succeeded
    pub fn is_created(&self) -> bool {
        matches!(*self.state.borrow(), PipelineState::Created { .. })
    }

    /// Resource layout the program expects
    pub fn descriptor_layout(&self) -> &DescriptorSetLayoutInfo {
        &self.desc.descriptor_layout
    }

    /// Linked program handle, if created
    pub(crate) fn program(&self) -> Option<ProgramHandle> {
        match *self.state.borrow() {
            PipelineState::Created { program, .. } => Some(program),
            _ => None,
        }
    }

    /// Vertex array handle, if created
    pub(crate) fn vertex_array(&self) -> Option<VertexArrayHandle> {
        match *self.state.borrow() {
            PipelineState::Created { vertex_array, .. } => Some(vertex_array),
            _ => None,
        }
    }

    /// Stride of a declared vertex-buffer binding slot
    pub(crate) fn binding_stride(&self, slot: u32) -> Option<u32> {
        self.desc
            .vertex_input
            .bindings
            .iter()
            .find(|b| b.binding == slot)
            .map(|b| b.stride)
    }
}

impl Drop for GraphicsPipeline {
    fn drop(&mut self) {
        if let PipelineState::Created {
            program,
            vertex_array,
        } = *self.state.borrow()
        {
            self.driver.destroy_program(program);
            self.driver.destroy_vertex_array(vertex_array);
        }
    }
}

#[cfg(test)]
#[path = "pipeline_tests.rs"]
mod tests;
