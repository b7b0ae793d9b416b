/// CommandBuffer - the translation core
///
/// Converts a small declarative vocabulary (render-pass begin/end, bind
/// pipeline, bind descriptor set, bind vertex/index buffer, draw indexed)
/// into the ordered sequence of global-state mutations the driver context
/// expects. The driver has no command buffers, descriptor sets or pipeline
/// objects — only global "current" bindings that every draw implicitly
/// reads — so every call here executes immediately. Recording and execution
/// are the same instant; the explicit-API surface exists for the caller's
/// structural clarity, not for deferred submission or reordering.

use std::rc::Rc;

use crate::error::{Error, Result};
use crate::gfx_bail;
use crate::rhi::{
    Buffer, ClearValue, DescriptorSet, Driver, GraphicsPipeline, IndexType, LoadOp,
    PrimitiveTopology, RenderPassInfo,
};

/// Transient per-frame command recorder
///
/// All binds and draws are valid only between `begin_render_pass` and
/// `end_render_pass`. The recorder holds no ownership: pipeline and buffer
/// references are transient and dropped when the render pass ends.
pub struct CommandBuffer {
    driver: Rc<dyn Driver>,
    inside_render_pass: bool,
    pipeline: Option<Rc<GraphicsPipeline>>,
}

impl CommandBuffer {
    /// Create a recorder, outside any render pass
    pub fn new(driver: Rc<dyn Driver>) -> Self {
        Self {
            driver,
            inside_render_pass: false,
            pipeline: None,
        }
    }

    /// Begin a render pass
    ///
    /// For each attachment with load-op `Clear`, issues the clear of that
    /// target before any drawing; `Preserve` attachments issue nothing.
    pub fn begin_render_pass(&mut self, info: &RenderPassInfo) -> Result<()> {
        if self.inside_render_pass {
            gfx_bail!(
                "prisma::command_buffer",
                "begin_render_pass called while already inside a render pass"
            );
        }

        if let Some(color) = &info.color {
            if color.load_op == LoadOp::Clear {
                match color.clear_value {
                    ClearValue::Color(value) => self.driver.clear_color_target(value),
                    ClearValue::DepthStencil { .. } => {
                        return Err(Error::InvalidResource(
                            "color attachment carries a depth/stencil clear value".to_string(),
                        ));
                    }
                }
            }
        }
        if let Some(depth_stencil) = &info.depth_stencil {
            if depth_stencil.load_op == LoadOp::Clear {
                match depth_stencil.clear_value {
                    ClearValue::DepthStencil { depth, stencil } => {
                        self.driver.clear_depth_stencil_target(depth, stencil)
                    }
                    ClearValue::Color(_) => {
                        return Err(Error::InvalidResource(
                            "depth/stencil attachment carries a color clear value".to_string(),
                        ));
                    }
                }
            }
        }

        self.inside_render_pass = true;
        Ok(())
    }

    /// End the current render pass
    ///
    /// Issues no driver calls by itself; presentation is the windowing
    /// collaborator's buffer swap. Transient bindings are reset.
    pub fn end_render_pass(&mut self) -> Result<()> {
        if !self.inside_render_pass {
            gfx_bail!(
                "prisma::command_buffer",
                "end_render_pass called outside a render pass"
            );
        }
        self.inside_render_pass = false;
        self.pipeline = None;
        Ok(())
    }

    /// Bind a graphics pipeline
    ///
    /// Applied eagerly: the pipeline's program and vertex-array configuration
    /// become current on the driver immediately, because the underlying state
    /// is global and must be correct before the next draw.
    pub fn bind_graphics_pipeline(&mut self, pipeline: &Rc<GraphicsPipeline>) -> Result<()> {
        if !self.inside_render_pass {
            gfx_bail!(
                "prisma::command_buffer",
                "bind_graphics_pipeline called outside a render pass"
            );
        }
        let (Some(program), Some(vertex_array)) = (pipeline.program(), pipeline.vertex_array())
        else {
            gfx_bail!(
                "prisma::command_buffer",
                "bind_graphics_pipeline called with a pipeline that was never created"
            );
        };

        self.driver.bind_program(program);
        self.driver.bind_vertex_array(vertex_array);
        self.pipeline = Some(pipeline.clone());
        Ok(())
    }

    /// Bind a descriptor set against the currently bound pipeline
    ///
    /// The set's layout must be compatible with the layout the pipeline
    /// declares (same binding indices and kinds). Every slot with a bound
    /// resource issues one uniform-buffer-range bind.
    pub fn bind_descriptor_set(&mut self, set: &DescriptorSet) -> Result<()> {
        if !self.inside_render_pass {
            gfx_bail!(
                "prisma::command_buffer",
                "bind_descriptor_set called outside a render pass"
            );
        }
        let Some(pipeline) = &self.pipeline else {
            gfx_bail!(
                "prisma::command_buffer",
                "bind_descriptor_set called before bind_graphics_pipeline"
            );
        };
        if !pipeline.descriptor_layout().is_compatible_with(set.layout()) {
            return Err(Error::InvalidResource(format!(
                "descriptor set layout {:?} is incompatible with the bound pipeline's layout {:?}",
                set.layout(),
                pipeline.descriptor_layout()
            )));
        }

        for (binding, bound) in set.bound_bindings() {
            let Some(buffer) = bound.buffer.upgrade() else {
                return Err(Error::InvalidResource(format!(
                    "buffer referenced at binding {} was destroyed by its owner",
                    binding
                )));
            };
            self.driver.bind_uniform_buffer_range(
                binding,
                buffer.handle(),
                bound.offset,
                bound.range,
            );
        }
        Ok(())
    }

    /// Attach a buffer to a vertex-input slot of the bound pipeline
    pub fn bind_vertex_buffer(&mut self, slot: u32, buffer: &Buffer, offset: u64) -> Result<()> {
        if !self.inside_render_pass {
            gfx_bail!(
                "prisma::command_buffer",
                "bind_vertex_buffer called outside a render pass"
            );
        }
        let Some(pipeline) = &self.pipeline else {
            gfx_bail!(
                "prisma::command_buffer",
                "bind_vertex_buffer called before bind_graphics_pipeline"
            );
        };
        let Some(stride) = pipeline.binding_stride(slot) else {
            return Err(Error::InvalidResource(format!(
                "bound pipeline declares no vertex-buffer binding at slot {}",
                slot
            )));
        };

        self.driver
            .bind_vertex_buffer(slot, buffer.handle(), offset, stride);
        Ok(())
    }

    /// Attach a buffer as the index source
    pub fn bind_index_buffer(&mut self, buffer: &Buffer) -> Result<()> {
        if !self.inside_render_pass {
            gfx_bail!(
                "prisma::command_buffer",
                "bind_index_buffer called outside a render pass"
            );
        }
        self.driver.bind_index_buffer(buffer.handle());
        Ok(())
    }

    /// Set the viewport rectangle for subsequent draws
    pub fn set_viewport(&mut self, x: i32, y: i32, width: i32, height: i32) -> Result<()> {
        if !self.inside_render_pass {
            gfx_bail!(
                "prisma::command_buffer",
                "set_viewport called outside a render pass"
            );
        }
        self.driver.set_viewport(x, y, width, height);
        Ok(())
    }

    /// Issue an indexed draw with whatever state is currently bound
    ///
    /// Binding completeness is deliberately not checked: drawing without the
    /// prerequisite binds produces undefined rendering, which is a contract
    /// violation the caller must avoid rather than a runtime-detected error.
    pub fn draw_indexed(
        &mut self,
        topology: PrimitiveTopology,
        index_count: u32,
        index_type: IndexType,
    ) -> Result<()> {
        if !self.inside_render_pass {
            gfx_bail!(
                "prisma::command_buffer",
                "draw_indexed called outside a render pass"
            );
        }
        self.driver.draw_indexed(topology, index_count, index_type);
        Ok(())
    }
}

#[cfg(test)]
#[path = "command_buffer_tests.rs"]
mod tests;
