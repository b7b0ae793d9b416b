/// Render pass descriptions - attachment load behavior and clear values
///
/// These are not stored entities: a `RenderPassInfo` is consumed once per
/// `CommandBuffer::begin_render_pass` call.

/// What happens to an attachment's previous contents at render pass begin
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOp {
    /// Clear the attachment with the supplied clear value
    Clear,
    /// Keep the attachment's previous contents
    Preserve,
}

/// Clear value for an attachment
#[derive(Debug, Clone, Copy)]
pub enum ClearValue {
    /// Color clear value (RGBA)
    Color([f32; 4]),
    /// Depth/stencil clear value
    DepthStencil { depth: f32, stencil: u32 },
}

/// One target surface's load behavior for a render pass
#[derive(Debug, Clone, Copy)]
pub struct RenderingAttachmentInfo {
    /// Clear or preserve at render pass begin
    pub load_op: LoadOp,
    /// Value used when `load_op` is `Clear`
    pub clear_value: ClearValue,
}

impl RenderingAttachmentInfo {
    /// Color attachment cleared with the given value
    pub fn clear_color(value: [f32; 4]) -> Self {
        Self {
            load_op: LoadOp::Clear,
            clear_value: ClearValue::Color(value),
        }
    }

    /// Depth/stencil attachment cleared with the given values
    pub fn clear_depth_stencil(depth: f32, stencil: u32) -> Self {
        Self {
            load_op: LoadOp::Clear,
            clear_value: ClearValue::DepthStencil { depth, stencil },
        }
    }

    /// Color attachment whose previous contents are kept
    pub fn preserve_color() -> Self {
        Self {
            load_op: LoadOp::Preserve,
            clear_value: ClearValue::Color([0.0; 4]),
        }
    }
}

/// Attachment set for one render pass
#[derive(Debug, Clone, Copy, Default)]
pub struct RenderPassInfo {
    /// Color attachment, if any
    pub color: Option<RenderingAttachmentInfo>,
    /// Depth/stencil attachment, if any
    pub depth_stencil: Option<RenderingAttachmentInfo>,
}
