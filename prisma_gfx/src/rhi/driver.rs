/// Driver trait - the immediate-mode driver context behind the shim
///
/// The target driver interface has no buffers-as-objects, descriptor sets or
/// pipeline objects. It is one implicit global state machine: a current
/// program, a current vertex array, current buffer bindings, and every draw
/// call implicitly reads whatever is bound at that instant. This trait models
/// that context as an explicit object so that the shim types above it can be
/// exercised against a recording test double.
///
/// # Preconditions
///
/// Exactly one driver context exists per process, and every method must be
/// called on the thread that owns it. The context is shared mutable state
/// across all calls and is not thread-safe, which is why the shim shares it
/// as `Rc<dyn Driver>` rather than `Arc`. No method may be invoked from a
/// second thread.

use std::ptr::NonNull;

use crate::error::Result;
use crate::rhi::{
    BufferStorageFlags, MapAccessFlags, ShaderStage,
    VertexInputAttribute, PrimitiveTopology, IndexType,
};

/// Driver-assigned buffer handle
pub type BufferHandle = u32;

/// Driver-assigned shader handle
pub type ShaderHandle = u32;

/// Driver-assigned program handle
pub type ProgramHandle = u32;

/// Driver-assigned vertex array handle
pub type VertexArrayHandle = u32;

/// Immediate-mode driver interface
///
/// Resource creation methods allocate driver-side objects and return their
/// handles; the `bind_*`, `clear_*`, `set_viewport` and `draw_indexed`
/// methods mutate the global context immediately. There is no deferred or
/// batched submission: a call has taken effect when it returns.
pub trait Driver {
    // ------------------------------------------------------------------
    // Buffer storage
    // ------------------------------------------------------------------

    /// Allocate an immutable-size storage region and return its handle
    ///
    /// # Arguments
    ///
    /// * `size` - Size in bytes
    /// * `initial_data` - Initial contents; `None` leaves the region
    ///   zero-initialized or undefined, per driver
    /// * `flags` - Storage flags fixed for the allocation's lifetime
    fn create_buffer(
        &self,
        size: u64,
        initial_data: Option<&[u8]>,
        flags: BufferStorageFlags,
    ) -> Result<BufferHandle>;

    /// Map a byte range of a buffer into host-visible memory
    fn map_buffer(
        &self,
        buffer: BufferHandle,
        offset: u64,
        length: u64,
        access: MapAccessFlags,
    ) -> Result<NonNull<u8>>;

    /// Invalidate the pointer returned by the last `map_buffer` on this buffer
    fn unmap_buffer(&self, buffer: BufferHandle);

    /// Release the driver allocation
    fn destroy_buffer(&self, buffer: BufferHandle);

    // ------------------------------------------------------------------
    // Shaders and programs
    // ------------------------------------------------------------------

    /// Create an empty shader compilation unit for the given stage
    fn create_shader(&self, stage: ShaderStage) -> ShaderHandle;

    /// Compile a shader from source text
    ///
    /// On failure the returned error string is the full compiler log.
    fn compile_shader(
        &self,
        shader: ShaderHandle,
        source: &str,
    ) -> std::result::Result<(), String>;

    /// Destroy a shader compilation unit
    fn destroy_shader(&self, shader: ShaderHandle);

    /// Create an empty program object
    fn create_program(&self) -> ProgramHandle;

    /// Link compiled shaders into a program
    ///
    /// On failure the returned error string is the full linker log.
    fn link_program(
        &self,
        program: ProgramHandle,
        shaders: &[ShaderHandle],
    ) -> std::result::Result<(), String>;

    /// Destroy a program object
    fn destroy_program(&self, program: ProgramHandle);

    // ------------------------------------------------------------------
    // Vertex array configuration
    // ------------------------------------------------------------------

    /// Create an empty vertex array object
    fn create_vertex_array(&self) -> VertexArrayHandle;

    /// Enable one attribute on a vertex array and set its component layout
    /// (component count, scalar type, normalization, byte offset) and the
    /// vertex-buffer binding slot it reads from
    fn configure_vertex_attribute(
        &self,
        vertex_array: VertexArrayHandle,
        attribute: &VertexInputAttribute,
    );

    /// Destroy a vertex array object
    fn destroy_vertex_array(&self, vertex_array: VertexArrayHandle);

    // ------------------------------------------------------------------
    // Global state mutations (issued during command recording)
    // ------------------------------------------------------------------

    /// Clear the color target with the given value
    fn clear_color_target(&self, value: [f32; 4]);

    /// Clear the depth/stencil target with the given values
    fn clear_depth_stencil_target(&self, depth: f32, stencil: u32);

    /// Make a program the current program
    fn bind_program(&self, program: ProgramHandle);

    /// Make a vertex array the current vertex array
    fn bind_vertex_array(&self, vertex_array: VertexArrayHandle);

    /// Attach a buffer range to a uniform-buffer binding slot
    fn bind_uniform_buffer_range(
        &self,
        binding: u32,
        buffer: BufferHandle,
        offset: u64,
        size: u64,
    );

    /// Attach a buffer to a vertex-input slot of the current vertex array
    fn bind_vertex_buffer(&self, slot: u32, buffer: BufferHandle, offset: u64, stride: u32);

    /// Attach a buffer as the index source of the current vertex array
    fn bind_index_buffer(&self, buffer: BufferHandle);

    /// Set the viewport rectangle
    fn set_viewport(&self, x: i32, y: i32, width: i32, height: i32);

    /// Issue an indexed draw using whatever state is currently bound
    fn draw_indexed(&self, topology: PrimitiveTopology, index_count: u32, index_type: IndexType);
}
