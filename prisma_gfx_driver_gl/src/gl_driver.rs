/// GlDriver - OpenGL implementation of the Driver trait
///
/// Every trait method translates directly to the matching GL calls. Buffer
/// storage edits go through the COPY_WRITE target so they never perturb the
/// vertex-input state the command stream depends on; vertex-array
/// configuration temporarily binds the array being built and restores the
/// empty binding afterwards.

use std::num::NonZeroU32;
use std::ptr::NonNull;

use glow::HasContext;

use prisma_gfx::gfx_error;
use prisma_gfx::rhi::{
    BufferHandle, BufferStorageFlags, Driver, IndexType, MapAccessFlags, PrimitiveTopology,
    ProgramHandle, ShaderHandle, ShaderStage, VertexArrayHandle, VertexInputAttribute,
};
use prisma_gfx::{Error, Result};

/// OpenGL driver context
///
/// Owns the glow context for the one GL context of the process. Not `Send`
/// or `Sync`: it must live and be used on the thread the GL context is
/// current on.
pub struct GlDriver {
    gl: glow::Context,
    // Rc<dyn Driver> is the sharing model; keep this type !Send + !Sync even
    // if a future glow version marks Context otherwise
    _not_send_sync: std::marker::PhantomData<*const ()>,
}

impl GlDriver {
    /// Wrap a loaded GL function table
    ///
    /// # Arguments
    ///
    /// * `loader` - Symbol loader of the current context (e.g. glutin's
    ///   `get_proc_address`)
    ///
    /// # Safety
    ///
    /// The matching GL context must be current on the calling thread and stay
    /// current for the driver's whole lifetime.
    pub unsafe fn new(loader: impl FnMut(&str) -> *const std::ffi::c_void) -> Self {
        #[allow(unused_mut)]
        let mut gl = glow::Context::from_loader_function(loader);
        #[cfg(feature = "gl-debug")]
        crate::debug::install(&mut gl);
        Self {
            gl,
            _not_send_sync: std::marker::PhantomData,
        }
    }
}

// ===== HANDLE CONVERSIONS =====

fn gl_buffer(handle: BufferHandle) -> Option<glow::NativeBuffer> {
    NonZeroU32::new(handle).map(glow::NativeBuffer)
}

fn gl_shader(handle: ShaderHandle) -> Option<glow::NativeShader> {
    NonZeroU32::new(handle).map(glow::NativeShader)
}

fn gl_program(handle: ProgramHandle) -> Option<glow::NativeProgram> {
    NonZeroU32::new(handle).map(glow::NativeProgram)
}

fn gl_vertex_array(handle: VertexArrayHandle) -> Option<glow::NativeVertexArray> {
    NonZeroU32::new(handle).map(glow::NativeVertexArray)
}

// ===== ENUM TRANSLATION =====

fn storage_flag_bits(flags: BufferStorageFlags) -> u32 {
    let mut bits = 0;
    if flags.contains(BufferStorageFlags::MAP_READ) {
        bits |= glow::MAP_READ_BIT;
    }
    if flags.contains(BufferStorageFlags::MAP_WRITE) {
        bits |= glow::MAP_WRITE_BIT;
    }
    if flags.contains(BufferStorageFlags::MAP_PERSISTENT) {
        bits |= glow::MAP_PERSISTENT_BIT;
    }
    if flags.contains(BufferStorageFlags::MAP_COHERENT) {
        bits |= glow::MAP_COHERENT_BIT;
    }
    if flags.contains(BufferStorageFlags::DYNAMIC_STORAGE) {
        bits |= glow::DYNAMIC_STORAGE_BIT;
    }
    bits
}

fn map_access_bits(access: MapAccessFlags) -> u32 {
    let mut bits = 0;
    if access.contains(MapAccessFlags::READ) {
        bits |= glow::MAP_READ_BIT;
    }
    if access.contains(MapAccessFlags::WRITE) {
        bits |= glow::MAP_WRITE_BIT;
    }
    if access.contains(MapAccessFlags::PERSISTENT) {
        bits |= glow::MAP_PERSISTENT_BIT;
    }
    if access.contains(MapAccessFlags::COHERENT) {
        bits |= glow::MAP_COHERENT_BIT;
    }
    bits
}

fn shader_stage_kind(stage: ShaderStage) -> u32 {
    match stage {
        ShaderStage::Vertex => glow::VERTEX_SHADER,
        ShaderStage::Fragment => glow::FRAGMENT_SHADER,
    }
}

fn topology_mode(topology: PrimitiveTopology) -> u32 {
    match topology {
        PrimitiveTopology::TriangleList => glow::TRIANGLES,
        PrimitiveTopology::TriangleStrip => glow::TRIANGLE_STRIP,
        PrimitiveTopology::LineList => glow::LINES,
        PrimitiveTopology::PointList => glow::POINTS,
    }
}

fn index_element_type(index_type: IndexType) -> u32 {
    match index_type {
        IndexType::U16 => glow::UNSIGNED_SHORT,
        IndexType::U32 => glow::UNSIGNED_INT,
    }
}

impl Driver for GlDriver {
    fn create_buffer(
        &self,
        size: u64,
        initial_data: Option<&[u8]>,
        flags: BufferStorageFlags,
    ) -> Result<BufferHandle> {
        unsafe {
            let buffer = self.gl.create_buffer().map_err(|e| {
                gfx_error!("prisma::gl", "Failed to create buffer: {}", e);
                Error::BackendError(format!("glCreateBuffers failed: {}", e))
            })?;
            self.gl.bind_buffer(glow::COPY_WRITE_BUFFER, Some(buffer));
            self.gl.buffer_storage(
                glow::COPY_WRITE_BUFFER,
                size as i32,
                initial_data,
                storage_flag_bits(flags),
            );
            self.gl.bind_buffer(glow::COPY_WRITE_BUFFER, None);
            Ok(buffer.0.get())
        }
    }

    fn map_buffer(
        &self,
        buffer: BufferHandle,
        offset: u64,
        length: u64,
        access: MapAccessFlags,
    ) -> Result<NonNull<u8>> {
        let Some(buffer) = gl_buffer(buffer) else {
            return Err(Error::BackendError("invalid buffer handle".to_string()));
        };
        unsafe {
            self.gl.bind_buffer(glow::COPY_WRITE_BUFFER, Some(buffer));
            let ptr = self.gl.map_buffer_range(
                glow::COPY_WRITE_BUFFER,
                offset as i32,
                length as i32,
                map_access_bits(access),
            );
            self.gl.bind_buffer(glow::COPY_WRITE_BUFFER, None);
            NonNull::new(ptr).ok_or_else(|| {
                gfx_error!("prisma::gl", "glMapBufferRange returned null");
                Error::BackendError("glMapBufferRange returned null".to_string())
            })
        }
    }

    fn unmap_buffer(&self, buffer: BufferHandle) {
        let Some(buffer) = gl_buffer(buffer) else {
            return;
        };
        unsafe {
            self.gl.bind_buffer(glow::COPY_WRITE_BUFFER, Some(buffer));
            self.gl.unmap_buffer(glow::COPY_WRITE_BUFFER);
            self.gl.bind_buffer(glow::COPY_WRITE_BUFFER, None);
        }
    }

    fn destroy_buffer(&self, buffer: BufferHandle) {
        if let Some(buffer) = gl_buffer(buffer) {
            unsafe {
                self.gl.delete_buffer(buffer);
            }
        }
    }

    fn create_shader(&self, stage: ShaderStage) -> ShaderHandle {
        unsafe {
            match self.gl.create_shader(shader_stage_kind(stage)) {
                Ok(shader) => shader.0.get(),
                Err(e) => {
                    gfx_error!("prisma::gl", "Failed to create {:?} shader: {}", stage, e);
                    0
                }
            }
        }
    }

    fn compile_shader(
        &self,
        shader: ShaderHandle,
        source: &str,
    ) -> std::result::Result<(), String> {
        let Some(shader) = gl_shader(shader) else {
            return Err("invalid shader handle".to_string());
        };
        unsafe {
            self.gl.shader_source(shader, source);
            self.gl.compile_shader(shader);
            if self.gl.get_shader_compile_status(shader) {
                Ok(())
            } else {
                Err(self.gl.get_shader_info_log(shader))
            }
        }
    }

    fn destroy_shader(&self, shader: ShaderHandle) {
        if let Some(shader) = gl_shader(shader) {
            unsafe {
                self.gl.delete_shader(shader);
            }
        }
    }

    fn create_program(&self) -> ProgramHandle {
        unsafe {
            match self.gl.create_program() {
                Ok(program) => program.0.get(),
                Err(e) => {
                    gfx_error!("prisma::gl", "Failed to create program: {}", e);
                    0
                }
            }
        }
    }

    fn link_program(
        &self,
        program: ProgramHandle,
        shaders: &[ShaderHandle],
    ) -> std::result::Result<(), String> {
        let Some(program) = gl_program(program) else {
            return Err("invalid program handle".to_string());
        };
        unsafe {
            let attached: Vec<_> = shaders.iter().copied().filter_map(gl_shader).collect();
            for shader in &attached {
                self.gl.attach_shader(program, *shader);
            }
            self.gl.link_program(program);
            // Detach either way; the program keeps the linked binary
            let status = self.gl.get_program_link_status(program);
            let log = self.gl.get_program_info_log(program);
            for shader in &attached {
                self.gl.detach_shader(program, *shader);
            }
            if status {
                Ok(())
            } else {
                Err(log)
            }
        }
    }

    fn destroy_program(&self, program: ProgramHandle) {
        if let Some(program) = gl_program(program) {
            unsafe {
                self.gl.delete_program(program);
            }
        }
    }

    fn create_vertex_array(&self) -> VertexArrayHandle {
        unsafe {
            match self.gl.create_vertex_array() {
                Ok(vertex_array) => vertex_array.0.get(),
                Err(e) => {
                    gfx_error!("prisma::gl", "Failed to create vertex array: {}", e);
                    0
                }
            }
        }
    }

    fn configure_vertex_attribute(
        &self,
        vertex_array: VertexArrayHandle,
        attribute: &VertexInputAttribute,
    ) {
        let Some(vertex_array) = gl_vertex_array(vertex_array) else {
            return;
        };
        unsafe {
            self.gl.bind_vertex_array(Some(vertex_array));
            self.gl.enable_vertex_attrib_array(attribute.location);
            match attribute.scalar {
                prisma_gfx::rhi::ScalarType::F32 => {
                    self.gl.vertex_attrib_format_f32(
                        attribute.location,
                        attribute.components as i32,
                        glow::FLOAT,
                        attribute.normalized,
                        attribute.offset,
                    );
                }
                prisma_gfx::rhi::ScalarType::U32 => {
                    self.attrib_int_format(attribute, glow::UNSIGNED_INT);
                }
                prisma_gfx::rhi::ScalarType::U16 => {
                    self.attrib_int_format(attribute, glow::UNSIGNED_SHORT);
                }
                prisma_gfx::rhi::ScalarType::U8 => {
                    self.attrib_int_format(attribute, glow::UNSIGNED_BYTE);
                }
            }
            self.gl
                .vertex_attrib_binding(attribute.location, attribute.binding);
            self.gl.bind_vertex_array(None);
        }
    }

    fn destroy_vertex_array(&self, vertex_array: VertexArrayHandle) {
        if let Some(vertex_array) = gl_vertex_array(vertex_array) {
            unsafe {
                self.gl.delete_vertex_array(vertex_array);
            }
        }
    }

    fn clear_color_target(&self, value: [f32; 4]) {
        unsafe {
            self.gl.clear_color(value[0], value[1], value[2], value[3]);
            self.gl.clear(glow::COLOR_BUFFER_BIT);
        }
    }

    fn clear_depth_stencil_target(&self, depth: f32, stencil: u32) {
        unsafe {
            self.gl.clear_depth_f32(depth);
            self.gl.clear_stencil(stencil as i32);
            self.gl
                .clear(glow::DEPTH_BUFFER_BIT | glow::STENCIL_BUFFER_BIT);
        }
    }

    fn bind_program(&self, program: ProgramHandle) {
        unsafe {
            self.gl.use_program(gl_program(program));
        }
    }

    fn bind_vertex_array(&self, vertex_array: VertexArrayHandle) {
        unsafe {
            self.gl.bind_vertex_array(gl_vertex_array(vertex_array));
        }
    }

    fn bind_uniform_buffer_range(
        &self,
        binding: u32,
        buffer: BufferHandle,
        offset: u64,
        size: u64,
    ) {
        unsafe {
            self.gl.bind_buffer_range(
                glow::UNIFORM_BUFFER,
                binding,
                gl_buffer(buffer),
                offset as i32,
                size as i32,
            );
        }
    }

    fn bind_vertex_buffer(&self, slot: u32, buffer: BufferHandle, offset: u64, stride: u32) {
        unsafe {
            self.gl
                .bind_vertex_buffer(slot, gl_buffer(buffer), offset as i32, stride as i32);
        }
    }

    fn bind_index_buffer(&self, buffer: BufferHandle) {
        // Latches into the currently bound vertex array
        unsafe {
            self.gl
                .bind_buffer(glow::ELEMENT_ARRAY_BUFFER, gl_buffer(buffer));
        }
    }

    fn set_viewport(&self, x: i32, y: i32, width: i32, height: i32) {
        unsafe {
            self.gl.viewport(x, y, width, height);
        }
    }

    fn draw_indexed(&self, topology: PrimitiveTopology, index_count: u32, index_type: IndexType) {
        unsafe {
            self.gl.draw_elements(
                topology_mode(topology),
                index_count as i32,
                index_element_type(index_type),
                0,
            );
        }
    }
}

impl GlDriver {
    /// Integer attribute layout: normalized integers go through the float
    /// path, raw integers through the integer path
    unsafe fn attrib_int_format(&self, attribute: &VertexInputAttribute, data_type: u32) {
        if attribute.normalized {
            self.gl.vertex_attrib_format_f32(
                attribute.location,
                attribute.components as i32,
                data_type,
                true,
                attribute.offset,
            );
        } else {
            self.gl.vertex_attrib_format_i32(
                attribute.location,
                attribute.components as i32,
                data_type,
                attribute.offset,
            );
        }
    }
}
