/// Recording driver for unit tests (no GPU required)
///
/// Records every driver call as a string so tests can assert the exact call
/// order the shim translates to, and backs buffer storage with host memory so
/// mapping round-trips behave like a real coherent mapping.

#[cfg(test)]
use std::cell::{Cell, RefCell};
#[cfg(test)]
use std::ptr::NonNull;

#[cfg(test)]
use rustc_hash::{FxHashMap, FxHashSet};

#[cfg(test)]
use crate::error::{Error, Result};
#[cfg(test)]
use crate::rhi::{
    BufferHandle, BufferStorageFlags, Driver, IndexType, MapAccessFlags, PrimitiveTopology,
    ProgramHandle, ShaderHandle, ShaderStage, VertexArrayHandle, VertexInputAttribute,
};

#[cfg(test)]
struct StoredBuffer {
    data: Box<[u8]>,
    flags: BufferStorageFlags,
}

/// Recording driver
///
/// Failure injection: `fail_compilation_for` makes `compile_shader` fail for
/// a given stage with a canned log; `fail_next_link` does the same for
/// `link_program`.
#[cfg(test)]
pub struct RecordingDriver {
    /// Every driver call, in the order received
    pub calls: RefCell<Vec<String>>,
    /// Program made current by the last `bind_program`, if any
    pub bound_program: Cell<Option<ProgramHandle>>,
    buffers: RefCell<FxHashMap<BufferHandle, StoredBuffer>>,
    shader_stages: RefCell<FxHashMap<ShaderHandle, ShaderStage>>,
    fail_compile: RefCell<FxHashSet<ShaderStage>>,
    fail_link: Cell<bool>,
    next_handle: Cell<u32>,
}

#[cfg(test)]
impl RecordingDriver {
    pub fn new() -> Self {
        Self {
            calls: RefCell::new(Vec::new()),
            bound_program: Cell::new(None),
            buffers: RefCell::new(FxHashMap::default()),
            shader_stages: RefCell::new(FxHashMap::default()),
            fail_compile: RefCell::new(FxHashSet::default()),
            fail_link: Cell::new(false),
            next_handle: Cell::new(1),
        }
    }

    /// Make `compile_shader` fail for every shader of the given stage
    pub fn fail_compilation_for(&self, stage: ShaderStage) {
        self.fail_compile.borrow_mut().insert(stage);
    }

    /// Make every subsequent `link_program` fail
    pub fn fail_link(&self) {
        self.fail_link.set(true);
    }

    /// Snapshot of the recorded calls
    pub fn recorded_calls(&self) -> Vec<String> {
        self.calls.borrow().clone()
    }

    /// Number of recorded calls whose name starts with `prefix`
    pub fn call_count(&self, prefix: &str) -> usize {
        self.calls
            .borrow()
            .iter()
            .filter(|c| c.starts_with(prefix))
            .count()
    }

    /// Read back a stored buffer's bytes
    pub fn buffer_contents(&self, buffer: BufferHandle) -> Vec<u8> {
        self.buffers.borrow()[&buffer].data.to_vec()
    }

    fn record(&self, call: impl Into<String>) {
        self.calls.borrow_mut().push(call.into());
    }

    fn allocate_handle(&self) -> u32 {
        let handle = self.next_handle.get();
        self.next_handle.set(handle + 1);
        handle
    }
}

#[cfg(test)]
impl Driver for RecordingDriver {
    fn create_buffer(
        &self,
        size: u64,
        initial_data: Option<&[u8]>,
        flags: BufferStorageFlags,
    ) -> Result<BufferHandle> {
        let handle = self.allocate_handle();
        let mut data = vec![0u8; size as usize].into_boxed_slice();
        if let Some(initial) = initial_data {
            data.copy_from_slice(initial);
        }
        self.buffers
            .borrow_mut()
            .insert(handle, StoredBuffer { data, flags });
        self.record(format!("create_buffer({})", handle));
        Ok(handle)
    }

    fn map_buffer(
        &self,
        buffer: BufferHandle,
        offset: u64,
        length: u64,
        _access: MapAccessFlags,
    ) -> Result<NonNull<u8>> {
        self.record(format!("map_buffer({})", buffer));
        let mut buffers = self.buffers.borrow_mut();
        let stored = buffers
            .get_mut(&buffer)
            .ok_or_else(|| Error::BackendError(format!("unknown buffer {}", buffer)))?;
        if offset + length > stored.data.len() as u64 {
            return Err(Error::BackendError("map range out of bounds".to_string()));
        }
        // The boxed slice's heap allocation is stable even if the map rehashes
        let ptr = unsafe { stored.data.as_mut_ptr().add(offset as usize) };
        NonNull::new(ptr).ok_or_else(|| Error::BackendError("null mapping".to_string()))
    }

    fn unmap_buffer(&self, buffer: BufferHandle) {
        self.record(format!("unmap_buffer({})", buffer));
    }

    fn destroy_buffer(&self, buffer: BufferHandle) {
        self.buffers.borrow_mut().remove(&buffer);
        self.record(format!("destroy_buffer({})", buffer));
    }

    fn create_shader(&self, stage: ShaderStage) -> ShaderHandle {
        let handle = self.allocate_handle();
        self.shader_stages.borrow_mut().insert(handle, stage);
        self.record(format!("create_shader({:?})", stage));
        handle
    }

    fn compile_shader(
        &self,
        shader: ShaderHandle,
        _source: &str,
    ) -> std::result::Result<(), String> {
        self.record(format!("compile_shader({})", shader));
        let stage = self.shader_stages.borrow()[&shader];
        if self.fail_compile.borrow().contains(&stage) {
            Err(format!("0:1: mock {:?} stage compile error", stage))
        } else {
            Ok(())
        }
    }

    fn destroy_shader(&self, shader: ShaderHandle) {
        self.record(format!("destroy_shader({})", shader));
    }

    fn create_program(&self) -> ProgramHandle {
        let handle = self.allocate_handle();
        self.record(format!("create_program({})", handle));
        handle
    }

    fn link_program(
        &self,
        program: ProgramHandle,
        _shaders: &[ShaderHandle],
    ) -> std::result::Result<(), String> {
        self.record(format!("link_program({})", program));
        if self.fail_link.get() {
            Err("mock link error".to_string())
        } else {
            Ok(())
        }
    }

    fn destroy_program(&self, program: ProgramHandle) {
        self.record(format!("destroy_program({})", program));
    }

    fn create_vertex_array(&self) -> VertexArrayHandle {
        let handle = self.allocate_handle();
        self.record(format!("create_vertex_array({})", handle));
        handle
    }

    fn configure_vertex_attribute(
        &self,
        vertex_array: VertexArrayHandle,
        attribute: &VertexInputAttribute,
    ) {
        self.record(format!(
            "configure_vertex_attribute({}, location={})",
            vertex_array, attribute.location
        ));
    }

    fn destroy_vertex_array(&self, vertex_array: VertexArrayHandle) {
        self.record(format!("destroy_vertex_array({})", vertex_array));
    }

    fn clear_color_target(&self, _value: [f32; 4]) {
        self.record("clear_color_target");
    }

    fn clear_depth_stencil_target(&self, _depth: f32, _stencil: u32) {
        self.record("clear_depth_stencil_target");
    }

    fn bind_program(&self, program: ProgramHandle) {
        self.bound_program.set(Some(program));
        self.record(format!("bind_program({})", program));
    }

    fn bind_vertex_array(&self, vertex_array: VertexArrayHandle) {
        self.record(format!("bind_vertex_array({})", vertex_array));
    }

    fn bind_uniform_buffer_range(
        &self,
        binding: u32,
        buffer: BufferHandle,
        offset: u64,
        size: u64,
    ) {
        self.record(format!(
            "bind_uniform_buffer_range(binding={}, buffer={}, offset={}, size={})",
            binding, buffer, offset, size
        ));
    }

    fn bind_vertex_buffer(&self, slot: u32, buffer: BufferHandle, offset: u64, stride: u32) {
        self.record(format!(
            "bind_vertex_buffer(slot={}, buffer={}, offset={}, stride={})",
            slot, buffer, offset, stride
        ));
    }

    fn bind_index_buffer(&self, buffer: BufferHandle) {
        self.record(format!("bind_index_buffer({})", buffer));
    }

    fn set_viewport(&self, _x: i32, _y: i32, width: i32, height: i32) {
        self.record(format!("set_viewport({}x{})", width, height));
    }

    fn draw_indexed(&self, topology: PrimitiveTopology, index_count: u32, index_type: IndexType) {
        self.record(format!(
            "draw_indexed({:?}, {}, {:?})",
            topology, index_count, index_type
        ));
    }
}
