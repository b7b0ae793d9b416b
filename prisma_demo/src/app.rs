//! Demo application
//!
//! Owns the window, the GL context and every long-lived graphics resource
//! (pipeline, buffers, descriptor set). Each frame it writes the three
//! matrices through the persistent uniform mapping, records one render pass
//! through a CommandBuffer and swaps buffers.

use std::ffi::CString;
use std::num::NonZeroU32;
use std::ptr::NonNull;
use std::rc::Rc;
use std::time::Instant;

use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec3};
use glutin::config::ConfigTemplateBuilder;
use glutin::context::{ContextApi, ContextAttributesBuilder, GlProfile, Version};
use glutin::context::PossiblyCurrentContext;
use glutin::display::GetGlDisplay;
use glutin::prelude::*;
use glutin::surface::{Surface, SurfaceAttributesBuilder, SwapInterval, WindowSurface};
use glutin_winit::{DisplayBuilder, GlWindow};
use winit::application::ApplicationHandler;
use winit::event::WindowEvent;
use winit::event_loop::ActiveEventLoop;
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::{Window, WindowAttributes};

use prisma_gfx::rhi::{
    Buffer, BufferDesc, BufferStorageFlags, CommandBuffer, DescriptorSet, DescriptorSetLayoutInfo,
    DescriptorWrite, Driver, GraphicsPipeline, GraphicsPipelineDesc, IndexType, MapAccessFlags,
    PrimitiveTopology, RenderPassInfo, RenderingAttachmentInfo, ScalarType, VertexInputAttribute,
    VertexInputBinding, VertexInputDescription,
};
use prisma_gfx::{gfx_error, gfx_info, gfx_warn};
use prisma_gfx_driver_gl::GlDriver;

use crate::dialog;
use crate::files;

const WINDOW_TITLE: &str = "Prisma Demo";
const WINDOW_WIDTH: u32 = 1280;
const WINDOW_HEIGHT: u32 = 720;

const VERTEX_SHADER_PATH: &str = "res/shader/shader.vert";
const FRAGMENT_SHADER_PATH: &str = "res/shader/shader.frag";

// ===== GEOMETRY =====

/// One vertex record: tightly packed position + color
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
struct Vertex {
    position: [f32; 3],
    color: [f32; 4],
}

const QUAD_VERTICES: [Vertex; 4] = [
    Vertex {
        position: [-0.5, -0.5, 0.0],
        color: [1.0, 0.2, 0.2, 1.0],
    },
    Vertex {
        position: [0.5, -0.5, 0.0],
        color: [0.2, 1.0, 0.2, 1.0],
    },
    Vertex {
        position: [0.5, 0.5, 0.0],
        color: [0.2, 0.2, 1.0, 1.0],
    },
    Vertex {
        position: [-0.5, 0.5, 0.0],
        color: [1.0, 1.0, 1.0, 1.0],
    },
];

const QUAD_INDICES: [u32; 6] = [0, 1, 2, 2, 3, 0];

/// Per-frame uniform record: three matrices, no padding between them,
/// matching the uniform block at descriptor binding 0
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
struct Uniforms {
    projection: Mat4,
    view: Mat4,
    model: Mat4,
}

// ===== APPLICATION =====

/// Everything that exists only after the window is created
///
/// Declaration order doubles as reverse-dependency destruction order: the
/// descriptor set drops before the buffers it references, and all graphics
/// resources drop while the GL context is still current.
struct GfxState {
    descriptor_set: DescriptorSet,
    pipeline: Rc<GraphicsPipeline>,
    vertex_buffer: Rc<Buffer>,
    index_buffer: Rc<Buffer>,
    uniform_buffer: Rc<Buffer>,
    /// Persistent-coherent mapping of `uniform_buffer`, written every frame
    uniform_ptr: NonNull<u8>,
    driver: Rc<dyn Driver>,
    gl_surface: Surface<WindowSurface>,
    gl_context: PossiblyCurrentContext,
    window: Window,
    started: Instant,
}

pub struct App {
    state: Option<GfxState>,
}

impl App {
    pub fn new() -> Self {
        Self { state: None }
    }

    fn init(&self, event_loop: &ActiveEventLoop) -> Result<GfxState, Box<dyn std::error::Error>> {
        // ===== WINDOW + CONTEXT =====

        let window_attributes = WindowAttributes::default()
            .with_title(WINDOW_TITLE)
            .with_inner_size(winit::dpi::PhysicalSize::new(WINDOW_WIDTH, WINDOW_HEIGHT));

        let template = ConfigTemplateBuilder::new().with_depth_size(24);
        let (window, gl_config) = DisplayBuilder::new()
            .with_window_attributes(Some(window_attributes))
            .build(event_loop, template, |mut configs| {
                configs
                    .next()
                    .expect("no GL framebuffer configuration available")
            })?;
        let window = window.ok_or("display builder returned no window")?;

        let gl_display = gl_config.display();
        let raw_window_handle = raw_window_handle::HasWindowHandle::window_handle(&window)?.as_raw();

        // Core profile 4.4+: immutable buffer storage and persistent mappings
        let context_attributes = ContextAttributesBuilder::new()
            .with_context_api(ContextApi::OpenGl(Some(Version::new(4, 4))))
            .with_profile(GlProfile::Core)
            .build(Some(raw_window_handle));
        let not_current = unsafe { gl_display.create_context(&gl_config, &context_attributes)? };

        let surface_attributes =
            window.build_surface_attributes(SurfaceAttributesBuilder::default())?;
        let gl_surface =
            unsafe { gl_display.create_window_surface(&gl_config, &surface_attributes)? };
        let gl_context = not_current.make_current(&gl_surface)?;

        if let Err(e) =
            gl_surface.set_swap_interval(&gl_context, SwapInterval::Wait(NonZeroU32::MIN))
        {
            gfx_warn!("prisma::demo", "Failed to enable vsync: {}", e);
        }

        // The driver assumes context affinity to this thread from here on
        let driver: Rc<dyn Driver> = unsafe {
            Rc::new(GlDriver::new(|symbol| {
                let symbol = CString::new(symbol).unwrap_or_default();
                gl_display.get_proc_address(&symbol)
            }))
        };

        gfx_info!(
            "prisma::demo",
            "Created GL context, window {}x{}",
            WINDOW_WIDTH,
            WINDOW_HEIGHT
        );

        // ===== PIPELINE =====

        let vertex_source = files::read_text_file(VERTEX_SHADER_PATH)
            .ok_or_else(|| format!("failed to load '{}'", VERTEX_SHADER_PATH))?;
        let fragment_source = files::read_text_file(FRAGMENT_SHADER_PATH)
            .ok_or_else(|| format!("failed to load '{}'", FRAGMENT_SHADER_PATH))?;

        let vertex_stride = std::mem::size_of::<Vertex>() as u32;
        let pipeline = GraphicsPipeline::new(
            driver.clone(),
            GraphicsPipelineDesc {
                vertex_source,
                fragment_source,
                vertex_input: VertexInputDescription {
                    bindings: vec![VertexInputBinding {
                        binding: 0,
                        stride: vertex_stride,
                    }],
                    attributes: vec![
                        VertexInputAttribute {
                            location: 0,
                            binding: 0,
                            components: 3,
                            scalar: ScalarType::F32,
                            normalized: false,
                            offset: 0,
                        },
                        VertexInputAttribute {
                            location: 1,
                            binding: 0,
                            components: 4,
                            scalar: ScalarType::F32,
                            normalized: false,
                            offset: 12,
                        },
                    ],
                },
                descriptor_layout: DescriptorSetLayoutInfo::single_uniform_buffer(0),
            },
        );
        pipeline.create()?;

        // ===== BUFFERS =====

        let vertex_buffer = Buffer::new(
            driver.clone(),
            &BufferDesc {
                size: std::mem::size_of_val(&QUAD_VERTICES) as u64,
                flags: BufferStorageFlags::empty(),
            },
            Some(bytemuck::cast_slice(&QUAD_VERTICES)),
        )?;
        let index_buffer = Buffer::new(
            driver.clone(),
            &BufferDesc {
                size: std::mem::size_of_val(&QUAD_INDICES) as u64,
                flags: BufferStorageFlags::empty(),
            },
            Some(bytemuck::cast_slice(&QUAD_INDICES)),
        )?;

        let uniform_size = std::mem::size_of::<Uniforms>() as u64;
        let uniform_buffer = Buffer::new(
            driver.clone(),
            &BufferDesc {
                size: uniform_size,
                flags: BufferStorageFlags::MAP_WRITE
                    | BufferStorageFlags::MAP_PERSISTENT
                    | BufferStorageFlags::MAP_COHERENT,
            },
            None,
        )?;

        // Mapped once here, written every frame, unmapped on drop
        let uniform_ptr = uniform_buffer.map(
            MapAccessFlags::WRITE | MapAccessFlags::PERSISTENT | MapAccessFlags::COHERENT,
        )?;

        // ===== DESCRIPTOR SET =====

        let mut descriptor_set = DescriptorSet::new(DescriptorSetLayoutInfo::single_uniform_buffer(0))?;
        descriptor_set.update(&[DescriptorWrite {
            dst_binding: 0,
            buffer: uniform_buffer.clone(),
            offset: 0,
            range: uniform_size,
        }])?;

        gfx_info!("prisma::demo", "Graphics resources created");

        Ok(GfxState {
            descriptor_set,
            pipeline,
            vertex_buffer,
            index_buffer,
            uniform_buffer,
            uniform_ptr,
            driver,
            gl_surface,
            gl_context,
            window,
            started: Instant::now(),
        })
    }

    /// Render one frame: update uniforms, record a render pass, swap
    fn render(&mut self) -> prisma_gfx::Result<()> {
        let Some(state) = &mut self.state else {
            return Ok(());
        };

        let size = state.window.inner_size();
        if size.width == 0 || size.height == 0 {
            return Ok(());
        }

        // Uniform update through the persistent mapping; coherent, so the
        // draw below sees the new matrices without a flush
        let elapsed = state.started.elapsed().as_secs_f32();
        let aspect = size.width as f32 / size.height as f32;
        let uniforms = Uniforms {
            projection: Mat4::perspective_rh_gl(60f32.to_radians(), aspect, 0.1, 100.0),
            view: Mat4::look_at_rh(Vec3::new(0.0, 0.0, 2.0), Vec3::ZERO, Vec3::Y),
            model: Mat4::from_rotation_z(elapsed),
        };
        let bytes = bytemuck::bytes_of(&uniforms);
        unsafe {
            std::ptr::copy_nonoverlapping(bytes.as_ptr(), state.uniform_ptr.as_ptr(), bytes.len());
        }

        let mut cmd = CommandBuffer::new(state.driver.clone());
        cmd.begin_render_pass(&RenderPassInfo {
            color: Some(RenderingAttachmentInfo::clear_color([0.05, 0.05, 0.08, 1.0])),
            depth_stencil: Some(RenderingAttachmentInfo::clear_depth_stencil(1.0, 0)),
        })?;
        cmd.set_viewport(0, 0, size.width as i32, size.height as i32)?;
        cmd.bind_graphics_pipeline(&state.pipeline)?;
        cmd.bind_descriptor_set(&state.descriptor_set)?;
        cmd.bind_vertex_buffer(0, &state.vertex_buffer, 0)?;
        cmd.bind_index_buffer(&state.index_buffer)?;
        cmd.draw_indexed(PrimitiveTopology::TriangleList, QUAD_INDICES.len() as u32, IndexType::U32)?;
        cmd.end_render_pass()?;

        if let Err(e) = state.gl_surface.swap_buffers(&state.gl_context) {
            gfx_error!("prisma::demo", "Failed to swap buffers: {}", e);
        }
        Ok(())
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.state.is_some() {
            return;
        }
        match self.init(event_loop) {
            Ok(state) => self.state = Some(state),
            Err(e) => {
                dialog::show_error(&format!("Startup failed: {}", e));
                event_loop.exit();
            }
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: winit::window::WindowId,
        event: WindowEvent,
    ) {
        match event {
            WindowEvent::CloseRequested => {
                gfx_info!("prisma::demo", "Close requested, shutting down");
                event_loop.exit();
            }
            WindowEvent::Resized(size) => {
                if let Some(state) = &self.state {
                    if let (Some(width), Some(height)) =
                        (NonZeroU32::new(size.width), NonZeroU32::new(size.height))
                    {
                        state.gl_surface.resize(&state.gl_context, width, height);
                    }
                }
            }
            WindowEvent::RedrawRequested => {
                if let Err(e) = self.render() {
                    gfx_error!("prisma::demo", "Render error: {}", e);
                }
            }
            WindowEvent::KeyboardInput { event, .. } => {
                if event.state.is_pressed()
                    && event.physical_key == PhysicalKey::Code(KeyCode::Escape)
                {
                    event_loop.exit();
                }
            }
            _ => {}
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(state) = &self.state {
            state.window.request_redraw();
        }
    }
}
