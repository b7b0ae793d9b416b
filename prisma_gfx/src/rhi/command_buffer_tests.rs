//! Unit tests for CommandBuffer
//!
//! Asserts the exact driver-call sequence a recorded render pass translates
//! to, and the bracket/compatibility rules around it.

use std::rc::Rc;

use crate::rhi::mock_driver::RecordingDriver;
use crate::rhi::{
    Buffer, BufferDesc, BufferStorageFlags, CommandBuffer, DescriptorSet,
    DescriptorSetLayoutInfo, DescriptorWrite, Driver, GraphicsPipeline, GraphicsPipelineDesc,
    IndexType, PrimitiveTopology, RenderPassInfo, RenderingAttachmentInfo, ScalarType,
    VertexInputAttribute, VertexInputBinding, VertexInputDescription,
};

fn test_driver() -> (Rc<RecordingDriver>, Rc<dyn Driver>) {
    let driver = Rc::new(RecordingDriver::new());
    let dyn_driver: Rc<dyn Driver> = driver.clone();
    (driver, dyn_driver)
}

fn quad_pipeline(driver: &Rc<dyn Driver>) -> Rc<GraphicsPipeline> {
    let pipeline = GraphicsPipeline::new(
        driver.clone(),
        GraphicsPipelineDesc {
            vertex_source: "#version 450 core\nvoid main() {}\n".to_string(),
            fragment_source: "#version 450 core\nvoid main() {}\n".to_string(),
            vertex_input: VertexInputDescription {
                bindings: vec![VertexInputBinding {
                    binding: 0,
                    stride: 28,
                }],
                attributes: vec![VertexInputAttribute {
                    location: 0,
                    binding: 0,
                    components: 3,
                    scalar: ScalarType::F32,
                    normalized: false,
                    offset: 0,
                }],
            },
            descriptor_layout: DescriptorSetLayoutInfo::single_uniform_buffer(0),
        },
    );
    pipeline.create().unwrap();
    pipeline
}

fn buffer(driver: &Rc<dyn Driver>, size: u64) -> Rc<Buffer> {
    Buffer::new(
        driver.clone(),
        &BufferDesc {
            size,
            flags: BufferStorageFlags::MAP_WRITE,
        },
        None,
    )
    .unwrap()
}

fn clear_pass() -> RenderPassInfo {
    RenderPassInfo {
        color: Some(RenderingAttachmentInfo::clear_color([0.1, 0.2, 0.3, 1.0])),
        depth_stencil: Some(RenderingAttachmentInfo::clear_depth_stencil(1.0, 0)),
    }
}

// ============================================================================
// BRACKET RULES
// ============================================================================

#[test]
fn test_nested_begin_render_pass_fails() {
    let (_, driver) = test_driver();
    let mut cmd = CommandBuffer::new(driver);

    cmd.begin_render_pass(&clear_pass()).unwrap();
    assert!(cmd.begin_render_pass(&clear_pass()).is_err());
}

#[test]
fn test_end_render_pass_outside_pass_fails() {
    let (_, driver) = test_driver();
    let mut cmd = CommandBuffer::new(driver);

    assert!(cmd.end_render_pass().is_err());
}

#[test]
fn test_binds_outside_render_pass_fail() {
    let (_, driver) = test_driver();
    let pipeline = quad_pipeline(&driver);
    let vertex_buffer = buffer(&driver, 112);
    let mut cmd = CommandBuffer::new(driver);

    assert!(cmd.bind_graphics_pipeline(&pipeline).is_err());
    assert!(cmd.bind_vertex_buffer(0, &vertex_buffer, 0).is_err());
    assert!(cmd.bind_index_buffer(&vertex_buffer).is_err());
    assert!(cmd
        .draw_indexed(PrimitiveTopology::TriangleList, 6, IndexType::U32)
        .is_err());
}

#[test]
fn test_render_pass_can_be_recorded_again_after_end() {
    let (_, driver) = test_driver();
    let mut cmd = CommandBuffer::new(driver);

    cmd.begin_render_pass(&clear_pass()).unwrap();
    cmd.end_render_pass().unwrap();
    cmd.begin_render_pass(&clear_pass()).unwrap();
    cmd.end_render_pass().unwrap();
}

#[test]
fn test_end_render_pass_drops_transient_pipeline_reference() {
    let (_, driver) = test_driver();
    let pipeline = quad_pipeline(&driver);
    let set = DescriptorSet::new(DescriptorSetLayoutInfo::single_uniform_buffer(0)).unwrap();
    let mut cmd = CommandBuffer::new(driver);

    cmd.begin_render_pass(&clear_pass()).unwrap();
    cmd.bind_graphics_pipeline(&pipeline).unwrap();
    cmd.end_render_pass().unwrap();

    // The next pass starts with no bound pipeline
    cmd.begin_render_pass(&clear_pass()).unwrap();
    assert!(cmd.bind_descriptor_set(&set).is_err());
}

// ============================================================================
// PIPELINE AND DESCRIPTOR SET BINDING
// ============================================================================

#[test]
fn test_bind_pipeline_activates_program_and_vertex_array() {
    let (recording, driver) = test_driver();
    let pipeline = quad_pipeline(&driver);
    let mut cmd = CommandBuffer::new(driver);

    cmd.begin_render_pass(&clear_pass()).unwrap();
    cmd.bind_graphics_pipeline(&pipeline).unwrap();

    assert_eq!(recording.call_count("bind_program"), 1);
    assert_eq!(recording.call_count("bind_vertex_array"), 1);
    assert!(recording.bound_program.get().is_some());
}

#[test]
fn test_bind_uncreated_pipeline_fails() {
    let (_, driver) = test_driver();
    let pipeline = GraphicsPipeline::new(
        driver.clone(),
        GraphicsPipelineDesc {
            vertex_source: String::new(),
            fragment_source: String::new(),
            vertex_input: VertexInputDescription::default(),
            descriptor_layout: DescriptorSetLayoutInfo::default(),
        },
    );
    let mut cmd = CommandBuffer::new(driver);

    cmd.begin_render_pass(&clear_pass()).unwrap();
    assert!(cmd.bind_graphics_pipeline(&pipeline).is_err());
}

#[test]
fn test_bind_descriptor_set_before_pipeline_fails() {
    let (_, driver) = test_driver();
    let set = DescriptorSet::new(DescriptorSetLayoutInfo::single_uniform_buffer(0)).unwrap();
    let mut cmd = CommandBuffer::new(driver);

    cmd.begin_render_pass(&clear_pass()).unwrap();
    assert!(cmd.bind_descriptor_set(&set).is_err());
}

#[test]
fn test_bind_descriptor_set_with_incompatible_layout_fails() {
    let (_, driver) = test_driver();
    let pipeline = quad_pipeline(&driver);
    // Pipeline expects binding 0; this set declares binding 2
    let set = DescriptorSet::new(DescriptorSetLayoutInfo::single_uniform_buffer(2)).unwrap();
    let mut cmd = CommandBuffer::new(driver);

    cmd.begin_render_pass(&clear_pass()).unwrap();
    cmd.bind_graphics_pipeline(&pipeline).unwrap();
    assert!(cmd.bind_descriptor_set(&set).is_err());
}

#[test]
fn test_bind_descriptor_set_with_dangling_buffer_fails() {
    let (_, driver) = test_driver();
    let pipeline = quad_pipeline(&driver);
    let mut set = DescriptorSet::new(DescriptorSetLayoutInfo::single_uniform_buffer(0)).unwrap();
    {
        let uniform = buffer(&driver, 192);
        set.update(&[DescriptorWrite {
            dst_binding: 0,
            buffer: uniform,
            offset: 0,
            range: 192,
        }])
        .unwrap();
        // The owner destroys the buffer while the set still references it
    }
    let mut cmd = CommandBuffer::new(driver);

    cmd.begin_render_pass(&clear_pass()).unwrap();
    cmd.bind_graphics_pipeline(&pipeline).unwrap();
    assert!(cmd.bind_descriptor_set(&set).is_err());
}

#[test]
fn test_bind_vertex_buffer_to_undeclared_slot_fails() {
    let (_, driver) = test_driver();
    let pipeline = quad_pipeline(&driver);
    let vertex_buffer = buffer(&driver, 112);
    let mut cmd = CommandBuffer::new(driver);

    cmd.begin_render_pass(&clear_pass()).unwrap();
    cmd.bind_graphics_pipeline(&pipeline).unwrap();
    assert!(cmd.bind_vertex_buffer(3, &vertex_buffer, 0).is_err());
}

// ============================================================================
// FULL FRAME TRANSLATION ORDER
// ============================================================================

#[test]
fn test_recorded_frame_translates_in_exact_order() {
    let (recording, driver) = test_driver();
    let pipeline = quad_pipeline(&driver);
    let uniform = buffer(&driver, 192);
    let vertex_buffer = buffer(&driver, 112);
    let index_buffer = buffer(&driver, 24);

    let mut set = DescriptorSet::new(DescriptorSetLayoutInfo::single_uniform_buffer(0)).unwrap();
    set.update(&[DescriptorWrite {
        dst_binding: 0,
        buffer: uniform.clone(),
        offset: 0,
        range: 192,
    }])
    .unwrap();

    let calls_before = recording.recorded_calls().len();

    let mut cmd = CommandBuffer::new(driver);
    cmd.begin_render_pass(&clear_pass()).unwrap();
    cmd.bind_graphics_pipeline(&pipeline).unwrap();
    cmd.bind_descriptor_set(&set).unwrap();
    cmd.bind_vertex_buffer(0, &vertex_buffer, 0).unwrap();
    cmd.bind_index_buffer(&index_buffer).unwrap();
    cmd.draw_indexed(PrimitiveTopology::TriangleList, 6, IndexType::U32)
        .unwrap();
    cmd.end_render_pass().unwrap();

    // Handle numbering is deterministic on the recording driver: the
    // pipeline consumed handles 1-4 (two shaders, program, vertex array),
    // then the three buffers took 5-7.
    let calls = recording.recorded_calls()[calls_before..].to_vec();
    assert_eq!(
        calls,
        vec![
            "clear_color_target".to_string(),
            "clear_depth_stencil_target".to_string(),
            "bind_program(3)".to_string(),
            "bind_vertex_array(4)".to_string(),
            "bind_uniform_buffer_range(binding=0, buffer=5, offset=0, size=192)".to_string(),
            "bind_vertex_buffer(slot=0, buffer=6, offset=0, stride=28)".to_string(),
            "bind_index_buffer(7)".to_string(),
            "draw_indexed(TriangleList, 6, U32)".to_string(),
        ]
    );

    // The clear is observed strictly before the draw
    let clear_pos = calls.iter().position(|c| c == "clear_color_target").unwrap();
    let draw_pos = calls
        .iter()
        .position(|c| c.starts_with("draw_indexed"))
        .unwrap();
    assert!(clear_pos < draw_pos);
}

#[test]
fn test_preserve_load_op_issues_no_clear() {
    let (recording, driver) = test_driver();
    let mut cmd = CommandBuffer::new(driver);

    cmd.begin_render_pass(&RenderPassInfo {
        color: Some(RenderingAttachmentInfo::preserve_color()),
        depth_stencil: None,
    })
    .unwrap();
    cmd.end_render_pass().unwrap();

    assert_eq!(recording.call_count("clear_color_target"), 0);
    assert_eq!(recording.call_count("clear_depth_stencil_target"), 0);
}

#[test]
fn test_set_viewport_is_forwarded() {
    let (recording, driver) = test_driver();
    let mut cmd = CommandBuffer::new(driver);

    cmd.begin_render_pass(&clear_pass()).unwrap();
    cmd.set_viewport(0, 0, 800, 600).unwrap();
    cmd.end_render_pass().unwrap();

    assert_eq!(recording.call_count("set_viewport"), 1);
}
