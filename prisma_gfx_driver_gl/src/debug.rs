//! OpenGL debug-output support (KHR_debug)
//!
//! Compiled in only with the `gl-debug` feature. Messages from the GL
//! implementation are routed into the prisma_gfx logger, with the GL severity
//! mapped onto the logger's severity levels.

use glow::HasContext;

use prisma_gfx::{gfx_debug, gfx_info, gfx_warn};

/// Enable synchronous debug output and install the message callback
///
/// Requires a debug-capable context; on contexts without KHR_debug the calls
/// are silently ignored by glow.
pub fn install(gl: &mut glow::Context) {
    unsafe {
        gl.enable(glow::DEBUG_OUTPUT);
        gl.enable(glow::DEBUG_OUTPUT_SYNCHRONOUS);
        gl.debug_message_callback(|source, kind, id, severity, message| {
            let source = source_name(source);
            let kind = kind_name(kind);
            match severity {
                glow::DEBUG_SEVERITY_HIGH | glow::DEBUG_SEVERITY_MEDIUM => {
                    gfx_warn!(
                        "prisma::gl::debug",
                        "[{} {} 0x{:x}] {}",
                        source,
                        kind,
                        id,
                        message
                    );
                }
                glow::DEBUG_SEVERITY_LOW => {
                    gfx_info!(
                        "prisma::gl::debug",
                        "[{} {} 0x{:x}] {}",
                        source,
                        kind,
                        id,
                        message
                    );
                }
                _ => {
                    gfx_debug!(
                        "prisma::gl::debug",
                        "[{} {} 0x{:x}] {}",
                        source,
                        kind,
                        id,
                        message
                    );
                }
            }
        });
    }
}

fn source_name(source: u32) -> &'static str {
    match source {
        glow::DEBUG_SOURCE_API => "api",
        glow::DEBUG_SOURCE_WINDOW_SYSTEM => "window-system",
        glow::DEBUG_SOURCE_SHADER_COMPILER => "shader-compiler",
        glow::DEBUG_SOURCE_THIRD_PARTY => "third-party",
        glow::DEBUG_SOURCE_APPLICATION => "application",
        _ => "other",
    }
}

fn kind_name(kind: u32) -> &'static str {
    match kind {
        glow::DEBUG_TYPE_ERROR => "error",
        glow::DEBUG_TYPE_DEPRECATED_BEHAVIOR => "deprecated",
        glow::DEBUG_TYPE_UNDEFINED_BEHAVIOR => "undefined-behavior",
        glow::DEBUG_TYPE_PORTABILITY => "portability",
        glow::DEBUG_TYPE_PERFORMANCE => "performance",
        glow::DEBUG_TYPE_MARKER => "marker",
        _ => "other",
    }
}
