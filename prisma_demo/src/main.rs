/*!
# Prisma Demo

Minimal real-time rendering demo: opens a window, compiles two shaders,
uploads a colored quad and draws it every frame through the prisma_gfx
resource and command abstractions, executing on the OpenGL driver backend.

The per-frame uniform data (projection, view, model matrices) lives in one
persistent-coherent mapped buffer: mapped once at startup, written every
frame, never unmapped until teardown.
*/

mod app;
mod dialog;
mod files;

use prisma_gfx::gfx_info;
use winit::event_loop::EventLoop;

fn main() {
    gfx_info!("prisma::demo", "Starting prisma demo");

    let event_loop = match EventLoop::new() {
        Ok(event_loop) => event_loop,
        Err(e) => {
            dialog::show_error(&format!("Failed to create event loop: {}", e));
            std::process::exit(1);
        }
    };

    let mut app = app::App::new();
    if let Err(e) = event_loop.run_app(&mut app) {
        dialog::show_error(&format!("Event loop error: {}", e));
        std::process::exit(1);
    }
}
