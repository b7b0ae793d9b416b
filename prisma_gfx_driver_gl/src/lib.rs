/*!
# Prisma GFX - OpenGL Driver Backend

OpenGL implementation of the prisma_gfx [`Driver`](prisma_gfx::rhi::Driver)
trait, using the glow bindings.

The driver targets a core profile context of version 4.4 or newer (immutable
buffer storage and persistent mappings are required). The caller creates the
context through its windowing library, makes it current on the owning thread
and hands the loader function to [`GlDriver::new`]; from then on every driver
call must stay on that thread.
*/

mod gl_driver;
#[cfg(feature = "gl-debug")]
mod debug;

pub use gl_driver::GlDriver;
