/*!
# Prisma GFX

Explicit-API rendering shim over an immediate-mode graphics driver.

This crate gives callers modern, object-shaped GPU resources — buffers,
descriptor sets, graphics pipelines, command buffers — and translates every
operation, at call time, into the correct sequence of state-setting calls
against a classic global-state driver interface (OpenGL-style). The driver
itself is abstracted behind the [`Driver`](rhi::Driver) trait; backend
implementations (e.g. the `prisma_gfx_driver_gl` crate) provide the real
driver, and the in-crate recording mock drives the unit tests.

## Architecture

- **Driver**: the single implicit driver context, modelled as an explicit
  object. Exactly one exists per process and every call must happen on the
  thread that owns it — which is why it is shared as `Rc<dyn Driver>`.
- **Buffer**: one immutable-size driver storage allocation, optionally
  host-mappable (including persistent + coherent mappings).
- **DescriptorSet**: a validated mapping from binding slots to uniform
  buffer ranges.
- **GraphicsPipeline**: compiled shader stages plus vertex-input layout,
  immutable after creation.
- **CommandBuffer**: records render-pass setup, resource binds and draws.
  Recording and execution are the same instant; the explicit-API surface
  exists for structural clarity, not for deferred submission.
*/

// Internal modules
mod error;
pub mod log;
pub mod rhi;

pub use error::{Error, Result};
