/// RHI module - explicit-API resource and command types

// Module declarations
pub mod driver;
pub mod buffer;
pub mod shader;
pub mod descriptor_set;
pub mod pipeline;
pub mod render_pass;
pub mod command_buffer;

#[cfg(test)]
pub mod mock_driver;

// Re-export everything from the leaf modules
pub use driver::*;
pub use buffer::*;
pub use shader::*;
pub use descriptor_set::*;
pub use pipeline::*;
pub use render_pass::*;
pub use command_buffer::*;
