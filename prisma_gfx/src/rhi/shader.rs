/// ShaderModule - one driver shader compilation unit

use std::rc::Rc;

use crate::error::{Error, Result};
use crate::gfx_error;
use crate::rhi::{Driver, ShaderHandle};

/// Shader stage kind
///
/// A module is never reused across incompatible stage kinds; the kind is
/// fixed at creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShaderStage {
    /// Vertex shader
    Vertex,
    /// Fragment shader
    Fragment,
}

/// One compiled driver shader
///
/// Compiled exactly once, in the constructor. A module is consumed by one
/// pipeline link step and may be dropped right afterwards — the pipeline only
/// needs it during linking.
pub struct ShaderModule {
    driver: Rc<dyn Driver>,
    handle: ShaderHandle,
    stage: ShaderStage,
}

impl ShaderModule {
    /// Create and compile a shader module from source text
    ///
    /// Compile failure is reported with the stage kind, the driver-assigned
    /// handle and the full compiler log, and the half-built module is
    /// destroyed before returning.
    pub fn compile(driver: Rc<dyn Driver>, stage: ShaderStage, source: &str) -> Result<Self> {
        let handle = driver.create_shader(stage);
        if let Err(compile_log) = driver.compile_shader(handle, source) {
            gfx_error!(
                "prisma::shader",
                "{:?} shader (handle {}) failed to compile:\n{}",
                stage,
                handle,
                compile_log
            );
            driver.destroy_shader(handle);
            return Err(Error::ShaderCompilationFailed(format!(
                "{:?} shader (handle {}): {}",
                stage, handle, compile_log
            )));
        }
        Ok(Self {
            driver,
            handle,
            stage,
        })
    }

    /// Stage kind the module was created for
    pub fn stage(&self) -> ShaderStage {
        self.stage
    }

    /// Driver handle, for the pipeline link step
    pub(crate) fn handle(&self) -> ShaderHandle {
        self.handle
    }
}

impl Drop for ShaderModule {
    fn drop(&mut self) {
        self.driver.destroy_shader(self.handle);
    }
}
