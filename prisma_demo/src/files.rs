//! Filesystem helpers

use std::path::Path;

use prisma_gfx::gfx_error;

/// Read a whole file as UTF-8 text
///
/// Returns `None` on any failure; the error is logged with the path.
pub fn read_text_file(path: impl AsRef<Path>) -> Option<String> {
    let path = path.as_ref();
    match std::fs::read_to_string(path) {
        Ok(text) => Some(text),
        Err(e) => {
            gfx_error!(
                "prisma::demo::files",
                "Failed to read '{}': {}",
                path.display(),
                e
            );
            None
        }
    }
}
