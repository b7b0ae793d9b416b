//! Error dialog utility
//!
//! Used only for unrecoverable startup failures. Writes the message to the
//! logger and to stderr so it is visible even when no window exists yet.

use prisma_gfx::gfx_error;

/// Show an unrecoverable error to the user
pub fn show_error(message: &str) {
    gfx_error!("prisma::demo", "{}", message);
    eprintln!("error: {}", message);
}
