//! Unit tests for error.rs

use crate::error::Error;

// ============================================================================
// DISPLAY FORMATTING
// ============================================================================

#[test]
fn test_error_display_backend() {
    let error = Error::BackendError("driver call failed".to_string());
    assert_eq!(error.to_string(), "Backend error: driver call failed");
}

#[test]
fn test_error_display_invalid_resource() {
    let error = Error::InvalidResource("undeclared binding 5".to_string());
    assert_eq!(error.to_string(), "Invalid resource: undeclared binding 5");
}

#[test]
fn test_error_display_invalid_operation() {
    let error = Error::InvalidOperation("buffer is already mapped".to_string());
    assert_eq!(
        error.to_string(),
        "Invalid operation: buffer is already mapped"
    );
}

#[test]
fn test_error_display_shader_compilation() {
    let error = Error::ShaderCompilationFailed("Fragment shader (handle 2): 0:1 bad".to_string());
    assert_eq!(
        error.to_string(),
        "Shader compilation failed: Fragment shader (handle 2): 0:1 bad"
    );
}

#[test]
fn test_error_display_program_link() {
    let error = Error::ProgramLinkFailed("program 3: unresolved symbol".to_string());
    assert_eq!(
        error.to_string(),
        "Program link failed: program 3: unresolved symbol"
    );
}

// ============================================================================
// TRAIT IMPLEMENTATIONS
// ============================================================================

#[test]
fn test_error_is_std_error() {
    fn assert_std_error<E: std::error::Error>(_: &E) {}
    assert_std_error(&Error::BackendError("x".to_string()));
}

#[test]
fn test_error_clone_and_debug() {
    let error = Error::InvalidResource("dup".to_string());
    let cloned = error.clone();
    assert_eq!(format!("{:?}", error), format!("{:?}", cloned));
}
