/// Axum integration for Quill.
#[cfg(feature = "axum")]
pub mod axum;
