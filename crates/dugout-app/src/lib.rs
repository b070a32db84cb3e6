// Library root: re-exports all modules so integration tests and the binary
// share the same public API.

pub mod card;
pub mod render;
pub mod service;
pub mod source;
