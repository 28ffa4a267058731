//! Prompt assembly: fixed instruction templates plus named-slot rendering.

pub mod assembler;
pub mod templates;

pub use assembler::{assemble, MissingFieldError};
pub use templates::Methodology;
