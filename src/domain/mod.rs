pub mod ast;
pub mod manifest;
pub mod source;
pub mod target;
