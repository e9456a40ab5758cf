pub mod code;
pub mod document;
