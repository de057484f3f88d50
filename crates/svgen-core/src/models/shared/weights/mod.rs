//! Parameter persistence for the output heads.

pub mod safetensors;

pub use safetensors::{fresh_var_builder, load_weights, save_weights};
