//! Configuration loading and schema definitions
//!
//! Model selection and output formats, read from `imgtools.toml`.

mod loader;
mod schema;

pub use loader::Config;
pub use schema::*;
