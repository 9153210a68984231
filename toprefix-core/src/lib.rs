// toprefix-core/src/lib.rs

pub mod build;
pub mod catalog;
pub mod env;
pub mod exec;
pub mod source;

// Re-export the types the CLI crate works with
pub use build::{Backend, Package, ProcessOptions};
pub use catalog::Catalog;
pub use env::Environment;
pub use source::Source;
