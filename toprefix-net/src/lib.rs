// toprefix-net/src/lib.rs
pub mod http;

pub use http::download;
