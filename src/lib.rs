//! Authors and books resource API.
//!
//! Resource modules live under [`modules`]; [`app`] wires them to a
//! repository and serves them over HTTP.

pub mod app;
pub mod modules;
pub mod patch;
pub mod utils;

pub use app::{build_registry, router, serve};
pub use modules::LibraryState;
