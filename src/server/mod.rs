//! Server module for webconsole
//!
//! - `config`: configuration structures
//! - `loader`: configuration loading from files and environment
//! - `init`: service construction, router assembly and the run loop

pub mod config;
mod init;
mod loader;

pub use init::{build_router, build_service, run};
pub use loader::load_config;
