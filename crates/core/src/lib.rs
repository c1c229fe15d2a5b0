// Docexec Core - Domain Logic & Ports
// NO process spawning, NO libc: OS concerns live behind the ports

pub mod application;
pub mod domain;
pub mod error;
pub mod port;

pub use error::{AppError, Result};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
