//! Domain layer: entities and identifier parsing
//!
//! This layer is independent of external concerns (no I/O, no CLI, no config loading).

pub mod entities;
pub mod error;
pub mod refs;

pub use entities::*;
pub use error::DomainError;
pub use refs::{SignupRef, UserRef};
