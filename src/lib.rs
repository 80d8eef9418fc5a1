//! bpcli: operator commands for community signups and private messages.
//!
//! Layers, innermost first:
//! - `domain`: entities and identifier parsing
//! - `application`: services orchestrating the data-access traits
//! - `infrastructure`: trait definitions, the JSON store and DI wiring
//! - `cli`: clap definitions, dispatch and output shaping

pub mod application;
pub mod cli;
pub mod config;
pub mod domain;
pub mod exitcode;
pub mod infrastructure;
pub mod util;
