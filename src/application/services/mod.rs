//! Application services
//!
//! Concrete service implementations that orchestrate domain logic.
//! Services depend on I/O boundary traits (UserDirectory, SignupStore, etc.)
//! but are themselves concrete structs, not traits.

mod message;
mod signup;
mod users;

pub use message::{
    CreateMessage, ListMessages, MessageService, StarTarget, DEFAULT_NOTICE_SUBJECT,
    DEFAULT_SUBJECT,
};
pub use signup::{AddSignup, SignupService};
pub use users::UserResolver;
