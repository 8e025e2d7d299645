//! Application layer - Use cases and business logic
//!
//! This layer contains:
//! - Services: the referral command handlers
//! - Errors: Domain-specific errors
//! - Messaging: payload parsing, dispatching, reply texts

pub mod errors;
pub mod services;
pub mod messaging;
