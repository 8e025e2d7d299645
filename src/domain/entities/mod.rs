//! Domain entities - Core business objects with no external dependencies

pub mod user;
pub mod invocation;
pub mod command;
pub mod referral;
pub mod filter;

pub use user::User;
pub use invocation::Invocation;
pub use command::{CommandKind, CommandRegistry};
pub use referral::{ReferralCode, ReferralFields, ReferralRecord};
pub use filter::Filter;
