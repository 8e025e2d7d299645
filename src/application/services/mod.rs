//! Application services - Business logic orchestration

pub mod command_service;
pub mod referral_service;

pub use command_service::CommandService;
pub use referral_service::ReferralService;
