//! Reply texts

use crate::domain::entities::{CommandRegistry, ReferralCode, ReferralFields};

pub const GENERIC_FAILURE: &str =
    "There was an error processing your request. Please try again later.";

pub const NO_CODE_YET: &str =
    "You do not have a referral code yet. Use `/referclub` to generate one.";

pub const LOOKING_UP: &str = "Looking up your referral code... :hourglass_flowing_sand:";

pub const GENERATING: &str = "No code found, generating a new one for you... :sparkles:";

pub const FETCHING_STATS: &str = "Fetching your referral stats... :hourglass_flowing_sand:";

/// Emoji shown next to the referral count
pub fn count_emoji(referral_count: u64) -> &'static str {
    if referral_count == 0 {
        ":rocket:"
    } else {
        ":tada:"
    }
}

fn share_line(apply_url: &str) -> String {
    format!(
        "Share this code with your friends to use when they apply for a club on {}!",
        apply_url
    )
}

pub fn new_code(code: &ReferralCode, apply_url: &str) -> String {
    format!(
        "A new referral code has been generated! :ultrafastparrot:\n\nYour referral code is: `{}`.\n\n{}",
        code,
        share_line(apply_url)
    )
}

pub fn existing_code(code: &ReferralCode, apply_url: &str) -> String {
    format!(
        "Your existing referral code is: `{}`.\n\n{}",
        code,
        share_line(apply_url)
    )
}

pub fn stats(fields: &ReferralFields) -> String {
    let generated_on = fields
        .created_date()
        .map(|d| d.format("%-m/%-d/%Y").to_string())
        .unwrap_or_else(|| "an unknown date".to_string());

    format!(
        "Your referral code is: `{}`\n\nYou have referred {} people so far! Keep sharing your code! {}\n\nYour referral code was generated on: {}",
        fields.referral_code,
        fields.referral_count,
        count_emoji(fields.referral_count),
        generated_on
    )
}

pub fn unknown_command(command: &str, registry: &CommandRegistry) -> String {
    let mut names: Vec<String> = registry
        .all()
        .map(|c| format!("  /{} - {}", c.name, c.description.as_deref().unwrap_or("")))
        .collect();
    names.sort();
    format!("I don't know `{}`. Available commands:\n{}", command, names.join("\n"))
}
