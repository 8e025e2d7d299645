//! Referral records and referral code generation

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Literal first segment of every referral code
pub const CODE_PREFIX: &str = "HC";

/// Number of name characters kept in the second segment
const NAME_PREFIX_LEN: usize = 3;

/// Number of random base-36 characters in the third segment
const RANDOM_LEN: u32 = 3;

/// Field names of the referral table
pub mod fields {
    pub const SLACK_ID: &str = "slackID";
    pub const REFERRAL_CODE: &str = "referralCode";
    pub const CREATED_AT: &str = "createdAt";
    pub const REFERRAL_COUNT: &str = "referralCount";
    pub const IS_ACTIVE: &str = "isActive";
    pub const EMAIL: &str = "email";
}

/// A referral code of the form `HC_<NAME>_<RANDOM>_<TIMESTAMP>`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReferralCode(String);

impl ReferralCode {
    /// Generate a code for `display_name` from the wall clock and a random value.
    pub fn generate(display_name: &str) -> Self {
        let millis = Utc::now().timestamp_millis().max(0) as u64;
        // uuid v4 is our source of randomness; the low bits are uniform enough here
        let entropy = uuid::Uuid::new_v4().as_u128() as u64;
        Self::generate_at(display_name, millis, entropy)
    }

    /// Deterministic core of [`ReferralCode::generate`].
    ///
    /// The name segment is the first three characters of the uppercased name
    /// with anything outside `[A-Z0-9]` dropped, so it can be shorter than three.
    pub fn generate_at(display_name: &str, millis: u64, entropy: u64) -> Self {
        let name: String = display_name
            .to_uppercase()
            .chars()
            .take(NAME_PREFIX_LEN)
            .filter(|c| c.is_ascii_alphanumeric())
            .collect();

        let random = entropy % 36u64.pow(RANDOM_LEN);
        let random = format!("{:0>width$}", to_base36(random), width = RANDOM_LEN as usize);

        Self(format!("{}_{}_{}_{}", CODE_PREFIX, name, random, to_base36(millis)))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for ReferralCode {
    fn from(code: String) -> Self {
        Self(code)
    }
}

impl fmt::Display for ReferralCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Upper-case base-36 rendering of `n`
pub fn to_base36(mut n: u64) -> String {
    const DIGITS: &[u8; 36] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ";

    if n == 0 {
        return "0".to_string();
    }

    let mut out = Vec::new();
    while n > 0 {
        out.push(DIGITS[(n % 36) as usize]);
        n /= 36;
    }
    out.reverse();
    String::from_utf8_lossy(&out).into_owned()
}

/// Fields of one row in the referral table, named the way the table names them.
///
/// `createdAt` is kept as the raw string the table returns; dates typed into
/// the table by hand don't always carry a time component.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReferralFields {
    #[serde(rename = "slackID")]
    pub slack_id: String,

    #[serde(rename = "referralCode")]
    pub referral_code: ReferralCode,

    #[serde(rename = "createdAt", default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,

    #[serde(rename = "referralCount", default)]
    pub referral_count: u64,

    #[serde(rename = "isActive", default)]
    pub is_active: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

impl ReferralFields {
    /// Fields for a freshly issued code: zero referrals, active.
    pub fn new(
        slack_id: impl Into<String>,
        referral_code: ReferralCode,
        created_at: DateTime<Utc>,
        email: Option<String>,
    ) -> Self {
        Self {
            slack_id: slack_id.into(),
            referral_code,
            created_at: Some(created_at.to_rfc3339_opts(chrono::SecondsFormat::Millis, true)),
            referral_count: 0,
            is_active: true,
            email,
        }
    }

    /// Calendar date the code was created, if the stored value parses.
    pub fn created_date(&self) -> Option<NaiveDate> {
        let raw = self.created_at.as_deref()?.trim();
        DateTime::parse_from_rfc3339(raw)
            .map(|dt| dt.with_timezone(&Utc).date_naive())
            .or_else(|_| NaiveDate::parse_from_str(raw, "%Y-%m-%d"))
            .ok()
    }

    /// String value of a named field, for filter evaluation
    pub fn field_value(&self, name: &str) -> Option<String> {
        match name {
            fields::SLACK_ID => Some(self.slack_id.clone()),
            fields::REFERRAL_CODE => Some(self.referral_code.as_str().to_string()),
            fields::CREATED_AT => self.created_at.clone(),
            fields::REFERRAL_COUNT => Some(self.referral_count.to_string()),
            fields::IS_ACTIVE => Some(if self.is_active { "1" } else { "0" }.to_string()),
            fields::EMAIL => self.email.clone(),
            _ => None,
        }
    }
}

/// A stored row: the store's record id plus its fields
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReferralRecord {
    pub id: String,
    pub fields: ReferralFields,
}

#[cfg(test)]
mod tests {
    use super::*;
    use regex_lite::Regex;

    fn code_pattern() -> Regex {
        Regex::new(r"^HC_[A-Z0-9]{0,3}_[A-Z0-9]{3}_[A-Z0-9]+$").unwrap()
    }

    #[test]
    fn test_base36() {
        assert_eq!(to_base36(0), "0");
        assert_eq!(to_base36(35), "Z");
        assert_eq!(to_base36(36), "10");
        assert_eq!(to_base36(1_704_067_200_000), "LQU5M2O0");
    }

    #[test]
    fn test_code_segments() {
        let code = ReferralCode::generate_at("alice", 1_704_067_200_000, 36 * 36 + 1);
        assert_eq!(code.as_str(), "HC_ALI_101_LQU5M2O0");
    }

    #[test]
    fn test_random_segment_is_zero_padded() {
        let code = ReferralCode::generate_at("bob", 36, 7);
        assert_eq!(code.as_str(), "HC_BOB_007_10");
    }

    #[test]
    fn test_short_name_gives_short_prefix() {
        let code = ReferralCode::generate_at("jo", 1, 0);
        assert_eq!(code.as_str(), "HC_JO_000_1");

        let code = ReferralCode::generate_at("", 1, 0);
        assert_eq!(code.as_str(), "HC__000_1");
        assert!(code_pattern().is_match(code.as_str()));
    }

    #[test]
    fn test_name_segment_is_uppercased_first_three() {
        for name in ["alice", "Bob Marley", "zed42", "ÅSA", "x.y-z_w"] {
            let code = ReferralCode::generate(name);
            assert!(code_pattern().is_match(code.as_str()), "bad code {} for {}", code, name);
        }

        for name in ["alice", "Rustacean", "abc", "q1w2e3"] {
            let code = ReferralCode::generate(name);
            let segment = code.as_str().split('_').nth(1).unwrap();
            assert_eq!(segment, name.to_uppercase()[..3].to_string());
        }
    }

    #[test]
    fn test_name_segment_comes_from_start_of_name() {
        let cases = [
            ("Al Smith", "AL"),
            ("J.R. Tolkien", "JR"),
            ("Élodie", "LO"),
            ("O'Neil", "ON"),
            ("  bob", "B"),
        ];
        for (name, expected) in cases {
            let code = ReferralCode::generate_at(name, 1, 0);
            assert_eq!(code.as_str(), format!("HC_{}_000_1", expected), "for {:?}", name);
            assert!(code_pattern().is_match(code.as_str()));
        }
    }

    #[test]
    fn test_new_fields_defaults() {
        let now = DateTime::parse_from_rfc3339("2024-01-01T00:00:00Z").unwrap().with_timezone(&Utc);
        let fields = ReferralFields::new("U123", ReferralCode::from("HC_ALI_X1Y_Z2W".to_string()), now, None);

        assert_eq!(fields.referral_count, 0);
        assert!(fields.is_active);
        assert_eq!(fields.created_at.as_deref(), Some("2024-01-01T00:00:00.000Z"));
        assert_eq!(fields.created_date(), NaiveDate::from_ymd_opt(2024, 1, 1));
    }

    #[test]
    fn test_fields_use_table_names() {
        let json = serde_json::json!({
            "slackID": "U123",
            "referralCode": "HC_ALI_X1Y_Z2W",
            "referralCount": 5,
            "createdAt": "2024-01-01T00:00:00Z"
        });
        let fields: ReferralFields = serde_json::from_value(json).unwrap();
        assert_eq!(fields.referral_count, 5);
        assert!(!fields.is_active);
        assert_eq!(fields.email, None);

        let out = serde_json::to_value(&fields).unwrap();
        assert_eq!(out["slackID"], "U123");
        assert!(out.get("email").is_none());
    }

    #[test]
    fn test_created_date_accepts_plain_dates() {
        let mut fields = ReferralFields::new("U1", ReferralCode::from("HC".to_string()), Utc::now(), None);
        fields.created_at = Some("2023-12-31".to_string());
        assert_eq!(fields.created_date(), NaiveDate::from_ymd_opt(2023, 12, 31));

        fields.created_at = Some("yesterday".to_string());
        assert_eq!(fields.created_date(), None);
    }
}
