use std::fmt;

/// The Slack user who invoked a command
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct User {
    pub id: String,
    pub username: Option<String>,
    pub real_name: Option<String>,
}

impl User {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            username: None,
            real_name: None,
        }
    }

    pub fn with_username(mut self, username: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self
    }

    pub fn with_real_name(mut self, real_name: impl Into<String>) -> Self {
        self.real_name = Some(real_name.into());
        self
    }

    /// Name used to derive a referral code prefix: real name first, then the
    /// handle, then the raw id.
    pub fn display_name(&self) -> &str {
        self.real_name
            .as_deref()
            .filter(|n| !n.trim().is_empty())
            .or_else(|| self.username.as_deref().filter(|n| !n.trim().is_empty()))
            .unwrap_or(&self.id)
    }
}

impl fmt::Display for User {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.display_name(), self.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_name_prefers_real_name() {
        let user = User::new("U123").with_username("alice").with_real_name("Alice Liddell");
        assert_eq!(user.display_name(), "Alice Liddell");
    }

    #[test]
    fn test_display_name_falls_back_to_username() {
        let user = User::new("U123").with_username("alice").with_real_name("  ");
        assert_eq!(user.display_name(), "alice");
        assert_eq!(User::new("U123").display_name(), "U123");
    }
}
