use super::User;

/// One slash-command invocation as delivered by the platform
#[derive(Debug, Clone)]
pub struct Invocation {
    pub id: String,
    /// Command as typed, including the leading slash
    pub command: String,
    /// Anything typed after the command
    pub text: String,
    pub user: User,
    /// Where replies to this invocation are posted
    pub response_url: Option<String>,
}

impl Invocation {
    pub fn new(command: impl Into<String>, user: User) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            command: command.into(),
            text: String::new(),
            user,
            response_url: None,
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    pub fn with_response_url(mut self, url: impl Into<String>) -> Self {
        self.response_url = Some(url.into());
        self
    }
}
