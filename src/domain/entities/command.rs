use std::collections::HashMap;

/// Slash commands the bot answers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommandKind {
    /// `/referclub` - look up or create the caller's referral code
    ReferClub,
    /// `/referralstats` - show usage statistics for the caller's code
    ReferralStats,
}

impl CommandKind {
    pub fn name(&self) -> &'static str {
        match self {
            CommandKind::ReferClub => "referclub",
            CommandKind::ReferralStats => "referralstats",
        }
    }
}

/// Describes one registered slash command
#[derive(Debug, Clone)]
pub struct Command {
    pub name: String,
    pub kind: CommandKind,
    pub description: Option<String>,
}

impl Command {
    pub fn new(kind: CommandKind) -> Self {
        Self {
            name: kind.name().to_string(),
            kind,
            description: None,
        }
    }

    pub fn with_description(mut self, desc: impl Into<String>) -> Self {
        self.description = Some(desc.into());
        self
    }

    /// Case-insensitive match, with or without the leading slash
    pub fn matches(&self, input: &str) -> bool {
        let input = input.trim().trim_start_matches('/').to_lowercase();
        self.name.to_lowercase() == input
    }
}

/// Command registry for routing invocations
#[derive(Debug, Default)]
pub struct CommandRegistry {
    commands: HashMap<String, Command>,
}

impl CommandRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding the two referral commands
    pub fn referral_commands() -> Self {
        let mut registry = Self::new();
        registry.register(
            Command::new(CommandKind::ReferClub)
                .with_description("Get or create your personal referral code"),
        );
        registry.register(
            Command::new(CommandKind::ReferralStats)
                .with_description("See how many people used your referral code"),
        );
        registry
    }

    pub fn register(&mut self, command: Command) {
        self.commands.insert(command.name.clone(), command);
    }

    pub fn find(&self, input: &str) -> Option<&Command> {
        self.commands.values().find(|c| c.matches(input))
    }

    pub fn all(&self) -> impl Iterator<Item = &Command> {
        self.commands.values()
    }
}
