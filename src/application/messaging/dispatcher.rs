//! Invocation dispatcher - hands each invocation to its own task

use std::sync::Arc;
use tokio::task::JoinHandle;

use crate::application::errors::ReferralError;
use crate::application::services::CommandService;
use crate::domain::entities::Invocation;

/// Runs every invocation concurrently on the tokio runtime.
///
/// Handlers share nothing mutable; the only shared resource is the remote
/// store, so two first-time `/referclub` calls from one user can both create.
#[derive(Clone)]
pub struct MessageDispatcher {
    commands: Arc<CommandService>,
}

impl MessageDispatcher {
    pub fn new(commands: Arc<CommandService>) -> Self {
        Self { commands }
    }

    /// Spawn a task handling `invocation`. Call only after the delivery is acknowledged.
    ///
    /// A handler that panics still gets the generic failure reply sent.
    pub fn dispatch(&self, invocation: Invocation) -> JoinHandle<()> {
        let commands = self.commands.clone();
        tracing::debug!("Dispatching {} ({})", invocation.command, invocation.id);
        tokio::spawn(async move {
            let handler = {
                let commands = commands.clone();
                let invocation = invocation.clone();
                tokio::spawn(async move { commands.handle(&invocation).await })
            };

            if let Err(e) = handler.await {
                commands
                    .report_failure(&invocation, &ReferralError::Unexpected(e.to_string()))
                    .await;
            }
        })
    }
}
