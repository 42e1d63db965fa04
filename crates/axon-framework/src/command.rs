//! Commands.
//!
//! A [`Command`] is identified by its label and may be invoked through any
//! of its aliases. Parsing the invocation out of a message is left to the
//! caller; the command receives the already-split arguments.

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use axon_core::{Message, ScopeId};
use futures::FutureExt;
use futures::future::BoxFuture;

use crate::policy::{CommandOptions, CommandPermissions};
use crate::registry::Entity;

/// Type-erased command execution logic.
pub type CommandFn = Arc<dyn Fn(CommandContext) -> BoxFuture<'static, anyhow::Result<()>> + Send + Sync>;

/// What a command receives when invoked.
#[derive(Debug, Clone)]
pub struct CommandContext {
    /// The invoking message.
    pub message: Message,
    /// Arguments following the command name.
    pub args: Vec<String>,
}

impl CommandContext {
    /// Scope of the invoking message.
    pub fn scope(&self) -> Option<&ScopeId> {
        self.message.guild_id.as_ref()
    }
}

/// A labelled command.
#[derive(Clone)]
pub struct Command {
    label: String,
    aliases: Vec<String>,
    description: String,
    module: String,
    options: Option<CommandOptions>,
    permissions: Option<CommandPermissions>,
    execute: CommandFn,
}

impl Command {
    /// Creates a command running `f`.
    pub fn new<F, Fut>(label: impl Into<String>, f: F) -> Self
    where
        F: Fn(CommandContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        Self {
            label: label.into(),
            aliases: Vec::new(),
            description: String::new(),
            module: String::new(),
            options: None,
            permissions: None,
            execute: Arc::new(move |ctx| f(ctx).boxed()),
        }
    }

    /// Adds an alternative invocation name.
    pub fn alias(mut self, alias: impl Into<String>) -> Self {
        self.aliases.push(alias.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Overrides the module's default options.
    pub fn with_options(mut self, options: CommandOptions) -> Self {
        self.options = Some(options);
        self
    }

    /// Overrides the module's default permissions.
    pub fn with_permissions(mut self, permissions: CommandPermissions) -> Self {
        self.permissions = Some(permissions);
        self
    }

    /// Sets the owning module label.
    pub fn with_module(mut self, module: impl Into<String>) -> Self {
        self.module = module.into();
        self
    }

    /// Fills the policies this command does not override.
    pub(crate) fn inherit(&mut self, options: &CommandOptions, permissions: &CommandPermissions) {
        if self.options.is_none() {
            self.options = Some(options.clone());
        }
        if self.permissions.is_none() {
            self.permissions = Some(permissions.clone());
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn aliases(&self) -> &[String] {
        &self.aliases
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn module(&self) -> &str {
        &self.module
    }

    /// Effective options, `None` until set or inherited.
    pub fn options(&self) -> Option<&CommandOptions> {
        self.options.as_ref()
    }

    /// Effective permissions, `None` until set or inherited.
    pub fn permissions(&self) -> Option<&CommandPermissions> {
        self.permissions.as_ref()
    }

    /// Runs the command.
    pub async fn execute(&self, ctx: CommandContext) -> anyhow::Result<()> {
        if self.options.as_ref().is_some_and(|o| o.guild_only) && ctx.scope().is_none() {
            anyhow::bail!("command '{}' can only be used in a guild", self.label);
        }
        (self.execute)(ctx).await
    }
}

impl Entity for Command {
    const KIND: &'static str = "command";

    fn label(&self) -> &str {
        &self.label
    }

    fn module(&self) -> &str {
        &self.module
    }
}

impl fmt::Debug for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Command")
            .field("label", &self.label)
            .field("aliases", &self.aliases)
            .field("module", &self.module)
            .field("options", &self.options)
            .field("permissions", &self.permissions)
            .finish_non_exhaustive()
    }
}
