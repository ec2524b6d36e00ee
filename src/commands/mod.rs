//! Command front end: one function per user action.

mod config;
mod install;
mod list;
mod remove;
mod upgrade;

use anyhow::Result;
use tokio::sync::mpsc;

pub use config::Config;

use crate::install::{ChannelProgress, InstallManager, InstallOutcome};
use crate::runtime::Runtime;
use crate::ui::Action;

/// Dispatches a user intent to its command.
pub async fn dispatch<R: Runtime>(runtime: &R, action: Action, config: Config) -> Result<()> {
    match action {
        Action::List => list::list(runtime, &config),
        Action::Install(name) => install::install(runtime, &name, &config).await,
        Action::Upgrade(name) => upgrade::upgrade(runtime, &name, &config).await,
        Action::Remove(name) => remove::remove(runtime, &name, &config),
    }
}

/// Runs an install while a background task prints its phase events, so the
/// front end keeps painting during long downloads.
pub(crate) async fn install_with_printer<R: Runtime>(
    manager: &InstallManager<'_, R>,
    name: &str,
) -> Result<InstallOutcome> {
    let (tx, mut rx) = mpsc::unbounded_channel();
    let printer = tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            println!("{}", event);
        }
    });

    let outcome = manager.install(name, &ChannelProgress::new(tx)).await;
    printer.await?;
    outcome
}
