//! Install phase reporting.
//!
//! The pipeline announces each phase through an [`InstallProgress`] sink so
//! the front end can stay responsive during long downloads and print status
//! as messages arrive.

use log::info;
use std::fmt;
use std::path::PathBuf;
use tokio::sync::mpsc;

/// One phase transition of an install operation.
#[derive(Debug, Clone, PartialEq)]
pub enum InstallEvent {
    Resolving { package: String },
    Selecting { tag: String },
    Downloading { asset: String },
    Linking { artifact: PathBuf },
    Done { tag: String },
}

impl fmt::Display for InstallEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InstallEvent::Resolving { package } => write!(f, "Resolving {}...", package),
            InstallEvent::Selecting { tag } => write!(f, "Selected release {}", tag),
            InstallEvent::Downloading { asset } => write!(f, "Downloading {}...", asset),
            InstallEvent::Linking { artifact } => {
                write!(f, "Linking {}", artifact.display())
            }
            InstallEvent::Done { tag } => write!(f, "Installed release {}", tag),
        }
    }
}

/// Sink for install phase events.
pub trait InstallProgress: Send + Sync {
    fn emit(&self, event: InstallEvent);
}

/// Reports phases to the log only.
pub struct LogProgress;

impl InstallProgress for LogProgress {
    fn emit(&self, event: InstallEvent) {
        info!("{}", event);
    }
}

/// Forwards phases to a channel consumed by the front end's printing loop.
pub struct ChannelProgress {
    tx: mpsc::UnboundedSender<InstallEvent>,
}

impl ChannelProgress {
    pub fn new(tx: mpsc::UnboundedSender<InstallEvent>) -> Self {
        Self { tx }
    }
}

impl InstallProgress for ChannelProgress {
    fn emit(&self, event: InstallEvent) {
        // A closed receiver just means nobody is watching anymore
        let _ = self.tx.send(event);
    }
}
