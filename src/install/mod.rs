//! Install orchestration.
//!
//! `InstallManager` owns everything under the install root and is the only
//! code that mutates it. One install is one pass through resolve → select →
//! download → link; every step either completes or aborts without touching
//! the previously installed state.

pub mod layout;
pub mod progress;
mod symlink;

use anyhow::{Context, Result};
use log::{debug, info};
use std::collections::HashSet;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::asset::{AssetPicker, SuffixPicker};
use crate::catalog::Catalog;
use crate::download;
use crate::http::HttpClient;
use crate::runtime::Runtime;
use crate::source::{self, ReleaseSource};

pub use layout::Layout;
pub use progress::{ChannelProgress, InstallEvent, InstallProgress, LogProgress};

/// Install failures with a typed identity (everything else travels as
/// plain `anyhow` context).
#[derive(Debug)]
pub enum InstallError {
    /// The name is not in the catalog and is not an owner/repo form.
    UnknownPackage(String),
    /// Another install of the same package is still running.
    InProgress(String),
    /// Permission or path failure while staging or linking.
    Filesystem(String),
}

impl fmt::Display for InstallError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InstallError::UnknownPackage(name) => {
                write!(
                    f,
                    "Unknown package '{}'. Use the owner/repo form or add it to catalog.json.",
                    name
                )
            }
            InstallError::InProgress(name) => {
                write!(f, "An install of '{}' is already in progress", name)
            }
            InstallError::Filesystem(msg) => write!(f, "Filesystem error: {}", msg),
        }
    }
}

impl std::error::Error for InstallError {}

/// How an install invocation ended, when it didn't fail outright.
#[derive(Debug, Clone, PartialEq)]
pub enum InstallOutcome {
    /// A new artifact was downloaded and linked.
    Installed { tag: String, artifact: PathBuf },
    /// The stable link already resolves to this release's artifact.
    AlreadyCurrent { tag: String },
    /// The release has no unambiguous installable artifact. Nothing was
    /// written; this is information, not an error.
    NoInstallableArtifact { tag: String },
}

#[derive(Debug, Clone, PartialEq)]
pub enum RemoveOutcome {
    Removed,
    NotInstalled,
}

/// Orchestrates the install pipeline and owns the install root.
pub struct InstallManager<'a, R: Runtime> {
    runtime: &'a R,
    source: &'a dyn ReleaseSource,
    http: HttpClient,
    layout: Layout,
    catalog: &'a Catalog,
    picker: Box<dyn AssetPicker>,
    in_flight: Mutex<HashSet<String>>,
}

impl<'a, R: Runtime> InstallManager<'a, R> {
    pub fn new(
        runtime: &'a R,
        source: &'a dyn ReleaseSource,
        http: HttpClient,
        layout: Layout,
        catalog: &'a Catalog,
    ) -> Self {
        Self {
            runtime,
            source,
            http,
            layout,
            catalog,
            picker: Box::new(SuffixPicker::appimage()),
            in_flight: Mutex::new(HashSet::new()),
        }
    }

    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    /// Installs (or repairs/upgrades to) the latest stable release of a
    /// package.
    #[tracing::instrument(skip(self, progress))]
    pub async fn install(
        &self,
        name: &str,
        progress: &dyn InstallProgress,
    ) -> Result<InstallOutcome> {
        let spec = self
            .catalog
            .resolve(name)
            .ok_or_else(|| InstallError::UnknownPackage(name.to_string()))?;

        let _guard = self.claim(&spec.name)?;

        progress.emit(InstallEvent::Resolving {
            package: spec.name.clone(),
        });
        let repo = spec.repo_id();
        let release = source::latest_release(self.source, &repo)
            .await
            .with_context(|| format!("Failed to resolve a release for '{}'", spec.name))?;

        progress.emit(InstallEvent::Selecting {
            tag: release.tag.clone(),
        });
        let Some(asset) = self.picker.pick(&release.assets) else {
            info!(
                "{} {} has no installable artifact; leaving everything untouched",
                spec.name, release.tag
            );
            return Ok(InstallOutcome::NoInstallableArtifact { tag: release.tag });
        };

        let artifact = self.layout.artifact_path(&spec.name, &release.tag);
        let link = self.layout.link_path(&spec.name);

        if self.is_current(&artifact, &link) {
            debug!("{} {} is already installed and linked", spec.name, release.tag);
            return Ok(InstallOutcome::AlreadyCurrent { tag: release.tag });
        }

        progress.emit(InstallEvent::Downloading {
            asset: asset.name.clone(),
        });
        download::fetch_artifact(self.runtime, &self.http, &asset.download_url, &artifact).await?;

        self.runtime
            .set_executable(&artifact)
            .map_err(|e| InstallError::Filesystem(format!("{:#}", e)))?;

        progress.emit(InstallEvent::Linking {
            artifact: artifact.clone(),
        });
        symlink::replace_link(self.runtime, &artifact, &link)
            .map_err(|e| InstallError::Filesystem(format!("{:#}", e)))?;

        progress.emit(InstallEvent::Done {
            tag: release.tag.clone(),
        });
        Ok(InstallOutcome::Installed {
            tag: release.tag,
            artifact,
        })
    }

    /// Removes the stable link and every installed version of a package.
    #[tracing::instrument(skip(self))]
    pub fn remove(&self, name: &str) -> Result<RemoveOutcome> {
        let link = self.layout.link_path(name);
        let package_dir = self.layout.package_dir(name);
        let mut removed = false;

        if self.runtime.is_symlink(&link) {
            self.runtime
                .remove_symlink(&link)
                .map_err(|e| InstallError::Filesystem(format!("{:#}", e)))?;
            removed = true;
        }

        if self.runtime.is_dir(&package_dir) {
            self.runtime
                .remove_dir_all(&package_dir)
                .map_err(|e| InstallError::Filesystem(format!("{:#}", e)))?;
            removed = true;
        }

        Ok(if removed {
            RemoveOutcome::Removed
        } else {
            RemoveOutcome::NotInstalled
        })
    }

    /// True when the artifact exists and the stable link resolves to it.
    fn is_current(&self, artifact: &Path, link: &Path) -> bool {
        self.runtime.exists(artifact)
            && self.runtime.is_symlink(link)
            && self
                .runtime
                .read_link(link)
                .map(|target| target == artifact)
                .unwrap_or(false)
    }

    /// Claims the per-name in-flight slot for the duration of one install.
    fn claim(&self, name: &str) -> Result<InFlightGuard<'_>> {
        let mut in_flight = self.in_flight.lock().expect("in-flight set poisoned");
        if !in_flight.insert(name.to_string()) {
            return Err(InstallError::InProgress(name.to_string()).into());
        }
        Ok(InFlightGuard {
            set: &self.in_flight,
            name: name.to_string(),
        })
    }
}

struct InFlightGuard<'m> {
    set: &'m Mutex<HashSet<String>>,
    name: String,
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        if let Ok(mut set) = self.set.lock() {
            set.remove(&self.name);
        }
    }
}
