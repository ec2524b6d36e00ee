//! Known-package catalog: the name → owner/repo mapping.
//!
//! A built-in seed covers well-known AppImage-distributed applications; an
//! optional `catalog.json` under the install root overlays it (matching
//! names replace the seed entry, new names extend it). Anything else can be
//! addressed ad hoc as `owner/repo`.

use anyhow::{Context, Result};
use log::debug;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::runtime::Runtime;
use crate::source::RepoId;

/// A catalog entry mapping a package name to its repository.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PackageSpec {
    pub name: String,
    pub owner: String,
    pub repo: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl PackageSpec {
    pub fn repo_id(&self) -> RepoId {
        RepoId {
            owner: self.owner.clone(),
            repo: self.repo.clone(),
        }
    }
}

/// The set of packages grundle knows how to resolve.
pub struct Catalog {
    entries: Vec<PackageSpec>,
}

impl Catalog {
    pub fn new(entries: Vec<PackageSpec>) -> Self {
        Self { entries }
    }

    /// The built-in seed catalog.
    pub fn builtin() -> Self {
        let spec = |name: &str, owner: &str, repo: &str, description: &str| PackageSpec {
            name: name.into(),
            owner: owner.into(),
            repo: repo.into(),
            description: Some(description.into()),
        };

        Self {
            entries: vec![
                spec(
                    "helix",
                    "helix-editor",
                    "helix",
                    "A post-modern modal text editor",
                ),
                spec(
                    "neovim",
                    "neovim",
                    "neovim",
                    "Vim-fork focused on extensibility and usability",
                ),
                spec(
                    "joplin",
                    "laurent22",
                    "joplin",
                    "Privacy-focused note taking app",
                ),
                spec(
                    "localsend",
                    "localsend",
                    "localsend",
                    "Share files to nearby devices",
                ),
            ],
        }
    }

    /// Loads the catalog: built-in seed plus the overlay file, if present.
    pub fn load<R: Runtime>(runtime: &R, overlay_path: &Path) -> Result<Self> {
        let mut catalog = Self::builtin();

        if runtime.exists(overlay_path) {
            debug!("Loading catalog overlay from {:?}", overlay_path);
            let contents = runtime
                .read_to_string(overlay_path)
                .with_context(|| format!("Failed to read catalog at {:?}", overlay_path))?;
            let overlay: Vec<PackageSpec> = serde_json::from_str(&contents)
                .with_context(|| format!("Failed to parse catalog at {:?}", overlay_path))?;
            for entry in overlay {
                catalog.upsert(entry);
            }
        }

        Ok(catalog)
    }

    fn upsert(&mut self, entry: PackageSpec) {
        match self.entries.iter_mut().find(|e| e.name == entry.name) {
            Some(existing) => *existing = entry,
            None => self.entries.push(entry),
        }
    }

    /// Resolves a package name to its spec.
    ///
    /// Catalog names win; an `owner/repo` argument is accepted as a one-off
    /// entry named after the repository.
    pub fn resolve(&self, name: &str) -> Option<PackageSpec> {
        if let Some(entry) = self.entries.iter().find(|e| e.name == name) {
            return Some(entry.clone());
        }

        name.parse::<RepoId>().ok().map(|repo| PackageSpec {
            name: repo.repo.clone(),
            owner: repo.owner,
            repo: repo.repo,
            description: None,
        })
    }

    pub fn entries(&self) -> &[PackageSpec] {
        &self.entries
    }
}
