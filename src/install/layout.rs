//! Install root directory layout.
//!
//! Every path the installer owns is derived here:
//!
//! ```text
//! <root>/packages/<name>/<name>.<tag>   versioned artifacts
//! <root>/bin/<name>                     stable symlink
//! <root>/catalog.json                   optional catalog overlay
//! ```

use anyhow::{Context, Result};
use log::info;
use std::path::{Path, PathBuf};

use crate::runtime::Runtime;

pub const DEFAULT_ROOT_DIR: &str = ".grundle";

#[derive(Debug, Clone)]
pub struct Layout {
    root: PathBuf,
}

impl Layout {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    /// Resolves the install root: an explicit override wins, otherwise
    /// `~/.grundle`.
    #[tracing::instrument(skip(runtime, override_root))]
    pub fn resolve<R: Runtime>(runtime: &R, override_root: Option<PathBuf>) -> Result<Self> {
        let root = match override_root {
            Some(path) => path,
            None => runtime
                .home_dir()
                .context("Could not find home directory")?
                .join(DEFAULT_ROOT_DIR),
        };

        info!("Using install root: {}", root.display());
        Ok(Self::new(root))
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn packages_dir(&self) -> PathBuf {
        self.root.join("packages")
    }

    pub fn bin_dir(&self) -> PathBuf {
        self.root.join("bin")
    }

    pub fn package_dir(&self, name: &str) -> PathBuf {
        self.packages_dir().join(name)
    }

    /// Versioned artifact slot for one release of a package.
    pub fn artifact_path(&self, name: &str, tag: &str) -> PathBuf {
        self.package_dir(name).join(format!("{}.{}", name, tag))
    }

    /// The stable path callers invoke.
    pub fn link_path(&self, name: &str) -> PathBuf {
        self.bin_dir().join(name)
    }

    pub fn catalog_path(&self) -> PathBuf {
        self.root.join("catalog.json")
    }

    /// Recovers the tag from an artifact path named `<name>.<tag>`.
    pub fn tag_from_artifact(name: &str, artifact: &Path) -> Option<String> {
        let file_name = artifact.file_name()?.to_str()?;
        file_name
            .strip_prefix(name)?
            .strip_prefix('.')
            .map(Into::into)
    }
}
