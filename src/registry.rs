//! In-memory view of known packages and their installed state.
//!
//! The registry is a read-through presentation layer: `refresh` rebuilds it
//! from the catalog plus the symlink truth on disk, and the mark methods
//! keep it in step with the installer between refreshes. It is never the
//! source of truth for what is installed.

use anyhow::Result;
use log::debug;
use std::path::PathBuf;

use crate::catalog::Catalog;
use crate::install::Layout;
use crate::runtime::Runtime;

/// A known package and whatever install state the filesystem shows for it.
#[derive(Debug, Clone, PartialEq)]
pub struct Package {
    pub name: String,
    pub description: Option<String>,
    pub installed_version: Option<String>,
    pub install_path: Option<PathBuf>,
}

impl Package {
    pub fn is_installed(&self) -> bool {
        self.installed_version.is_some()
    }
}

pub struct PackageRegistry<'a, R: Runtime> {
    runtime: &'a R,
    layout: Layout,
    entries: Vec<Package>,
}

impl<'a, R: Runtime> PackageRegistry<'a, R> {
    pub fn new(runtime: &'a R, layout: Layout) -> Self {
        Self {
            runtime,
            layout,
            entries: Vec::new(),
        }
    }

    /// Rebuilds the view: every catalog entry, plus anything installed under
    /// `bin/` that the catalog doesn't know about.
    pub fn refresh(&mut self, catalog: &Catalog) -> Result<()> {
        let mut entries: Vec<Package> = catalog
            .entries()
            .iter()
            .map(|spec| self.inspect(&spec.name, spec.description.clone()))
            .collect();

        let bin_dir = self.layout.bin_dir();
        if self.runtime.is_dir(&bin_dir) {
            for path in self.runtime.read_dir(&bin_dir)? {
                let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
                    continue;
                };
                if entries.iter().any(|p| p.name == name) {
                    continue;
                }
                debug!("Discovered uncataloged install: {}", name);
                entries.push(self.inspect(name, None));
            }
        }

        self.entries = entries;
        Ok(())
    }

    /// Reads a package's installed state off the stable symlink.
    fn inspect(&self, name: &str, description: Option<String>) -> Package {
        let link = self.layout.link_path(name);
        let mut package = Package {
            name: name.to_string(),
            description,
            installed_version: None,
            install_path: None,
        };

        if !self.runtime.is_symlink(&link) {
            return package;
        }
        match self.runtime.read_link(&link) {
            Ok(target) if self.runtime.exists(&target) => {
                package.installed_version = Layout::tag_from_artifact(name, &target);
                package.install_path = Some(link);
            }
            Ok(target) => {
                debug!("Link for {} dangles at {:?}; treating as not installed", name, target);
            }
            Err(e) => {
                debug!("Unreadable link for {}: {:#}", name, e);
            }
        }

        package
    }

    pub fn packages(&self) -> &[Package] {
        &self.entries
    }

    pub fn get(&self, name: &str) -> Option<&Package> {
        self.entries.iter().find(|p| p.name == name)
    }

    /// Records a successful install.
    pub fn mark_installed(&mut self, name: &str, version: &str, path: PathBuf) {
        match self.entries.iter_mut().find(|p| p.name == name) {
            Some(package) => {
                package.installed_version = Some(version.to_string());
                package.install_path = Some(path);
            }
            None => self.entries.push(Package {
                name: name.to_string(),
                description: None,
                installed_version: Some(version.to_string()),
                install_path: Some(path),
            }),
        }
    }

    /// Records an explicit removal. The package stays known; only its
    /// install state is cleared.
    pub fn mark_removed(&mut self, name: &str) {
        if let Some(package) = self.entries.iter_mut().find(|p| p.name == name) {
            package.installed_version = None;
            package.install_path = None;
        }
    }
}
