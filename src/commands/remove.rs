use anyhow::Result;
use log::debug;

use crate::catalog::Catalog;
use crate::install::{InstallManager, Layout, RemoveOutcome};
use crate::registry::PackageRegistry;
use crate::runtime::Runtime;

use super::Config;

/// Remove a package: its stable link and every installed version.
#[tracing::instrument(skip(runtime, config))]
pub fn remove<R: Runtime>(runtime: &R, name: &str, config: &Config) -> Result<()> {
    let layout = Layout::resolve(runtime, config.install_root.clone())?;
    let catalog = Catalog::load(runtime, &layout.catalog_path())?;
    let source = config.release_source();
    let manager = InstallManager::new(
        runtime,
        &source,
        config.http.clone(),
        layout.clone(),
        &catalog,
    );

    let resolved = catalog
        .resolve(name)
        .map(|spec| spec.name)
        .unwrap_or_else(|| name.to_string());
    debug!("Removing {}", resolved);

    match manager.remove(&resolved)? {
        RemoveOutcome::Removed => {
            let mut registry = PackageRegistry::new(runtime, layout);
            registry.refresh(&catalog)?;
            registry.mark_removed(&resolved);

            println!("Removed {}", resolved);
        }
        RemoveOutcome::NotInstalled => {
            println!("{} is not installed. Nothing to remove.", resolved);
        }
    }

    Ok(())
}
