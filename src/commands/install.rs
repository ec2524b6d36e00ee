use anyhow::Result;
use log::debug;

use crate::catalog::Catalog;
use crate::install::{InstallManager, InstallOutcome, Layout};
use crate::registry::PackageRegistry;
use crate::runtime::Runtime;

use super::Config;

/// Install the latest stable release of a package.
#[tracing::instrument(skip(runtime, config))]
pub async fn install<R: Runtime>(runtime: &R, name: &str, config: &Config) -> Result<()> {
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
    debug!("Installing {} (resolved from '{}')", resolved, name);

    match super::install_with_printer(&manager, name).await? {
        InstallOutcome::Installed { tag, artifact: _ } => {
            let link = layout.link_path(&resolved);
            let mut registry = PackageRegistry::new(runtime, layout.clone());
            registry.refresh(&catalog)?;
            registry.mark_installed(&resolved, &tag, link.clone());

            println!("Installed {} {} -> {}", resolved, tag, link.display());
        }
        InstallOutcome::AlreadyCurrent { tag } => {
            println!("{} {} is already installed.", resolved, tag);
        }
        InstallOutcome::NoInstallableArtifact { tag } => {
            println!(
                "{} {} is not distributed as an AppImage. Nothing to install.",
                resolved, tag
            );
        }
    }

    Ok(())
}
