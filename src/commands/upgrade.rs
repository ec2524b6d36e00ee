use anyhow::Result;
use log::debug;

use crate::catalog::Catalog;
use crate::install::{InstallManager, InstallOutcome, Layout};
use crate::registry::PackageRegistry;
use crate::runtime::Runtime;

use super::Config;

/// Upgrade an installed package to the latest stable release.
///
/// Re-resolving and re-installing is the same pipeline as `install`; the
/// difference is only in how the outcome is reported against the previously
/// installed version.
#[tracing::instrument(skip(runtime, config))]
pub async fn upgrade<R: Runtime>(runtime: &R, name: &str, config: &Config) -> Result<()> {
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

    let mut registry = PackageRegistry::new(runtime, layout.clone());
    registry.refresh(&catalog)?;
    let previous = registry
        .get(&resolved)
        .and_then(|p| p.installed_version.clone());
    debug!("Upgrading {} (currently {:?})", resolved, previous);

    match super::install_with_printer(&manager, name).await? {
        InstallOutcome::Installed { tag, artifact: _ } => {
            let link = layout.link_path(&resolved);
            registry.mark_installed(&resolved, &tag, link);

            match previous {
                Some(old) if old != tag => {
                    println!("Upgraded {} {} -> {}", resolved, old, tag);
                }
                _ => println!("Installed {} {}", resolved, tag),
            }
        }
        InstallOutcome::AlreadyCurrent { tag } => {
            println!("{} {} is already up to date.", resolved, tag);
        }
        InstallOutcome::NoInstallableArtifact { tag } => {
            println!(
                "{} {} is not distributed as an AppImage. Nothing to upgrade.",
                resolved, tag
            );
        }
    }

    Ok(())
}
