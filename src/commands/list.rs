use anyhow::Result;
use log::debug;

use crate::catalog::Catalog;
use crate::install::Layout;
use crate::registry::PackageRegistry;
use crate::runtime::Runtime;
use crate::ui::{ListEntry, Styles, render_list};

use super::Config;

/// List known packages and their installed state.
#[tracing::instrument(skip(runtime, config))]
pub fn list<R: Runtime>(runtime: &R, config: &Config) -> Result<()> {
    let layout = Layout::resolve(runtime, config.install_root.clone())?;
    let catalog = Catalog::load(runtime, &layout.catalog_path())?;

    let mut registry = PackageRegistry::new(runtime, layout);
    registry.refresh(&catalog)?;
    debug!("Listing {} package(s)", registry.packages().len());

    if registry.packages().is_empty() {
        println!("No packages known.");
        return Ok(());
    }

    let mut entries = vec![ListEntry::Heading("Known packages:".into())];
    entries.extend(
        registry
            .packages()
            .iter()
            .cloned()
            .map(ListEntry::Package),
    );

    print!("{}", render_list(&Styles::default(), &entries));
    Ok(())
}
