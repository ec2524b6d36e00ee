//! Presentation boundary for the command front end.
//!
//! Styling is a plain configuration value handed to the renderer, and list
//! entries are typed variants carrying their payload, so rendering is an
//! exhaustive match with nothing to downcast and no process-wide state.

use crate::registry::Package;

/// Rendering configuration, passed by value to wherever it is needed.
#[derive(Debug, Clone)]
pub struct Styles {
    pub installed_marker: String,
    pub absent_marker: String,
    pub missing_version: String,
}

impl Default for Styles {
    fn default() -> Self {
        Self {
            installed_marker: "*".into(),
            absent_marker: " ".into(),
            missing_version: "-".into(),
        }
    }
}

/// One row of the package browser.
#[derive(Debug, Clone, PartialEq)]
pub enum ListEntry {
    Heading(String),
    Package(Package),
}

/// User intents the front end can dispatch.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    List,
    Install(String),
    Upgrade(String),
    Remove(String),
}

/// Renders the package browser as text.
pub fn render_list(styles: &Styles, entries: &[ListEntry]) -> String {
    let mut out = String::new();
    for entry in entries {
        match entry {
            ListEntry::Heading(heading) => {
                out.push_str(heading);
                out.push('\n');
            }
            ListEntry::Package(package) => {
                out.push_str(&render_package(styles, package));
                out.push('\n');
            }
        }
    }
    out
}

fn render_package(styles: &Styles, package: &Package) -> String {
    let marker = if package.is_installed() {
        &styles.installed_marker
    } else {
        &styles.absent_marker
    };
    let version = package
        .installed_version
        .as_deref()
        .unwrap_or(&styles.missing_version);
    let description = package.description.as_deref().unwrap_or("");

    format!("{} {:<16} {:<12} {}", marker, package.name, version, description)
        .trim_end()
        .to_string()
}
