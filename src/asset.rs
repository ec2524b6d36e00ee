//! Asset selection policy.

use log::{debug, warn};

use crate::source::ReleaseAsset;

/// Trait for selecting an asset from a release's asset list.
pub trait AssetPicker: Send + Sync {
    /// Pick the single installable asset.
    ///
    /// Returns `None` when no asset qualifies. That is a normal outcome,
    /// not an error: the package simply isn't distributed in an installable
    /// form.
    fn pick<'a>(&self, assets: &'a [ReleaseAsset]) -> Option<&'a ReleaseAsset>;
}

/// Picks the one asset whose filename ends with a packaging suffix.
///
/// Zero matches means "nothing to install". More than one match is treated
/// as ambiguous and also selects nothing, rather than guessing which variant
/// the user wanted.
pub struct SuffixPicker {
    suffix: String,
}

impl SuffixPicker {
    pub fn new(suffix: impl Into<String>) -> Self {
        Self {
            suffix: suffix.into().to_lowercase(),
        }
    }

    /// Picker for AppImage-packaged releases.
    pub fn appimage() -> Self {
        Self::new(".AppImage")
    }

    fn matches(&self, name: &str) -> bool {
        name.to_lowercase().ends_with(&self.suffix)
    }
}

impl AssetPicker for SuffixPicker {
    fn pick<'a>(&self, assets: &'a [ReleaseAsset]) -> Option<&'a ReleaseAsset> {
        let candidates: Vec<&ReleaseAsset> =
            assets.iter().filter(|a| self.matches(&a.name)).collect();

        match candidates.as_slice() {
            &[single] => Some(single),
            &[] => {
                debug!("No asset matches suffix '{}'", self.suffix);
                None
            }
            multiple => {
                let names: Vec<&str> = multiple.iter().map(|a| a.name.as_str()).collect();
                warn!(
                    "{} assets match suffix '{}' ({}); refusing to guess",
                    multiple.len(),
                    self.suffix,
                    names.join(", ")
                );
                None
            }
        }
    }
}
