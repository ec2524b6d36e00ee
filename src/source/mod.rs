//! Release source abstraction.
//!
//! A release source answers "what has been published for this repository"
//! and nothing else; picking an artifact and putting it on disk belong to
//! the install pipeline.

mod github;

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub use github::GitHubReleases;

/// Repository identifier (owner/repo format).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RepoId {
    pub owner: String,
    pub repo: String,
}

impl fmt::Display for RepoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.repo)
    }
}

impl FromStr for RepoId {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split('/').collect();
        if parts.len() != 2 || parts[0].is_empty() || parts[1].is_empty() {
            anyhow::bail!("Invalid repository format. Expected 'owner/repo'.")
        } else {
            Ok(RepoId {
                owner: parts[0].to_string(),
                repo: parts[1].to_string(),
            })
        }
    }
}

/// A downloadable asset from a release.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReleaseAsset {
    pub name: String,
    pub size: u64,
    pub download_url: String,
}

/// A release from the source. Immutable snapshot, never persisted.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Release {
    /// Version tag (e.g., "23.10")
    pub tag: String,
    /// Whether this release is an unpublished draft
    pub draft: bool,
    /// Whether this is a pre-release
    pub prerelease: bool,
    /// Publication date (ISO 8601)
    pub published_at: Option<String>,
    /// Downloadable assets
    pub assets: Vec<ReleaseAsset>,
}

/// Failures at the release source boundary.
#[derive(Debug)]
pub enum SourceError {
    /// The source could not be reached or answered with a server failure.
    Unavailable(String),
    /// The repository does not exist or has no stable releases.
    ReleaseNotFound(String),
}

impl fmt::Display for SourceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceError::Unavailable(msg) => {
                write!(f, "Release source unavailable: {}", msg)
            }
            SourceError::ReleaseNotFound(repo) => {
                write!(f, "No stable release found for {}", repo)
            }
        }
    }
}

impl std::error::Error for SourceError {}

/// Selects the release to install from whatever the source returned.
///
/// The rule is explicit and independent of API ordering: the non-draft,
/// non-prerelease release with the greatest `published_at` wins. Releases
/// without a publication date sort last; ties fall back to tag comparison.
pub fn select_stable(releases: &[Release]) -> Option<&Release> {
    releases
        .iter()
        .filter(|r| !r.draft && !r.prerelease)
        .max_by(|a, b| match (&a.published_at, &b.published_at) {
            (Some(at_a), Some(at_b)) => at_a.cmp(at_b),
            (Some(_), None) => std::cmp::Ordering::Greater,
            (None, Some(_)) => std::cmp::Ordering::Less,
            (None, None) => a.tag.cmp(&b.tag),
        })
}

/// Trait for release sources (GitHub and API-compatible forges).
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ReleaseSource: Send + Sync {
    /// Fetch all releases for a repository.
    async fn releases(&self, repo: &RepoId) -> Result<Vec<Release>>;
}

/// Fetches the most recent stable release, per [`select_stable`].
pub async fn latest_release(source: &dyn ReleaseSource, repo: &RepoId) -> Result<Release> {
    let releases = source.releases(repo).await?;
    select_stable(&releases)
        .cloned()
        .ok_or_else(|| SourceError::ReleaseNotFound(repo.to_string()).into())
}
