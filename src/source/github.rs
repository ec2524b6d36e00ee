//! GitHub releases API implementation of [`ReleaseSource`].

use anyhow::Result;
use async_trait::async_trait;
use log::debug;

use crate::http::{HttpClient, RequestError};

use super::{Release, ReleaseAsset, ReleaseSource, RepoId, SourceError};

pub const DEFAULT_API_URL: &str = "https://api.github.com";

/// GitHub API response types (internal).
mod api {
    use serde::Deserialize;

    #[derive(Deserialize, Debug)]
    pub struct Release {
        pub tag_name: String,
        #[serde(default)]
        pub draft: bool,
        #[serde(default)]
        pub prerelease: bool,
        #[serde(default)]
        pub published_at: Option<String>,
        #[serde(default)]
        pub assets: Vec<Asset>,
    }

    #[derive(Deserialize, Debug)]
    pub struct Asset {
        pub name: String,
        #[serde(default)]
        pub size: u64,
        pub browser_download_url: String,
    }
}

impl From<api::Release> for Release {
    fn from(r: api::Release) -> Self {
        Release {
            tag: r.tag_name,
            draft: r.draft,
            prerelease: r.prerelease,
            published_at: r.published_at,
            assets: r.assets.into_iter().map(Into::into).collect(),
        }
    }
}

impl From<api::Asset> for ReleaseAsset {
    fn from(a: api::Asset) -> Self {
        ReleaseAsset {
            name: a.name,
            size: a.size,
            download_url: a.browser_download_url,
        }
    }
}

/// Release source backed by the GitHub releases API.
pub struct GitHubReleases {
    http: HttpClient,
    api_url: String,
}

impl GitHubReleases {
    pub fn new(http: HttpClient, api_url: Option<String>) -> Self {
        Self {
            http,
            api_url: api_url.unwrap_or_else(|| DEFAULT_API_URL.to_string()),
        }
    }

    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    async fn fetch_releases(&self, repo: &RepoId) -> Result<Vec<api::Release>> {
        let url = format!("{}/repos/{}/{}/releases", self.api_url, repo.owner, repo.repo);
        let mut releases = Vec::new();
        let mut page = 1;

        // Limit to 10 pages (1000 releases) to prevent infinite loop
        while page <= 10 {
            debug!("Fetching releases page {} from {}...", page, url);

            let parsed: Vec<api::Release> = self
                .http
                .get_json(&url, &[("per_page", "100"), ("page", &page.to_string())])
                .await?;

            if parsed.is_empty() {
                break;
            }

            releases.extend(parsed);
            page += 1;
        }

        Ok(releases)
    }
}

#[async_trait]
impl ReleaseSource for GitHubReleases {
    #[tracing::instrument(skip(self))]
    async fn releases(&self, repo: &RepoId) -> Result<Vec<Release>> {
        match self.fetch_releases(repo).await {
            Ok(releases) => Ok(releases.into_iter().map(Into::into).collect()),
            Err(e) => {
                // An unknown repository and an unreachable source are
                // different conversations with the user.
                if matches!(
                    e.downcast_ref::<RequestError>(),
                    Some(RequestError::NotFound(_))
                ) {
                    Err(SourceError::ReleaseNotFound(repo.to_string()).into())
                } else {
                    Err(SourceError::Unavailable(format!("{:#}", e)).into())
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::latest_release;
    use reqwest::Client;

    fn github(url: &str) -> GitHubReleases {
        GitHubReleases::new(HttpClient::new(Client::new()), Some(url.to_string()))
    }

    #[test]
    fn test_default_api_url() {
        let source = GitHubReleases::new(HttpClient::new(Client::new()), None);
        assert_eq!(source.api_url(), DEFAULT_API_URL);
    }

    #[tokio::test]
    async fn test_releases_paged_fetch() {
        let mut server = mockito::Server::new_async().await;
        let url = server.url();

        let page1 = server
            .mock("GET", "/repos/helix-editor/helix/releases?per_page=100&page=1")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"[
                    {
                        "tag_name": "24.03",
                        "draft": false,
                        "prerelease": false,
                        "published_at": "2024-03-30T00:00:00Z",
                        "assets": [
                            {
                                "name": "helix-24.03.AppImage",
                                "size": 1024,
                                "browser_download_url": "https://example.com/helix-24.03.AppImage"
                            }
                        ]
                    },
                    {
                        "tag_name": "25.01-rc1",
                        "prerelease": true,
                        "assets": []
                    }
                ]"#,
            )
            .create_async()
            .await;
        let page2 = server
            .mock("GET", "/repos/helix-editor/helix/releases?per_page=100&page=2")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body("[]")
            .create_async()
            .await;

        let source = github(&url);
        let repo: RepoId = "helix-editor/helix".parse().unwrap();
        let releases = source.releases(&repo).await.unwrap();

        page1.assert_async().await;
        page2.assert_async().await;

        assert_eq!(releases.len(), 2);
        assert_eq!(releases[0].tag, "24.03");
        assert!(!releases[0].prerelease);
        assert_eq!(releases[0].assets.len(), 1);
        assert_eq!(releases[0].assets[0].name, "helix-24.03.AppImage");
        assert_eq!(
            releases[0].assets[0].download_url,
            "https://example.com/helix-24.03.AppImage"
        );
        assert!(releases[1].prerelease);
    }

    #[tokio::test]
    async fn test_latest_release_skips_prerelease() {
        let mut server = mockito::Server::new_async().await;
        let url = server.url();

        let _page1 = server
            .mock("GET", "/repos/o/r/releases?per_page=100&page=1")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"[
                    {"tag_name": "2.0.0-rc1", "prerelease": true, "published_at": "2024-06-01T00:00:00Z", "assets": []},
                    {"tag_name": "1.9.0", "prerelease": false, "published_at": "2024-05-01T00:00:00Z", "assets": []}
                ]"#,
            )
            .create_async()
            .await;
        let _page2 = server
            .mock("GET", "/repos/o/r/releases?per_page=100&page=2")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body("[]")
            .create_async()
            .await;

        let source = github(&url);
        let repo: RepoId = "o/r".parse().unwrap();
        let release = latest_release(&source, &repo).await.unwrap();
        assert_eq!(release.tag, "1.9.0");
    }

    #[tokio::test]
    async fn test_releases_unknown_repo_is_release_not_found() {
        let mut server = mockito::Server::new_async().await;
        let url = server.url();

        let _mock = server
            .mock("GET", "/repos/nobody/nothing/releases?per_page=100&page=1")
            .with_status(404)
            .create_async()
            .await;

        let source = github(&url);
        let repo: RepoId = "nobody/nothing".parse().unwrap();
        let err = source.releases(&repo).await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<SourceError>(),
            Some(SourceError::ReleaseNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_releases_server_failure_is_unavailable() {
        let mut server = mockito::Server::new_async().await;
        let url = server.url();

        let _mock = server
            .mock("GET", "/repos/o/r/releases?per_page=100&page=1")
            .with_status(502)
            .create_async()
            .await;

        let source = github(&url);
        let repo: RepoId = "o/r".parse().unwrap();
        let err = source.releases(&repo).await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<SourceError>(),
            Some(SourceError::Unavailable(_))
        ));
    }
}
