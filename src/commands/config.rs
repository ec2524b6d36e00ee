use anyhow::Result;
use log::debug;
use reqwest::{
    Client,
    header::{AUTHORIZATION, HeaderMap, HeaderValue},
};
use std::env;
use std::path::PathBuf;

use crate::http::HttpClient;
use crate::source::GitHubReleases;

/// Shared wiring for every command: the HTTP client and the global flags.
pub struct Config {
    pub http: HttpClient,
    pub install_root: Option<PathBuf>,
    pub api_url: Option<String>,
}

impl Config {
    pub fn new(install_root: Option<PathBuf>, api_url: Option<String>) -> Result<Self> {
        let mut headers = HeaderMap::new();
        if let Ok(token) = env::var("GITHUB_TOKEN") {
            let mut auth_value = HeaderValue::from_str(&format!("Bearer {}", token))?;
            auth_value.set_sensitive(true);
            headers.insert(AUTHORIZATION, auth_value);
            debug!("Using GITHUB_TOKEN for authentication");
        }

        let client = Client::builder()
            .user_agent("grundle-cli")
            .default_headers(headers)
            .build()?;

        Ok(Self {
            http: HttpClient::new(client),
            install_root,
            api_url,
        })
    }

    pub fn release_source(&self) -> GitHubReleases {
        GitHubReleases::new(self.http.clone(), self.api_url.clone())
    }
}
