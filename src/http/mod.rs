//! HTTP plumbing shared by the release source and the downloader.

mod client;

pub use client::{HttpClient, RequestError};
