//! GitHub Actions REST access
//!
//! This module provides:
//! - The `ActionsApi` trait collectors fetch through
//! - `GithubClient`, the reqwest implementation used in production
//!
//! Collectors never build URLs or touch HTTP themselves. Tests swap
//! the client for an in-memory implementation of the trait.

pub mod api;
pub mod client;

pub use api::{ActionsApi, FetchError};
pub use client::GithubClient;
