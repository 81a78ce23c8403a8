//! Credential-caching client for the EZVIZ open platform API: cache-first access tokens backed by
//! pluggable expiring caches, plus one RPC dispatch path that serves both JSON and binary
//! endpoints.

#![deny(clippy::all, missing_docs, unused_crate_dependencies)]

pub mod auth;
pub mod cache;
pub mod client;
pub mod config;
pub mod error;
pub mod http;
pub mod obs;
pub mod rpc;
#[cfg(all(any(test, feature = "test"), feature = "reqwest"))]
pub mod _preludet {
	//! Convenience re-exports and helpers for integration tests; enabled via `cfg(test)` or the
	//! `test` crate feature.

	pub use crate::_prelude::*;

	// self
	use crate::{
		cache::{ExpiringCache, MemoryCache},
		client::Client,
		config::ClientConfig,
		http::ReqwestHttpClient,
	};

	/// Client type alias used by reqwest-backed integration tests.
	pub type ReqwestTestClient = Client<ReqwestHttpClient>;

	/// Builds a reqwest HTTP client with the default request timeout.
	pub fn test_reqwest_http_client() -> ReqwestHttpClient {
		ReqwestHttpClient::with_timeout(ClientConfig::DEFAULT_TIMEOUT)
			.expect("Failed to build Reqwest client for tests.")
	}

	/// Constructs a [`Client`] pointed at `base_url` (typically an `httpmock` server) and backed
	/// by an in-memory cache that the caller can inspect.
	pub fn build_reqwest_test_client(
		base_url: &str,
		app_key: &str,
		app_secret: &str,
	) -> (ReqwestTestClient, Arc<MemoryCache>) {
		let config = ClientConfig::builder(app_key, app_secret)
			.host(base_url)
			.build()
			.expect("Test client configuration should be valid.");
		let cache_backend = Arc::new(MemoryCache::default());
		let cache: Arc<dyn ExpiringCache> = cache_backend.clone();
		let client = Client::with_http_client(config, test_reqwest_http_client(), cache);

		(client, cache_backend)
	}
}

mod _prelude {
	pub use std::{
		collections::BTreeMap,
		error::Error as StdError,
		fmt::{Debug, Display, Formatter, Result as FmtResult},
		future::Future,
		pin::Pin,
		sync::Arc,
	};

	pub use parking_lot::RwLock;
	#[cfg(feature = "reqwest")]
	pub use reqwest::{Client as ReqwestClient, Error as ReqwestError};
	pub use serde::{Deserialize, Serialize, de::DeserializeOwned};
	pub use thiserror::Error as ThisError;
	pub use time::OffsetDateTime;
	pub use url::Url;

	pub use crate::error::{Error, Result};
}

#[cfg(feature = "reqwest")] pub use reqwest;
pub use url;
#[cfg(test)] use {color_eyre as _, httpmock as _};
