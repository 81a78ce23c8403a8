//! Client facade owning configuration, transport, expiring cache, and the active token.

mod dispatch;
mod refresh;

pub use refresh::TokenSource;

// self
use crate::{
	_prelude::*,
	auth::Secret,
	cache::ExpiringCache,
	config::ClientConfig,
	http::RpcHttpClient,
};
#[cfg(feature = "reqwest")] use crate::{cache::FileCache, http::ReqwestHttpClient};

/// Crate version, sent in the `User-Agent` header.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(feature = "reqwest")]
/// Client specialized for the crate's default reqwest transport.
pub type ReqwestEzvizClient = Client<ReqwestHttpClient>;

/// Entry point for authenticated calls against the API.
///
/// The client owns the HTTP transport, the expiring cache that persists the access token
/// between runs, and the token currently in use. Token refresh needs `&mut self`, so a client
/// shared across tasks must sit behind the caller's own synchronization; dispatch only reads the
/// token and takes `&self`.
pub struct Client<C>
where
	C: ?Sized + RpcHttpClient,
{
	/// Immutable settings (credentials, host, dispatch mode, verbosity).
	pub config: ClientConfig,
	/// HTTP transport used for every outbound request.
	pub http_client: Arc<C>,
	/// Single-slot cache holding the last authentication response.
	pub cache: Arc<dyn ExpiringCache>,
	access_token: Option<Secret>,
}
impl<C> Client<C>
where
	C: ?Sized + RpcHttpClient,
{
	/// Creates a client from caller-provided transport and cache.
	pub fn with_http_client(
		config: ClientConfig,
		http_client: impl Into<Arc<C>>,
		cache: Arc<dyn ExpiringCache>,
	) -> Self {
		Self { config, http_client: http_client.into(), cache, access_token: None }
	}

	/// Replaces the expiring cache.
	pub fn with_cache(mut self, cache: Arc<dyn ExpiringCache>) -> Self {
		self.cache = cache;

		self
	}

	/// Seeds the active token, e.g. one obtained out of band.
	pub fn with_access_token(mut self, token: impl Into<String>) -> Self {
		self.access_token = Some(Secret::new(token));

		self
	}

	/// Token attached to outgoing calls, if one is held.
	pub fn access_token(&self) -> Option<&Secret> {
		self.access_token.as_ref()
	}

	/// Forgets the in-memory token; the cache is left untouched.
	pub fn invalidate_access_token(&mut self) {
		self.access_token = None;
	}
}
#[cfg(feature = "reqwest")]
impl Client<ReqwestHttpClient> {
	/// Creates a client with a reqwest transport bounded by `config.timeout` and a file cache
	/// named after the application key inside `config.cache_dir`.
	pub fn new(config: ClientConfig) -> Result<Self> {
		let http_client = ReqwestHttpClient::with_timeout(config.timeout)?;
		let cache: Arc<dyn ExpiringCache> =
			Arc::new(FileCache::for_app_key(&config.cache_dir, &config.app_key));

		Ok(Self::with_http_client(config, http_client, cache))
	}
}
impl<C> Debug for Client<C>
where
	C: ?Sized + RpcHttpClient,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("Client")
			.field("config", &self.config)
			.field("access_token_set", &self.access_token.is_some())
			.finish()
	}
}

#[cfg(all(test, feature = "reqwest"))]
mod tests {
	// crates.io
	use httpmock::prelude::*;
	// self
	use super::*;
	use crate::{_preludet::*, client::TokenSource, rpc::QueryParams};

	const TOKEN_BODY: &str =
		r#"{"code":"200","msg":"","data":{"accessToken":"TOK","expireTime":1999999999000}}"#;

	#[tokio::test]
	async fn refreshed_token_is_attached_to_later_calls() {
		let server = MockServer::start_async().await;
		let (mut client, cache) = build_reqwest_test_client(&server.base_url(), "K", "S");
		let token_mock = server
			.mock_async(|when, then| {
				when.method(POST).path("/lapp/token/get");
				then.status(200).header("content-type", "application/json").body(TOKEN_BODY);
			})
			.await;
		let list_mock = server
			.mock_async(|when, then| {
				when.method(GET).path("/lapp/device/list").query_param("accessToken", "TOK");
				then.status(200)
					.header("content-type", "application/json")
					.body(r#"{"code":"200","msg":"","data":["C1","C2"]}"#);
			})
			.await;
		let source =
			client.refresh_access_token().await.expect("Authentication should succeed.");

		assert_eq!(source, TokenSource::Network);
		assert!(cache.is_populated());

		let devices: Vec<String> = client
			.call("lapp/device/list", QueryParams::new())
			.await
			.expect("Authenticated call should succeed.");

		assert_eq!(devices, ["C1", "C2"]);

		token_mock.assert_calls_async(1).await;
		list_mock.assert_calls_async(1).await;
	}

	#[tokio::test]
	async fn invalidated_token_is_restored_from_cache() {
		let server = MockServer::start_async().await;
		let (mut client, _cache) = build_reqwest_test_client(&server.base_url(), "K", "S");
		let token_mock = server
			.mock_async(|when, then| {
				when.method(POST).path("/lapp/token/get");
				then.status(200).header("content-type", "application/json").body(TOKEN_BODY);
			})
			.await;

		client.refresh_access_token().await.expect("Authentication should succeed.");
		client.invalidate_access_token();

		assert!(client.access_token().is_none());
		assert_eq!(
			client.refresh_access_token().await.expect("Cached refresh should succeed."),
			TokenSource::Cache
		);
		assert_eq!(client.access_token().map(|token| token.expose()), Some("TOK"));

		token_mock.assert_calls_async(1).await;
	}

	#[test]
	fn debug_hides_token_value() {
		let config = ClientConfig::builder("K", "S").build().expect("Config should build.");
		let client: ReqwestTestClient = Client::with_http_client(
			config,
			test_reqwest_http_client(),
			Arc::new(crate::cache::MemoryCache::default()) as Arc<dyn ExpiringCache>,
		)
		.with_access_token("TOK");
		let rendered = format!("{client:?}");

		assert!(rendered.contains("access_token_set: true"));
		assert!(!rendered.contains("TOK"));
	}
}
