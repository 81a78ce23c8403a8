//! Cache-first access-token refresh.
//!
//! [`Client::refresh_access_token`] consults the expiring cache before touching the network.
//! Any cache failure (missing, expired, unreadable) falls through to the authentication
//! endpoint; this is the only place where the client recovers from an error locally.

// self
use crate::{
	_prelude::*,
	auth::{AccessTokenResponse, AuthRequest, TOKEN_PATH},
	cache::CacheError,
	client::Client,
	error::SerializationError,
	http::RpcHttpClient,
	obs::{self, CallKind, CallOutcome, CallSpan},
	rpc::{QueryParams, StructuredResponse},
};

/// Where [`Client::refresh_access_token`] obtained the token it adopted.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TokenSource {
	/// A valid record was read from the expiring cache; no request was sent.
	Cache,
	/// The authentication endpoint issued a new token.
	Network,
}

impl<C> Client<C>
where
	C: ?Sized + RpcHttpClient,
{
	/// Ensures an access token is held, preferring the cached one.
	///
	/// On a cache miss the client authenticates with its key and secret, adopts the new token,
	/// and writes the full authentication response back to the cache. When that final write
	/// fails the error is returned even though the new token is already active in memory; only
	/// cross-process reuse is lost. A failed authentication leaves the current token unchanged.
	pub async fn refresh_access_token(&mut self) -> Result<TokenSource> {
		const KIND: CallKind = CallKind::TokenRefresh;

		let span = CallSpan::new(KIND, "refresh_access_token");

		obs::record_call_outcome(KIND, CallOutcome::Attempt);

		let result = span.instrument(self.refresh_access_token_inner()).await;

		match &result {
			Ok(TokenSource::Cache) => obs::record_call_outcome(KIND, CallOutcome::CacheHit),
			Ok(TokenSource::Network) => obs::record_call_outcome(KIND, CallOutcome::Success),
			Err(_) => obs::record_call_outcome(KIND, CallOutcome::Failure),
		}

		result
	}

	async fn refresh_access_token_inner(&mut self) -> Result<TokenSource> {
		match self.cache.get::<AccessTokenResponse>().await {
			Ok(StructuredResponse { data: Some(token), .. }) => {
				self.access_token = Some(token.access_token);

				return Ok(TokenSource::Cache);
			},
			Ok(_) => obs::log_cache_miss(self.config.verbose, &CacheError::NotFound),
			Err(e) => obs::log_cache_miss(self.config.verbose, &e),
		}

		let mut response = AccessTokenResponse::default();
		let request = AuthRequest {
			appkey: &self.config.app_key,
			appsecret: self.config.app_secret.expose(),
		};

		self.send(TOKEN_PATH, QueryParams::new(), Some(&request), &mut response).await?;

		let token = response
			.data
			.as_ref()
			.ok_or_else(|| SerializationError::MissingData { path: TOKEN_PATH.to_owned() })?;

		self.access_token = Some(token.access_token.clone());
		self.cache.set(&response).await?;

		Ok(TokenSource::Network)
	}
}
