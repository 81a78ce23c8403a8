//! Transport primitives for RPC dispatch.
//!
//! [`RpcHttpClient`] is the client's only dependency on an HTTP stack. The dispatcher builds a
//! complete [`HttpRequest`] and gets back the status line and headers with a [`ResponseBody`]
//! that is read chunk by chunk, so binary bodies can flow into a sink without being held in
//! memory. Transports map their own failures into [`TransportError`] so timeouts stay
//! distinguishable from other network errors.

// std
use std::collections::VecDeque;
#[cfg(feature = "reqwest")] use std::{ops::Deref, time::Duration as StdDuration};
// crates.io
use bytes::Bytes;
// self
use crate::{_prelude::*, error::TransportError};
#[cfg(feature = "reqwest")] use crate::error::ConfigError;

/// Request handed to a transport.
pub type HttpRequest = ::http::Request<Vec<u8>>;
/// Response returned by a transport; the body is pulled lazily.
pub type HttpResponse = ::http::Response<ResponseBody>;
/// Boxed future returned by [`RpcHttpClient::execute`].
pub type HttpFuture<'a> =
	Pin<Box<dyn Future<Output = Result<HttpResponse, TransportError>> + 'a + Send>>;

/// Abstraction over HTTP transports able to execute one request.
///
/// Implementations must be `Send + Sync + 'static` so a single transport can back many clients,
/// and must enforce their own timeout.
pub trait RpcHttpClient
where
	Self: 'static + Send + Sync,
{
	/// Sends `request` and resolves once the status line and headers have arrived.
	fn execute(&self, request: HttpRequest) -> HttpFuture<'_>;
}

/// Response body yielding chunks in arrival order.
pub struct ResponseBody(BodySource);
enum BodySource {
	Chunks(VecDeque<Bytes>),
	#[cfg(feature = "reqwest")]
	Reqwest(reqwest::Response),
}
impl ResponseBody {
	/// Body already split into chunks, e.g. canned bytes from a test transport.
	pub fn from_chunks<I>(chunks: I) -> Self
	where
		I: IntoIterator,
		I::Item: Into<Bytes>,
	{
		Self(BodySource::Chunks(chunks.into_iter().map(Into::into).collect()))
	}

	/// Body streamed from a live reqwest response.
	#[cfg(feature = "reqwest")]
	pub fn from_reqwest(response: reqwest::Response) -> Self {
		Self(BodySource::Reqwest(response))
	}

	/// Next chunk, or `None` once the body is exhausted.
	pub async fn chunk(&mut self) -> Result<Option<Bytes>, TransportError> {
		match &mut self.0 {
			BodySource::Chunks(chunks) => Ok(chunks.pop_front()),
			#[cfg(feature = "reqwest")]
			BodySource::Reqwest(response) => Ok(response.chunk().await?),
		}
	}

	/// Drains the remaining chunks into one buffer.
	pub async fn collect(mut self) -> Result<Vec<u8>, TransportError> {
		let mut buffer = Vec::new();

		while let Some(chunk) = self.chunk().await? {
			buffer.extend_from_slice(&chunk);
		}

		Ok(buffer)
	}
}
impl Default for ResponseBody {
	fn default() -> Self {
		Self::from_chunks(None::<Bytes>)
	}
}
impl From<Vec<u8>> for ResponseBody {
	fn from(bytes: Vec<u8>) -> Self {
		Self::from_chunks(Some(bytes))
	}
}
impl From<Bytes> for ResponseBody {
	fn from(bytes: Bytes) -> Self {
		Self::from_chunks(Some(bytes))
	}
}
impl From<&'static str> for ResponseBody {
	fn from(text: &'static str) -> Self {
		Self::from_chunks(Some(text))
	}
}
impl Debug for ResponseBody {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		match &self.0 {
			BodySource::Chunks(chunks) =>
				f.debug_struct("ResponseBody").field("pending_chunks", &chunks.len()).finish(),
			#[cfg(feature = "reqwest")]
			BodySource::Reqwest(_) => f.debug_struct("ResponseBody").field("source", &"reqwest").finish(),
		}
	}
}

/// Thin wrapper around [`ReqwestClient`] so shared HTTP behavior lives in one place.
#[cfg(feature = "reqwest")]
#[derive(Clone, Default)]
pub struct ReqwestHttpClient(pub ReqwestClient);
#[cfg(feature = "reqwest")]
impl ReqwestHttpClient {
	/// Wraps an existing reqwest [`ReqwestClient`]; its timeout settings are used as is.
	pub fn with_client(client: ReqwestClient) -> Self {
		Self(client)
	}

	/// Builds a client whose requests, body reads included, fail after `timeout`.
	pub fn with_timeout(timeout: StdDuration) -> Result<Self, ConfigError> {
		let client = ReqwestClient::builder().timeout(timeout).build()?;

		Ok(Self(client))
	}
}
#[cfg(feature = "reqwest")]
impl AsRef<ReqwestClient> for ReqwestHttpClient {
	fn as_ref(&self) -> &ReqwestClient {
		&self.0
	}
}
#[cfg(feature = "reqwest")]
impl Deref for ReqwestHttpClient {
	type Target = ReqwestClient;

	fn deref(&self) -> &Self::Target {
		&self.0
	}
}
#[cfg(feature = "reqwest")]
impl RpcHttpClient for ReqwestHttpClient {
	fn execute(&self, request: HttpRequest) -> HttpFuture<'_> {
		let client = self.0.clone();

		Box::pin(async move {
			let request = reqwest::Request::try_from(request)?;
			let response = client.execute(request).await?;
			let status = response.status();
			let headers = response.headers().to_owned();
			let mut response_new = HttpResponse::new(ResponseBody::from_reqwest(response));

			*response_new.status_mut() = status;
			*response_new.headers_mut() = headers;

			Ok(response_new)
		})
	}
}
