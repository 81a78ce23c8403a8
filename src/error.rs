//! Client-level error types shared across the cache, transport, and dispatch layers.

// self
use crate::_prelude::*;

/// Client-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Canonical client error exposed by public APIs.
#[derive(Debug, ThisError)]
pub enum Error {
	/// Expiring-cache failure (miss, expiry, decode, or backend).
	#[error("{0}")]
	Cache(
		#[from]
		#[source]
		crate::cache::CacheError,
	),
	/// Local configuration problem.
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// Request or response could not be encoded or decoded.
	#[error(transparent)]
	Serialization(#[from] SerializationError),
	/// Transport failure (DNS, TCP, TLS, timeout).
	#[error(transparent)]
	Transport(#[from] TransportError),
	/// Domain-level failure reported by a successful HTTP response.
	#[error(transparent)]
	Api(#[from] ApiError),

	/// Server answered with a status other than `200 OK`.
	#[error("Server error: {status} {reason}.")]
	Server {
		/// HTTP status code.
		status: u16,
		/// Canonical reason phrase for the status, empty when unknown.
		reason: String,
	},
	/// Server streamed a non-JSON body into a response shape that cannot accept bytes.
	#[error("Response shape has no sink for a `{content_type}` body.")]
	UnexpectedStream {
		/// Content type declared by the server.
		content_type: String,
	},
}

/// Domain error carried by a `{code, msg}` envelope whose code is not the success sentinel.
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
#[error("{code}: {message}")]
pub struct ApiError {
	/// Vendor status code (e.g. `"10002"`).
	pub code: String,
	/// Vendor message accompanying the code.
	pub message: String,
}
impl ApiError {
	/// Builds an API error from a code/message pair.
	pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
		Self { code: code.into(), message: message.into() }
	}
}

/// Configuration and validation failures raised by the client.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// HTTP client could not be constructed.
	#[error("HTTP client could not be constructed.")]
	HttpClientBuild {
		/// Underlying transport builder failure.
		#[source]
		source: BoxError,
	},
	/// HTTP request construction failed.
	#[error(transparent)]
	HttpRequest(#[from] ::http::Error),
	/// Host and path do not form a valid URL.
	#[error("Request URL `{url}` is invalid.")]
	InvalidUrl {
		/// Offending URL text.
		url: String,
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
	/// Application key is empty.
	#[error("Application key must not be empty.")]
	MissingAppKey,
	/// Application secret is empty.
	#[error("Application secret must not be empty.")]
	MissingAppSecret,
	/// API host is empty.
	#[error("API host must not be empty.")]
	MissingHost,
}
impl ConfigError {
	/// Wraps a transport's builder failure inside [`ConfigError`].
	pub fn http_client_build(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::HttpClientBuild { source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for ConfigError {
	fn from(e: ReqwestError) -> Self {
		Self::http_client_build(e)
	}
}

/// Encode/decode failures on the RPC path.
#[derive(Debug, ThisError)]
pub enum SerializationError {
	/// Request payload could not be encoded as JSON.
	#[error("Request payload could not be encoded as JSON.")]
	Encode(#[source] serde_json::Error),
	/// Response body declared as JSON could not be decoded into the response shape.
	#[error("Response body from `{path}` is malformed JSON.")]
	Decode {
		/// Request path that produced the body.
		path: String,
		/// Structured parsing failure, including the JSON path of the offending field.
		#[source]
		source: serde_path_to_error::Error<serde_json::Error>,
	},
	/// Successful envelope carried no `data` where the caller expected a payload.
	#[error("Response from `{path}` is missing its data payload.")]
	MissingData {
		/// Request path that produced the envelope.
		path: String,
	},
	/// Query-only dispatch needs a payload that serializes to a JSON object.
	#[error("Request payload must serialize to a JSON object to be sent as query parameters.")]
	NonObjectPayload,
}

/// Transport-level failures (network, timeout, IO).
#[derive(Debug, ThisError)]
pub enum TransportError {
	/// Underlying HTTP client reported a network failure.
	#[error("Network error occurred while calling the API.")]
	Network {
		/// Transport-specific network error.
		#[source]
		source: BoxError,
	},
	/// Request exceeded the configured timeout.
	#[error("Request timed out while calling the API.")]
	Timeout {
		/// Transport-specific timeout error.
		#[source]
		source: BoxError,
	},
	/// Underlying IO failure surfaced during transport or while draining a body into a sink.
	#[error("I/O error occurred while calling the API.")]
	Io(#[from] std::io::Error),
}
impl TransportError {
	/// Wraps a transport-specific network error.
	pub fn network(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::Network { source: Box::new(src) }
	}

	/// Wraps a transport-specific timeout error.
	pub fn timeout(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::Timeout { source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for TransportError {
	fn from(e: ReqwestError) -> Self {
		if e.is_timeout() { Self::timeout(e) } else { Self::network(e) }
	}
}
