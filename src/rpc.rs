//! Response shapes, content negotiation, and request-building helpers for RPC dispatch.
//!
//! Every call goes through one path. The server's `Content-Type` picks a [`ContentKind`]:
//! JSON bodies are handed to [`RpcResponse::absorb_json`], anything else is copied byte for byte
//! into [`RpcResponse::sink`]. Either way the shape then reports domain errors through
//! [`RpcResponse::check`].

// std
use std::io::Write;
// crates.io
use serde_json::Value;
// self
use crate::{
	_prelude::*,
	cache::Expirable,
	error::{ApiError, ConfigError, SerializationError},
};

/// Media type that selects JSON decoding (matched as a prefix of `Content-Type`).
pub const JSON_CONTENT_TYPE: &str = "application/json";
/// Vendor code signalling success inside a `{code, msg}` envelope.
pub const SUCCESS_CODE: &str = "200";
/// Query key carrying the active access token.
pub const ACCESS_TOKEN_PARAM: &str = "accessToken";
/// Host used when the configuration does not override it.
pub const DEFAULT_HOST: &str = "open.ys7.com/api";

/// Ordered query parameters; ordering keeps generated URLs deterministic.
pub type QueryParams = BTreeMap<String, String>;

/// Path-aware JSON decoding failure.
pub type JsonDecodeError = serde_path_to_error::Error<serde_json::Error>;

/// How a response body is consumed, derived from its declared content type.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ContentKind {
	/// `application/json`; decoded into the response shape.
	Json,
	/// Any other (or missing) content type; streamed into the response sink.
	Stream,
}
impl ContentKind {
	/// Classifies a `Content-Type` header value by exact prefix match.
	pub fn from_content_type(content_type: Option<&str>) -> Self {
		match content_type {
			Some(value) if value.starts_with(JSON_CONTENT_TYPE) => Self::Json,
			_ => Self::Stream,
		}
	}

	/// Returns a stable label suitable for log or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			Self::Json => "json",
			Self::Stream => "stream",
		}
	}
}

/// Contract implemented by every response shape accepted by the dispatcher.
pub trait RpcResponse {
	/// Decodes a JSON body into `self`.
	fn absorb_json(&mut self, body: &[u8]) -> Result<(), JsonDecodeError>;

	/// Writable sink for non-JSON bodies; shapes that only accept JSON return `None`.
	fn sink(&mut self) -> Option<&mut dyn Write> {
		None
	}

	/// Reports the domain-level outcome carried by the response.
	fn check(&self) -> Result<(), ApiError>;
}

/// Bare `{code, msg}` envelope for endpoints without a payload.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiStatus {
	/// Vendor status code.
	#[serde(default)]
	pub code: String,
	/// Vendor message.
	#[serde(default, rename = "msg")]
	pub message: String,
}
impl ApiStatus {
	/// Returns `true` when the code equals [`SUCCESS_CODE`].
	pub fn is_success(&self) -> bool {
		self.code == SUCCESS_CODE
	}
}
impl RpcResponse for ApiStatus {
	fn absorb_json(&mut self, body: &[u8]) -> Result<(), JsonDecodeError> {
		*self = decode_json(body)?;

		Ok(())
	}

	fn check(&self) -> Result<(), ApiError> {
		check_code(&self.code, &self.message)
	}
}

/// Decoded `{code, msg, data}` document with a typed payload.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StructuredResponse<T> {
	/// Vendor status code.
	#[serde(default)]
	pub code: String,
	/// Vendor message.
	#[serde(default)]
	pub msg: String,
	/// Typed payload; absent on most error responses.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub data: Option<T>,
}
impl<T> StructuredResponse<T> {
	/// Splits the envelope into its status and payload.
	pub fn into_parts(self) -> (ApiStatus, Option<T>) {
		(ApiStatus { code: self.code, message: self.msg }, self.data)
	}
}
impl<T> Default for StructuredResponse<T> {
	fn default() -> Self {
		Self { code: String::new(), msg: String::new(), data: None }
	}
}
impl<T> RpcResponse for StructuredResponse<T>
where
	T: DeserializeOwned,
{
	fn absorb_json(&mut self, body: &[u8]) -> Result<(), JsonDecodeError> {
		*self = decode_json(body)?;

		Ok(())
	}

	fn check(&self) -> Result<(), ApiError> {
		check_code(&self.code, &self.msg)
	}
}
impl<T> Expirable for StructuredResponse<T>
where
	T: Expirable,
{
	fn expire_time_millis(&self) -> i64 {
		self.data.as_ref().map_or(0, Expirable::expire_time_millis)
	}
}

/// Raw byte response (images, clips) written into a caller-supplied sink.
///
/// Endpoints that normally stream still answer errors as JSON; such a body is absorbed as an
/// [`ApiStatus`] and reported by [`check`](RpcResponse::check).
#[derive(Debug, Default)]
pub struct StreamResponse<W> {
	sink: W,
	status: Option<ApiStatus>,
}
impl<W> StreamResponse<W>
where
	W: Write,
{
	/// Wraps the sink that receives body bytes.
	pub fn new(sink: W) -> Self {
		Self { sink, status: None }
	}

	/// Status absorbed from a JSON body, if the server answered with one.
	pub fn status(&self) -> Option<&ApiStatus> {
		self.status.as_ref()
	}

	/// Borrows the sink.
	pub fn get_ref(&self) -> &W {
		&self.sink
	}

	/// Returns the sink.
	pub fn into_inner(self) -> W {
		self.sink
	}
}
impl<W> RpcResponse for StreamResponse<W>
where
	W: Write,
{
	fn absorb_json(&mut self, body: &[u8]) -> Result<(), JsonDecodeError> {
		self.status = Some(decode_json(body)?);

		Ok(())
	}

	fn sink(&mut self) -> Option<&mut dyn Write> {
		Some(&mut self.sink)
	}

	fn check(&self) -> Result<(), ApiError> {
		match &self.status {
			Some(status) => status.check(),
			None => Ok(()),
		}
	}
}

/// Decodes `body` as JSON, keeping the path of the first failing field.
pub fn decode_json<T>(body: &[u8]) -> Result<T, JsonDecodeError>
where
	T: DeserializeOwned,
{
	let mut de = serde_json::Deserializer::from_slice(body);

	serde_path_to_error::deserialize(&mut de)
}

/// Builds `<base>/<path>?<query>` where `base` is `https://<host>` unless `host` already carries
/// a scheme.
pub fn endpoint_url(host: &str, path: &str, query: &QueryParams) -> Result<Url, ConfigError> {
	let host = host.trim_end_matches('/');
	let path = path.trim_start_matches('/');
	let raw = if host.contains("://") {
		format!("{host}/{path}")
	} else {
		format!("https://{host}/{path}")
	};
	let mut url = Url::parse(&raw).map_err(|source| ConfigError::InvalidUrl { url: raw, source })?;

	if !query.is_empty() {
		url.query_pairs_mut().extend_pairs(query.iter());
	}

	Ok(url)
}

/// Adds the active token under [`ACCESS_TOKEN_PARAM`] unless the caller already supplied a
/// non-empty one.
pub fn inject_access_token(query: &mut QueryParams, token: Option<&str>) {
	let Some(token) = token.filter(|t| !t.is_empty()) else { return };
	let slot = query.entry(ACCESS_TOKEN_PARAM.to_owned()).or_default();

	if slot.is_empty() {
		*slot = token.to_owned();
	}
}

/// Flattens a payload's top-level JSON fields into `query`; entries already present win and
/// `null` fields are skipped.
pub fn merge_payload_into_query<P>(query: &mut QueryParams, payload: &P) -> Result<(), SerializationError>
where
	P: ?Sized + Serialize,
{
	let Value::Object(fields) = serde_json::to_value(payload).map_err(SerializationError::Encode)?
	else {
		return Err(SerializationError::NonObjectPayload);
	};

	for (key, value) in fields {
		let value = match value {
			Value::Null => continue,
			Value::String(text) => text,
			other => other.to_string(),
		};

		query.entry(key).or_insert(value);
	}

	Ok(())
}

fn check_code(code: &str, message: &str) -> Result<(), ApiError> {
	if code == SUCCESS_CODE { Ok(()) } else { Err(ApiError::new(code, message)) }
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	fn query(pairs: &[(&str, &str)]) -> QueryParams {
		pairs.iter().map(|(k, v)| ((*k).to_owned(), (*v).to_owned())).collect()
	}

	#[test]
	fn content_kind_matches_json_prefix_only() {
		assert_eq!(ContentKind::from_content_type(Some("application/json")), ContentKind::Json);
		assert_eq!(
			ContentKind::from_content_type(Some("application/json;charset=UTF-8")),
			ContentKind::Json
		);
		assert_eq!(ContentKind::from_content_type(Some("image/jpeg")), ContentKind::Stream);
		assert_eq!(ContentKind::from_content_type(Some("text/json")), ContentKind::Stream);
		assert_eq!(ContentKind::from_content_type(None), ContentKind::Stream);
	}

	#[test]
	fn status_check_uses_success_sentinel() {
		let mut status = ApiStatus::default();

		status
			.absorb_json(br#"{"code":"400","msg":"bad key"}"#)
			.expect("Status fixture should decode.");

		assert_eq!(status.check(), Err(ApiError::new("400", "bad key")));

		status.absorb_json(br#"{"code":"200","msg":"ok"}"#).expect("Status fixture should decode.");

		assert_eq!(status.check(), Ok(()));
	}

	#[test]
	fn decode_errors_report_the_failing_path() {
		let mut response = StructuredResponse::<Vec<u32>>::default();
		let err = response
			.absorb_json(br#"{"code":"200","msg":"","data":[1,"two"]}"#)
			.expect_err("A string inside a numeric list must not decode.");

		assert_eq!(err.path().to_string(), "data[1]");
	}

	#[test]
	fn stream_response_is_successful_without_a_status() {
		let mut response = StreamResponse::new(Vec::new());

		response
			.sink()
			.expect("Stream responses expose a sink.")
			.write_all(b"\xff\xd8jpeg")
			.expect("Writing into a Vec sink should succeed.");

		assert!(response.check().is_ok());
		assert_eq!(response.into_inner(), b"\xff\xd8jpeg");
	}

	#[test]
	fn stream_response_reports_absorbed_errors() {
		let mut response = StreamResponse::new(Vec::new());

		response
			.absorb_json(br#"{"code":"20007","msg":"device offline"}"#)
			.expect("Error envelope should decode.");

		assert_eq!(response.check(), Err(ApiError::new("20007", "device offline")));
		assert!(response.get_ref().is_empty());
	}

	#[test]
	fn endpoint_url_defaults_to_https_and_avoids_double_slashes() {
		let url = endpoint_url(DEFAULT_HOST, "/lapp/token/get", &QueryParams::new())
			.expect("Default host should form a valid URL.");

		assert_eq!(url.as_str(), "https://open.ys7.com/api/lapp/token/get");

		let url = endpoint_url(
			"http://127.0.0.1:8080/",
			"lapp/device/list",
			&query(&[("pageSize", "10"), ("name", "front door")]),
		)
		.expect("Host with scheme should form a valid URL.");

		assert_eq!(url.as_str(), "http://127.0.0.1:8080/lapp/device/list?name=front+door&pageSize=10");
	}

	#[test]
	fn token_injection_never_overrides_caller_value() {
		let mut params = QueryParams::new();

		inject_access_token(&mut params, None);

		assert!(params.is_empty());

		inject_access_token(&mut params, Some("active"));

		assert_eq!(params.get(ACCESS_TOKEN_PARAM).map(String::as_str), Some("active"));

		let mut params = query(&[(ACCESS_TOKEN_PARAM, "explicit")]);

		inject_access_token(&mut params, Some("active"));

		assert_eq!(params.get(ACCESS_TOKEN_PARAM).map(String::as_str), Some("explicit"));

		let mut params = query(&[(ACCESS_TOKEN_PARAM, "")]);

		inject_access_token(&mut params, Some("active"));

		assert_eq!(params.get(ACCESS_TOKEN_PARAM).map(String::as_str), Some("active"));

		let mut params = query(&[(ACCESS_TOKEN_PARAM, "")]);

		inject_access_token(&mut params, None);

		assert_eq!(params.get(ACCESS_TOKEN_PARAM).map(String::as_str), Some(""));
	}

	#[test]
	fn structured_payload_needs_no_default_impl() {
		#[derive(Debug, PartialEq, Deserialize)]
		struct Lease {
			holder: String,
		}

		let mut response = StructuredResponse::<Lease>::default();

		response
			.absorb_json(br#"{"code":"10002","msg":"token expired"}"#)
			.expect("An envelope without data should decode.");

		assert_eq!(response.data, None);
		assert_eq!(response.check(), Err(ApiError::new("10002", "token expired")));

		response
			.absorb_json(br#"{"code":"200","msg":"","data":{"holder":"cam-1"}}"#)
			.expect("An envelope with data should decode.");

		assert_eq!(response.data, Some(Lease { holder: "cam-1".into() }));
	}

	#[test]
	fn payload_fields_merge_into_query() {
		#[derive(Serialize)]
		struct Capture<'a> {
			#[serde(rename = "deviceSerial")]
			device_serial: &'a str,
			channel: u8,
			quality: Option<u8>,
		}

		let mut params = query(&[("channel", "9")]);

		merge_payload_into_query(
			&mut params,
			&Capture { device_serial: "C123", channel: 1, quality: None },
		)
		.expect("Object payloads should merge into the query.");

		assert_eq!(params, query(&[("channel", "9"), ("deviceSerial", "C123")]));
		assert!(matches!(
			merge_payload_into_query(&mut params, &[1, 2]),
			Err(SerializationError::NonObjectPayload)
		));
	}
}
