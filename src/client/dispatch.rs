//! Content-negotiating RPC dispatch.
//!
//! [`Client::dispatch`] attaches the active token, picks the HTTP method from the configured
//! [`DispatchMode`], and routes the body either into JSON decoding or into the response sink
//! depending on the declared `Content-Type`. Non-200 statuses short-circuit before the body is
//! inspected. Streamed bodies reach the sink chunk by chunk as the transport yields them.

// std
use std::io::Write;
// crates.io
use ::http::{
	Method, Request, StatusCode,
	header::{CONTENT_TYPE, USER_AGENT},
};
// self
use crate::{
	_prelude::*,
	auth::Secret,
	client::{Client, VERSION},
	config::DispatchMode,
	error::{ConfigError, SerializationError, TransportError},
	http::{HttpResponse, RpcHttpClient},
	obs::{self, CallKind, CallOutcome, CallSpan},
	rpc::{
		self, ContentKind, JSON_CONTENT_TYPE, QueryParams, RpcResponse, StreamResponse,
		StructuredResponse,
	},
};

impl<C> Client<C>
where
	C: ?Sized + RpcHttpClient,
{
	/// Sends one call and fills `response` from the reply.
	///
	/// The active token is added under `accessToken` unless `query` already has that key.
	/// With [`DispatchMode::JsonBody`] a payload turns the call into a JSON `POST` and its absence
	/// into a `GET`; with [`DispatchMode::QueryOnly`] the call is always a `POST` and the payload's
	/// fields join the query string.
	pub async fn dispatch<P, R>(
		&self,
		path: &str,
		mut query: QueryParams,
		payload: Option<&P>,
		response: &mut R,
	) -> Result<()>
	where
		P: ?Sized + Serialize,
		R: ?Sized + RpcResponse,
	{
		rpc::inject_access_token(&mut query, self.access_token.as_ref().map(Secret::expose));

		self.send(path, query, payload, response).await
	}

	/// `GET`s `path` and returns the decoded `data` payload.
	pub async fn call<T>(&self, path: &str, query: QueryParams) -> Result<T>
	where
		T: DeserializeOwned,
	{
		let mut response = StructuredResponse::<T>::default();

		self.dispatch::<(), _>(path, query, None, &mut response).await?;

		response.data.ok_or_else(|| SerializationError::MissingData { path: path.to_owned() }.into())
	}

	/// Sends `payload` to `path` and returns the decoded `data` payload.
	pub async fn call_with<P, T>(&self, path: &str, query: QueryParams, payload: &P) -> Result<T>
	where
		P: ?Sized + Serialize,
		T: DeserializeOwned,
	{
		let mut response = StructuredResponse::<T>::default();

		self.dispatch(path, query, Some(payload), &mut response).await?;

		response.data.ok_or_else(|| SerializationError::MissingData { path: path.to_owned() }.into())
	}

	/// `GET`s a binary resource into `sink` and hands the sink back.
	///
	/// A JSON error envelope from the server surfaces as an [`ApiError`](crate::error::ApiError)
	/// and leaves the sink untouched.
	pub async fn call_stream<W>(&self, path: &str, query: QueryParams, sink: W) -> Result<W>
	where
		W: Write,
	{
		let mut response = StreamResponse::new(sink);

		self.dispatch::<(), _>(path, query, None, &mut response).await?;

		Ok(response.into_inner())
	}

	/// Dispatch without token injection; the authentication call goes through here.
	pub(crate) async fn send<P, R>(
		&self,
		path: &str,
		query: QueryParams,
		payload: Option<&P>,
		response: &mut R,
	) -> Result<()>
	where
		P: ?Sized + Serialize,
		R: ?Sized + RpcResponse,
	{
		const KIND: CallKind = CallKind::Dispatch;

		let span = CallSpan::new(KIND, "dispatch");

		obs::record_call_outcome(KIND, CallOutcome::Attempt);

		let result = span.instrument(self.send_inner(path, query, payload, response)).await;

		match &result {
			Ok(_) => obs::record_call_outcome(KIND, CallOutcome::Success),
			Err(_) => obs::record_call_outcome(KIND, CallOutcome::Failure),
		}

		result
	}

	async fn send_inner<P, R>(
		&self,
		path: &str,
		mut query: QueryParams,
		payload: Option<&P>,
		response: &mut R,
	) -> Result<()>
	where
		P: ?Sized + Serialize,
		R: ?Sized + RpcResponse,
	{
		let verbose = self.config.verbose;
		let (method, body) = match (self.config.dispatch_mode, payload) {
			(DispatchMode::JsonBody, Some(payload)) => {
				let body = serde_json::to_vec(payload).map_err(SerializationError::Encode)?;

				(Method::POST, Some(body))
			},
			(DispatchMode::JsonBody, None) => (Method::GET, None),
			(DispatchMode::QueryOnly, payload) => {
				if let Some(payload) = payload {
					rpc::merge_payload_into_query(&mut query, payload)?;
				}

				(Method::POST, None)
			},
		};
		let url = rpc::endpoint_url(&self.config.host, path, &query)?;

		obs::log_request(verbose, method.as_str(), &url, body.as_ref().map(Vec::len));

		let mut builder = Request::builder()
			.method(method)
			.uri(url.as_str())
			.header(USER_AGENT, format!("ezviz-client/{VERSION}"));

		if body.is_some() {
			builder = builder.header(CONTENT_TYPE, JSON_CONTENT_TYPE);
		}

		let request = builder.body(body.unwrap_or_default()).map_err(ConfigError::from)?;
		let reply = self.http_client.execute(request).await?;
		let status = reply.status();
		let content_type = declared_content_type(&reply);

		obs::log_response(verbose, &url, status.as_u16(), content_type.as_deref().unwrap_or_default());

		if status != StatusCode::OK {
			return Err(Error::Server {
				status: status.as_u16(),
				reason: status.canonical_reason().unwrap_or_default().to_owned(),
			});
		}

		let mut body = reply.into_body();
		let kind = ContentKind::from_content_type(content_type.as_deref());
		let len = match kind {
			ContentKind::Json => {
				let bytes = body.collect().await?;

				response
					.absorb_json(&bytes)
					.map_err(|source| SerializationError::Decode { path: path.to_owned(), source })?;

				bytes.len() as u64
			},
			ContentKind::Stream => {
				if response.sink().is_none() {
					return Err(Error::UnexpectedStream {
						content_type: content_type.unwrap_or_default(),
					});
				}

				let mut len = 0;

				// The sink is re-borrowed per chunk so no `dyn Write` is held across an await.
				while let Some(chunk) = body.chunk().await? {
					if let Some(sink) = response.sink() {
						sink.write_all(&chunk).map_err(TransportError::from)?;
					}

					len += chunk.len() as u64;
				}

				if let Some(sink) = response.sink() {
					sink.flush().map_err(TransportError::from)?;
				}

				len
			},
		};

		obs::log_body_consumed(verbose, kind, len);
		obs::record_response_bytes(kind, len);
		response.check()?;

		Ok(())
	}
}

fn declared_content_type(reply: &HttpResponse) -> Option<String> {
	reply.headers().get(CONTENT_TYPE).and_then(|value| value.to_str().ok()).map(str::to_owned)
}

#[cfg(test)]
mod tests {
	// std
	use std::io;
	// self
	use super::*;
	use crate::{
		cache::{ExpiringCache, MemoryCache},
		config::ClientConfig,
		http::{HttpFuture, HttpRequest, ResponseBody},
	};

	/// Transport answering every request with the same chunked body.
	struct ChunkedTransport {
		content_type: &'static str,
		chunks: Vec<&'static [u8]>,
	}
	impl RpcHttpClient for ChunkedTransport {
		fn execute(&self, _request: HttpRequest) -> HttpFuture<'_> {
			let reply = ::http::Response::builder()
				.header(CONTENT_TYPE, self.content_type)
				.body(ResponseBody::from_chunks(self.chunks.clone()))
				.map_err(|e| TransportError::Io(io::Error::other(e)));

			Box::pin(async move { reply })
		}
	}

	/// Sink recording the size of every write it receives.
	#[derive(Default)]
	struct WriteLog {
		bytes: Vec<u8>,
		writes: Vec<usize>,
	}
	impl Write for WriteLog {
		fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
			self.bytes.extend_from_slice(buf);
			self.writes.push(buf.len());

			Ok(buf.len())
		}

		fn flush(&mut self) -> io::Result<()> {
			Ok(())
		}
	}

	fn client_over(transport: ChunkedTransport) -> Client<ChunkedTransport> {
		let config = ClientConfig::builder("K", "S")
			.verbose(true)
			.build()
			.expect("Test config should build.");
		let cache: Arc<dyn ExpiringCache> = Arc::new(MemoryCache::default());

		Client::with_http_client(config, transport, cache)
	}

	#[tokio::test]
	async fn stream_chunks_reach_the_sink_one_by_one() {
		let client = client_over(ChunkedTransport {
			content_type: "video/mp4",
			chunks: vec![&b"\x00\x00\x00\x18ftyp"[..], &b"mp42"[..], &b"\x00\x00"[..]],
		});
		let sink = client
			.call_stream("lapp/video/clip", QueryParams::new(), WriteLog::default())
			.await
			.expect("Chunked stream should be written into the sink.");

		assert_eq!(sink.writes, [8, 4, 2]);
		assert_eq!(sink.bytes, b"\x00\x00\x00\x18ftypmp42\x00\x00");
	}

	#[tokio::test]
	async fn json_split_across_chunks_is_decoded_whole() {
		let client = client_over(ChunkedTransport {
			content_type: "application/json",
			chunks: vec![&b"{\"code\":\"200\",\"msg\":\"\",\"da"[..], &b"ta\":[\"C1\"]}"[..]],
		});
		let devices: Vec<String> = client
			.call("lapp/device/list", QueryParams::new())
			.await
			.expect("A JSON body split across chunks should decode.");

		assert_eq!(devices, ["C1"]);
	}
}
