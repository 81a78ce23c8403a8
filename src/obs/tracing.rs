// self
use crate::{_prelude::*, obs::CallKind, rpc::ContentKind};

/// Query keys whose values never reach log output.
pub const REDACTED_PARAMS: [&str; 2] = ["accessToken", "appsecret"];

/// Type alias that resolves to an instrumented future when tracing is enabled.
#[cfg(feature = "tracing")]
pub type InstrumentedCall<F> = tracing::instrument::Instrumented<F>;
/// Passthrough future type when tracing is disabled.
#[cfg(not(feature = "tracing"))]
pub type InstrumentedCall<F> = F;

/// A span builder used by client calls.
#[derive(Clone, Debug)]
pub struct CallSpan {
	#[cfg(feature = "tracing")]
	span: tracing::Span,
}
impl CallSpan {
	/// Creates a new span tagged with the provided call kind + stage.
	pub fn new(kind: CallKind, stage: &'static str) -> Self {
		#[cfg(feature = "tracing")]
		{
			let span = tracing::info_span!("ezviz_client.call", call = kind.as_str(), stage);

			Self { span }
		}
		#[cfg(not(feature = "tracing"))]
		{
			let _ = (kind, stage);

			Self {}
		}
	}

	/// Instruments an async block without holding a guard across `.await` points.
	pub fn instrument<Fut>(&self, fut: Fut) -> InstrumentedCall<Fut>
	where
		Fut: Future,
	{
		#[cfg(feature = "tracing")]
		{
			use tracing::Instrument;

			fut.instrument(self.span.clone())
		}
		#[cfg(not(feature = "tracing"))]
		{
			fut
		}
	}
}

/// Renders `url` with the values of [`REDACTED_PARAMS`] masked.
pub fn redact_url(url: &Url) -> String {
	if url.query().is_none() {
		return url.to_string();
	}

	let pairs: Vec<(String, String)> = url
		.query_pairs()
		.map(|(key, value)| {
			let value = if REDACTED_PARAMS.iter().any(|param| *param == key) {
				"<redacted>".into()
			} else {
				value
			};

			(key.into_owned(), value.into_owned())
		})
		.collect();
	let mut redacted = url.clone();

	redacted.query_pairs_mut().clear().extend_pairs(pairs);

	redacted.to_string()
}

pub(crate) fn log_request(verbose: bool, method: &str, url: &Url, body_len: Option<usize>) {
	#[cfg(feature = "tracing")]
	if verbose {
		tracing::debug!(method, url = %redact_url(url), body_len, "sending request");
	}
	#[cfg(not(feature = "tracing"))]
	{
		let _ = (verbose, method, url, body_len);
	}
}

pub(crate) fn log_response(verbose: bool, url: &Url, status: u16, content_type: &str) {
	#[cfg(feature = "tracing")]
	if verbose {
		tracing::debug!(url = %redact_url(url), status, content_type, "received response headers");
	}
	#[cfg(not(feature = "tracing"))]
	{
		let _ = (verbose, url, status, content_type);
	}
}

pub(crate) fn log_body_consumed(verbose: bool, body: ContentKind, len: u64) {
	#[cfg(feature = "tracing")]
	if verbose {
		tracing::debug!(body = body.as_str(), len, "response body consumed");
	}
	#[cfg(not(feature = "tracing"))]
	{
		let _ = (verbose, body, len);
	}
}

pub(crate) fn log_cache_miss(verbose: bool, reason: &dyn Display) {
	#[cfg(feature = "tracing")]
	if verbose {
		tracing::debug!(%reason, "cached access token unusable; authenticating");
	}
	#[cfg(not(feature = "tracing"))]
	{
		let _ = (verbose, reason);
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn redact_url_masks_secrets_only() {
		let url = Url::parse(
			"https://open.ys7.com/api/lapp/device/capture?accessToken=TOK&deviceSerial=C1",
		)
		.expect("Fixture URL should parse.");
		let rendered = redact_url(&url);

		assert!(!rendered.contains("TOK"));
		assert!(rendered.contains("deviceSerial=C1"));
		assert!(rendered.contains("accessToken=%3Credacted%3E"));
	}

	#[test]
	fn redact_url_keeps_urls_without_query() {
		let url = Url::parse("https://open.ys7.com/api/lapp/token/get")
			.expect("Fixture URL should parse.");

		assert_eq!(redact_url(&url), "https://open.ys7.com/api/lapp/token/get");
	}

	#[cfg(feature = "tracing")]
	#[tokio::test]
	async fn instrument_wraps_future() {
		let span = CallSpan::new(CallKind::Dispatch, "instrument_wraps_future");
		let value = span.instrument(async { 42 }).await;

		assert_eq!(value, 42);
	}
}
