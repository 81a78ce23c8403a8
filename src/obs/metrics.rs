// self
use crate::{
	obs::{CallKind, CallOutcome},
	rpc::ContentKind,
};

/// Records a call outcome on `ezviz_client_call_total` (when enabled).
pub fn record_call_outcome(kind: CallKind, outcome: CallOutcome) {
	#[cfg(feature = "metrics")]
	{
		metrics::counter!(
			"ezviz_client_call_total",
			"call" => kind.as_str(),
			"outcome" => outcome.as_str()
		)
		.increment(1);
	}

	#[cfg(not(feature = "metrics"))]
	{
		let _ = (kind, outcome);
	}
}

/// Adds the size of a consumed response body to `ezviz_client_response_bytes_total`, labeled by
/// whether it was decoded or streamed into a sink (when enabled).
pub fn record_response_bytes(body: ContentKind, len: u64) {
	#[cfg(feature = "metrics")]
	{
		metrics::counter!("ezviz_client_response_bytes_total", "body" => body.as_str())
			.increment(len);
	}

	#[cfg(not(feature = "metrics"))]
	{
		let _ = (body, len);
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn recorders_accept_every_label() {
		for outcome in
			[CallOutcome::Attempt, CallOutcome::CacheHit, CallOutcome::Success, CallOutcome::Failure]
		{
			record_call_outcome(CallKind::TokenRefresh, outcome);
		}

		record_response_bytes(ContentKind::Json, 42);
		record_response_bytes(ContentKind::Stream, 4_096);
	}
}
