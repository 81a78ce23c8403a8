//! Access-token record returned by the authentication endpoint and cached between runs.

// self
use crate::{
	_prelude::*,
	auth::Secret,
	cache::Expirable,
	rpc::StructuredResponse,
};

/// Path of the authentication endpoint, relative to the API host.
pub const TOKEN_PATH: &str = "lapp/token/get";

/// Short-lived credential issued by the authentication endpoint.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessToken {
	/// Token attached to every subsequent call; callers must avoid logging it.
	pub access_token: Secret,
	/// Expiry instant in milliseconds since the Unix epoch.
	pub expire_time: i64,
}
impl AccessToken {
	/// Creates a token record.
	pub fn new(access_token: impl Into<String>, expire_time: i64) -> Self {
		Self { access_token: Secret::new(access_token), expire_time }
	}
}
impl Expirable for AccessToken {
	fn expire_time_millis(&self) -> i64 {
		self.expire_time
	}
}

/// Full `{code, msg, data}` document returned by the authentication endpoint; this is the record
/// persisted in the expiring cache.
pub type AccessTokenResponse = StructuredResponse<AccessToken>;

/// Parameters sent to the authentication endpoint.
#[derive(Clone, Serialize)]
pub struct AuthRequest<'a> {
	/// Application key.
	pub appkey: &'a str,
	/// Application secret.
	pub appsecret: &'a str,
}
impl Debug for AuthRequest<'_> {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("AuthRequest")
			.field("appkey", &self.appkey)
			.field("appsecret", &"<redacted>")
			.finish()
	}
}
