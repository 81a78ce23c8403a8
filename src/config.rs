//! Explicit client configuration and its validating builder.

// std
use std::{path::PathBuf, time::Duration as StdDuration};
// self
use crate::{_prelude::*, auth::Secret, error::ConfigError, rpc::DEFAULT_HOST};

/// Selects how request payloads travel to the API.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum DispatchMode {
	/// `POST` with a JSON body when a payload is present, `GET` otherwise.
	#[default]
	JsonBody,
	/// Always `POST`; payload fields are merged into the query string and no body is sent.
	QueryOnly,
}
impl DispatchMode {
	/// Returns a stable label suitable for span or log fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			DispatchMode::JsonBody => "json_body",
			DispatchMode::QueryOnly => "query_only",
		}
	}
}
impl Display for DispatchMode {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Immutable settings owned by a [`Client`](crate::client::Client).
#[derive(Clone)]
pub struct ClientConfig {
	/// Application key issued by the vendor console.
	pub app_key: String,
	/// Application secret paired with the key.
	pub app_secret: Secret,
	/// API host, optionally with a scheme (`https://` is assumed otherwise).
	pub host: String,
	/// Emits request/response debug events when set.
	pub verbose: bool,
	/// Upper bound for a single HTTP round trip.
	pub timeout: StdDuration,
	/// Payload transport mode.
	pub dispatch_mode: DispatchMode,
	/// Directory holding the default credential cache file.
	pub cache_dir: PathBuf,
}
impl ClientConfig {
	/// Round-trip timeout used unless overridden.
	pub const DEFAULT_TIMEOUT: StdDuration = StdDuration::from_secs(10);

	/// Starts a builder for the given credential pair.
	pub fn builder(app_key: impl Into<String>, app_secret: impl Into<String>) -> ClientConfigBuilder {
		ClientConfigBuilder::new(app_key, app_secret)
	}
}
impl Debug for ClientConfig {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("ClientConfig")
			.field("app_key", &self.app_key)
			.field("app_secret", &self.app_secret)
			.field("host", &self.host)
			.field("verbose", &self.verbose)
			.field("timeout", &self.timeout)
			.field("dispatch_mode", &self.dispatch_mode)
			.field("cache_dir", &self.cache_dir)
			.finish()
	}
}

/// Builder for [`ClientConfig`].
#[derive(Clone, Debug)]
pub struct ClientConfigBuilder {
	app_key: String,
	app_secret: Secret,
	host: Option<String>,
	verbose: bool,
	timeout: Option<StdDuration>,
	dispatch_mode: DispatchMode,
	cache_dir: Option<PathBuf>,
}
impl ClientConfigBuilder {
	fn new(app_key: impl Into<String>, app_secret: impl Into<String>) -> Self {
		Self {
			app_key: app_key.into(),
			app_secret: Secret::new(app_secret),
			host: None,
			verbose: false,
			timeout: None,
			dispatch_mode: DispatchMode::default(),
			cache_dir: None,
		}
	}

	/// Overrides the API host (defaults to `open.ys7.com/api`).
	pub fn host(mut self, host: impl Into<String>) -> Self {
		self.host = Some(host.into());

		self
	}

	/// Enables request/response debug events through `tracing` (a default feature).
	pub fn verbose(mut self, verbose: bool) -> Self {
		self.verbose = verbose;

		self
	}

	/// Overrides the round-trip timeout (defaults to 10 seconds).
	pub fn timeout(mut self, timeout: StdDuration) -> Self {
		self.timeout = Some(timeout);

		self
	}

	/// Selects the payload transport mode.
	pub fn dispatch_mode(mut self, mode: DispatchMode) -> Self {
		self.dispatch_mode = mode;

		self
	}

	/// Sets the directory for the default credential cache file (defaults to the working
	/// directory).
	pub fn cache_dir(mut self, dir: impl Into<PathBuf>) -> Self {
		self.cache_dir = Some(dir.into());

		self
	}

	/// Validates and produces the configuration.
	pub fn build(self) -> Result<ClientConfig, ConfigError> {
		if self.app_key.trim().is_empty() {
			return Err(ConfigError::MissingAppKey);
		}
		if self.app_secret.is_empty() {
			return Err(ConfigError::MissingAppSecret);
		}

		let host = self.host.unwrap_or_else(|| DEFAULT_HOST.to_owned());

		if host.trim().is_empty() {
			return Err(ConfigError::MissingHost);
		}

		Ok(ClientConfig {
			app_key: self.app_key,
			app_secret: self.app_secret,
			host,
			verbose: self.verbose,
			timeout: self.timeout.unwrap_or(ClientConfig::DEFAULT_TIMEOUT),
			dispatch_mode: self.dispatch_mode,
			cache_dir: self.cache_dir.unwrap_or_default(),
		})
	}
}
