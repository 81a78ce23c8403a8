//! Single-slot expiring cache contract and the built-in durable and volatile backends.
//!
//! Backends implement [`ExpiringCache`] as a plain byte slot. The record-level contract
//! (serialize on [`set`](dyn ExpiringCache::set), decode plus expiry check on
//! [`get`](dyn ExpiringCache::get)) lives on `dyn ExpiringCache` so every backend, including
//! test doubles, enforces the same rules.

pub mod file;
pub mod memory;

pub use file::FileCache;
pub use memory::MemoryCache;

// self
use crate::_prelude::*;

/// Boxed future returned by [`ExpiringCache`] backends.
pub type CacheFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, CacheError>> + 'a + Send>>;

/// Values that know the instant at which they stop being valid.
pub trait Expirable {
	/// Expiry instant in milliseconds since the Unix epoch.
	fn expire_time_millis(&self) -> i64;
}

/// Records that can live in an [`ExpiringCache`].
pub trait CachedRecord
where
	Self: Expirable + Serialize + DeserializeOwned,
{
}
impl<T> CachedRecord for T where T: Expirable + Serialize + DeserializeOwned {}

/// Storage backend holding at most one serialized record.
pub trait ExpiringCache
where
	Self: Send + Sync,
{
	/// Atomically replaces the slot contents with `bytes`.
	fn store(&self, bytes: Vec<u8>) -> CacheFuture<'_, ()>;

	/// Loads the slot contents, failing with [`CacheError::NotFound`] when empty.
	fn load(&self) -> CacheFuture<'_, Vec<u8>>;
}
impl dyn ExpiringCache {
	/// Serializes `record` as JSON and stores it, replacing any previous record.
	pub async fn set<R>(&self, record: &R) -> Result<(), CacheError>
	where
		R: CachedRecord,
	{
		let bytes = serde_json::to_vec(record).map_err(|e| CacheError::Serialization {
			message: format!("Failed to serialize cached record: {e}"),
		})?;

		self.store(bytes).await
	}

	/// Loads and decodes the cached record, rejecting it once expired.
	pub async fn get<R>(&self) -> Result<R, CacheError>
	where
		R: CachedRecord,
	{
		self.get_at(OffsetDateTime::now_utc()).await
	}

	/// Same as [`get`](Self::get) but evaluates expiry against `now`.
	pub async fn get_at<R>(&self, now: OffsetDateTime) -> Result<R, CacheError>
	where
		R: CachedRecord,
	{
		let bytes = self.load().await?;
		let record: R = serde_json::from_slice(&bytes).map_err(|e| CacheError::Serialization {
			message: format!("Failed to parse cached record: {e}"),
		})?;
		let expire_time_millis = record.expire_time_millis();

		if is_expired_at(expire_time_millis, now) {
			return Err(CacheError::Expired { expire_time_millis });
		}

		Ok(record)
	}
}

/// Error type produced by [`ExpiringCache`] backends and the record-level contract.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ThisError)]
pub enum CacheError {
	/// The slot holds no record.
	#[error("No cached record found.")]
	NotFound,
	/// The record decoded but its expiry instant has passed.
	#[error("Cached record expired at {expire_time_millis} ms.")]
	Expired {
		/// Expiry instant stored in the record.
		expire_time_millis: i64,
	},
	/// Serialization failures surfaced while encoding or decoding a record.
	#[error("Serialization error: {message}.")]
	Serialization {
		/// Human-readable error payload.
		message: String,
	},
	/// Backend-level failure for the storage medium.
	#[error("Backend failure: {message}.")]
	Backend {
		/// Human-readable error payload.
		message: String,
	},
}
impl CacheError {
	/// Returns `true` for the miss states (`NotFound` and `Expired`).
	pub fn is_miss(&self) -> bool {
		matches!(self, Self::NotFound | Self::Expired { .. })
	}
}

/// Expiry rule shared by every backend: the millisecond expiry is floored to seconds and
/// compared against a seconds-resolution clock.
pub fn is_expired_at(expire_time_millis: i64, now: OffsetDateTime) -> bool {
	now.unix_timestamp() >= expire_time_millis.div_euclid(1_000)
}

#[cfg(test)]
mod tests {
	// crates.io
	use time::macros;
	// self
	use super::*;

	#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
	struct Lease {
		holder: String,
		expires: i64,
	}
	impl Expirable for Lease {
		fn expire_time_millis(&self) -> i64 {
			self.expires
		}
	}

	#[test]
	fn expiry_uses_second_granularity() {
		let now = macros::datetime!(2030-01-01 00:00:10 UTC);
		let now_secs = now.unix_timestamp();

		assert!(is_expired_at(now_secs * 1_000, now));
		assert!(is_expired_at(now_secs * 1_000 + 999, now));
		assert!(is_expired_at(now_secs * 1_000 - 1, now));
		assert!(!is_expired_at((now_secs + 1) * 1_000, now));
	}

	#[tokio::test]
	async fn get_at_rejects_expired_records_after_decoding() {
		let cache: Arc<dyn ExpiringCache> = Arc::new(MemoryCache::default());
		let now = macros::datetime!(2030-01-01 00:00 UTC);
		let record = Lease { holder: "cam-1".into(), expires: now.unix_timestamp() * 1_000 };

		cache.set(&record).await.expect("Storing the lease fixture should succeed.");

		let err = cache
			.get_at::<Lease>(now)
			.await
			.expect_err("A record expiring exactly now must be rejected.");

		assert_eq!(err, CacheError::Expired { expire_time_millis: record.expires });
		assert!(err.is_miss());

		let earlier = macros::datetime!(2029-12-31 23:59 UTC);
		let fetched = cache
			.get_at::<Lease>(earlier)
			.await
			.expect("The same record is valid before its expiry.");

		assert_eq!(fetched, record);
	}

	#[tokio::test]
	async fn get_reports_shape_mismatch_as_serialization_error() {
		let cache: Arc<dyn ExpiringCache> = Arc::new(MemoryCache::default());

		cache.store(b"{\"holder\":42}".to_vec()).await.expect("Raw store should succeed.");

		let err = cache.get::<Lease>().await.expect_err("Mismatched shapes must not decode.");

		assert!(matches!(err, CacheError::Serialization { .. }));
		assert!(!err.is_miss());
	}
}
