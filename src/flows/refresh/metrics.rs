// std
use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};
// self
use crate::{_prelude::*, auth::TokenState};

const NEVER: i64 = i64::MIN;

/// Advisory counters for refresh calls that reached the network.
///
/// Shared between clones of a [`crate::flows::Marketplace`]; nothing reads them on the
/// token path.
#[derive(Debug)]
pub struct RefreshMetrics {
	sent: AtomicU64,
	renewed: AtomicU64,
	rejected: AtomicU64,
	last_renewal: AtomicI64,
}
impl RefreshMetrics {
	/// Total refresh calls sent.
	pub fn attempts(&self) -> u64 {
		self.sent.load(Ordering::Relaxed)
	}

	/// Refresh calls that produced a new token state.
	pub fn successes(&self) -> u64 {
		self.renewed.load(Ordering::Relaxed)
	}

	/// Refresh calls that ended in [`crate::error::Error::RefreshFailed`].
	pub fn failures(&self) -> u64 {
		self.rejected.load(Ordering::Relaxed)
	}

	/// Issue instant of the most recently renewed token, if any refresh succeeded.
	pub fn last_renewal(&self) -> Option<OffsetDateTime> {
		match self.last_renewal.load(Ordering::Relaxed) {
			NEVER => None,
			seconds => OffsetDateTime::from_unix_timestamp(seconds).ok(),
		}
	}

	pub(crate) fn record_sent(&self) {
		self.sent.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_outcome(&self, renewed: &Result<TokenState>) {
		match renewed {
			Ok(state) => {
				self.renewed.fetch_add(1, Ordering::Relaxed);
				self.last_renewal.store(state.issued_at.unix_timestamp(), Ordering::Relaxed);
			},
			Err(_) => {
				self.rejected.fetch_add(1, Ordering::Relaxed);
			},
		}
	}
}
impl Default for RefreshMetrics {
	fn default() -> Self {
		Self {
			sent: AtomicU64::new(0),
			renewed: AtomicU64::new(0),
			rejected: AtomicU64::new(0),
			last_renewal: AtomicI64::new(NEVER),
		}
	}
}
