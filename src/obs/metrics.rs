// self
use crate::obs::{FlowKind, FlowOutcome};

/// Counter incremented once per flow attempt and once per final outcome.
pub const FLOW_COUNTER: &str = "marketplace_bridge_flow_total";
/// Counter incremented per signed business call, labeled by RPC method.
pub const API_CALL_COUNTER: &str = "marketplace_bridge_api_call_total";

/// Records a flow outcome through the global `metrics` recorder.
///
/// Without the `metrics` feature this compiles to nothing.
pub fn record_flow_outcome(kind: FlowKind, outcome: FlowOutcome) {
	#[cfg(feature = "metrics")]
	metrics::counter!(FLOW_COUNTER, "flow" => kind.as_str(), "outcome" => outcome.as_str())
		.increment(1);
	#[cfg(not(feature = "metrics"))]
	let _ = (kind, outcome);
}

/// Records the final outcome of one signed business call for `method`.
pub fn record_api_call(method: &str, outcome: FlowOutcome) {
	#[cfg(feature = "metrics")]
	metrics::counter!(
		API_CALL_COUNTER,
		"method" => method.to_owned(),
		"outcome" => outcome.as_str()
	)
	.increment(1);
	#[cfg(not(feature = "metrics"))]
	let _ = (method, outcome);
}
