//! Trait definition for bid adapters.

use serde_json::Value as Json;

use super::types::{RequestDescriptor, SlotDescriptor};

/// Capability set an orchestrator needs from one demand endpoint.
///
/// Adapters handle exactly one endpoint's request/response shape. The
/// orchestrator owns the transport: it sends the [`RequestDescriptor`],
/// pairs the response back using its correlation id, and hands the body to
/// [`BidAdapter::parse_response`] together with the same slots.
pub trait BidAdapter: Send + Sync {
    /// Partner identifier (e.g. `"ConsumableHtb"`).
    fn partner_id(&self) -> &str;

    /// Number of slots one outbound request serves. Orchestrators split
    /// larger batches before calling [`BidAdapter::build_request`].
    fn slots_per_request(&self) -> usize {
        1
    }

    /// Build the outbound request for `slots`. Never fails.
    fn build_request(&self, slots: &[SlotDescriptor]) -> RequestDescriptor;

    /// Decide pass or bid for each slot and write the outcome onto it.
    ///
    /// Malformed responses resolve to a pass; nothing is returned.
    fn parse_response(&self, session_id: &str, response: &Json, slots: &mut [SlotDescriptor]);
}
