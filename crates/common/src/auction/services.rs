//! Collaborators the adapter calls out to.
//!
//! Every collaborator sits behind a narrow trait so hosts can swap the
//! defaults (UUIDs, the system clock, the in-memory creative registry, log
//! based analytics) for their own implementations.

use std::sync::Arc;

use derive_more::Display;
use error_stack::Report;
use serde::{Deserialize, Serialize};

use crate::bid_transformer::BidTransformer;
use crate::creative::InMemoryCreativeRegistry;
use crate::error::AdapterError;
use crate::http_util::PathUrlBuilder;
use crate::pixel::{UreqPixelTransport, WinNoticeFirer};
use crate::request_id::UuidIdGenerator;
use crate::settings::ConsumableSettings;

use super::types::Size;

/// Produces externally unique ids. Monotonicity is not required.
pub trait IdGenerator: Send + Sync {
    fn generate_id(&self) -> String;
}

pub trait Clock: Send + Sync {
    /// Milliseconds since the Unix epoch.
    fn now_millis(&self) -> u64;
}

pub trait UrlBuilder: Send + Sync {
    /// Append `segments` as path segments to `base`.
    fn build_url(&self, base: &str, segments: &[String]) -> String;
}

/// Partner-configured rounding/bucketing of a price.
pub trait PriceTransformer: Send + Sync {
    fn apply(&self, price: f64) -> String;
}

/// Hand-off of a winning creative to the rendering pipeline.
pub trait CreativeRegistry: Send + Sync {
    /// Store the entry and return the opaque token used to render it later.
    fn register(&self, entry: RenderEntry) -> String;
}

/// Fire-and-forget request-outcome events.
pub trait AnalyticsSink: Send + Sync {
    fn emit(&self, session_id: &str, event: StatsEvent, context: &StatsContext);
}

/// Issues an image-style GET beacon.
pub trait PixelTransport: Send + Sync {
    /// Deliver the beacon.
    ///
    /// # Errors
    ///
    /// Returns [`AdapterError::Pixel`] when the beacon could not be delivered.
    fn send(&self, request: http::Request<()>) -> Result<(), Report<AdapterError>>;
}

/// Everything the creative registry needs to render a winning bid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderEntry {
    pub session_id: String,
    pub partner_id: String,
    pub adm: String,
    pub request_id: String,
    pub size: Size,
    /// Targeting-formatted price.
    pub price: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deal_id: Option<String>,
    /// Milliseconds since the Unix epoch after which the creative must not render.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expiry: Option<u64>,
    /// Win-notice pixel fired at render time; empty means none.
    pub pixel_url: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Serialize, Deserialize)]
pub enum StatsEvent {
    #[display("hs_slot_pass")]
    #[serde(rename = "hs_slot_pass")]
    SlotPass,
    #[display("hs_slot_bid")]
    #[serde(rename = "hs_slot_bid")]
    SlotBid,
}

/// Per-slot details attached to a stats event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatsContext {
    pub partner_id: String,
    pub stats_id: String,
    pub x_slot: String,
    pub request_id: String,
}

/// System clock backed by `chrono`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_millis(&self) -> u64 {
        u64::try_from(chrono::Utc::now().timestamp_millis()).unwrap_or_default()
    }
}

/// Analytics sink that writes events to the log.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogAnalyticsSink;

impl AnalyticsSink for LogAnalyticsSink {
    fn emit(&self, session_id: &str, event: StatsEvent, context: &StatsContext) {
        log::info!(
            "[{}] {} {} for xSlot '{}' (request {})",
            session_id,
            context.stats_id,
            event,
            context.x_slot,
            context.request_id
        );
    }
}

/// The collaborators injected into an adapter.
#[derive(Clone)]
pub struct AdapterServices {
    pub id_generator: Arc<dyn IdGenerator>,
    pub clock: Arc<dyn Clock>,
    pub url_builder: Arc<dyn UrlBuilder>,
    /// Formats prices for targeting values and the registry entry.
    pub targeting_transformer: Arc<dyn PriceTransformer>,
    /// Formats the price returned on the slot.
    pub price_transformer: Arc<dyn PriceTransformer>,
    pub creative_registry: Arc<dyn CreativeRegistry>,
    pub analytics: Arc<dyn AnalyticsSink>,
}

impl AdapterServices {
    /// Default collaborators for `settings`.
    ///
    /// Win notices are delivered with `ureq`; the in-memory registry holding
    /// creatives is returned alongside so the host can render them.
    #[must_use]
    pub fn with_defaults(settings: &ConsumableSettings) -> (Self, Arc<InMemoryCreativeRegistry>) {
        let id_generator: Arc<dyn IdGenerator> = Arc::new(UuidIdGenerator);
        let clock: Arc<dyn Clock> = Arc::new(SystemClock);
        let firer = WinNoticeFirer::new(Arc::new(UreqPixelTransport::default()));
        let registry = Arc::new(InMemoryCreativeRegistry::new(
            id_generator.clone(),
            clock.clone(),
            firer,
        ));

        let services = Self {
            id_generator,
            clock,
            url_builder: Arc::new(PathUrlBuilder),
            targeting_transformer: Arc::new(BidTransformer::new(
                settings.bid_transformers.targeting.clone(),
                settings.bid_unit_in_cents,
            )),
            price_transformer: Arc::new(BidTransformer::new(
                settings.bid_transformers.price.clone(),
                settings.bid_unit_in_cents,
            )),
            creative_registry: registry.clone(),
            analytics: Arc::new(LogAnalyticsSink),
        };

        (services, registry)
    }
}
