//! Orchestrator-facing contract of a bid adapter.
//!
//! This module holds the slot and request types exchanged with the
//! orchestrator, the [`BidAdapter`] capability trait, and the collaborator
//! traits an adapter depends on.
//!
//! Note: the Consumable adapter itself lives in
//! [`crate::integrations::consumable`].

use std::sync::Arc;

use error_stack::Report;

use crate::error::AdapterError;
use crate::settings::ConsumableSettings;

pub mod provider;
pub mod services;
pub mod types;

pub use provider::BidAdapter;
pub use services::{
    AdapterServices, AnalyticsSink, Clock, CreativeRegistry, IdGenerator, PixelTransport,
    PriceTransformer, RenderEntry, StatsContext, StatsEvent, UrlBuilder,
};
pub use types::{
    RequestDescriptor, Size, SlotDescriptor, SlotOutcome, SlotResult, Targeting, WinNotice,
};

/// Build the Consumable adapter for `settings` with the given collaborators.
///
/// # Errors
///
/// Returns [`AdapterError::Configuration`] when the settings fail validation.
pub fn build_adapter(
    settings: ConsumableSettings,
    services: AdapterServices,
) -> Result<Arc<dyn BidAdapter>, Report<AdapterError>> {
    log::info!("Building bid adapter for partner '{}'", settings.partner_id);

    let adapter = crate::integrations::consumable::ConsumableAdapter::new(settings, services)?;
    Ok(Arc::new(adapter))
}
