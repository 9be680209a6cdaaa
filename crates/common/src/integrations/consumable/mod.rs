//! Consumable (AOL/ADTECH pubapi) bid adapter.
//!
//! One GET per slot; the price in the response is rescaled by
//! `networkId / zoneId` before it is bucketed for targeting.

use error_stack::Report;
use serde_json::Value as Json;
use validator::Validate;

use crate::auction::{AdapterServices, BidAdapter, RequestDescriptor, SlotDescriptor};
use crate::error::AdapterError;
use crate::settings::ConsumableSettings;

mod request;
mod response;
mod targeting;

pub use request::RequestBuilder;
pub use response::{BidRecord, ResponseMapper};
pub use targeting::line_item_targeting;

pub struct ConsumableAdapter {
    settings: ConsumableSettings,
    request_builder: RequestBuilder,
    response_mapper: ResponseMapper,
}

impl ConsumableAdapter {
    /// Validate `settings` and wire the adapter to `services`.
    ///
    /// # Errors
    ///
    /// Returns [`AdapterError::Configuration`] when the settings fail
    /// validation.
    pub fn new(
        settings: ConsumableSettings,
        services: AdapterServices,
    ) -> Result<Self, Report<AdapterError>> {
        settings.validate().map_err(|err| {
            Report::new(AdapterError::Configuration {
                message: format!("Invalid {} settings: {err}", settings.partner_id),
            })
        })?;

        let request_builder = RequestBuilder::new(
            &settings,
            services.id_generator.clone(),
            services.clock.clone(),
            services.url_builder.clone(),
        );
        let response_mapper = ResponseMapper::new(&settings, &services);

        log::info!(
            "{}: adapter v{} ready with {} xSlot(s)",
            settings.partner_id,
            settings.version,
            settings.x_slots.len()
        );

        Ok(Self {
            settings,
            request_builder,
            response_mapper,
        })
    }

    /// Slot descriptor for the configured xSlot `x_slot`.
    ///
    /// # Errors
    ///
    /// Returns [`AdapterError::InvalidSlot`] when no xSlot has that name.
    pub fn slot(
        &self,
        x_slot: &str,
        request_id: &str,
    ) -> Result<SlotDescriptor, Report<AdapterError>> {
        let config = self.settings.x_slot(x_slot).ok_or_else(|| {
            Report::new(AdapterError::InvalidSlot {
                message: format!("Unknown xSlot '{x_slot}'"),
            })
        })?;
        Ok(SlotDescriptor::from_x_slot(x_slot, config, request_id))
    }
}

impl BidAdapter for ConsumableAdapter {
    fn partner_id(&self) -> &str {
        &self.settings.partner_id
    }

    fn build_request(&self, slots: &[SlotDescriptor]) -> RequestDescriptor {
        self.request_builder.build(slots)
    }

    fn parse_response(&self, session_id: &str, response: &Json, slots: &mut [SlotDescriptor]) {
        self.response_mapper.parse(session_id, response, slots);
    }
}
