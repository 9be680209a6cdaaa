//! Outbound request construction.

use std::sync::Arc;

use crate::auction::{Clock, IdGenerator, RequestDescriptor, SlotDescriptor, UrlBuilder};
use crate::constants::ADTECH_SEGMENT_PREFIX;
use crate::settings::ConsumableSettings;

/// Builds the GET URL for the first slot of a batch.
pub struct RequestBuilder {
    partner_id: String,
    endpoint: String,
    default_network_id: String,
    ids: Arc<dyn IdGenerator>,
    clock: Arc<dyn Clock>,
    url_builder: Arc<dyn UrlBuilder>,
}

impl RequestBuilder {
    #[must_use]
    pub fn new(
        settings: &ConsumableSettings,
        ids: Arc<dyn IdGenerator>,
        clock: Arc<dyn Clock>,
        url_builder: Arc<dyn UrlBuilder>,
    ) -> Self {
        Self {
            partner_id: settings.partner_id.clone(),
            endpoint: settings.endpoint.clone(),
            default_network_id: settings.default_network_id.clone(),
            ids,
            clock,
            url_builder,
        }
    }

    /// Request for `slots[0]` with a fresh correlation id.
    ///
    /// Slot data is not validated here; an empty batch still yields a
    /// request, with an empty placement segment.
    #[must_use]
    pub fn build(&self, slots: &[SlotDescriptor]) -> RequestDescriptor {
        let slot = slots.first();
        match slots.len() {
            0 => log::warn!("{}: building request without a slot", self.partner_id),
            1 => {}
            n => log::warn!(
                "{}: {} extra slot(s) are not part of the request",
                self.partner_id,
                n - 1
            ),
        }

        let network_id = slot
            .and_then(|slot| slot.network_id.as_deref())
            .filter(|id| !id.is_empty())
            .unwrap_or(self.default_network_id.as_str());
        let placement_id = slot.map_or("", |slot| slot.placement_id.as_str());

        let segments = [
            network_id.to_string(),
            placement_id.to_string(),
            "0".to_string(),
            "0".to_string(),
            self.adtech_segment(),
        ];
        let url = self.url_builder.build_url(&self.endpoint, &segments);
        let correlation_id = self.ids.generate_id();

        log::debug!(
            "{}: request {} for placement '{}': {}",
            self.partner_id,
            correlation_id,
            placement_id,
            url
        );

        RequestDescriptor {
            url,
            correlation_id,
        }
    }

    /// `ADTECH;v=2;cmd=bid;cors=yes;misc=<now millis>`
    fn adtech_segment(&self) -> String {
        let misc = self.clock.now_millis().to_string();
        let parameters = [
            ("v", "2"),
            ("cmd", "bid"),
            ("cors", "yes"),
            ("misc", misc.as_str()),
        ];

        parameters
            .into_iter()
            .fold(ADTECH_SEGMENT_PREFIX.to_string(), |mut segment, (key, value)| {
                segment.push(';');
                segment.push_str(key);
                segment.push('=');
                segment.push_str(value);
                segment
            })
    }
}
