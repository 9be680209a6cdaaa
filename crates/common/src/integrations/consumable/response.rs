//! Bid response parsing and the pass/bid decision.

use std::sync::Arc;

use derive_more::Display;
use serde::Deserialize;
use serde_json::Value as Json;

use crate::auction::{
    AdapterServices, AnalyticsSink, Clock, CreativeRegistry, PriceTransformer, RenderEntry, Size,
    SlotDescriptor, SlotOutcome, SlotResult, StatsContext, StatsEvent, Targeting, WinNotice,
};
use crate::constants::RENDER_TOKEN_KEY;
use crate::settings::{ConsumableSettings, Features, TargetingKeys};

use super::targeting::line_item_targeting;

/// Bid response in either the flat (`bids`) or the OpenRTB (`seatbid`) shape.
///
/// Bid entries stay raw until one is picked, so a malformed entry the adapter
/// never reads does not fail the response.
#[derive(Debug, Default, Deserialize)]
struct ConsumableBidResponse {
    /// Response-level no-bid reason.
    #[serde(default)]
    nbr: Option<Json>,
    #[serde(default)]
    bids: Vec<Json>,
    #[serde(default)]
    seatbid: Vec<Json>,
}

impl ConsumableBidResponse {
    /// First flat bid, else the first bid of the first seat that has one.
    fn into_first_bid(self) -> Option<Json> {
        self.bids.into_iter().next().or_else(|| {
            self.seatbid.into_iter().find_map(|mut seat| {
                match seat.get_mut("bid").map(Json::take) {
                    Some(Json::Array(bids)) => bids.into_iter().next(),
                    _ => None,
                }
            })
        })
    }
}

#[derive(Debug, Default, Deserialize)]
struct WireBid {
    #[serde(default, deserialize_with = "deserialize_lenient_number")]
    price: Option<f64>,
    #[serde(default, deserialize_with = "deserialize_lenient_number")]
    w: Option<f64>,
    #[serde(default, deserialize_with = "deserialize_lenient_number")]
    h: Option<f64>,
    #[serde(default)]
    adm: Option<String>,
    #[serde(default, deserialize_with = "deserialize_lenient_string")]
    dealid: Option<String>,
    /// Win-notice pixel URL, possibly percent-encoded.
    #[serde(default)]
    nurl: Option<String>,
    #[serde(default)]
    nbr: Option<Json>,
}

/// Accepts a JSON number or a numeric string. Anything else that is a scalar
/// becomes `None`.
fn deserialize_lenient_number<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    use serde::de::{self, Visitor};
    use std::fmt;

    struct LenientNumberVisitor;

    impl<'de> Visitor<'de> for LenientNumberVisitor {
        type Value = Option<f64>;

        fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
            formatter.write_str("a number or numeric string")
        }

        fn visit_f64<E>(self, value: f64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(Some(value))
        }

        fn visit_i64<E>(self, value: i64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(Some(value as f64))
        }

        fn visit_u64<E>(self, value: u64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(Some(value as f64))
        }

        fn visit_str<E>(self, value: &str) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(value.trim().parse::<f64>().ok())
        }

        fn visit_bool<E>(self, _value: bool) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(None)
        }

        fn visit_unit<E>(self) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(None)
        }
    }

    deserializer.deserialize_any(LenientNumberVisitor)
}

/// Accepts a string or an integer (deal ids are sometimes numeric).
fn deserialize_lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    use serde::de::{self, Visitor};
    use std::fmt;

    struct LenientStringVisitor;

    impl<'de> Visitor<'de> for LenientStringVisitor {
        type Value = Option<String>;

        fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
            formatter.write_str("a string or integer")
        }

        fn visit_str<E>(self, value: &str) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(Some(value.to_string()))
        }

        fn visit_i64<E>(self, value: i64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(Some(value.to_string()))
        }

        fn visit_u64<E>(self, value: u64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(Some(value.to_string()))
        }

        fn visit_unit<E>(self) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(None)
        }
    }

    deserializer.deserialize_any(LenientStringVisitor)
}

fn dimension(value: Option<f64>) -> Option<u32> {
    value
        .filter(|v| v.is_finite() && *v >= 0.0 && v.fract() == 0.0 && *v <= f64::from(u32::MAX))
        .map(|v| v as u32)
}

fn parse_decimal(value: &str) -> f64 {
    value.trim().parse::<f64>().unwrap_or(f64::NAN)
}

/// One usable bid taken from the response.
#[derive(Debug, Clone, PartialEq)]
pub struct BidRecord {
    /// Raw price before network/zone normalization.
    pub price: f64,
    pub width: u32,
    pub height: u32,
    pub adm: String,
    pub deal_id: Option<String>,
    /// Empty when the bid carries no win notice.
    pub pixel_url: String,
}

impl BidRecord {
    fn from_wire(bid: WireBid) -> Option<Self> {
        Some(Self {
            price: bid.price?,
            width: dimension(bid.w)?,
            height: dimension(bid.h)?,
            adm: bid.adm.unwrap_or_default(),
            deal_id: bid.dealid.filter(|deal| !deal.is_empty()),
            pixel_url: bid.nurl.unwrap_or_default(),
        })
    }
}

/// Why a response resolved to a pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
enum NoBid {
    #[display("malformed response")]
    Malformed,
    #[display("no bids")]
    Empty,
    #[display("no-bid reason present")]
    Declined,
    #[display("bid without usable price or size")]
    Unusable,
}

/// First bid of the response, or the reason there is none.
fn first_bid(response: &Json) -> Result<BidRecord, NoBid> {
    let parsed: ConsumableBidResponse =
        serde_json::from_value(response.clone()).map_err(|err| {
            log::debug!("Failed to deserialize bid response: {err}");
            NoBid::Malformed
        })?;

    if parsed.nbr.is_some() {
        return Err(NoBid::Declined);
    }

    let bid = parsed.into_first_bid().ok_or(NoBid::Empty)?;
    let bid: WireBid = serde_json::from_value(bid).map_err(|err| {
        log::debug!("Failed to deserialize first bid: {err}");
        NoBid::Malformed
    })?;
    if bid.nbr.is_some() {
        return Err(NoBid::Declined);
    }

    BidRecord::from_wire(bid).ok_or(NoBid::Unusable)
}

fn response_id(response: &Json) -> String {
    match response.get("id") {
        Some(Json::String(id)) => id.clone(),
        Some(id) => id.to_string(),
        None => String::new(),
    }
}

/// Turns a raw response into a pass or a bid on the slot.
pub struct ResponseMapper {
    partner_id: String,
    stats_id: String,
    default_network_id: String,
    features: Features,
    emit_request_time: bool,
    targeting_keys: TargetingKeys,
    clock: Arc<dyn Clock>,
    targeting_transformer: Arc<dyn PriceTransformer>,
    price_transformer: Arc<dyn PriceTransformer>,
    registry: Arc<dyn CreativeRegistry>,
    analytics: Arc<dyn AnalyticsSink>,
}

impl ResponseMapper {
    #[must_use]
    pub fn new(settings: &ConsumableSettings, services: &AdapterServices) -> Self {
        Self {
            partner_id: settings.partner_id.clone(),
            stats_id: settings.stats_id.clone(),
            default_network_id: settings.default_network_id.clone(),
            features: settings.features.clone(),
            emit_request_time: settings.analytics.request_time,
            targeting_keys: settings.targeting_keys.clone(),
            clock: services.clock.clone(),
            targeting_transformer: services.targeting_transformer.clone(),
            price_transformer: services.price_transformer.clone(),
            registry: services.creative_registry.clone(),
            analytics: services.analytics.clone(),
        }
    }

    /// Write a pass or bid outcome onto `slots[0]`.
    ///
    /// Pending slots after the first were not part of the request and are
    /// passed.
    pub fn parse(&self, session_id: &str, response: &Json, slots: &mut [SlotDescriptor]) {
        let Some((slot, extra)) = slots.split_first_mut() else {
            log::warn!("{}: response without a slot to attach to", self.partner_id);
            return;
        };

        // Never requested, so no hs_slot_pass event is emitted for these.
        for other in extra.iter_mut().filter(|other| other.is_pending()) {
            log::debug!(
                "{}: xSlot '{}' was not part of the request, passing",
                self.partner_id,
                other.x_slot
            );
            other.mark_pass();
        }

        let record = match first_bid(response) {
            Ok(record) => record,
            Err(reason) => {
                log::info!(
                    "{}: no bid response for {{ id: {} }} ({reason})",
                    self.partner_id,
                    slot.placement_id
                );
                self.pass(session_id, slot);
                return;
            }
        };

        let price = record.price * self.rescale_factor(slot);
        if !(price.is_finite() && price > 0.0) {
            log::info!(
                "{}: returned pass for {{ id: {} }}",
                self.partner_id,
                response_id(response)
            );
            self.pass(session_id, slot);
            return;
        }

        self.emit(session_id, StatsEvent::SlotBid, slot);
        let result = self.bid_result(session_id, slot, record, price);
        log::debug!(
            "{}: bid {} on xSlot '{}' ({})",
            self.partner_id,
            price,
            slot.x_slot,
            result.size
        );
        slot.outcome = Some(SlotOutcome::Bid(result));
    }

    /// `networkId / zoneId` for the slot; NaN when either is not a number.
    fn rescale_factor(&self, slot: &SlotDescriptor) -> f64 {
        let network_id = slot
            .network_id
            .as_deref()
            .filter(|id| !id.is_empty())
            .unwrap_or(self.default_network_id.as_str());
        parse_decimal(network_id) / parse_decimal(&slot.zone_id)
    }

    fn pass(&self, session_id: &str, slot: &mut SlotDescriptor) {
        self.emit(session_id, StatsEvent::SlotPass, slot);
        slot.mark_pass();
    }

    fn emit(&self, session_id: &str, event: StatsEvent, slot: &SlotDescriptor) {
        if !self.emit_request_time {
            return;
        }
        let context = StatsContext {
            partner_id: self.partner_id.clone(),
            stats_id: self.stats_id.clone(),
            x_slot: slot.x_slot.clone(),
            request_id: slot.request_id.clone(),
        };
        self.analytics.emit(session_id, event, &context);
    }

    fn bid_result(
        &self,
        session_id: &str,
        slot: &SlotDescriptor,
        record: BidRecord,
        price: f64,
    ) -> SlotResult {
        let size = Size::new(record.width, record.height);
        let targeting_price = self.targeting_transformer.apply(price);

        let mut targeting = if self.features.targeting {
            line_item_targeting(
                &self.targeting_keys,
                size,
                &slot.request_id,
                record.deal_id.as_deref(),
                &targeting_price,
            )
        } else {
            Targeting::new()
        };

        let (adm, win_notice) = if self.features.return_creative {
            (
                Some(record.adm.clone()),
                WinNotice::new(record.pixel_url.clone()),
            )
        } else {
            (None, None)
        };

        let returned_price = if self.features.return_price {
            let formatted = self.price_transformer.apply(price);
            let parsed = formatted.parse::<f64>().ok();
            if parsed.is_none() {
                log::warn!(
                    "{}: price transformer output '{}' is not a number",
                    self.partner_id,
                    formatted
                );
            }
            parsed
        } else {
            None
        };

        let demand_expiry = &self.features.demand_expiry;
        let expiry = demand_expiry
            .enabled
            .then(|| self.clock.now_millis().saturating_add(demand_expiry.value_ms));

        let render_token = self.registry.register(RenderEntry {
            session_id: session_id.to_string(),
            partner_id: self.partner_id.clone(),
            adm: record.adm,
            request_id: slot.request_id.clone(),
            size,
            price: targeting_price,
            deal_id: record.deal_id,
            expiry,
            pixel_url: record.pixel_url,
        });

        if self.features.internal_render {
            targeting.insert(RENDER_TOKEN_KEY.to_string(), vec![render_token.clone()]);
        }

        SlotResult {
            size,
            targeting,
            price: returned_price,
            adm,
            win_notice,
            render_token,
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::test_support::tests::{create_test_settings, test_harness, TestHarness, TEST_NOW_MILLIS};

    fn mapper(settings: &ConsumableSettings) -> (ResponseMapper, TestHarness) {
        let harness = test_harness(settings);
        (ResponseMapper::new(settings, &harness.services), harness)
    }

    fn slot(network_id: Option<&str>, zone_id: &str) -> SlotDescriptor {
        SlotDescriptor {
            x_slot: "sidebar".to_string(),
            network_id: network_id.map(str::to_string),
            placement_id: "555".to_string(),
            zone_id: zone_id.to_string(),
            request_id: "req-1".to_string(),
            sizes: vec![Size::new(300, 250)],
            outcome: None,
        }
    }

    fn bid_response(price: Json) -> Json {
        json!({"id": "resp-1", "bids": [{"price": price, "w": 300, "h": 250, "adm": "<div/>"}]})
    }

    fn assert_pass(slot: &SlotDescriptor, harness: &TestHarness) {
        assert!(slot.is_pass(), "slot should pass: {:?}", slot.outcome);
        assert!(slot.result().is_none());
        assert!(harness.registry.entries().is_empty());
        assert_eq!(harness.analytics.kinds(), vec![StatsEvent::SlotPass]);
    }

    #[test]
    fn test_empty_bids_pass() {
        let settings = create_test_settings();
        let (mapper, harness) = mapper(&settings);
        let mut slots = [slot(Some("10"), "5")];

        mapper.parse("session-1", &json!({"id": "resp-1", "bids": []}), &mut slots);

        assert_pass(&slots[0], &harness);
        let events = harness.analytics.events();
        let (session, _, context) = &events[0];
        assert_eq!(session, "session-1");
        assert_eq!(context.stats_id, "CONSUMABLE");
        assert_eq!(context.x_slot, "sidebar");
    }

    #[test]
    fn test_bid_level_no_bid_reason_passes() {
        let settings = create_test_settings();
        let (mapper, harness) = mapper(&settings);
        let mut slots = [slot(Some("10"), "5")];

        let response = json!({"bids": [{"price": 2.0, "w": 300, "h": 250, "adm": "x", "nbr": 2}]});
        mapper.parse("session-1", &response, &mut slots);

        assert_pass(&slots[0], &harness);
    }

    #[test]
    fn test_response_level_no_bid_reason_passes() {
        let settings = create_test_settings();
        let (mapper, harness) = mapper(&settings);
        let mut slots = [slot(Some("10"), "5")];

        mapper.parse("session-1", &json!({"id": "resp-1", "nbr": 0}), &mut slots);

        assert_pass(&slots[0], &harness);
    }

    #[test]
    fn test_malformed_responses_pass() {
        let malformed = [
            json!("not an object"),
            json!([1, 2, 3]),
            json!({"bids": "nope"}),
            json!({"bids": [{"price": "abc", "w": 300, "h": 250}]}),
            json!({"bids": [{"price": 1.0, "w": "wide", "h": 250}]}),
            json!({"bids": [{"price": 1.0, "w": 300}]}),
            json!({"bids": [{"w": 300, "h": 250}]}),
            json!(null),
        ];

        for response in malformed {
            let settings = create_test_settings();
            let (mapper, harness) = mapper(&settings);
            let mut slots = [slot(Some("10"), "5")];

            mapper.parse("session-1", &response, &mut slots);

            assert_pass(&slots[0], &harness);
        }
    }

    #[test]
    fn test_non_positive_prices_pass() {
        for price in [json!(0), json!(-1.5), json!("0.0")] {
            let settings = create_test_settings();
            let (mapper, harness) = mapper(&settings);
            let mut slots = [slot(Some("10"), "5")];

            mapper.parse("session-1", &bid_response(price), &mut slots);

            assert_pass(&slots[0], &harness);
        }
    }

    #[test]
    fn test_zero_zone_passes() {
        let settings = create_test_settings();
        let (mapper, harness) = mapper(&settings);
        let mut slots = [slot(Some("10"), "0")];

        mapper.parse("session-1", &bid_response(json!(2.0)), &mut slots);

        assert_pass(&slots[0], &harness);
    }

    #[test]
    fn test_price_is_rescaled_by_network_and_zone() {
        let settings = create_test_settings();
        let (mapper, harness) = mapper(&settings);
        let mut slots = [slot(Some("10"), "5")];

        mapper.parse("session-1", &bid_response(json!(2.0)), &mut slots);

        let result = slots[0].result().expect("should bid");
        assert_eq!(result.price, Some(4.0));
        assert_eq!(result.size, Size::new(300, 250));
        assert_eq!(
            result.targeting.get("ix_consumable_cpm"),
            Some(&vec!["300x250_4.00".to_string()])
        );
        assert_eq!(
            result.targeting.get("ix_consumable_id"),
            Some(&vec!["req-1".to_string()])
        );
        assert_eq!(harness.analytics.kinds(), vec![StatsEvent::SlotBid]);
    }

    #[test]
    fn test_default_network_id_is_used_for_rescaling() {
        let settings = create_test_settings();
        let (mapper, _) = mapper(&settings);
        let mut slots = [slot(None, "10947.1")];

        mapper.parse("session-1", &bid_response(json!("1.25")), &mut slots);

        let result = slots[0].result().expect("should bid");
        assert_eq!(result.price, Some(1.25));
    }

    #[test]
    fn test_deal_id_uses_private_market_keys() {
        let settings = create_test_settings();
        let (mapper, harness) = mapper(&settings);
        let mut slots = [slot(Some("10"), "4")];

        let response = json!({"bids": [{"price": 2.0, "w": 300, "h": 250, "adm": "<div/>", "dealid": "D1"}]});
        mapper.parse("session-1", &response, &mut slots);

        let result = slots[0].result().expect("should bid");
        assert_eq!(
            result.targeting.get("ix_consumable_dealid"),
            Some(&vec!["300x250_D1".to_string()])
        );
        assert_eq!(
            result.targeting.get("ix_consumable_cpm"),
            Some(&vec!["300x250_5.00".to_string()])
        );
        assert_eq!(
            harness.registry.entries()[0].deal_id.as_deref(),
            Some("D1")
        );
    }

    #[test]
    fn test_malformed_later_bid_is_ignored() {
        let settings = create_test_settings();
        let (mapper, harness) = mapper(&settings);
        let mut slots = [slot(Some("10"), "5")];

        let response = json!({"bids": [
            {"price": 2.0, "w": 300, "h": 250, "adm": "<div/>"},
            {"price": {"v": 1}, "w": 300, "h": 250, "adm": 7}
        ]});
        mapper.parse("session-1", &response, &mut slots);

        let result = slots[0].result().expect("should bid");
        assert_eq!(result.price, Some(4.0));
        assert_eq!(harness.analytics.kinds(), vec![StatsEvent::SlotBid]);
    }

    #[test]
    fn test_malformed_first_bid_passes() {
        let settings = create_test_settings();
        let (mapper, harness) = mapper(&settings);
        let mut slots = [slot(Some("10"), "5")];

        let response = json!({"bids": [
            {"price": {"v": 1}, "w": 300, "h": 250},
            {"price": 2.0, "w": 300, "h": 250, "adm": "<div/>"}
        ]});
        mapper.parse("session-1", &response, &mut slots);

        assert_pass(&slots[0], &harness);
    }

    #[test]
    fn test_seatbid_skips_empty_seats() {
        let settings = create_test_settings();
        let (mapper, _) = mapper(&settings);
        let mut slots = [slot(Some("10"), "5")];

        let response = json!({"seatbid": [
            {"bid": []},
            {"bid": [{"price": 2.0, "w": 300, "h": 250, "adm": "<i/>"}, {"price": []}]}
        ]});
        mapper.parse("session-1", &response, &mut slots);

        let result = slots[0].result().expect("should bid");
        assert_eq!(result.adm.as_deref(), Some("<i/>"));
    }

    #[test]
    fn test_openrtb_seatbid_shape() {
        let settings = create_test_settings();
        let (mapper, _) = mapper(&settings);
        let mut slots = [slot(Some("10"), "5")];

        let response = json!({
            "id": "resp-1",
            "seatbid": [{"bid": [{"price": "2.0", "w": "728", "h": "90", "adm": "<b/>"}]}]
        });
        mapper.parse("session-1", &response, &mut slots);

        let result = slots[0].result().expect("should bid");
        assert_eq!(result.size, Size::new(728, 90));
        assert_eq!(result.adm.as_deref(), Some("<b/>"));
        assert_eq!(result.price, Some(4.0));
    }

    #[test]
    fn test_registration_entry() {
        let mut settings = create_test_settings();
        settings.features.demand_expiry.enabled = true;
        settings.features.demand_expiry.value_ms = 30_000;
        let (mapper, harness) = mapper(&settings);
        let mut slots = [slot(Some("10"), "5")];

        let response = json!({"bids": [{
            "price": 2.0, "w": 300, "h": 250, "adm": "<div/>",
            "nurl": "https%3A%2F%2Ft.example.com%2Fwin"
        }]});
        mapper.parse("session-9", &response, &mut slots);

        let entries = harness.registry.entries();
        assert_eq!(entries.len(), 1);
        let entry = &entries[0];
        assert_eq!(entry.session_id, "session-9");
        assert_eq!(entry.partner_id, "ConsumableHtb");
        assert_eq!(entry.adm, "<div/>");
        assert_eq!(entry.request_id, "req-1");
        assert_eq!(entry.size, Size::new(300, 250));
        assert_eq!(entry.price, "4.00");
        assert_eq!(entry.deal_id, None);
        assert_eq!(entry.expiry, Some(TEST_NOW_MILLIS + 30_000));
        assert_eq!(entry.pixel_url, "https%3A%2F%2Ft.example.com%2Fwin");

        let result = slots[0].result().expect("should bid");
        assert_eq!(result.render_token, "render-1");
        assert_eq!(
            result.targeting.get(RENDER_TOKEN_KEY),
            Some(&vec!["render-1".to_string()])
        );
        assert_eq!(
            result.win_notice.as_ref().map(WinNotice::pixel_url),
            Some("https%3A%2F%2Ft.example.com%2Fwin")
        );
    }

    #[test]
    fn test_no_expiry_when_disabled() {
        let settings = create_test_settings();
        let (mapper, harness) = mapper(&settings);
        let mut slots = [slot(Some("10"), "5")];

        mapper.parse("session-1", &bid_response(json!(2.0)), &mut slots);

        assert_eq!(harness.registry.entries()[0].expiry, None);
        let result = slots[0].result().expect("should bid");
        assert!(result.win_notice.is_none());
    }

    #[test]
    fn test_analytics_can_be_disabled() {
        let mut settings = create_test_settings();
        settings.analytics.request_time = false;

        let (mapper, harness) = mapper(&settings);
        let mut slots = [slot(Some("10"), "5")];
        mapper.parse("session-1", &bid_response(json!(2.0)), &mut slots);
        assert!(slots[0].result().is_some());

        let mut passed = [slot(Some("10"), "5")];
        mapper.parse("session-1", &json!({"bids": []}), &mut passed);
        assert!(passed[0].is_pass());

        assert!(harness.analytics.events().is_empty());
    }

    #[test]
    fn test_extra_slots_are_passed() {
        let settings = create_test_settings();
        let (mapper, harness) = mapper(&settings);
        let mut second = slot(Some("10"), "5");
        second.x_slot = "header".to_string();
        let mut slots = [slot(Some("10"), "5"), second];

        mapper.parse("session-1", &bid_response(json!(2.0)), &mut slots);

        assert!(slots[0].result().is_some());
        assert!(slots[1].is_pass());
        assert_eq!(harness.registry.entries().len(), 1);
        assert_eq!(harness.analytics.kinds(), vec![StatsEvent::SlotBid]);
    }

    #[test]
    fn test_feature_flag_combinations() {
        for bits in 0u8..16 {
            let mut settings = create_test_settings();
            settings.features.targeting = bits & 1 != 0;
            settings.features.return_creative = bits & 2 != 0;
            settings.features.return_price = bits & 4 != 0;
            settings.features.internal_render = bits & 8 != 0;
            let features = settings.features.clone();

            let (mapper, harness) = mapper(&settings);
            let mut slots = [slot(Some("10"), "5")];
            let response = json!({"bids": [{
                "price": 2.0, "w": 300, "h": 250, "adm": "<div/>", "nurl": "https://t.example.com/win"
            }]});
            mapper.parse("session-1", &response, &mut slots);

            let result = slots[0].result().expect("should bid");
            assert_eq!(result.size, Size::new(300, 250), "flags {bits:04b}");
            assert_eq!(result.render_token, "render-1", "flags {bits:04b}");
            assert_eq!(harness.registry.entries().len(), 1, "flags {bits:04b}");

            assert_eq!(
                result.targeting.contains_key("ix_consumable_cpm"),
                features.targeting,
                "flags {bits:04b}"
            );
            assert_eq!(
                result.targeting.contains_key("ix_consumable_id"),
                features.targeting,
                "flags {bits:04b}"
            );
            assert_eq!(
                result.targeting.contains_key(RENDER_TOKEN_KEY),
                features.internal_render,
                "flags {bits:04b}"
            );
            assert_eq!(
                result.adm.is_some(),
                features.return_creative,
                "flags {bits:04b}"
            );
            assert_eq!(
                result.win_notice.is_some(),
                features.return_creative,
                "flags {bits:04b}"
            );
            assert_eq!(
                result.price.is_some(),
                features.return_price,
                "flags {bits:04b}"
            );

            let expected_keys =
                usize::from(features.targeting) * 2 + usize::from(features.internal_render);
            assert_eq!(result.targeting.len(), expected_keys, "flags {bits:04b}");
        }
    }
}
