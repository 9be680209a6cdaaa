//! Static configuration of the Consumable adapter.
//!
//! Settings are read from TOML and merged with environment variables prefixed
//! with `CONSUMABLE__`, e.g. `CONSUMABLE__FEATURES__RETURN_PRICE=false`.

use std::borrow::Cow;
use std::collections::BTreeMap;

use config::{Config, Environment, File, FileFormat};
use error_stack::{Report, ResultExt};
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

use crate::bid_transformer::BidTransformerConfig;
use crate::constants::{
    ADAPTER_VERSION, DEFAULT_BID_UNIT_IN_CENTS, DEFAULT_ENDPOINT, DEFAULT_NETWORK_ID, ENV_PREFIX,
    ENV_SEPARATOR, PARTNER_ID, STATS_ID, TARGETING_KEY_ID, TARGETING_KEY_OM, TARGETING_KEY_PM,
    TARGETING_KEY_PMID,
};
use crate::error::AdapterError;

/// Static placement configuration for one slot.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct XSlotConfig {
    /// Overrides the profile's default network id.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub network_id: Option<String>,
    pub placement_id: String,
    pub zone_id: String,
    /// Ad sizes [[width, height], ...]
    #[serde(default)]
    pub sizes: Vec<[u32; 2]>,
}

/// Runtime switches read once when the adapter is built.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Features {
    /// Line-item targeting keys (`id`, `om`, `pm`, `pmid`).
    #[serde(default = "default_true")]
    pub targeting: bool,
    /// Creative markup and win notice on the slot.
    #[serde(default = "default_true")]
    pub return_creative: bool,
    /// Transformed price on the slot.
    #[serde(default = "default_true")]
    pub return_price: bool,
    /// Creative registry token in the slot's targeting.
    #[serde(default = "default_true")]
    pub internal_render: bool,
    #[serde(default)]
    pub demand_expiry: DemandExpiry,
}

impl Default for Features {
    fn default() -> Self {
        Self {
            targeting: true,
            return_creative: true,
            return_price: true,
            internal_render: true,
            demand_expiry: DemandExpiry::default(),
        }
    }
}

/// Time-to-live for registered creatives.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct DemandExpiry {
    #[serde(default)]
    pub enabled: bool,
    /// Milliseconds added to the registration time.
    #[serde(default)]
    pub value_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct AnalyticsConfig {
    /// Emit `hs_slot_pass` / `hs_slot_bid` request-outcome events.
    #[serde(default = "default_true")]
    pub request_time: bool,
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        Self { request_time: true }
    }
}

/// Ad server key names for each targeting entry.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, Validate)]
pub struct TargetingKeys {
    #[serde(default = "default_key_id")]
    #[validate(length(min = 1))]
    pub id: String,
    /// Open-market price key.
    #[serde(default = "default_key_om")]
    #[validate(length(min = 1))]
    pub om: String,
    /// Private-market price key.
    #[serde(default = "default_key_pm")]
    #[validate(length(min = 1))]
    pub pm: String,
    /// Private-market deal key.
    #[serde(default = "default_key_pmid")]
    #[validate(length(min = 1))]
    pub pmid: String,
}

impl Default for TargetingKeys {
    fn default() -> Self {
        Self {
            id: default_key_id(),
            om: default_key_om(),
            pm: default_key_pm(),
            pmid: default_key_pmid(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize, Validate)]
pub struct BidTransformers {
    /// Applied to the price used in targeting values.
    #[serde(default)]
    #[validate(nested)]
    pub targeting: BidTransformerConfig,
    /// Applied to the price returned on the slot.
    #[serde(default)]
    #[validate(nested)]
    pub price: BidTransformerConfig,
}

/// Partner profile plus the publisher's slot configuration.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize, Validate)]
pub struct ConsumableSettings {
    #[serde(default = "default_partner_id")]
    #[validate(length(min = 1))]
    pub partner_id: String,

    #[serde(default = "default_stats_id")]
    #[validate(length(min = 1))]
    pub stats_id: String,

    #[serde(default = "default_version")]
    pub version: String,

    /// Base URL the request path segments are appended to.
    #[serde(default = "default_endpoint")]
    #[validate(url)]
    pub endpoint: String,

    /// Network id for slots that do not set one.
    #[serde(default = "default_network_id")]
    #[validate(custom(function = "validate_numeric_id"))]
    pub default_network_id: String,

    /// Unit of the endpoint's prices in cents.
    #[serde(default = "default_bid_unit_in_cents")]
    #[validate(range(min = 1))]
    pub bid_unit_in_cents: u32,

    #[serde(default)]
    pub features: Features,

    #[serde(default)]
    pub analytics: AnalyticsConfig,

    #[serde(default)]
    #[validate(nested)]
    pub targeting_keys: TargetingKeys,

    #[serde(default)]
    #[validate(nested)]
    pub bid_transformers: BidTransformers,

    #[serde(default)]
    #[validate(custom(function = "validate_x_slots"))]
    pub x_slots: BTreeMap<String, XSlotConfig>,
}

fn default_true() -> bool {
    true
}

fn default_partner_id() -> String {
    PARTNER_ID.to_string()
}

fn default_stats_id() -> String {
    STATS_ID.to_string()
}

fn default_version() -> String {
    ADAPTER_VERSION.to_string()
}

fn default_endpoint() -> String {
    DEFAULT_ENDPOINT.to_string()
}

fn default_network_id() -> String {
    DEFAULT_NETWORK_ID.to_string()
}

fn default_bid_unit_in_cents() -> u32 {
    DEFAULT_BID_UNIT_IN_CENTS
}

fn default_key_id() -> String {
    TARGETING_KEY_ID.to_string()
}

fn default_key_om() -> String {
    TARGETING_KEY_OM.to_string()
}

fn default_key_pm() -> String {
    TARGETING_KEY_PM.to_string()
}

fn default_key_pmid() -> String {
    TARGETING_KEY_PMID.to_string()
}

fn invalid(code: &'static str, message: String) -> ValidationError {
    ValidationError::new(code).with_message(Cow::from(message))
}

fn parse_decimal(value: &str) -> Option<f64> {
    value
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|number| number.is_finite())
}

fn validate_numeric_id(value: &str) -> Result<(), ValidationError> {
    match parse_decimal(value) {
        Some(_) => Ok(()),
        None => Err(invalid(
            "numeric_id",
            format!("'{value}' is not a decimal number"),
        )),
    }
}

fn validate_x_slots(x_slots: &BTreeMap<String, XSlotConfig>) -> Result<(), ValidationError> {
    if x_slots.is_empty() {
        return Err(invalid(
            "x_slots_empty",
            "at least one xSlot must be configured".to_string(),
        ));
    }

    for (name, slot) in x_slots {
        if slot.placement_id.trim().is_empty() {
            return Err(invalid(
                "placement_id",
                format!("xSlot '{name}' has an empty placement_id"),
            ));
        }
        match parse_decimal(&slot.zone_id) {
            Some(zone) if zone != 0.0 => {}
            _ => {
                return Err(invalid(
                    "zone_id",
                    format!("xSlot '{name}' needs a non-zero numeric zone_id"),
                ));
            }
        }
        if let Some(network_id) = &slot.network_id {
            if parse_decimal(network_id).is_none() {
                return Err(invalid(
                    "network_id",
                    format!("xSlot '{name}' has a non-numeric network_id '{network_id}'"),
                ));
            }
        }
        if slot.sizes.is_empty() {
            return Err(invalid(
                "sizes",
                format!("xSlot '{name}' has no sizes"),
            ));
        }
    }

    Ok(())
}

impl Default for ConsumableSettings {
    fn default() -> Self {
        Self {
            partner_id: default_partner_id(),
            stats_id: default_stats_id(),
            version: default_version(),
            endpoint: default_endpoint(),
            default_network_id: default_network_id(),
            bid_unit_in_cents: default_bid_unit_in_cents(),
            features: Features::default(),
            analytics: AnalyticsConfig::default(),
            targeting_keys: TargetingKeys::default(),
            bid_transformers: BidTransformers::default(),
            x_slots: BTreeMap::new(),
        }
    }
}

impl ConsumableSettings {
    /// Parse settings from TOML and apply `CONSUMABLE__` environment overrides.
    ///
    /// The result is not validated; call [`Validate::validate`] or build an
    /// adapter, which validates on construction.
    ///
    /// # Errors
    ///
    /// Returns [`AdapterError::Configuration`] when the TOML is malformed or
    /// does not match the settings shape.
    pub fn from_toml(toml_str: &str) -> Result<Self, Report<AdapterError>> {
        let environment = Environment::default()
            .prefix(ENV_PREFIX)
            .separator(ENV_SEPARATOR);

        let toml = File::from_str(toml_str, FileFormat::Toml);
        let config = Config::builder()
            .add_source(toml)
            .add_source(environment)
            .build()
            .change_context(AdapterError::Configuration {
                message: "Failed to build configuration".to_string(),
            })?;

        config
            .try_deserialize()
            .change_context(AdapterError::Configuration {
                message: "Failed to deserialize settings".to_string(),
            })
    }

    /// Serialize the effective settings back to TOML.
    ///
    /// # Errors
    ///
    /// Returns [`AdapterError::Configuration`] if serialization fails.
    pub fn to_canonical_toml(&self) -> Result<String, Report<AdapterError>> {
        toml::to_string(self).change_context(AdapterError::Configuration {
            message: "Failed to serialize settings to TOML".to_string(),
        })
    }

    #[must_use]
    pub fn x_slot(&self, name: &str) -> Option<&XSlotConfig> {
        self.x_slots.get(name)
    }
}
