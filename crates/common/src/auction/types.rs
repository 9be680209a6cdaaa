//! Core types shared between the orchestrator and the bid adapter.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::settings::XSlotConfig;

/// Ad server targeting: every key maps to exactly one composed string,
/// wrapped in a list so line-item rules match on the exact value.
pub type Targeting = BTreeMap<String, Vec<String>>;

/// Creative size in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Size {
    pub width: u32,
    pub height: u32,
}

impl Size {
    #[must_use]
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

impl From<[u32; 2]> for Size {
    fn from([width, height]: [u32; 2]) -> Self {
        Self { width, height }
    }
}

/// Canonical size key, e.g. `300x250`.
impl fmt::Display for Size {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Outbound request for one batch of slots.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestDescriptor {
    pub url: String,
    /// Pairs the eventual response with this request.
    pub correlation_id: String,
}

/// Win-notice pixel URL, fired by the renderer when the creative renders.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WinNotice(String);

impl WinNotice {
    /// Returns `None` for an empty pixel URL.
    #[must_use]
    pub fn new(pixel_url: impl Into<String>) -> Option<Self> {
        let pixel_url = pixel_url.into();
        if pixel_url.is_empty() {
            None
        } else {
            Some(Self(pixel_url))
        }
    }

    #[must_use]
    pub fn pixel_url(&self) -> &str {
        &self.0
    }
}

/// Demand attached to a slot that received a usable bid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SlotResult {
    pub size: Size,
    pub targeting: Targeting,
    /// Transformed price, present when price passthrough is enabled.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
    /// Creative markup, present when creative passthrough is enabled.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub adm: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub win_notice: Option<WinNotice>,
    /// Token returned by the creative registry.
    pub render_token: String,
}

/// Terminal state of a slot after its response was parsed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum SlotOutcome {
    Pass,
    Bid(SlotResult),
}

/// One ad slot ("parcel") being auctioned.
///
/// Owned by the orchestrator. The adapter writes `outcome` in place; a slot
/// whose response never arrives keeps `outcome == None`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SlotDescriptor {
    /// Name of the static placement configuration this slot was built from.
    pub x_slot: String,
    pub network_id: Option<String>,
    pub placement_id: String,
    pub zone_id: String,
    pub request_id: String,
    pub sizes: Vec<Size>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub outcome: Option<SlotOutcome>,
}

impl SlotDescriptor {
    #[must_use]
    pub fn from_x_slot(
        name: impl Into<String>,
        config: &XSlotConfig,
        request_id: impl Into<String>,
    ) -> Self {
        Self {
            x_slot: name.into(),
            network_id: config.network_id.clone(),
            placement_id: config.placement_id.clone(),
            zone_id: config.zone_id.clone(),
            request_id: request_id.into(),
            sizes: config.sizes.iter().copied().map(Size::from).collect(),
            outcome: None,
        }
    }

    /// Still waiting for a response.
    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.outcome.is_none()
    }

    #[must_use]
    pub fn is_pass(&self) -> bool {
        matches!(self.outcome, Some(SlotOutcome::Pass))
    }

    #[must_use]
    pub fn result(&self) -> Option<&SlotResult> {
        match &self.outcome {
            Some(SlotOutcome::Bid(result)) => Some(result),
            _ => None,
        }
    }

    pub(crate) fn mark_pass(&mut self) {
        self.outcome = Some(SlotOutcome::Pass);
    }
}
