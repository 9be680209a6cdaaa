/// Partner identifier reported to analytics and the creative registry.
pub const PARTNER_ID: &str = "ConsumableHtb";

/// Short identifier used by header stats.
pub const STATS_ID: &str = "CONSUMABLE";

pub const ADAPTER_VERSION: &str = "2.1.1";

pub const DEFAULT_ENDPOINT: &str = "https://adserver-us.adtech.advertising.com/pubapi/3.0/";

/// Network id used when a slot does not carry one.
pub const DEFAULT_NETWORK_ID: &str = "10947.1";

/// Unit of the endpoint's bid prices, in cents.
pub const DEFAULT_BID_UNIT_IN_CENTS: u32 = 100;

/// Prefix of the final path segment; protocol parameters follow it.
pub const ADTECH_SEGMENT_PREFIX: &str = "ADTECH";

pub const TARGETING_KEY_ID: &str = "ix_consumable_id";
pub const TARGETING_KEY_OM: &str = "ix_consumable_cpm";
pub const TARGETING_KEY_PM: &str = "ix_consumable_cpm";
pub const TARGETING_KEY_PMID: &str = "ix_consumable_dealid";

/// Targeting key holding the creative registry token when internal render is on.
pub const RENDER_TOKEN_KEY: &str = "pubKitAdId";

/// Prefix for environment overrides, e.g. `CONSUMABLE__ENDPOINT`.
pub const ENV_PREFIX: &str = "CONSUMABLE";
pub const ENV_SEPARATOR: &str = "__";
