//! Configuration commands.
//!
//! Configuration is loaded from TOML files and merged with environment variables
//! prefixed with `CONSUMABLE__`. For example, `CONSUMABLE__FEATURES__RETURN_PRICE`
//! will override `features.return_price` in the TOML file.

use std::fs;
use std::path::PathBuf;

use consumable_htb_common::settings::ConsumableSettings;
use validator::Validate;

use crate::error::CliError;

/// Load, merge and validate configuration from a TOML file.
///
/// Returns the settings together with their canonical TOML after env merge.
pub(crate) fn load_and_merge_config(
    file: &PathBuf,
    verbose: bool,
) -> Result<(ConsumableSettings, String), CliError> {
    let content = fs::read_to_string(file)?;

    if verbose {
        println!("Loading config from: {}", file.display());
        println!("Environment variables with CONSUMABLE__ prefix will be merged");
    }

    let settings = ConsumableSettings::from_toml(&content)
        .map_err(|e| CliError::Config(format!("Failed to parse and merge config: {e:?}")))?;

    settings
        .validate()
        .map_err(|e| CliError::Config(format!("Settings validation failed: {e}")))?;

    let merged_toml = settings
        .to_canonical_toml()
        .map_err(|e| CliError::Config(format!("Failed to serialize merged config: {e:?}")))?;

    Ok((settings, merged_toml))
}

/// Validate configuration file.
///
/// Validates TOML syntax, required fields and xSlot definitions after the
/// environment merge.
pub fn validate(file: PathBuf, verbose: bool) -> Result<(), CliError> {
    let (settings, merged_toml) = load_and_merge_config(&file, verbose)?;

    println!("Configuration is valid");
    println!("  File: {}", file.display());
    println!("  Partner: {} v{}", settings.partner_id, settings.version);
    println!("  Endpoint: {}", settings.endpoint);

    println!("\nxSlots:");
    for (name, slot) in &settings.x_slots {
        let sizes: Vec<String> = slot
            .sizes
            .iter()
            .map(|[width, height]| format!("{width}x{height}"))
            .collect();
        println!(
            "  - {}: network {}, placement {}, zone {}, sizes [{}]",
            name,
            slot.network_id
                .as_deref()
                .unwrap_or(settings.default_network_id.as_str()),
            slot.placement_id,
            slot.zone_id,
            sizes.join(", ")
        );
    }

    if verbose {
        let value: toml::Value = toml::from_str(&merged_toml)?;
        if let Some(table) = value.as_table() {
            println!("\nSections found:");
            for key in table.keys() {
                println!("  - [{}]", key);
            }
        }

        println!("\nFeatures:");
        let features = &settings.features;
        for (name, enabled) in [
            ("targeting", features.targeting),
            ("return_creative", features.return_creative),
            ("return_price", features.return_price),
            ("internal_render", features.internal_render),
            ("demand_expiry", features.demand_expiry.enabled),
        ] {
            println!(
                "  - {}: {}",
                name,
                if enabled { "enabled" } else { "disabled" }
            );
        }
    }

    Ok(())
}
