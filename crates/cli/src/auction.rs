//! Test auction commands: build a request, parse a response, or do both
//! against the live endpoint.

use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use consumable_htb_common::auction::{
    AdapterServices, BidAdapter, RequestDescriptor, SlotDescriptor,
};
use consumable_htb_common::creative::InMemoryCreativeRegistry;
use consumable_htb_common::integrations::consumable::ConsumableAdapter;
use consumable_htb_common::request_id::generate_request_id;
use serde_json::Value as Json;

use crate::config::load_and_merge_config;
use crate::error::CliError;

/// Adapter wired to the default collaborators plus one slot to auction.
struct Auction {
    adapter: ConsumableAdapter,
    registry: Arc<InMemoryCreativeRegistry>,
    slots: Vec<SlotDescriptor>,
}

impl Auction {
    fn load(file: &PathBuf, x_slot: &str, verbose: bool) -> Result<Self, CliError> {
        let (settings, _) = load_and_merge_config(file, verbose)?;
        let (services, registry) = AdapterServices::with_defaults(&settings);
        let adapter = ConsumableAdapter::new(settings, services)?;
        let slot = adapter.slot(x_slot, &generate_request_id())?;

        Ok(Self {
            adapter,
            registry,
            slots: vec![slot],
        })
    }

    fn request(&self) -> RequestDescriptor {
        self.adapter.build_request(&self.slots)
    }

    /// Apply `response` to the slot and, when asked, render the winning
    /// creative from the registry.
    fn settle(
        mut self,
        session_id: &str,
        response: &Json,
        render: bool,
    ) -> Result<AuctionOutcome, CliError> {
        self.adapter
            .parse_response(session_id, response, &mut self.slots);

        let mut slots = self.slots.into_iter();
        let slot = slots
            .next()
            .ok_or_else(|| CliError::Adapter("no slot to settle".to_string()))?;

        let creative = match (render, slot.result()) {
            (true, Some(result)) => Some(self.registry.render(&result.render_token)?),
            _ => None,
        };

        Ok(AuctionOutcome { slot, creative })
    }
}

#[derive(Debug)]
pub(crate) struct AuctionOutcome {
    pub(crate) slot: SlotDescriptor,
    pub(crate) creative: Option<String>,
}

impl AuctionOutcome {
    fn print(&self) -> Result<(), CliError> {
        println!("{}", serde_json::to_string_pretty(&self.slot)?);
        if let Some(creative) = &self.creative {
            println!("\nRendered creative:\n{creative}");
        }
        Ok(())
    }
}

/// Inline JSON when the argument starts like JSON, otherwise a file path.
pub(crate) fn read_response(response: &str) -> Result<Json, CliError> {
    let trimmed = response.trim_start();
    if trimmed.starts_with('{') || trimmed.starts_with('[') {
        return Ok(serde_json::from_str(trimmed)?);
    }
    let content = fs::read_to_string(response)?;
    Ok(serde_json::from_str(&content)?)
}

pub(crate) fn build_request(
    file: &PathBuf,
    x_slot: &str,
    verbose: bool,
) -> Result<RequestDescriptor, CliError> {
    Ok(Auction::load(file, x_slot, verbose)?.request())
}

pub(crate) fn parse_response(
    file: &PathBuf,
    x_slot: &str,
    response: &str,
    session_id: &str,
    render: bool,
    verbose: bool,
) -> Result<AuctionOutcome, CliError> {
    let response = read_response(response)?;
    let auction = Auction::load(file, x_slot, verbose)?;
    auction.settle(session_id, &response, render)
}

/// Print the outbound request for an xSlot.
pub fn request(file: PathBuf, x_slot: String, verbose: bool) -> Result<(), CliError> {
    let request = build_request(&file, &x_slot, verbose)?;
    println!("{}", serde_json::to_string_pretty(&request)?);
    Ok(())
}

/// Apply a recorded bid response to an xSlot and print the slot outcome.
pub fn parse(
    file: PathBuf,
    x_slot: String,
    response: String,
    session: Option<String>,
    render: bool,
    verbose: bool,
) -> Result<(), CliError> {
    let session_id = session.unwrap_or_else(generate_request_id);
    parse_response(&file, &x_slot, &response, &session_id, render, verbose)?.print()
}

/// Send the request to the endpoint and parse whatever comes back.
pub fn bid(
    file: PathBuf,
    x_slot: String,
    session: Option<String>,
    render: bool,
    timeout_ms: u64,
    verbose: bool,
) -> Result<(), CliError> {
    let session_id = session.unwrap_or_else(generate_request_id);
    let auction = Auction::load(&file, &x_slot, verbose)?;
    let request = auction.request();

    if verbose {
        println!("GET {}", request.url);
        println!("Correlation id: {}", request.correlation_id);
    }

    let config = ureq::Agent::config_builder()
        .timeout_global(Some(Duration::from_millis(timeout_ms)))
        .build();
    let agent = ureq::Agent::new_with_config(config);

    let mut response = agent.get(request.url.as_str()).call().map_err(|e| {
        log::warn!(
            "Request {} failed, xSlot '{}' stays pending: {}",
            request.correlation_id,
            x_slot,
            e
        );
        CliError::Http(format!("Failed to send request: {e}"))
    })?;
    let body: Json = response.body_mut().read_json()?;
    log::debug!("Response for {}: {}", request.correlation_id, body);

    auction.settle(&session_id, &body, render)?.print()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::tests::create_test_config;
    use tempfile::TempDir;

    #[test]
    fn test_build_request_for_x_slot() {
        let dir = TempDir::new().expect("should create temp dir");
        let config_path = create_test_config(&dir);

        let request = build_request(&config_path, "sidebar", false).expect("should build");

        assert!(request.url.starts_with(
            "https://adserver-us.adtech.advertising.com/pubapi/3.0/10.1/555/0/0/ADTECH;v=2;cmd=bid;cors=yes;misc="
        ));
        assert!(!request.correlation_id.is_empty());
    }

    #[test]
    fn test_unknown_x_slot_is_rejected() {
        let dir = TempDir::new().expect("should create temp dir");
        let config_path = create_test_config(&dir);

        let result = build_request(&config_path, "footer", false);
        assert!(matches!(result, Err(CliError::Adapter(_))));
    }

    #[test]
    fn test_parse_inline_bid_and_render() {
        let dir = TempDir::new().expect("should create temp dir");
        let config_path = create_test_config(&dir);

        let outcome = parse_response(
            &config_path,
            "sidebar",
            r#"{"bids":[{"price":"1.0","w":300,"h":250,"adm":"<div/>"}]}"#,
            "session-1",
            true,
            false,
        )
        .expect("should parse");

        let result = outcome.slot.result().expect("should bid");
        assert_eq!(result.size.to_string(), "300x250");
        assert_eq!(result.price, Some(5.05));
        assert_eq!(outcome.creative.as_deref(), Some("<div/>"));
    }

    #[test]
    fn test_parse_response_file_without_bids() {
        let dir = TempDir::new().expect("should create temp dir");
        let config_path = create_test_config(&dir);
        let response_path = dir.path().join("response.json");
        fs::write(&response_path, r#"{"id":"r1","bids":[]}"#).expect("should write response");

        let outcome = parse_response(
            &config_path,
            "header",
            response_path.to_str().expect("utf-8 path"),
            "session-1",
            true,
            false,
        )
        .expect("should parse");

        assert!(outcome.slot.is_pass());
        assert!(outcome.creative.is_none());
    }

    #[test]
    fn test_read_response_rejects_bad_json() {
        assert!(matches!(
            read_response("{not json"),
            Err(CliError::Json(_))
        ));
        assert!(matches!(
            read_response("/definitely/missing/response.json"),
            Err(CliError::Io(_))
        ));
    }
}
