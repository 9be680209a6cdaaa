//! Consumable header-bidding adapter.
//!
//! This crate turns a slot into an outbound bid request for the Consumable
//! (ADTECH pubapi) endpoint and turns the endpoint's response into a pass or
//! a bid with ad server targeting, handing winning creatives to a renderer.
//!
//! # Modules
//!
//! - [`auction`]: Slot types, the [`auction::BidAdapter`] trait and collaborator traits
//! - [`bid_transformer`]: Price bucketing for targeting values and returned prices
//! - [`constants`]: Partner profile and default values
//! - [`creative`]: In-memory creative registry and rendering
//! - [`error`]: Error types and error handling utilities
//! - [`http_util`]: URL path construction
//! - [`integrations`]: The Consumable adapter
//! - [`logging`]: Logger setup for hosts and the CLI
//! - [`pixel`]: Win-notice pixel firing
//! - [`request_id`]: Request and correlation id generation
//! - [`settings`]: Configuration management and validation
//! - [`test_support`]: Testing utilities and mocks

pub mod auction;
pub mod bid_transformer;
pub mod constants;
pub mod creative;
pub mod error;
pub mod http_util;
pub mod integrations;
pub mod logging;
pub mod pixel;
pub mod request_id;
pub mod settings;
