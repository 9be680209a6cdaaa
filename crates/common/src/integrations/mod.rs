//! Demand partner integrations.

pub mod consumable;
