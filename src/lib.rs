//! Core library for skyblock-flipper.
//!
//! Fetches BIN auction listings and bazaar order-book prices, normalizes them into
//! per-item price observations and ranks items by the gap between their two cheapest
//! prices. The binary (`main.rs`) wires these modules to the command line.

pub mod aggregator;
pub mod cache;
pub mod cli;
pub mod config;
pub mod errors;
pub mod feeds;
pub mod flips;
pub mod models;
pub mod report;
pub mod utils;
