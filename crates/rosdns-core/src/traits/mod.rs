//! Core traits for the RouterOS DNS bridge
//!
//! - [`RouterApi`]: read and write static DNS entries on a router

pub mod router_api;

pub use router_api::{RouterApi, SystemInfo};
