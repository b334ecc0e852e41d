//! Venue store use cases

pub mod ports;
pub mod service;

pub use service::VenueService;
