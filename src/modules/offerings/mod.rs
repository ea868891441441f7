//! Offerings (a subject taught to a group in a period) and their capacity.

pub mod service;

pub use service::OfferingService;
