//! Shipping quote engine.
//!
//! Derives billable weight, applies loyalty and promotional discounts, tax and
//! the home delivery surcharge, and produces an itemized invoice together with
//! the package record to store.

pub mod calculators;
pub mod models;
pub mod queries;
pub mod requests;
pub mod responses;
pub mod rewards;
pub mod routes;
pub mod services;
pub mod tracking;

// Re-export commonly used items
pub use calculators::{quote, quote_at, quote_strict, round_money, QuoteError, ShippablePackage};
pub use routes::router;
pub use tracking::TrackingStatus;
