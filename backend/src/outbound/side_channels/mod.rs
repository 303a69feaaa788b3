//! Reqwest-backed side channels.
//!
//! Both adapters are optional. The award pipeline calls them through
//! `BestEffort`, so their errors are logged and never fail an award.

mod authenticity_http;
mod certification_anchor_http;
mod dto;

pub use authenticity_http::{DEFAULT_SCORER_MODEL, HttpAuthenticityScorer};
pub use certification_anchor_http::HttpCertificationAnchor;
