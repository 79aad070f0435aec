//! Network utilities for icon discovery.
//!
//! This module provides:
//! - HTTP client with relaxed certificate validation and per-request timeouts
//! - Size-capped body reads
//! - URL origin and content-type helpers

mod client;

pub use client::{content_type_of, origin_of, read_body_limited, BodyError, HttpClient};
