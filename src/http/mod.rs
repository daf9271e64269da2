//! HTTP client module
//!
//! Provides the request/response layer the harness and asset checks build on.

mod client;

pub use client::{HttpClient, HttpMethod, HttpRequest, HttpResponse, MultipartPayload};
