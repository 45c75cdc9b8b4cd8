//! Client/server boundary of the Sigsum log API
//!
//! The [`Log`](api::Log) trait is the abstract capability a log server
//! binds to and a client mirrors; [`Client`](client::Client) is the HTTP
//! client implementation. The HTTP server itself lives outside the core;
//! [`ApiError::status`](api::ApiError::status) fixes the contract an
//! adapter follows when translating errors.

pub mod api;
pub mod client;

pub use api::{
    check_consistency_request, check_inclusion_request, check_leaves_request, ApiError, Log,
    SubmitHeader, SUBMIT_HEADER_NAME,
};
pub use client::{Client, Config};
