//! mpsiem HTTP plumbing
//!
//! This crate provides the pieces every API module builds on:
//! - HTTP client construction and retry policy
//! - `Connection`: authenticated session bound to a core hostname
//! - `exec_request`: one JSON request/response round trip

pub mod client;
pub mod connection;
pub mod request;

pub use client::{HttpClientConfig, create_client};
pub use connection::Connection;
pub use request::exec_request;

pub use reqwest::Method;
