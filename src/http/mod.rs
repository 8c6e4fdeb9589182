//! HTTP transport layer
//!
//! Provides the external routing: the `/mcp` listener plus metadata
//! endpoints.

pub mod handlers;
