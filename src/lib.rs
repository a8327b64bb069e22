//! scryfall-mcp: MCP server exposing Magic: The Gathering card data
//!
//! This library implements a Model Context Protocol server backed by the
//! Scryfall card database. Two tools are exposed to the client:
//!
//! - **search**: Scryfall full-text query → list of matching cards
//! - **fetch**: card UUID → full card record, rendered as text plus a
//!   structured twin for visual hosts
//!
//! App-capable hosts can additionally load a rendered-card viewer surface
//! registered as an MCP resource.
//!
//! # Architecture
//!
//! The server is deliberately thin: one inbound protocol (JSON-RPC 2.0 over
//! stdio), one outbound protocol (HTTP GET against the Scryfall API), and a
//! pure formatting layer between them. No caching, no retries, no state
//! beyond the rate-limit timestamp.
//!
//! # Modules
//!
//! - [`config`] — Configuration loading and validation
//! - [`error`] — Error types
//! - [`mcp`] — MCP protocol implementation
//! - [`scryfall`] — Rate-limited Scryfall API client
//! - [`render`] — Card-to-text and card-to-HTML rendering

pub mod config;
pub mod error;
pub mod mcp;
pub mod render;
pub mod scryfall;
