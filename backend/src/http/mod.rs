//! HTTP server module for the gateway.
//!
//! This module provides an axum-based HTTP server that exposes the gateways
//! as a REST API under `/{version}/api`.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │  HTTP Layer (axum handlers)                               │
//! │  - Request parsing                                        │
//! │  - Status mapping (200 / 402 / 500)                       │
//! │  - CORS, compression, tracing, body limit                 │
//! └───────────────────┬──────────────────────────────────────┘
//!                     │
//! ┌───────────────────▼──────────────────────────────────────┐
//! │  Gateways (services)                                      │
//! └───────────────────┬──────────────────────────────────────┘
//!                     │
//! ┌───────────────────▼──────────────────────────────────────┐
//! │  Repository Layer (db)                                    │
//! │  - LocalRepository / InfluxRepository / MongoRepository   │
//! └──────────────────────────────────────────────────────────┘
//! ```

pub mod dto;
pub mod error;
pub mod handlers;
pub mod router;
pub mod state;

pub use router::{create_router, create_router_with_limit, API_VERSION};
pub use state::AppState;
