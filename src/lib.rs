//! Ads Webhook API Library
//!
//! Accepts ad-creation webhooks and lead submissions, persists them to SQLite,
//! and exposes read/update endpoints for ads and leads.
//!
//! # Modules
//!
//! - `auth`: Shared-secret header gate.
//! - `config`: Configuration management.
//! - `db`: SQLite pool and schema setup.
//! - `db_storage`: Storage adapter for ads and leads.
//! - `errors`: Error handling types.
//! - `handlers`: HTTP request handlers.
//! - `models`: Records, ingress decoding and the update allow-list.
//! - `router`: Route table and middleware.

pub mod auth;
pub mod config;
pub mod db;
pub mod db_storage;
pub mod errors;
pub mod handlers;
pub mod models;
pub mod router;
