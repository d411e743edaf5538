//! # talentdeck
//!
//! Invite-only talent marketplace. Administrators invite and curate talent,
//! founders browse published profiles and request introductions, talent keep
//! their own profile current.
//!
//! ## Usage
//!
//! ```bash
//! talentdeck serve
//! talentdeck admin create --email ops@example.com
//! talentdeck invite create --email ada@example.com --role talent
//! ```
//!
//! ## Modules
//!
//! - `domain` - Entities, roles and the invite and intro state machines
//! - `validation` - Field-level validation of procedure and form input
//! - `storage` - Storage traits with in-memory and PostgreSQL backends
//! - `services` - Marketplace operations with ownership checks
//! - `rpc` - Typed procedure registry exposed at `/api/rpc/{name}`
//! - `web` - axum router, route guard and server-rendered pages
//! - `config` - TOML and environment configuration
//! - `error` - Application error type and error codes

pub mod config;
pub mod domain;
pub mod error;
pub mod rpc;
pub mod services;
pub mod storage;
pub mod validation;
pub mod web;

pub use error::{MarketError, Result};
