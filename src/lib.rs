//! Contact-Intake API Library
//!
//! Backend for a consulting studio's marketing site: takes contact-form
//! submissions through validation, anti-spam heuristics and per-IP rate
//! limiting, then fans accepted inquiries out to the configured email and
//! chat notification channels. Accepted inquiries are forwarded, never
//! stored.
//!
//! # Modules
//!
//! - `api`: API-layer namespace and the OpenAPI document.
//! - `core`: Domain-layer namespace (models, validation, spam, errors).
//! - `integrations`: External service integrations namespace.
//! - `config`: Configuration management.
//! - `dispatch`: Email and chat notification dispatchers.
//! - `errors`: Error handling types.
//! - `handlers`: HTTP request handlers and routing.
//! - `models`: Submission and response models.
//! - `rate_limit`: Fixed-window rate limiter and counter stores.
//! - `spam`: Content spam scanning.
//! - `validation`: Payload schema validation and legacy remapping.

pub mod api;
pub mod core;
pub mod integrations;

pub mod config;
pub mod dispatch;
pub mod errors;
pub mod handlers;
pub mod models;
pub mod rate_limit;
pub mod spam;
pub mod validation;
