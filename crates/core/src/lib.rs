//! Atelier Core - Shared types library.
//!
//! This crate provides common types used across all Atelier components:
//! - `console` - Server-rendered admin console for the content backend
//! - `cli` - Command-line tools for account and price management
//!
//! # Architecture
//!
//! The core crate contains only types and pure helpers - no I/O, no HTTP
//! clients. This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for backend IDs, emails, roles, slugs and colors

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
