//! Guacamaya Core - Shared types library.
//!
//! This crate provides common types used across the Guacamaya components:
//! - `console` - Internal administration console for the storefront
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no HTTP clients, no record
//! store access. This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for type-safe IDs, emails, shipping
//!   destinations, and statuses

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
