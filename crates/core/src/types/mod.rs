//! Core types for Guacamaya.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod destination;
pub mod email;
pub mod id;
pub mod status;

pub use destination::{Destination, DestinationError};
pub use email::{Email, EmailError};
pub use id::*;
pub use status::*;
