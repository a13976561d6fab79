//! Core types for Atelier.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod color;
pub mod email;
pub mod id;
pub mod role;
pub mod slug;

pub use color::{HexColor, HexColorError};
pub use email::{Email, EmailError};
pub use id::*;
pub use role::{AdminRole, ParseRoleError};
pub use slug::slugify;
