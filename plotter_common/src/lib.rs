//! Plotter Common Library
//!
//! Shared data model, error taxonomy, hardware capability traits and
//! configuration loading for the plotter motion workspace.
//!
//! # Module Structure
//!
//! - [`motion`] - Axis/machine state, positioning modes, reply tokens, errors
//! - [`hal`] - Capability traits implemented by platform adapters
//! - [`config`] - TOML configuration types and loader
//! - [`consts`] - Numeric limits and defaults
//! - [`prelude`] - Common re-exports for convenience
//!
//! # Usage
//!
//! ```rust
//! use plotter_common::prelude::*;
//!
//! let target = Vector2D::new(30.0, 40.0);
//! assert_eq!(target.length(), 50.0);
//! ```

pub mod config;
pub mod consts;
pub mod hal;
pub mod motion;
pub mod prelude;
