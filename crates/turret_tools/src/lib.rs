//! # Turret Tools
//!
//! Development tools for the turret engine: RON data-file validation
//! run in CI before balance data ships.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod validate;
