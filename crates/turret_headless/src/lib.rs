//! # Turret Headless
//!
//! Headless scenario runner for the turret decision core.
//!
//! Loads RON scenario files describing turret emplacements and a
//! static raider field, runs a registry for a fixed number of ticks
//! with the scenario acting as host (candidate provider and power
//! delivery), and reports metrics as JSON. Batch mode repeats a
//! scenario across threads to confirm cross-run determinism.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod batch;
pub mod runner;
pub mod scenario;
