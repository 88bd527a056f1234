//! Headless runner library for Nightfall Survivors.
//!
//! Drives the combat simulation without a frontend: a scripted autopilot
//! plays the run, and the results come back as serializable reports for
//! balance analysis and CI checks.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]

pub mod runner;
