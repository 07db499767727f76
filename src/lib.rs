//! `grb-afterglow` library crate.
//!
//! The binary (`grb`) is a thin wrapper around this library so that:
//!
//! - processing and modeling are testable without spawning processes
//! - the processors, models and likelihood can be driven from other tools
//!   (notebooks, batch scripts, external samplers)

pub mod app;
pub mod cli;
pub mod convert;
pub mod domain;
pub mod error;
pub mod event;
pub mod fit;
pub mod io;
pub mod models;
pub mod process;
pub mod report;
pub mod time;
