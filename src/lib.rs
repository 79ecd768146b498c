//! `turnout-model` library crate.
//!
//! The binary (`turnout`) is a thin wrapper around this library so that:
//!
//! - selection and scoring are testable without spawning processes
//! - the regression core can be driven from other front-ends

pub mod app;
pub mod cli;
pub mod data;
pub mod domain;
pub mod error;
pub mod fit;
pub mod io;
pub mod math;
pub mod report;
