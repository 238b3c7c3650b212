//! Command-line front end for SANS reduction states.

pub mod commands;
pub mod config;
pub mod logging;
pub mod summary;
