//! Command handlers for attrib CLI
//!
//! Each subcommand has its own module with handler functions.

pub mod configure;
pub mod inspect;
pub mod run;
