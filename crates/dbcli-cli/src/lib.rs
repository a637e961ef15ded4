//! Command-line front ends for the dbcli administration tools.
//!
//! - [`rcli`] -- key-value store client
//! - [`mcli`] -- document store client
//!
//! Both binaries share [`config`] loading and [`logging`] setup. Data goes
//! to standard output; diagnostics go to standard error.

pub mod config;
pub mod logging;
pub mod mcli;
pub mod rcli;
