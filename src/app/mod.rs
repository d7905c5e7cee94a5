//! Service plumbing shared by every route: configuration, state, errors,
//! database access, authorization middleware and startup.

pub mod bootstrap;
pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod state;
pub mod swagger;
