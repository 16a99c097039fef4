//! Heat rejected to the environment by groups of buildings.
//!
//! Buildings are grouped by shared cooling system (or by a user group file),
//! each group's hourly cooling demand is combined into a sensible/latent
//! heat-rejection series, and one CSV per group is written.

pub mod catalogue;
pub mod cli;
pub mod config;
pub mod error;
pub mod groups;
pub mod io;
pub mod logging;
pub mod rejection;
pub mod runner;
