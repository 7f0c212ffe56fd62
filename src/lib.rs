//! Follow every follower of a GitHub account.
//!
//! The pipeline authenticates, lists the target's followers page by page,
//! then checks and follows each one in order with fixed pauses in between.

pub mod config;
pub mod error;
pub mod follower;
pub mod github;
pub mod prompt;
pub mod report;
pub mod session;
pub mod throttle;
