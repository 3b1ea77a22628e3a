//! Find and resolve duplicate activities on Intervals.icu.
//!
//! [`engine`] holds the pure decision logic; the other modules fetch
//! activities, load configuration and apply decisions.

pub mod client;
pub mod config;
pub mod dump;
pub mod engine;
pub mod history;
pub mod report;
pub mod runner;
pub mod window;

#[cfg(test)]
pub(crate) mod testing;
