//! Terminal helpers shared by the imgtools binary
//!
//! - Status messages and error reports
//! - Progress bars for batch runs
//! - Logging setup

#![warn(missing_docs)]

pub mod logging;
pub mod output;
pub mod progress;
