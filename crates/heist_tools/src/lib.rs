//! # Heist Development Tools
//!
//! Command-line tools for content authors:
//! - RON content validation
//! - Headless scripted runs of a level, battles included

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]

pub mod error;
pub mod simulate;
pub mod validate;

pub use error::{ToolError, ToolResult};
