//! Data types for the FlexTable pipeline.

mod config;
mod dataset;
mod filter;
mod formatting;
mod grouping;
mod layout;

pub use config::*;
pub use dataset::*;
pub use filter::*;
pub use formatting::*;
pub use grouping::*;
pub use layout::*;
