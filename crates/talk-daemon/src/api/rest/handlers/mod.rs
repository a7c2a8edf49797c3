//! API request handlers

mod dispatch;
mod health;
pub mod params;

pub use dispatch::*;
pub use health::*;
