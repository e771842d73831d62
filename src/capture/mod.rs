pub mod client;
pub mod error;
pub mod output;

#[cfg(test)]
pub mod mock;

pub use client::*;
pub use error::*;
