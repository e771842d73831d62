pub mod config;
pub mod init;

pub use config::*;
pub use init::init;
