pub mod capture_result;
pub mod device;
pub mod envelope;

pub use capture_result::*;
pub use device::*;
pub use envelope::*;
