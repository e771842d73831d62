pub mod capture;
pub mod config;
pub mod event;

pub use capture::{
    CaptureError, FingerprintClient, TransportError, capture_fingerprint,
    capture_fingerprint_with,
};
pub use event::CaptureResult;
