//! Microphone and camera capture.
//!
//! Each modality is an explicit state machine over a device trait. Devices
//! hand out tracks; whoever holds a track must stop it, and both machines
//! stop their tracks on every exit path including `Drop`.

pub mod camera;
pub mod file_devices;
pub mod voice;

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DeviceError {
    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("Device unavailable: {0}")]
    Unavailable(String),

    #[error("Capture already in progress")]
    Busy,

    #[error("Device not ready")]
    NotReady,

    #[error("Encoding failed: {0}")]
    Encoding(String),
}
