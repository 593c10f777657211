//! Pairing: showing this device's session id as a QR code and scanning the
//! peer's.

pub mod capability;
pub mod qr;
pub mod scanner;

pub use capability::{DeviceClass, NO_CAMERA_NOTICE, ScanCapability, UNSUPPORTED_NOTICE};
pub use qr::{QUIET_ZONE, qr_rows};
pub use scanner::{SCAN_DELAY, ScanError, Scanner, decode_frame_file, decode_luma};
