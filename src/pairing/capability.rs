use std::path::PathBuf;

/// Form factor this client runs as.
#[derive(clap::ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DeviceClass {
    /// Shows the pairing code; never scans.
    #[default]
    Desktop,
    /// Scans the peer's code with a camera.
    Handheld,
}

impl DeviceClass {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Desktop => "desktop",
            Self::Handheld => "handheld",
        }
    }
}

/// What the scanner region can do on this device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanCapability {
    /// Not a handheld device.
    Unsupported,
    /// Handheld, but there is no usable camera.
    NoCamera,
    /// Handheld with a camera whose frames land in this file.
    Camera(PathBuf),
}

pub const UNSUPPORTED_NOTICE: &str = "only available on mobile devices";
pub const NO_CAMERA_NOTICE: &str = "no camera available";

impl ScanCapability {
    /// Resolve the capability from configuration. A camera whose directory
    /// does not exist counts as no camera.
    pub fn detect(device: DeviceClass, camera: Option<PathBuf>) -> Self {
        match (device, camera) {
            (DeviceClass::Desktop, _) => Self::Unsupported,
            (DeviceClass::Handheld, None) => Self::NoCamera,
            (DeviceClass::Handheld, Some(path)) => {
                let dir_exists = path
                    .parent()
                    .filter(|p| !p.as_os_str().is_empty())
                    .is_none_or(std::path::Path::is_dir);
                if dir_exists {
                    Self::Camera(path)
                } else {
                    tracing::warn!(camera = %path.display(), "camera directory missing");
                    Self::NoCamera
                }
            }
        }
    }

    /// Static text shown instead of a live scanner.
    pub const fn notice(&self) -> Option<&'static str> {
        match self {
            Self::Unsupported => Some(UNSUPPORTED_NOTICE),
            Self::NoCamera => Some(NO_CAMERA_NOTICE),
            Self::Camera(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_desktop_never_scans() {
        let dir = tempdir().unwrap();
        let capability =
            ScanCapability::detect(DeviceClass::Desktop, Some(dir.path().join("frame.png")));
        assert_eq!(capability, ScanCapability::Unsupported);
        assert_eq!(capability.notice(), Some("only available on mobile devices"));
    }

    #[test]
    fn test_handheld_without_camera() {
        let capability = ScanCapability::detect(DeviceClass::Handheld, None);
        assert_eq!(capability.notice(), Some("no camera available"));
        assert!(!matches!(capability, ScanCapability::Camera(_)));
    }

    #[test]
    fn test_handheld_camera_needs_existing_directory() {
        let dir = tempdir().unwrap();
        let frame = dir.path().join("frame.png");
        assert_eq!(
            ScanCapability::detect(DeviceClass::Handheld, Some(frame.clone())),
            ScanCapability::Camera(frame)
        );
        let missing = dir.path().join("gone").join("frame.png");
        assert_eq!(
            ScanCapability::detect(DeviceClass::Handheld, Some(missing)),
            ScanCapability::NoCamera
        );
    }
}
