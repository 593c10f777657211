use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::note::Variant;
use crate::pairing::DeviceClass;

/// Flags that can be stored in a config file.
///
/// Files hold the same flags as the command line, one or more per line.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ConfigFlags {
    pub relay: Option<String>,
    pub variant: Option<Variant>,
    pub device: Option<DeviceClass>,
    pub camera: Option<PathBuf>,
    pub no_persist: bool,
    pub reconnect_delay_ms: Option<u64>,
    pub perf: bool,
    pub debug_log: Option<PathBuf>,
}

impl ConfigFlags {
    /// Merge two flag sets; switches add up, options from `other` win.
    pub fn union(&self, other: &Self) -> Self {
        Self {
            relay: other.relay.clone().or_else(|| self.relay.clone()),
            variant: other.variant.or(self.variant),
            device: other.device.or(self.device),
            camera: other.camera.clone().or_else(|| self.camera.clone()),
            no_persist: self.no_persist || other.no_persist,
            reconnect_delay_ms: other.reconnect_delay_ms.or(self.reconnect_delay_ms),
            perf: self.perf || other.perf,
            debug_log: other.debug_log.clone().or_else(|| self.debug_log.clone()),
        }
    }
}

pub fn global_config_path() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        if let Some(appdata) = std::env::var_os("APPDATA") {
            return PathBuf::from(appdata).join("notemirror").join("config");
        }
    }

    #[cfg(target_os = "macos")]
    {
        if let Some(home) = std::env::var_os("HOME") {
            return PathBuf::from(home)
                .join("Library")
                .join("Application Support")
                .join("notemirror")
                .join("config");
        }
    }

    #[cfg(not(any(target_os = "windows", target_os = "macos")))]
    {
        if let Some(xdg) = std::env::var_os("XDG_CONFIG_HOME") {
            return PathBuf::from(xdg).join("notemirror").join("config");
        }
        if let Some(home) = std::env::var_os("HOME") {
            return PathBuf::from(home)
                .join(".config")
                .join("notemirror")
                .join("config");
        }
    }

    local_override_path()
}

pub fn local_override_path() -> PathBuf {
    PathBuf::from(".notemirrorrc")
}

/// Read flags from `path`. A missing file yields the defaults.
///
/// # Errors
///
/// Returns an error if the file exists but cannot be read.
pub fn load_config_flags(path: &Path) -> Result<ConfigFlags> {
    if !path.exists() {
        return Ok(ConfigFlags::default());
    }
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config {}", path.display()))?;
    let tokens = content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .flat_map(|line| line.split_whitespace().map(ToOwned::to_owned))
        .collect::<Vec<_>>();
    Ok(parse_flag_tokens(&tokens))
}

/// Write `flags` to `path`, creating parent directories.
///
/// # Errors
///
/// Returns an error if the directory or file cannot be written.
pub fn save_config_flags(path: &Path, flags: &ConfigFlags) -> Result<()> {
    let mut lines = vec!["# notemirror defaults (saved with --save)".to_string()];
    if let Some(relay) = &flags.relay {
        lines.push(format!("--relay {relay}"));
    }
    if let Some(variant) = flags.variant {
        lines.push(format!("--variant {}", variant.as_str()));
    }
    if let Some(device) = flags.device {
        lines.push(format!("--device {}", device.as_str()));
    }
    if let Some(camera) = &flags.camera {
        lines.push(format!("--camera {}", camera.display()));
    }
    if flags.no_persist {
        lines.push("--no-persist".to_string());
    }
    if let Some(delay) = flags.reconnect_delay_ms {
        lines.push(format!("--reconnect-delay-ms {delay}"));
    }
    if flags.perf {
        lines.push("--perf".to_string());
    }
    if let Some(path) = &flags.debug_log {
        lines.push(format!("--debug-log {}", path.display()));
    }
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create config dir {}", parent.display()))?;
    }
    fs::write(path, format!("{}\n", lines.join("\n")))
        .with_context(|| format!("Failed to write config {}", path.display()))
}

/// Remove the config file at `path` if there is one.
///
/// # Errors
///
/// Returns an error if the file exists but cannot be removed.
pub fn clear_config_flags(path: &Path) -> Result<()> {
    if path.exists() {
        fs::remove_file(path).with_context(|| format!("Failed to remove {}", path.display()))?;
    }
    Ok(())
}

/// Pick known flags out of `tokens`. Unknown tokens and unparsable values
/// are skipped.
pub fn parse_flag_tokens(tokens: &[String]) -> ConfigFlags {
    let mut flags = ConfigFlags::default();
    let mut i = 0;
    while i < tokens.len() {
        let token = tokens[i].as_str();
        match token {
            "--no-persist" => flags.no_persist = true,
            "--perf" => flags.perf = true,
            _ => {
                let (name, value) = match token.split_once('=') {
                    Some((name, value)) => (name, Some(value)),
                    None if takes_value(token) => {
                        let next = tokens.get(i + 1).map(String::as_str);
                        if next.is_some() {
                            i += 1;
                        }
                        (token, next)
                    }
                    None => (token, None),
                };
                if let Some(value) = value {
                    apply_option(&mut flags, name, value);
                }
            }
        }
        i += 1;
    }
    flags
}

fn takes_value(name: &str) -> bool {
    matches!(
        name,
        "--relay" | "--variant" | "--device" | "--camera" | "--reconnect-delay-ms" | "--debug-log"
    )
}

fn apply_option(flags: &mut ConfigFlags, name: &str, value: &str) {
    match name {
        "--relay" => flags.relay = Some(value.to_string()),
        "--variant" => flags.variant = parse_variant(value),
        "--device" => flags.device = parse_device(value),
        "--camera" => flags.camera = Some(PathBuf::from(value)),
        "--reconnect-delay-ms" => flags.reconnect_delay_ms = value.parse().ok(),
        "--debug-log" => flags.debug_log = Some(PathBuf::from(value)),
        _ => {}
    }
}

fn parse_variant(s: &str) -> Option<Variant> {
    match s {
        "plain" => Some(Variant::Plain),
        "rich" => Some(Variant::Rich),
        _ => None,
    }
}

fn parse_device(s: &str) -> Option<DeviceClass> {
    match s {
        "desktop" => Some(DeviceClass::Desktop),
        "handheld" => Some(DeviceClass::Handheld),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn tokens(args: &[&str]) -> Vec<String> {
        args.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn test_parse_flag_tokens_extracts_known_flags() {
        let args = tokens(&[
            "notemirror",
            "--relay",
            "http://localhost:3000/",
            "--variant=plain",
            "--device",
            "handheld",
            "--camera",
            "/tmp/frame.png",
            "--no-persist",
            "--reconnect-delay-ms=250",
            "--debug-log",
            "events.log",
            "stray",
        ]);
        let flags = parse_flag_tokens(&args);
        assert_eq!(flags.relay.as_deref(), Some("http://localhost:3000/"));
        assert_eq!(flags.variant, Some(Variant::Plain));
        assert_eq!(flags.device, Some(DeviceClass::Handheld));
        assert_eq!(flags.camera, Some(PathBuf::from("/tmp/frame.png")));
        assert!(flags.no_persist);
        assert_eq!(flags.reconnect_delay_ms, Some(250));
        assert_eq!(flags.debug_log, Some(PathBuf::from("events.log")));
        assert!(!flags.perf);
    }

    #[test]
    fn test_bad_values_are_skipped() {
        let flags = parse_flag_tokens(&tokens(&[
            "--variant",
            "fancy",
            "--reconnect-delay-ms=soon",
            "--device",
        ]));
        assert_eq!(flags, ConfigFlags::default());
    }

    #[test]
    fn test_config_union_merges_cli_over_file_for_options() {
        let file = ConfigFlags {
            no_persist: true,
            variant: Some(Variant::Plain),
            relay: Some("http://file/".to_string()),
            ..ConfigFlags::default()
        };
        let cli = ConfigFlags {
            perf: true,
            variant: Some(Variant::Rich),
            ..ConfigFlags::default()
        };
        let merged = file.union(&cli);
        assert!(merged.no_persist);
        assert!(merged.perf);
        assert_eq!(merged.variant, Some(Variant::Rich));
        assert_eq!(merged.relay.as_deref(), Some("http://file/"));
    }

    #[test]
    fn test_save_load_and_clear_config() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join(".notemirrorrc");
        let flags = ConfigFlags {
            relay: Some("https://relay.example/".to_string()),
            variant: Some(Variant::Plain),
            device: Some(DeviceClass::Handheld),
            camera: Some(PathBuf::from("frame.png")),
            no_persist: true,
            reconnect_delay_ms: Some(2000),
            perf: true,
            debug_log: Some(PathBuf::from("events.log")),
        };

        save_config_flags(&path, &flags).unwrap();
        assert_eq!(load_config_flags(&path).unwrap(), flags);

        clear_config_flags(&path).unwrap();
        assert!(!path.exists());
        assert_eq!(load_config_flags(&path).unwrap(), ConfigFlags::default());
    }
}
