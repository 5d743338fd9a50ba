//! Robot configuration file – reads/writes `wheelbot.toml`.

use std::fs;
use std::path::{Path, PathBuf};

use wheelbot_types::RobotConfiguration;

pub const DEFAULT_CONFIG_FILE: &str = "wheelbot.toml";

/// Pick the config path: first CLI argument, then `WHEELBOT_CONFIG`, then
/// `wheelbot.toml` in the working directory.
pub fn config_path(arg: Option<String>, env: Option<String>) -> PathBuf {
    arg.or(env)
        .filter(|p| !p.trim().is_empty())
        .map_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE), PathBuf::from)
}

/// Load the config from `path`. Returns `None` if the file does not exist.
pub fn load_from(path: &Path) -> Result<Option<RobotConfiguration>, String> {
    if !path.exists() {
        return Ok(None);
    }
    let raw = fs::read_to_string(path)
        .map_err(|e| format!("Failed to read config at {}: {}", path.display(), e))?;
    let cfg: RobotConfiguration =
        toml::from_str(&raw).map_err(|e| format!("Failed to parse config: {}", e))?;
    Ok(Some(cfg))
}

/// Save the config to `path`, creating parent directories if necessary.
pub fn save_to(cfg: &RobotConfiguration, path: &Path) -> Result<(), String> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .map_err(|e| format!("Failed to create config directory: {}", e))?;
    }
    let raw =
        toml::to_string_pretty(cfg).map_err(|e| format!("Failed to serialize config: {}", e))?;
    fs::write(path, raw)
        .map_err(|e| format!("Failed to write config at {}: {}", path.display(), e))
}

/// Load `path`, writing the default robot there first when it is missing.
/// Environment overrides are applied and the result validated.
///
/// The returned flag is `true` when a new file was written.
pub fn load_or_init(path: &Path) -> Result<(RobotConfiguration, bool), String> {
    let (mut cfg, created) = match load_from(path)? {
        Some(cfg) => (cfg, false),
        None => {
            let cfg = RobotConfiguration::default_robot();
            save_to(&cfg, path)?;
            (cfg, true)
        }
    };
    apply_env_overrides(&mut cfg);
    cfg.validate()
        .map_err(|e| format!("Invalid config at {}: {}", path.display(), e))?;
    Ok((cfg, created))
}

/// Apply `WHEELBOT_*` environment variable overrides to `cfg`.
///
/// | Variable | Config field |
/// |---|---|
/// | `WHEELBOT_ROBOT_NAME` | `robot_name` |
/// | `WHEELBOT_BASE_TOPIC` | `communication.base_topic` |
/// | `WHEELBOT_BRIDGE_ADDR` | `communication.bridge_addr` |
/// | `WHEELBOT_MAX_SPEED` | `drive.max_speed` |
pub fn apply_env_overrides(cfg: &mut RobotConfiguration) {
    apply_overrides(cfg, |key| std::env::var(key).ok());
}

fn apply_overrides(cfg: &mut RobotConfiguration, lookup: impl Fn(&str) -> Option<String>) {
    if let Some(v) = lookup("WHEELBOT_ROBOT_NAME") {
        cfg.robot_name = v;
    }
    if let Some(v) = lookup("WHEELBOT_BASE_TOPIC") {
        cfg.communication.base_topic = v;
    }
    if let Some(v) = lookup("WHEELBOT_BRIDGE_ADDR") {
        cfg.communication.bridge_addr = v;
    }
    if let Some(v) = lookup("WHEELBOT_MAX_SPEED")
        && let Ok(speed) = v.trim().parse::<f64>()
        && speed.is_finite()
    {
        cfg.drive.max_speed = speed;
    }
}
