//! Configuration loading and root folder resolution
//!
//! The root folder holds everything a VMask deployment owns: the SQLite
//! database, the surrogate clip library, and anonymized output files.

use crate::{Error, Result};
use std::path::PathBuf;

/// Resolve the VMask root folder, in priority order:
/// 1. Command-line argument (highest priority)
/// 2. Environment variable
/// 3. TOML config file (`root_folder` key)
/// 4. OS-dependent compiled default (fallback)
pub fn resolve_root_folder(cli_arg: Option<&str>, env_var_name: &str) -> Result<PathBuf> {
    // Priority 1: Command-line argument
    if let Some(path) = cli_arg {
        return Ok(PathBuf::from(path));
    }

    // Priority 2: Environment variable
    if let Ok(path) = std::env::var(env_var_name) {
        if !path.is_empty() {
            return Ok(PathBuf::from(path));
        }
    }

    // Priority 3: TOML config file
    if let Ok(config_path) = load_config_file() {
        if let Ok(toml_content) = std::fs::read_to_string(&config_path) {
            if let Ok(config) = toml::from_str::<toml::Value>(&toml_content) {
                if let Some(root_folder) = config.get("root_folder").and_then(|v| v.as_str()) {
                    return Ok(PathBuf::from(root_folder));
                }
            }
        }
    }

    // Priority 4: OS-dependent compiled default
    Ok(get_default_root_folder())
}

/// Get default configuration file path for the platform
fn load_config_file() -> Result<PathBuf> {
    let config_dir = if cfg!(target_os = "linux") {
        // Try ~/.config/vmask/config.toml first, then /etc/vmask/config.toml
        let user_config = dirs::config_dir().map(|d| d.join("vmask").join("config.toml"));
        let system_config = PathBuf::from("/etc/vmask/config.toml");

        if let Some(path) = user_config {
            if path.exists() {
                return Ok(path);
            }
        }
        if system_config.exists() {
            return Ok(system_config);
        }
        return Err(Error::Config("No config file found".to_string()));
    } else if cfg!(target_os = "macos") || cfg!(target_os = "windows") {
        dirs::config_dir()
            .map(|d| d.join("vmask").join("config.toml"))
            .ok_or_else(|| Error::Config("Could not determine config directory".to_string()))?
    } else {
        return Err(Error::Config("Unsupported platform".to_string()));
    };

    if config_dir.exists() {
        Ok(config_dir)
    } else {
        Err(Error::Config(format!("Config file not found: {:?}", config_dir)))
    }
}

/// Get OS-dependent default root folder path
fn get_default_root_folder() -> PathBuf {
    if cfg!(target_os = "linux") {
        dirs::data_local_dir()
            .map(|d| d.join("vmask"))
            .unwrap_or_else(|| PathBuf::from("/var/lib/vmask"))
    } else if cfg!(target_os = "macos") {
        dirs::data_dir()
            .map(|d| d.join("vmask"))
            .unwrap_or_else(|| PathBuf::from("/Library/Application Support/vmask"))
    } else if cfg!(target_os = "windows") {
        dirs::data_local_dir()
            .map(|d| d.join("vmask"))
            .unwrap_or_else(|| PathBuf::from("C:\\ProgramData\\vmask"))
    } else {
        PathBuf::from("./vmask_data")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_arg_wins() {
        let path = resolve_root_folder(Some("/tmp/vmask-test"), "VMASK_TEST_UNSET_VAR").unwrap();
        assert_eq!(path, PathBuf::from("/tmp/vmask-test"));
    }

    #[test]
    fn test_env_var_fallback() {
        std::env::set_var("VMASK_TEST_ROOT_VAR", "/tmp/vmask-env");
        let path = resolve_root_folder(None, "VMASK_TEST_ROOT_VAR").unwrap();
        assert_eq!(path, PathBuf::from("/tmp/vmask-env"));
        std::env::remove_var("VMASK_TEST_ROOT_VAR");
    }
}
