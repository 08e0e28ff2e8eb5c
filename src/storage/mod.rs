//! Storage Layer
//!
//! Resolves the per-user directories holding configuration and captures.

use anyhow::Result;
use std::path::PathBuf;

use crate::config::AppConfig;

fn project_dirs() -> Result<directories::ProjectDirs> {
    directories::ProjectDirs::from("br.com", "ufabc", "scanvars")
        .ok_or_else(|| anyhow::anyhow!("Could not determine home directory"))
}

/// Get the application data directory
pub fn get_data_dir() -> Result<PathBuf> {
    let data_dir = project_dirs()?.data_dir().to_path_buf();
    std::fs::create_dir_all(&data_dir)?;
    Ok(data_dir)
}

/// Get the configuration directory
pub fn get_config_dir() -> Result<PathBuf> {
    let config_dir = project_dirs()?.config_dir().to_path_buf();
    std::fs::create_dir_all(&config_dir)?;
    Ok(config_dir)
}

/// Directory receiving camera captures, created on demand
pub fn capture_dir(config: &AppConfig) -> Result<PathBuf> {
    let dir = match &config.capture.capture_dir {
        Some(dir) => dir.clone(),
        None => get_data_dir()?.join("captures"),
    };
    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}
