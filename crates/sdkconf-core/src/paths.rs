use directories::ProjectDirs;
use std::path::PathBuf;

pub const APP_QUALIFIER: &str = "com";
pub const APP_ORG: &str = "sdkconf";
pub const APP_NAME: &str = "sdkconf";

pub const CONFIG_ENV: &str = "SDKCONF_CONFIG";

pub fn config_dir() -> anyhow::Result<PathBuf> {
    let dirs = ProjectDirs::from(APP_QUALIFIER, APP_ORG, APP_NAME)
        .ok_or_else(|| anyhow::anyhow!("cannot determine config directory"))?;
    Ok(dirs.config_dir().to_path_buf())
}

pub fn data_dir() -> anyhow::Result<PathBuf> {
    let dirs = ProjectDirs::from(APP_QUALIFIER, APP_ORG, APP_NAME)
        .ok_or_else(|| anyhow::anyhow!("cannot determine data directory"))?;
    Ok(dirs.data_dir().to_path_buf())
}

pub fn settings_path() -> anyhow::Result<PathBuf> {
    if let Ok(override_path) = std::env::var(CONFIG_ENV) {
        return Ok(PathBuf::from(override_path));
    }
    Ok(config_dir()?.join("settings.json"))
}

pub fn default_diagnostics_log() -> anyhow::Result<PathBuf> {
    Ok(data_dir()?.join("logs").join("diagnostics.jsonl"))
}
