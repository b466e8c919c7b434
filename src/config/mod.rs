mod types;

pub use types::*;

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

/// Load configuration from a TOML file
pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {:?}", path))?;

    let mut config: Config = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {:?}", path))?;

    apply_env_overrides(&mut config)?;
    validate_config(&config)?;

    Ok(config)
}

/// Load config from default locations or return default config
pub fn load_config_or_default(custom_path: Option<&Path>) -> Result<Config> {
    if let Some(path) = custom_path {
        return load_config(path);
    }

    // Try default locations
    let default_paths = [
        "./hdrscan.toml",
        "./config.toml",
        "~/.config/hdrscan/config.toml",
        "/etc/hdrscan/config.toml",
    ];

    for path_str in default_paths {
        let path = shellexpand::tilde(path_str);
        let path = Path::new(path.as_ref());
        if path.exists() {
            return load_config(path);
        }
    }

    // Return default config if no file found
    let mut config = Config::default();
    apply_env_overrides(&mut config)?;
    validate_config(&config)?;
    Ok(config)
}

/// Environment variables win over the file.
fn apply_env_overrides(config: &mut Config) -> Result<()> {
    let var = |name: &str| std::env::var(name).ok().filter(|v| !v.trim().is_empty());

    if let Some(key) = var("TMDB_API_KEY") {
        config.metadata.tmdb_api_key = Some(key);
    }
    if let Some(key) = var("FANART_API_KEY") {
        config.metadata.fanart_api_key = Some(key);
    }
    if let Some(source) = var("IMAGE_SOURCE") {
        config.metadata.image_source = source
            .parse()
            .map_err(anyhow::Error::msg)
            .context("Invalid IMAGE_SOURCE")?;
    }
    if let Some(lang) = var("CONTENT_LANGUAGE") {
        config.metadata.content_language = lang.trim().to_lowercase();
    }
    if let Some(path) = var("MEDIA_PATH") {
        config.library.media_path = PathBuf::from(path);
    }
    if let Some(path) = var("DATA_DIR") {
        config.library.data_dir = PathBuf::from(path);
    }
    if let Some(path) = var("TEMP_DIR") {
        config.library.temp_dir = PathBuf::from(path);
    }

    Ok(())
}

/// Validate configuration
fn validate_config(config: &Config) -> Result<()> {
    let ratio = config.analysis.audio_bitrate_estimate_ratio;
    if !(ratio > 0.0 && ratio <= 1.0) {
        anyhow::bail!("audio_bitrate_estimate_ratio must be in (0, 1], got {ratio}");
    }

    if config.library.workers == 0 {
        anyhow::bail!("library.workers must be at least 1");
    }

    if config.metadata.content_language.trim().is_empty() {
        anyhow::bail!("metadata.content_language cannot be empty");
    }

    if config.metadata.request_timeout_secs == 0 {
        anyhow::bail!("metadata.request_timeout_secs cannot be 0");
    }

    if !config.library.media_path.exists() {
        tracing::warn!("Media path does not exist: {:?}", config.library.media_path);
    }

    match config.metadata.image_source {
        ImageSource::Tmdb if config.metadata.tmdb_key().is_none() => {
            tracing::warn!("TMDB selected for artwork but no tmdb_api_key is set");
        }
        ImageSource::Fanart if config.metadata.fanart_key().is_none() => {
            tracing::warn!("Fanart.tv selected for artwork but no fanart_api_key is set");
        }
        _ => {}
    }

    Ok(())
}
