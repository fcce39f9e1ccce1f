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

    expand_paths(&mut config);
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
        "./transcode-watch.toml",
        "~/.config/transcode-watch/config.toml",
        "/etc/transcode-watch/config.toml",
    ];

    for path_str in default_paths {
        let path = shellexpand::tilde(path_str);
        let path = Path::new(path.as_ref());
        if path.exists() {
            tracing::debug!("Using config file {:?}", path);
            return load_config(path);
        }
    }

    Ok(Config::default())
}

fn expand_tilde(path: &mut PathBuf) {
    if let Some(s) = path.to_str() {
        *path = PathBuf::from(shellexpand::tilde(s).as_ref());
    }
}

fn expand_paths(config: &mut Config) {
    if let Some(program) = config.worker.program.as_mut() {
        expand_tilde(program);
    }
    expand_tilde(&mut config.encoder.program);
    expand_tilde(&mut config.encoder.exiftool);
}

/// Validate configuration
pub fn validate_config(config: &Config) -> Result<()> {
    let dispatch = &config.dispatch;

    if !dispatch.delay_secs.is_finite() || dispatch.delay_secs < 0.0 {
        anyhow::bail!(
            "Delay must be a non-negative number of seconds, got {}",
            dispatch.delay_secs
        );
    }

    if dispatch.max_procs == 0 {
        anyhow::bail!("max_procs must be at least 1");
    }

    if dispatch.worker_timeout_secs == Some(0) {
        anyhow::bail!("worker_timeout_secs must be greater than 0 when set");
    }

    if dispatch.extensions.iter().any(|e| e.is_empty()) {
        anyhow::bail!("Extensions cannot be empty strings");
    }

    Ok(())
}
