use std::{fs, io, path::Path, time::Duration};

use anyhow::{bail, Context};
use serde::Deserialize;
use url::Url;

pub const DEFAULT_CONFIG_FILE: &str = "quiz.toml";
pub const DEFAULT_SERVER_URL: &str = "http://localhost:8080";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub server_url: String,
    pub request_timeout_secs: Option<u64>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            server_url: DEFAULT_SERVER_URL.into(),
            request_timeout_secs: None,
        }
    }
}

impl Settings {
    /// `None` (or zero) keeps calls unbounded.
    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_secs
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs)
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct FileSettings {
    server_url: Option<String>,
    request_timeout_secs: Option<u64>,
}

/// Defaults, then the config file, then the environment, then CLI flags.
///
/// A missing `quiz.toml` in the working directory is fine; an explicit
/// `--config` path that cannot be read is an error.
pub fn load_settings(
    config_path: Option<&Path>,
    server_url_flag: Option<String>,
) -> anyhow::Result<Settings> {
    let mut settings = Settings::default();

    let (path, required) = match config_path {
        Some(path) => (path, true),
        None => (Path::new(DEFAULT_CONFIG_FILE), false),
    };
    match fs::read_to_string(path) {
        Ok(raw) => apply_file(&mut settings, &raw)
            .with_context(|| format!("invalid config file '{}'", path.display()))?,
        Err(err) if err.kind() == io::ErrorKind::NotFound && !required => {}
        Err(err) => {
            return Err(err)
                .with_context(|| format!("failed to read config file '{}'", path.display()))
        }
    }

    apply_env(&mut settings, |key| std::env::var(key).ok())?;

    if let Some(v) = server_url_flag {
        settings.server_url = v;
    }

    settings.server_url = normalize_server_url(&settings.server_url)?;
    Ok(settings)
}

fn apply_file(settings: &mut Settings, raw: &str) -> anyhow::Result<()> {
    let file_cfg: FileSettings = toml::from_str(raw)?;
    if let Some(v) = file_cfg.server_url {
        settings.server_url = v;
    }
    if let Some(v) = file_cfg.request_timeout_secs {
        settings.request_timeout_secs = Some(v);
    }
    Ok(())
}

fn apply_env(
    settings: &mut Settings,
    lookup: impl Fn(&str) -> Option<String>,
) -> anyhow::Result<()> {
    if let Some(v) = lookup("QUIZ_SERVER_URL") {
        settings.server_url = v;
    }
    if let Some(v) = lookup("APP__SERVER_URL") {
        settings.server_url = v;
    }

    if let Some(v) = lookup("APP__REQUEST_TIMEOUT_SECS") {
        let parsed = v
            .trim()
            .parse::<u64>()
            .with_context(|| format!("APP__REQUEST_TIMEOUT_SECS must be whole seconds, got '{v}'"))?;
        settings.request_timeout_secs = Some(parsed);
    }

    Ok(())
}

fn normalize_server_url(raw: &str) -> anyhow::Result<String> {
    let trimmed = raw.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        return Ok(DEFAULT_SERVER_URL.into());
    }

    let url = Url::parse(trimmed).with_context(|| format!("invalid server url '{trimmed}'"))?;
    if !matches!(url.scheme(), "http" | "https") {
        bail!("server url '{trimmed}' must use http or https");
    }

    Ok(trimmed.to_string())
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
