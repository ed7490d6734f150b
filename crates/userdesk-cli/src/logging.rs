// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result};
use std::env;
use std::fs::{self, OpenOptions};
use std::path::PathBuf;
use std::sync::Mutex;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use crate::config::Config;

pub const LOG_ENV: &str = "USERDESK_LOG";

/// Installs the global subscriber. Output goes to the log file only; the
/// terminal belongs to the TUI.
pub fn init(config: &Config) -> Result<PathBuf> {
    let path = config.log_path()?;
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)
            .with_context(|| format!("create log directory {}", parent.display()))?;
    }
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .with_context(|| {
            format!(
                "open log file {}; set [log].file to a writable path",
                path.display()
            )
        })?;

    let filter = build_filter(env::var(LOG_ENV).ok(), &config.log_level())?;
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(Mutex::new(file)).with_ansi(false))
        .with(filter)
        .try_init()
        .context("install tracing subscriber")?;
    Ok(path)
}

/// `USERDESK_LOG` directives win over the configured level.
fn build_filter(env_directives: Option<String>, level: &str) -> Result<EnvFilter> {
    match env_directives.filter(|directives| !directives.trim().is_empty()) {
        Some(directives) => EnvFilter::try_new(&directives)
            .with_context(|| format!("invalid {LOG_ENV} directives {directives:?}")),
        None => EnvFilter::try_new(level).with_context(|| format!("invalid log level {level:?}")),
    }
}

#[cfg(test)]
mod tests {
    use super::build_filter;
    use anyhow::Result;

    #[test]
    fn configured_level_is_used_without_env_directives() -> Result<()> {
        let filter = build_filter(None, "warn")?;
        assert_eq!(filter.to_string(), "warn");

        let blank = build_filter(Some("  ".to_owned()), "debug")?;
        assert_eq!(blank.to_string(), "debug");
        Ok(())
    }

    #[test]
    fn env_directives_override_configured_level() -> Result<()> {
        let filter = build_filter(Some("userdesk_client=trace".to_owned()), "info")?;
        assert!(filter.to_string().contains("userdesk_client=trace"));
        Ok(())
    }
}
