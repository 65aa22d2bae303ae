//! `sentinel config`: configuration management commands.

use anyhow::Context;
use clap::Subcommand;
use sentinel_config::{BackendConfig, ConfigStore, FileConfigStore};

#[derive(Debug, Subcommand)]
pub enum ConfigAction {
    /// Print the effective config (API key masked)
    Show,

    /// Print the config file path
    Path,

    /// Write a default config file
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// Set one setting: backend_url, api_key, timeout_seconds, debug_logging_enabled
    Set { key: String, value: String },
}

pub fn run(store: FileConfigStore, action: ConfigAction) -> anyhow::Result<()> {
    match action {
        ConfigAction::Show => show(&store),
        ConfigAction::Path => {
            println!("{}", store.path().display());
            Ok(())
        }
        ConfigAction::Init { force } => init(&store, force),
        ConfigAction::Set { key, value } => set(&store, &key, &value),
    }
}

fn show(store: &FileConfigStore) -> anyhow::Result<()> {
    let mut config = store.load().context("Failed to load config")?;
    if config.has_api_key() {
        config.api_key = "********".into();
    }
    print!("{}", toml::to_string_pretty(&config)?);

    if let Err(e) = config.validate() {
        println!();
        println!("# warning: {e}");
    }
    Ok(())
}

fn init(store: &FileConfigStore, force: bool) -> anyhow::Result<()> {
    if store.path().exists() && !force {
        anyhow::bail!(
            "Config already exists at {} (use --force to overwrite)",
            store.path().display()
        );
    }

    store.save(&BackendConfig::default())?;
    println!("Wrote default config to {}", store.path().display());
    println!("Set the backend with `sentinel config set backend_url <URL>`");
    Ok(())
}

fn set(store: &FileConfigStore, key: &str, value: &str) -> anyhow::Result<()> {
    // Env overrides must not leak into the saved file.
    let store = store.clone().without_env_overrides();
    let mut config = store.load().context("Failed to load config")?;
    apply_setting(&mut config, key, value)?;
    store.save(&config)?;

    let shown = if key == "api_key" { "********" } else { value.trim() };
    println!("{key} = {shown}");
    Ok(())
}

pub(crate) fn apply_setting(config: &mut BackendConfig, key: &str, value: &str) -> anyhow::Result<()> {
    let value = value.trim();
    match key {
        "backend_url" => config.backend_url = value.to_string(),
        "api_key" => config.api_key = value.to_string(),
        "timeout_seconds" => {
            let secs: i64 = value
                .parse()
                .with_context(|| format!("timeout_seconds must be a whole number, got `{value}`"))?;
            if secs <= 0 {
                anyhow::bail!("Request timeout must be a positive number of seconds");
            }
            config.timeout_seconds = secs;
        }
        "debug_logging_enabled" => {
            config.debug_logging_enabled = value
                .parse()
                .with_context(|| format!("debug_logging_enabled must be true or false, got `{value}`"))?;
        }
        other => anyhow::bail!(
            "Unknown setting `{other}` (expected backend_url, api_key, timeout_seconds, debug_logging_enabled)"
        ),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_store() -> (tempfile::TempDir, FileConfigStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = FileConfigStore::new(dir.path().join("sentinel").join("config.toml"))
            .without_env_overrides();
        (dir, store)
    }

    #[test]
    fn settings_are_applied() {
        let mut config = BackendConfig::default();
        apply_setting(&mut config, "backend_url", " https://sentinel.example ").unwrap();
        apply_setting(&mut config, "api_key", "s3cr3t").unwrap();
        apply_setting(&mut config, "timeout_seconds", "30").unwrap();
        apply_setting(&mut config, "debug_logging_enabled", "true").unwrap();

        assert_eq!(config.backend_url, "https://sentinel.example");
        assert_eq!(config.api_key, "s3cr3t");
        assert_eq!(config.timeout_seconds, 30);
        assert!(config.debug_logging_enabled);
    }

    #[test]
    fn bad_settings_are_rejected() {
        let mut config = BackendConfig::default();
        assert!(apply_setting(&mut config, "timeout_seconds", "0").is_err());
        assert!(apply_setting(&mut config, "timeout_seconds", "soon").is_err());
        assert!(apply_setting(&mut config, "debug_logging_enabled", "maybe").is_err());
        assert!(apply_setting(&mut config, "colour", "red").is_err());
        assert_eq!(config, BackendConfig::default());
    }

    #[test]
    fn init_then_set_persists() {
        let (_dir, store) = temp_store();

        init(&store, false).unwrap();
        assert!(store.path().exists());
        assert!(init(&store, false).is_err());
        init(&store, true).unwrap();

        set(&store, "backend_url", "http://10.0.0.5:8080").unwrap();
        set(&store, "timeout_seconds", "20").unwrap();

        let loaded = store.load().unwrap();
        assert_eq!(loaded.backend_url, "http://10.0.0.5:8080");
        assert_eq!(loaded.timeout_seconds, 20);
        assert!(!loaded.debug_logging_enabled);
    }
}
