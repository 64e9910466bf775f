//! `scout config` command
//!
//! Get or set configuration values.
//!
//! # Usage
//! ```bash
//! scout config                              # Show all config
//! scout config dedup.merge_threshold        # Get specific value
//! scout config dedup.merge_threshold 92     # Set value
//! scout config data.dir ~/research --global
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::Args;
use toml_edit::{DocumentMut, Item, Value};

use crate::config::{Config, SCOUT_DIR};

#[derive(Args, Debug)]
pub struct ConfigArgs {
    /// Config key (e.g., dedup.merge_threshold, data.dir)
    pub key: Option<String>,

    /// Value to set
    pub value: Option<String>,

    /// List all config values
    #[arg(long)]
    pub list: bool,

    /// Edit config file in $EDITOR
    #[arg(short, long)]
    pub edit: bool,

    /// Show config file path
    #[arg(long)]
    pub path: bool,

    /// Use global config (~/.scout/config.toml) instead of local
    #[arg(short, long)]
    pub global: bool,
}

fn local_config_path() -> PathBuf {
    Config::find_local_dir()
        .unwrap_or_else(|| PathBuf::from(SCOUT_DIR))
        .join("config.toml")
}

fn config_path(global: bool) -> Result<PathBuf> {
    if global {
        Config::global_config_path().context("Could not determine home directory")
    } else {
        Ok(local_config_path())
    }
}

pub fn run(args: ConfigArgs) -> Result<()> {
    let config_path = config_path(args.global)?;

    if args.path {
        match Config::global_config_path() {
            Some(global) => println!("Global: {}", global.display()),
            None => println!("Global: (no home directory)"),
        }
        println!("Local:  {}", local_config_path().display());
        println!();
        if config_path.exists() {
            println!("✓ Active: {}", config_path.display());
        } else {
            println!("⚠ No config file found at {}", config_path.display());
        }
        return Ok(());
    }

    if args.edit {
        let editor = std::env::var("EDITOR").unwrap_or_else(|_| "vi".to_string());

        if !config_path.exists() {
            Config::default().save_to(&config_path)?;
            println!("Created {}", config_path.display());
        }

        std::process::Command::new(&editor)
            .arg(&config_path)
            .status()
            .with_context(|| format!("Failed to open editor: {}", editor))?;
        return Ok(());
    }

    if args.list || args.key.is_none() {
        if config_path.exists() {
            let content = fs::read_to_string(&config_path)?;
            println!("📋 Configuration ({}):\n", config_path.display());
            println!("{}", content);
        } else {
            println!("📋 No config file at {}", config_path.display());
            println!();
            println!("Create one with:");
            println!("  scout init");
            println!("  scout config dedup.merge_threshold 92");
        }
        return Ok(());
    }

    if let Some(key) = &args.key {
        if let Some(value) = &args.value {
            set_config_value(&config_path, key, value)?;
            println!("✅ Set {} = {} (in {})", key, value, config_path.display());
        } else {
            match get_config_value(&config_path, key)? {
                Some(v) => println!("{}", v),
                None => println!("(not set)"),
            }
        }
    }

    Ok(())
}

fn split_key(key: &str) -> Result<(&str, &str)> {
    match key.split_once('.') {
        Some((section, name)) if !section.is_empty() && !name.is_empty() && !name.contains('.') => {
            Ok((section, name))
        }
        _ => bail!("Invalid key: {}. Use section.key (e.g. dedup.merge_threshold)", key),
    }
}

/// Set `section.key`, keeping the rest of the file's formatting
fn set_config_value(path: &Path, key: &str, val: &str) -> Result<()> {
    let (section, name) = split_key(key)?;

    let content = if path.exists() {
        fs::read_to_string(path)?
    } else {
        String::new()
    };
    let mut doc: DocumentMut = content.parse().context("Failed to parse config.toml")?;

    if doc.get(section).is_none() {
        doc[section] = toml_edit::table();
    }
    doc[section][name] = Item::Value(parse_toml_value(val));

    let updated = doc.to_string();
    // Unknown sections and ill-typed values are caught here, before the file is touched
    toml::from_str::<Config>(&updated)
        .with_context(|| format!("Invalid value for {}: {}", key, val))?;
    check_known_key(&updated, section, name)?;

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, updated)?;
    Ok(())
}

fn check_known_key(content: &str, section: &str, name: &str) -> Result<()> {
    let config: Config = toml::from_str(content)?;
    let known = toml::Value::try_from(&config)?;
    let defaults = toml::Value::try_from(Config::default())?;
    let present = |v: &toml::Value| v.get(section).and_then(|s| s.get(name)).is_some();
    if present(&known) || present(&defaults) || (section == "data" && name == "dir") {
        Ok(())
    } else {
        bail!("Unknown config key: {}.{}", section, name)
    }
}

fn get_config_value(path: &Path, key: &str) -> Result<Option<String>> {
    let (section, name) = split_key(key)?;
    if !path.exists() {
        return Ok(None);
    }

    let content = fs::read_to_string(path)?;
    let doc: toml::Value = content.parse().context("Failed to parse config.toml")?;

    Ok(doc
        .get(section)
        .and_then(|t| t.get(name))
        .map(|v| match v {
            toml::Value::String(s) => s.clone(),
            other => other.to_string(),
        }))
}

/// Parse string value to appropriate TOML type
fn parse_toml_value(s: &str) -> Value {
    match s {
        "true" => Value::from(true),
        "false" => Value::from(false),
        _ => {
            if let Ok(i) = s.parse::<i64>() {
                Value::from(i)
            } else if let Ok(f) = s.parse::<f64>() {
                Value::from(f)
            } else {
                Value::from(s)
            }
        }
    }
}
