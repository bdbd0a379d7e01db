/// Configuration system for imsdash.
///
/// Layers, lowest to highest precedence:
///
/// 1. **Built-in defaults** from [`schema::ImsConfig::default()`]
/// 2. **User global config**, `~/.imsdash/config.toml`
/// 3. **Project local config**, `.imsdash.toml` in the working directory
/// 4. **Environment variables**, `IMSDASH_*`
///
/// Files are merged at the key level: a file that only sets
/// `dashboard.capacity` leaves every other key at the previous layer's
/// value. A file that is unreadable, is not TOML, holds a value of the
/// wrong type, or fails [`ImsConfig::validate`] is skipped as a whole; the
/// other layers still apply.
pub mod schema;

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

pub use schema::{ImsConfig, MAX_CAPACITY};

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Load the fully resolved configuration.
pub fn load() -> ImsConfig {
    let layers = [global_config_path(), project_config_path()];
    let mut config = load_layers(layers.iter().flatten().map(PathBuf::as_path));
    apply_env_overrides(&mut config);
    config
}

/// Merge the given TOML files over the defaults, in order.
fn load_layers<'a>(paths: impl Iterator<Item = &'a Path>) -> ImsConfig {
    let Ok(mut merged) = toml::Value::try_from(ImsConfig::default()) else {
        return ImsConfig::default();
    };

    for path in paths {
        let Some(layer) = read_toml_value(path) else {
            continue;
        };
        let mut candidate = merged.clone();
        merge_values(&mut candidate, layer);
        if resolve(&candidate).is_some() {
            merged = candidate;
        }
    }

    resolve(&merged).unwrap_or_default()
}

/// Deserialize and validate a merged document.
fn resolve(document: &toml::Value) -> Option<ImsConfig> {
    let config: ImsConfig = document.clone().try_into().ok()?;
    config.validate().ok()?;
    Some(config)
}

fn read_toml_value(path: &Path) -> Option<toml::Value> {
    let content = fs::read_to_string(path).ok()?;
    toml::from_str(&content).ok()
}

/// Overlay `layer` onto `base`, descending into tables so that only keys
/// present in `layer` replace values in `base`.
fn merge_values(base: &mut toml::Value, layer: toml::Value) {
    match (base, layer) {
        (toml::Value::Table(base_table), toml::Value::Table(layer_table)) => {
            for (key, value) in layer_table {
                match base_table.get_mut(&key) {
                    Some(existing) => merge_values(existing, value),
                    None => {
                        base_table.insert(key, value);
                    }
                }
            }
        }
        (slot, value) => *slot = value,
    }
}

// ---------------------------------------------------------------------------
// File paths
// ---------------------------------------------------------------------------

fn global_config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".imsdash").join("config.toml"))
}

fn project_config_path() -> Option<PathBuf> {
    std::env::current_dir()
        .ok()
        .map(|cwd| cwd.join(".imsdash.toml"))
}

/// Path of the user global config file, for display.
pub fn global_config_file() -> Option<PathBuf> {
    global_config_path()
}

/// Path of the project config file, for display.
pub fn project_config_file() -> Option<PathBuf> {
    project_config_path()
}

// ---------------------------------------------------------------------------
// Environment variable overrides
// ---------------------------------------------------------------------------

/// Apply `IMSDASH_*` overrides.
///
/// - `IMSDASH_BASE_URL`: backend base URL
/// - `IMSDASH_TIMEOUT_MS`: request timeout
/// - `IMSDASH_POLL_INTERVAL_MS`: poll period
/// - `IMSDASH_CAPACITY`: points per series
/// - `IMSDASH_EVENT_LOG`: `0`/`false` disables the event log, any other
///   non-boolean value is used as the log path
fn apply_env_overrides(config: &mut ImsConfig) {
    if let Ok(val) = std::env::var("IMSDASH_BASE_URL")
        && !val.is_empty()
    {
        config.server.base_url = val;
    }
    if let Ok(val) = std::env::var("IMSDASH_TIMEOUT_MS")
        && let Ok(ms) = val.parse::<u64>()
    {
        config.server.timeout_ms = ms;
    }
    if let Ok(val) = std::env::var("IMSDASH_POLL_INTERVAL_MS")
        && let Ok(ms) = val.parse::<u64>()
        && ms > 0
    {
        config.dashboard.poll_interval_ms = ms;
    }
    if let Ok(val) = std::env::var("IMSDASH_CAPACITY")
        && let Ok(capacity) = val.parse::<usize>()
        && (1..=MAX_CAPACITY).contains(&capacity)
    {
        config.dashboard.capacity = capacity;
    }
    if let Ok(val) = std::env::var("IMSDASH_EVENT_LOG") {
        match parse_bool(&val) {
            Some(enabled) => config.logging.events_enabled = enabled,
            None if !val.is_empty() => {
                config.logging.events_enabled = true;
                config.logging.events_path = val;
            }
            None => {}
        }
    }
}

/// Parse a boolean-ish string. Returns `None` for anything unrecognised.
fn parse_bool(val: &str) -> Option<bool> {
    match val.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

// ---------------------------------------------------------------------------
// init / set / reset / show
// ---------------------------------------------------------------------------

/// Write the annotated default config to `~/.imsdash/config.toml`.
///
/// Refuses to overwrite an existing file unless `force` is set.
pub fn init_config(force: bool) -> Result<PathBuf> {
    let path = global_config_path().context("could not determine home directory")?;

    if path.exists() && !force {
        anyhow::bail!(
            "config file already exists at {}. Use --force to overwrite.",
            path.display()
        );
    }

    write_config_file(&path, ImsConfig::default_toml())?;
    Ok(path)
}

/// Reset the global config file to the annotated defaults.
pub fn reset_config() -> Result<PathBuf> {
    init_config(true)
}

/// Set one dotted key (e.g. `dashboard.capacity`) in the global config.
///
/// The key must exist in the schema. The new value is parsed with the type
/// of the value it replaces, and the result must still deserialize into
/// [`ImsConfig`] before anything is written.
pub fn set_config_value(key: &str, raw: &str) -> Result<PathBuf> {
    let path = global_config_path().context("could not determine home directory")?;

    let mut document = match fs::read_to_string(&path) {
        Ok(content) => toml::from_str(&content)
            .with_context(|| format!("failed to parse {}", path.display()))?,
        Err(_) => toml::Value::try_from(ImsConfig::default())
            .context("failed to serialize default config")?,
    };

    let template =
        toml::Value::try_from(ImsConfig::default()).context("failed to serialize default config")?;
    let expected = lookup(&template, key).with_context(|| format!("unknown config key '{key}'"))?;
    let value = coerce_value(expected, key, raw)?;
    assign(&mut document, key, value)?;

    let updated: ImsConfig = document
        .clone()
        .try_into()
        .with_context(|| format!("'{raw}' is not a valid value for '{key}'"))?;
    updated.validate()?;

    let rendered = toml::to_string_pretty(&document).context("failed to serialize config")?;
    write_config_file(&path, &rendered)?;
    Ok(path)
}

/// Render the effective configuration as TOML.
pub fn show_effective_config() -> Result<String> {
    toml::to_string_pretty(&load()).context("failed to serialize effective config")
}

fn write_config_file(path: &Path, contents: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    fs::write(path, contents).with_context(|| format!("failed to write {}", path.display()))
}

fn lookup<'a>(root: &'a toml::Value, key: &str) -> Option<&'a toml::Value> {
    key.split('.').try_fold(root, |node, part| node.get(part))
}

/// Store `value` at the dotted `key`, creating intermediate tables.
fn assign(root: &mut toml::Value, key: &str, value: toml::Value) -> Result<()> {
    let (sections, leaf) = match key.rsplit_once('.') {
        Some((sections, leaf)) => (Some(sections), leaf),
        None => (None, key),
    };

    let mut node = root;
    for part in sections.into_iter().flat_map(|s| s.split('.')) {
        let table = node
            .as_table_mut()
            .with_context(|| format!("'{part}' in '{key}' is not a section"))?;
        node = table
            .entry(part.to_string())
            .or_insert_with(|| toml::Value::Table(toml::map::Map::new()));
    }

    node.as_table_mut()
        .with_context(|| format!("cannot set '{key}': parent is not a section"))?
        .insert(leaf.to_string(), value);
    Ok(())
}

fn coerce_value(expected: &toml::Value, key: &str, raw: &str) -> Result<toml::Value> {
    Ok(match expected {
        toml::Value::Boolean(_) => toml::Value::Boolean(
            parse_bool(raw).with_context(|| format!("expected boolean for '{key}', got '{raw}'"))?,
        ),
        toml::Value::Integer(_) => toml::Value::Integer(
            raw.trim()
                .parse()
                .with_context(|| format!("expected integer for '{key}', got '{raw}'"))?,
        ),
        toml::Value::Float(_) => toml::Value::Float(
            raw.trim()
                .parse()
                .with_context(|| format!("expected number for '{key}', got '{raw}'"))?,
        ),
        toml::Value::Table(_) => anyhow::bail!("'{key}' is a section, not a value"),
        _ => toml::Value::String(raw.to_string()),
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
