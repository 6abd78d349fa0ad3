use crate::error::Error;
use crate::volume::MatchRule;
use config::builder::DefaultState;
use config::{
    Config, ConfigBuilder, ConfigError, Environment, File as ConfigFile, Map, Source, Value,
    ValueKind,
};
use serde::{Deserialize, Serialize};
use std::env;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

pub const DEFAULT_NAMESPACE: &str = "openshift-mtv";
pub const DEFAULT_INTERVAL_SECS: u64 = 40;
pub const DEFAULT_EVENT_LIMIT: usize = 50;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Style {
    #[default]
    Pretty,
    Table,
}

impl FromStr for Style {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pretty" => Ok(Style::Pretty),
            "table" => Ok(Style::Table),
            other => Err(format!("unknown style '{}' (expected pretty or table)", other)),
        }
    }
}

impl fmt::Display for Style {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Style::Pretty => f.write_str("pretty"),
            Style::Table => f.write_str("table"),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct WatchConfig {
    /// Namespace holding plans, migrations and events.
    pub namespace: String,
    pub interval_secs: u64,
    pub style: Style,
    pub errors_only: bool,
    pub show_events: bool,
    pub show_completed: bool,
    /// Plan allow-list; empty shows every plan.
    pub plans: Vec<String>,
    pub event_limit: usize,
    /// Enabled volume association rules, in priority order.
    pub match_rules: Vec<MatchRule>,
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            namespace: DEFAULT_NAMESPACE.to_string(),
            interval_secs: DEFAULT_INTERVAL_SECS,
            style: Style::default(),
            errors_only: false,
            show_events: false,
            show_completed: false,
            plans: Vec::new(),
            event_limit: DEFAULT_EVENT_LIMIT,
            match_rules: MatchRule::ALL.to_vec(),
        }
    }
}

impl WatchConfig {
    pub fn validate(&self) -> Result<(), Error> {
        if self.interval_secs == 0 {
            return Err(Error::InvalidConfig(
                "interval_secs must be at least 1".to_string(),
            ));
        }
        if self.match_rules.is_empty() {
            return Err(Error::InvalidConfig(
                "match_rules must enable at least one rule".to_string(),
            ));
        }
        Ok(())
    }
}

fn with_defaults(
    builder: ConfigBuilder<DefaultState>,
) -> Result<ConfigBuilder<DefaultState>, config::ConfigError> {
    let rules: Vec<String> = MatchRule::ALL.iter().map(ToString::to_string).collect();
    builder
        .set_default("namespace", DEFAULT_NAMESPACE)?
        .set_default("interval_secs", DEFAULT_INTERVAL_SECS as i64)?
        .set_default("style", Style::default().to_string())?
        .set_default("errors_only", false)?
        .set_default("show_events", false)?
        .set_default("show_completed", false)?
        .set_default("plans", Vec::<String>::new())?
        .set_default("event_limit", DEFAULT_EVENT_LIMIT as i64)?
        .set_default("match_rules", rules)
}

/// Unprefixed variable names still accepted, and the keys they set.
const LEGACY_VARIABLES: [(&str, &str); 5] = [
    ("NS", "namespace"),
    ("INTERVAL", "interval_secs"),
    ("STYLE", "style"),
    ("SHOW_ERRORS_ONLY", "errors_only"),
    ("SHOW_EVENTS", "show_events"),
];

/// `NS`, `INTERVAL`, `STYLE`, `SHOW_ERRORS_ONLY` and `SHOW_EVENTS`. The two
/// switches are on only for the value `1`. Empty variables are ignored.
#[derive(Debug, Clone, Default)]
struct LegacyEnvironment {
    /// Read from here instead of the process environment when set.
    vars: Option<Map<String, String>>,
}

impl LegacyEnvironment {
    fn lookup(&self, variable: &str) -> Option<String> {
        match &self.vars {
            Some(vars) => vars.get(variable).cloned(),
            None => env::var(variable).ok(),
        }
    }
}

impl Source for LegacyEnvironment {
    fn clone_into_box(&self) -> Box<dyn Source + Send + Sync> {
        Box::new(self.clone())
    }

    fn collect(&self) -> Result<Map<String, Value>, ConfigError> {
        let origin = "legacy environment".to_string();
        let mut map = Map::new();
        for (variable, key) in LEGACY_VARIABLES {
            let Some(raw) = self.lookup(variable).filter(|raw| !raw.is_empty()) else {
                continue;
            };
            let kind = match key {
                "errors_only" | "show_events" => ValueKind::Boolean(raw == "1"),
                _ => ValueKind::String(raw),
            };
            map.insert(key.to_string(), Value::new(Some(&origin), kind));
        }
        Ok(map)
    }
}

/// Load defaults, then `Migwatch.toml` (or the explicit `path`, which must
/// exist), then the legacy unprefixed variables, then `MIGWATCH_*`.
pub fn load_configuration_from(path: Option<&Path>) -> Result<WatchConfig, Error> {
    load_with_legacy(path, LegacyEnvironment::default())
}

fn load_with_legacy(path: Option<&Path>, legacy: LegacyEnvironment) -> Result<WatchConfig, Error> {
    let file = match path {
        Some(path) => ConfigFile::from(path).required(true),
        None => ConfigFile::with_name("Migwatch").required(false),
    };

    let builder = with_defaults(Config::builder())?
        .add_source(file)
        .add_source(legacy)
        .add_source(
            Environment::with_prefix("MIGWATCH")
                .try_parsing(true)
                .list_separator(",")
                .with_list_parse_key("plans")
                .with_list_parse_key("match_rules"),
        )
        .build()?;

    let config = builder.try_deserialize::<WatchConfig>()?;
    config.validate()?;
    Ok(config)
}
