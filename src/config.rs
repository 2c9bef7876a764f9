//! Configuration loading and management

use std::fmt;

use anyhow::{bail, Context, Result};
use chordhook::{DebugLevel, Kind};

/// Queue capacity when `CHORDHOOK_BUFFER` is unset
const DEFAULT_BUFFER: usize = 1024;

/// One chord to register at startup, e.g. `key_down:ctrl+shift+q`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Binding {
    pub kind: Kind,
    pub keys: Vec<String>,
}

impl Binding {
    fn parse(entry: &str) -> Result<Self> {
        let (kind, keys) = entry
            .split_once(':')
            .with_context(|| format!("binding '{entry}' is missing a ':'"))?;
        let kind: Kind = kind
            .trim()
            .parse()
            .map_err(anyhow::Error::msg)
            .with_context(|| format!("invalid binding '{entry}'"))?;
        let keys: Vec<String> = keys
            .split('+')
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .map(str::to_string)
            .collect();
        if keys.is_empty() {
            bail!("binding '{entry}' names no keys");
        }
        Ok(Self { kind, keys })
    }
}

impl fmt::Display for Binding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.kind, self.keys.join("+"))
    }
}

/// Daemon configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Capacity of the raw event queue
    pub buffer_capacity: usize,

    /// Engine debug level
    pub debug_level: DebugLevel,

    /// Chords registered at startup
    pub bindings: Vec<Binding>,
}

impl Config {
    /// Load configuration from environment and defaults
    pub fn load() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through `lookup` instead of the process environment
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let buffer_capacity = match lookup("CHORDHOOK_BUFFER") {
            Some(value) => value
                .trim()
                .parse::<usize>()
                .with_context(|| format!("invalid CHORDHOOK_BUFFER '{value}'"))?,
            None => DEFAULT_BUFFER,
        };
        if buffer_capacity == 0 {
            bail!("CHORDHOOK_BUFFER must be at least 1");
        }

        let debug_level = match lookup("CHORDHOOK_DEBUG") {
            Some(value) => value
                .trim()
                .parse::<DebugLevel>()
                .map_err(anyhow::Error::msg)
                .context("invalid CHORDHOOK_DEBUG")?,
            None => DebugLevel::default(),
        };

        let bindings = lookup("CHORDHOOK_BINDINGS")
            .unwrap_or_default()
            .split(';')
            .map(str::trim)
            .filter(|entry| !entry.is_empty())
            .map(Binding::parse)
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            buffer_capacity,
            debug_level,
            bindings,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn load(vars: &[(&str, &str)]) -> Result<Config> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_config_defaults() {
        let config = load(&[]).unwrap();
        assert_eq!(config.buffer_capacity, 1024);
        assert_eq!(config.debug_level, DebugLevel::Silent);
        assert!(config.bindings.is_empty());
    }

    #[test]
    fn test_config_bindings() {
        let config = load(&[
            ("CHORDHOOK_BINDINGS", "key_down:ctrl+shift+q; mouse_up:left ;"),
            ("CHORDHOOK_DEBUG", "verbose"),
            ("CHORDHOOK_BUFFER", "64"),
        ])
        .unwrap();

        assert_eq!(config.buffer_capacity, 64);
        assert_eq!(config.debug_level, DebugLevel::Verbose);
        assert_eq!(
            config.bindings,
            vec![
                Binding {
                    kind: Kind::KeyDown,
                    keys: vec!["ctrl".into(), "shift".into(), "q".into()],
                },
                Binding {
                    kind: Kind::MouseUp,
                    keys: vec!["left".into()],
                },
            ]
        );
        assert_eq!(config.bindings[0].to_string(), "KeyDown:ctrl+shift+q");
    }

    #[test]
    fn test_config_rejects_bad_values() {
        assert!(load(&[("CHORDHOOK_BUFFER", "lots")]).is_err());
        assert!(load(&[("CHORDHOOK_BUFFER", "0")]).is_err());
        assert!(load(&[("CHORDHOOK_DEBUG", "chatty")]).is_err());
        assert!(load(&[("CHORDHOOK_BINDINGS", "key_down")]).is_err());
        assert!(load(&[("CHORDHOOK_BINDINGS", "key_press:a")]).is_err());
        assert!(load(&[("CHORDHOOK_BINDINGS", "key_down: + ")]).is_err());
    }
}
