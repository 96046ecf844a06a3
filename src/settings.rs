//! Delimiter configuration and its loading from JSON/YAML files

use crate::constants::{
    DEFAULT_ESCAPE, DEFAULT_EVALUATE, DEFAULT_INTERPOLATE, SETTINGS_EXTENSIONS,
};
use crate::error::{Error, Result};
use regex::Regex;
use serde::{Deserialize, Deserializer};
use std::path::Path;

/// A delimiter pattern. Capture group 1 is the directive's inner text.
#[derive(Debug, Clone)]
pub struct Delimiter {
    regex: Regex,
}

impl Delimiter {
    /// Compiles `pattern` for the delimiter kind `name`.
    ///
    /// # Errors
    /// * `Error::InvalidDelimiter` if the pattern does not compile or has no
    ///   capture group
    pub fn new(name: &str, pattern: &str) -> Result<Self> {
        let invalid = |reason: String| Error::InvalidDelimiter {
            name: name.to_string(),
            pattern: pattern.to_string(),
            reason,
        };
        let regex = Regex::new(pattern).map_err(|e| invalid(e.to_string()))?;
        if regex.captures_len() < 2 {
            return Err(invalid("pattern has no capture group".to_string()));
        }
        Ok(Self { regex })
    }

    fn builtin(pattern: &'static str) -> Self {
        Self { regex: Regex::new(pattern).expect("default delimiter patterns are valid") }
    }

    pub fn regex(&self) -> &Regex {
        &self.regex
    }

    pub fn as_str(&self) -> &str {
        self.regex.as_str()
    }
}

impl PartialEq for Delimiter {
    fn eq(&self, other: &Self) -> bool {
        self.as_str() == other.as_str()
    }
}

/// Settings for a single compile call.
///
/// An omitted pattern falls back to its default; a pattern set to `None`
/// (`null` in a settings file) disables that delimiter kind.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TemplateSettings {
    /// HTML-escaped interpolation, `<%- expr %>` by default
    #[serde(default = "get_default_escape", deserialize_with = "deserialize_escape")]
    pub escape: Option<Delimiter>,
    /// Raw interpolation, `<%= expr %>` by default
    #[serde(default = "get_default_interpolate", deserialize_with = "deserialize_interpolate")]
    pub interpolate: Option<Delimiter>,
    /// Embedded statements, `<% stmt %>` by default
    #[serde(default = "get_default_evaluate", deserialize_with = "deserialize_evaluate")]
    pub evaluate: Option<Delimiter>,
    /// Name of the data parameter. Without it, data properties are bound
    /// as local variables.
    #[serde(default)]
    pub variable: Option<String>,
}

impl Default for TemplateSettings {
    fn default() -> Self {
        Self {
            escape: get_default_escape(),
            interpolate: get_default_interpolate(),
            evaluate: get_default_evaluate(),
            variable: None,
        }
    }
}

impl TemplateSettings {
    /// Loads settings from a `.json`, `.yaml` or `.yml` file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let extension = path.extension().and_then(|ext| ext.to_str()).unwrap_or_default();
        if !SETTINGS_EXTENSIONS.contains(&extension) {
            return Err(Error::UnsupportedSettingsFormat {
                path: path.display().to_string(),
                extensions: SETTINGS_EXTENSIONS.join(", "),
            });
        }

        let content = std::fs::read_to_string(path)?;
        let settings = match extension {
            "json" => serde_json::from_str(&content)?,
            _ => serde_yaml::from_str(&content)?,
        };
        log::debug!("Loaded template settings from '{}'", path.display());
        Ok(settings)
    }

    pub fn with_variable(mut self, variable: impl Into<String>) -> Self {
        self.variable = Some(variable.into());
        self
    }

    pub fn with_escape(mut self, pattern: Option<&str>) -> Result<Self> {
        self.escape = pattern.map(|p| Delimiter::new("escape", p)).transpose()?;
        Ok(self)
    }

    pub fn with_interpolate(mut self, pattern: Option<&str>) -> Result<Self> {
        self.interpolate = pattern.map(|p| Delimiter::new("interpolate", p)).transpose()?;
        Ok(self)
    }

    pub fn with_evaluate(mut self, pattern: Option<&str>) -> Result<Self> {
        self.evaluate = pattern.map(|p| Delimiter::new("evaluate", p)).transpose()?;
        Ok(self)
    }
}

fn get_default_escape() -> Option<Delimiter> {
    Some(Delimiter::builtin(DEFAULT_ESCAPE))
}

fn get_default_interpolate() -> Option<Delimiter> {
    Some(Delimiter::builtin(DEFAULT_INTERPOLATE))
}

fn get_default_evaluate() -> Option<Delimiter> {
    Some(Delimiter::builtin(DEFAULT_EVALUATE))
}

fn deserialize_delimiter<'de, D>(name: &str, deserializer: D) -> Result<Option<Delimiter>, D::Error>
where
    D: Deserializer<'de>,
{
    let pattern: Option<String> = Option::deserialize(deserializer)?;
    pattern
        .map(|p| Delimiter::new(name, &p))
        .transpose()
        .map_err(serde::de::Error::custom)
}

fn deserialize_escape<'de, D: Deserializer<'de>>(d: D) -> Result<Option<Delimiter>, D::Error> {
    deserialize_delimiter("escape", d)
}

fn deserialize_interpolate<'de, D: Deserializer<'de>>(d: D) -> Result<Option<Delimiter>, D::Error> {
    deserialize_delimiter("interpolate", d)
}

fn deserialize_evaluate<'de, D: Deserializer<'de>>(d: D) -> Result<Option<Delimiter>, D::Error> {
    deserialize_delimiter("evaluate", d)
}
