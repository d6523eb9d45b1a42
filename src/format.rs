//! Output format for reports printed to stdout.

use std::fmt;
use std::str::FromStr;

use anyhow::{Context, Result, bail};
use serde::Serialize;

/// How `patchline plan` prints its report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// Aligned table for people
    #[default]
    Text,
    /// Pretty-printed JSON for scripts
    Json,
}

impl FromStr for OutputFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "text" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            other => bail!("unknown format '{other}'; expected 'text' or 'json'"),
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Text => "text",
            Self::Json => "json",
        })
    }
}

impl OutputFormat {
    /// Render `data`: JSON through serde, text through `text`.
    ///
    /// # Errors
    /// Fails only if `data` cannot be serialized to JSON.
    pub fn render<T, F>(self, data: &T, text: F) -> Result<String>
    where
        T: Serialize,
        F: FnOnce(&T) -> String,
    {
        match self {
            Self::Json => serde_json::to_string_pretty(data).context("JSON serialization failed"),
            Self::Text => Ok(text(data)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_ignores_case_and_padding() {
        assert_eq!("JSON".parse::<OutputFormat>().unwrap(), OutputFormat::Json);
        assert_eq!(" text ".parse::<OutputFormat>().unwrap(), OutputFormat::Text);
        let err = "yaml".parse::<OutputFormat>().unwrap_err();
        assert!(err.to_string().contains("'yaml'"));
    }

    #[test]
    fn display_round_trips_through_parse() {
        for format in [OutputFormat::Text, OutputFormat::Json] {
            assert_eq!(format.to_string().parse::<OutputFormat>().unwrap(), format);
        }
    }

    #[test]
    fn render_picks_json_or_text_view() {
        let value = serde_json::json!({ "selected": 2 });
        let json = OutputFormat::Json.render(&value, |_| unreachable!()).unwrap();
        assert!(json.contains("\"selected\": 2"));

        let text = OutputFormat::Text
            .render(&value, |v| format!("selected: {}", v["selected"]))
            .unwrap();
        assert_eq!(text, "selected: 2");
    }
}
