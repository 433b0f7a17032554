//! Output formats and rendered payloads.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::error::Error;

/// Output rendering selected by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FormatKind {
    Markdown,
    Json,
    Terminal,
}

impl FormatKind {
    /// All supported formats.
    pub const ALL: [FormatKind; 3] = [Self::Markdown, Self::Json, Self::Terminal];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Markdown => "markdown",
            Self::Json => "json",
            Self::Terminal => "terminal",
        }
    }
}

impl FromStr for FormatKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "markdown" => Ok(Self::Markdown),
            "json" => Ok(Self::Json),
            "terminal" => Ok(Self::Terminal),
            _ => Err(Error::UnsupportedFormat(s.to_string())),
        }
    }
}

impl std::fmt::Display for FormatKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Final payload produced by the presenter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderedOutput {
    /// Format the payload is encoded in
    pub format: FormatKind,
    /// Rendered text
    pub payload: String,
}

impl RenderedOutput {
    pub fn new(format: FormatKind, payload: impl Into<String>) -> Self {
        Self {
            format,
            payload: payload.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_kind_parsing() {
        assert_eq!("markdown".parse::<FormatKind>().unwrap(), FormatKind::Markdown);
        assert_eq!("JSON".parse::<FormatKind>().unwrap(), FormatKind::Json);
        assert_eq!(" terminal ".parse::<FormatKind>().unwrap(), FormatKind::Terminal);
    }

    #[test]
    fn test_unknown_format_is_rejected() {
        let err = "html".parse::<FormatKind>().unwrap_err();
        assert!(matches!(err, Error::UnsupportedFormat(ref f) if f == "html"));

        assert!("".parse::<FormatKind>().is_err());
    }

    #[test]
    fn test_format_kind_display_matches_parse() {
        for format in FormatKind::ALL {
            assert_eq!(format.to_string().parse::<FormatKind>().unwrap(), format);
        }
    }

    #[test]
    fn test_rendered_output_serialization() {
        let output = RenderedOutput::new(FormatKind::Terminal, "No results.\n");
        let json = serde_json::to_string(&output).unwrap();
        assert!(json.contains("\"format\":\"terminal\""));

        let parsed: RenderedOutput = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, output);
    }
}
