//! `[output]` section configuration.
//!
//! # Example
//!
//! ```toml
//! [output]
//! format = "png"            # png | jpeg | webp
//! url_prefix = "/sprites"   # prefix of generated image URLs
//! ```
//!
//! `jpeg` has no alpha channel: transparent areas of the sheet are lost.

use serde::{Deserialize, Serialize};

use crate::config::{ConfigDiagnostics, FieldPath};
use crate::image::OutputFormat;

/// Sheet encoding and addressing.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Encoded image format.
    pub format: OutputFormat,

    /// Prefix joined with the image key to form its URL.
    pub url_prefix: String,
}

impl OutputConfig {
    pub const FORMAT: FieldPath = FieldPath::new("output.format");
    pub const URL_PREFIX: FieldPath = FieldPath::new("output.url_prefix");

    pub fn validate(&self, diag: &mut ConfigDiagnostics) {
        if self.url_prefix.is_empty() {
            diag.error_with_hint(
                Self::URL_PREFIX,
                "must not be empty",
                "use \"/\" to serve images from the site root",
            );
        } else if self.url_prefix.len() > 1 && self.url_prefix.ends_with('/') {
            diag.error_with_hint(
                Self::URL_PREFIX,
                format!("must not end with `/`: {:?}", self.url_prefix),
                format!("use {:?}", self.url_prefix.trim_end_matches('/')),
            );
        } else if self.url_prefix.chars().any(char::is_whitespace) {
            diag.error(Self::URL_PREFIX, "must not contain whitespace");
        }

        if !self.format.supports_alpha() {
            diag.hint(Self::FORMAT, "jpeg drops transparency, consider png or webp");
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            format: OutputFormat::Png,
            url_prefix: "/sprites".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::config::{ConfigDiagnostics, test_parse_config};
    use crate::image::OutputFormat;

    #[test]
    fn test_output_config() {
        let config =
            test_parse_config("[output]\nformat = \"jpeg\"\nurl_prefix = \"https://cdn.example.com/s\"");
        assert_eq!(config.output.format, OutputFormat::Jpeg);
        assert_eq!(config.output.url_prefix, "https://cdn.example.com/s");
    }

    #[test]
    fn test_output_config_defaults() {
        let config = test_parse_config("");
        assert_eq!(config.output.format, OutputFormat::Png);
        assert_eq!(config.output.url_prefix, "/sprites");
    }

    #[test]
    fn test_output_config_rejects_unknown_format() {
        let result = toml::from_str::<crate::config::SpriteConfig>("[output]\nformat = \"gif\"");
        assert!(result.is_err());
    }

    #[test]
    fn test_output_config_validate_prefix() {
        let mut config = test_parse_config("[output]\nurl_prefix = \"\"");
        let mut diag = ConfigDiagnostics::new();
        config.output.validate(&mut diag);
        assert_eq!(diag.len(), 1);

        config.output.url_prefix = "/my sprites".into();
        let mut diag = ConfigDiagnostics::new();
        config.output.validate(&mut diag);
        assert_eq!(diag.len(), 1);
    }

    #[test]
    fn test_output_config_validate_trailing_slash() {
        let mut config = test_parse_config("[output]\nurl_prefix = \"/sprites/\"");
        let mut diag = ConfigDiagnostics::new();
        config.output.validate(&mut diag);
        assert_eq!(diag.len(), 1);
        assert_eq!(diag.errors()[0].hint.as_deref(), Some("use \"/sprites\""));

        // The site root itself is fine
        config.output.url_prefix = "/".into();
        let mut diag = ConfigDiagnostics::new();
        config.output.validate(&mut diag);
        assert!(diag.is_empty());

        config.output.url_prefix = "https://cdn.example.com/s".into();
        let mut diag = ConfigDiagnostics::new();
        config.output.validate(&mut diag);
        assert!(diag.is_empty());
    }
}
