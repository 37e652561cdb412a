//! Minifier configuration loaded from a file.
//!
//! Only the serializable knobs live here; predicates, strategies and other
//! callbacks are set on [`Options`](crate::Options) in code.
//!
//! ```toml
//! collapse_whitespace = true
//! remove_comments = false
//! minify_css = true
//! ```

use facet::Facet;

use crate::options::{CssMinify, CssOptions, HtmlOptions, MinifyOptions};
use crate::{Error, Result};

/// Minifier settings, every field optional.
#[derive(Debug, Clone, Default, Facet)]
#[facet(rename_all = "snake_case")]
pub struct MinifyConfig {
    /// Also remove line breaks inside `<svg>` (default: true)
    #[facet(default)]
    pub collapse_whitespace: Option<bool>,

    /// Drop HTML comments (default: true)
    #[facet(default)]
    pub remove_comments: Option<bool>,

    /// Keep optional closing tags (default: true)
    #[facet(default)]
    pub keep_closing_tags: Option<bool>,

    /// Keep spaces between attributes (default: true)
    #[facet(default)]
    pub keep_spaces_between_attributes: Option<bool>,

    /// Minify inline `<script>` (default: false)
    #[facet(default)]
    pub minify_js: Option<bool>,

    /// Minify stylesheets, in `css` templates and `<style>` (default: true)
    #[facet(default)]
    pub minify_css: Option<bool>,

    /// Restore spacing inside pseudo-class arguments (default: true)
    #[facet(default)]
    pub restore_pseudo_class_spacing: Option<bool>,
}

impl MinifyConfig {
    /// Parse a TOML document.
    pub fn from_toml(source: &str) -> Result<Self> {
        facet_toml::from_str::<MinifyConfig>(source).map_err(|e| Error::Config(format!("{e:?}")))
    }

    /// Fill in defaults for every unset field.
    pub fn into_options(self) -> MinifyOptions {
        let defaults = HtmlOptions::default();
        let html = HtmlOptions {
            collapse_whitespace: self
                .collapse_whitespace
                .unwrap_or(defaults.collapse_whitespace),
            remove_comments: self.remove_comments.unwrap_or(defaults.remove_comments),
            keep_closing_tags: self.keep_closing_tags.unwrap_or(defaults.keep_closing_tags),
            keep_spaces_between_attributes: self
                .keep_spaces_between_attributes
                .unwrap_or(defaults.keep_spaces_between_attributes),
            minify_js: self.minify_js.unwrap_or(defaults.minify_js),
        };

        let css = if self.minify_css.unwrap_or(true) {
            CssMinify::Default(CssOptions {
                restore_pseudo_class_spacing: self.restore_pseudo_class_spacing.unwrap_or(true),
            })
        } else {
            CssMinify::Disabled
        };

        MinifyOptions { html, css }
    }
}

impl From<MinifyConfig> for MinifyOptions {
    fn from(config: MinifyConfig) -> Self {
        config.into_options()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_config_gives_defaults() {
        let options = MinifyConfig::default().into_options();
        assert_eq!(options.html, HtmlOptions::default());
        assert!(matches!(options.css, CssMinify::Default(ref o) if o.restore_pseudo_class_spacing));
    }

    #[test]
    fn test_from_toml() {
        let config = MinifyConfig::from_toml(
            "remove_comments = false\nminify_css = false\nminify_js = true\n",
        )
        .unwrap();
        assert_eq!(config.remove_comments, Some(false));
        assert_eq!(config.collapse_whitespace, None);

        let options: MinifyOptions = config.into();
        assert!(!options.html.remove_comments);
        assert!(options.html.minify_js);
        assert!(options.html.collapse_whitespace);
        assert!(matches!(options.css, CssMinify::Disabled));
    }

    #[test]
    fn test_from_toml_rejects_wrong_type() {
        let err = MinifyConfig::from_toml("minify_css = \"yes\"\n").unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }
}
