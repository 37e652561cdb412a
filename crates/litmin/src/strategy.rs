//! The pluggable minification strategy.
//!
//! A [`Strategy`] owns the four steps of the placeholder round trip. The
//! placeholder, combine and split steps have default implementations; only
//! the two minifier calls are required.

use std::future::Future;
use std::pin::Pin;

use litmin_literals::Part;

use crate::Result;
use crate::css::{
    LightningOutput, StandIns, restore_pseudo_class_spacing, run_lightningcss, slots_intact,
};
use crate::html::{
    TagNameGuard, expression_in_comment, minify_markup, minify_style_elements,
    strip_svg_line_breaks,
};
use crate::options::{CssMinify, CssOptions, MinifyOptions};
use crate::placeholder::{Language, Placeholder, generate_placeholder};

/// Why a markup template was returned untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// A placeholder token appeared inside `<!-- ... -->`
    ExpressionInComment,
}

/// Result of minifying a markup document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HtmlOutcome {
    Minified(String),
    /// The input, unchanged
    Skipped { html: String, reason: SkipReason },
}

/// Result of minifying a stylesheet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CssOutcome {
    Minified(String),
    /// The minifier recovered from errors or rewrote a placeholder. `css` is
    /// the input with line breaks removed.
    Fallback { css: String, warnings: Vec<String> },
}

/// How templates are turned into a document, minified, and cut back apart.
///
/// # Example
///
/// ```rust,ignore
/// struct Passthrough;
///
/// impl Strategy for Passthrough {
///     fn minify_html<'a>(
///         &'a self,
///         html: &'a str,
///         _placeholder: &'a Placeholder,
///         _options: &'a MinifyOptions,
///     ) -> Pin<Box<dyn Future<Output = Result<HtmlOutcome>> + Send + 'a>> {
///         Box::pin(async move { Ok(HtmlOutcome::Minified(html.to_string())) })
///     }
///
///     fn minify_css<'a>(
///         &'a self,
///         css: &'a str,
///         _placeholder: &'a Placeholder,
///         _options: &'a CssOptions,
///     ) -> Pin<Box<dyn Future<Output = Result<CssOutcome>> + Send + 'a>> {
///         Box::pin(async move { Ok(CssOutcome::Minified(css.to_string())) })
///     }
/// }
/// ```
pub trait Strategy: Send + Sync {
    /// Pick token(s) that do not occur in `parts`.
    fn placeholder(&self, parts: &[Part], language: Language) -> Placeholder {
        generate_placeholder(parts, language)
    }

    /// Join the parts with the placeholder token(s).
    fn combine(&self, parts: &[Part], placeholder: &Placeholder) -> String {
        crate::split::combine(parts, placeholder)
    }

    /// Minify a combined markup document.
    fn minify_html<'a>(
        &'a self,
        html: &'a str,
        placeholder: &'a Placeholder,
        options: &'a MinifyOptions,
    ) -> Pin<Box<dyn Future<Output = Result<HtmlOutcome>> + Send + 'a>>;

    /// Minify a combined stylesheet.
    fn minify_css<'a>(
        &'a self,
        css: &'a str,
        placeholder: &'a Placeholder,
        options: &'a CssOptions,
    ) -> Pin<Box<dyn Future<Output = Result<CssOutcome>> + Send + 'a>>;

    /// Cut a minified document back into parts.
    fn split(&self, minified: &str, placeholder: &Placeholder) -> Result<Vec<String>> {
        crate::split::split(minified, placeholder)
    }
}

/// minify-html for markup, lightningcss for stylesheets.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultStrategy;

impl Strategy for DefaultStrategy {
    fn minify_html<'a>(
        &'a self,
        html: &'a str,
        placeholder: &'a Placeholder,
        options: &'a MinifyOptions,
    ) -> Pin<Box<dyn Future<Output = Result<HtmlOutcome>> + Send + 'a>> {
        Box::pin(async move {
            if expression_in_comment(html, placeholder) {
                return Ok(HtmlOutcome::Skipped {
                    html: html.to_string(),
                    reason: SkipReason::ExpressionInComment,
                });
            }

            let guard = TagNameGuard::new(html, placeholder);
            let input = match &guard {
                Some(guard) => guard.hide(html),
                None => html.to_string(),
            };

            let minify_css = matches!(options.css, CssMinify::Default(_));
            let mut result = minify_markup(&input, &options.html, minify_css)?;

            if let CssMinify::Custom(minify) = &options.css {
                result = minify_style_elements(&result, minify);
            }
            if let Some(guard) = &guard {
                result = guard.restore(&result);
            }
            if options.html.collapse_whitespace {
                result = strip_svg_line_breaks(&result);
            }
            if let CssMinify::Default(css) = &options.css
                && css.restore_pseudo_class_spacing
            {
                result = restore_pseudo_class_spacing(html, &result);
            }

            Ok(HtmlOutcome::Minified(result))
        })
    }

    fn minify_css<'a>(
        &'a self,
        css: &'a str,
        placeholder: &'a Placeholder,
        options: &'a CssOptions,
    ) -> Pin<Box<dyn Future<Output = Result<CssOutcome>> + Send + 'a>> {
        Box::pin(async move {
            let (input, stand_ins) = StandIns::hide(css, placeholder);

            let minified = match run_lightningcss(&input)? {
                LightningOutput::Warned(warnings) => return Ok(css_fallback(css, warnings)),
                LightningOutput::Minified(minified) => minified,
            };

            let Some(mut result) = stand_ins.restore(&minified) else {
                return Ok(css_fallback(
                    css,
                    vec![format!("minifier rewrote a placeholder stand-in: {minified}")],
                ));
            };
            if !slots_intact(css, &result, placeholder) {
                return Ok(css_fallback(
                    css,
                    vec![format!("minifier rewrote a placeholder token: {result}")],
                ));
            }

            if options.restore_pseudo_class_spacing {
                result = restore_pseudo_class_spacing(css, &result);
            }
            Ok(CssOutcome::Minified(result))
        })
    }
}

/// The stylesheet with line breaks removed, and why it was not minified.
fn css_fallback(css: &str, warnings: Vec<String>) -> CssOutcome {
    CssOutcome::Fallback {
        css: css.replace(['\r', '\n'], ""),
        warnings,
    }
}
