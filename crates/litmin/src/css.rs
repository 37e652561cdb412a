//! CSS side of the minifier adapter, via lightningcss.

use std::sync::{Arc, LazyLock, RwLock};

use lightningcss::stylesheet::{MinifyOptions, ParserOptions, PrinterOptions, StyleSheet};
use regex::Regex;

use crate::placeholder::{Placeholder, call_token_name};
use crate::split::split;
use crate::{Error, Result};

/// `:pseudo(args)` followed by the opening brace of a rule
static PSEUDO_CLASS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(::?.+\((.*)\))\s*\{").unwrap());

/// What lightningcss made of a stylesheet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum LightningOutput {
    Minified(String),
    /// Parsed with recovery, output discarded
    Warned(Vec<String>),
}

/// Parse, minify and print a stylesheet.
///
/// Errors that stop parsing are returned as [`Error::CssMinify`]. Recovered
/// errors become [`LightningOutput::Warned`].
pub(crate) fn run_lightningcss(css: &str) -> Result<LightningOutput> {
    let warnings = Arc::new(RwLock::new(Vec::new()));
    let parser_options = ParserOptions {
        error_recovery: true,
        warnings: Some(warnings.clone()),
        ..ParserOptions::default()
    };

    let mut stylesheet = StyleSheet::parse(css, parser_options)
        .map_err(|e| Error::CssMinify(format!("failed to parse CSS: {e}")))?;

    let messages: Vec<String> = warnings
        .read()
        .map(|w| w.iter().map(ToString::to_string).collect())
        .unwrap_or_default();
    if !messages.is_empty() {
        return Ok(LightningOutput::Warned(messages));
    }

    stylesheet
        .minify(MinifyOptions::default())
        .map_err(|e| Error::CssMinify(format!("failed to minify CSS: {e}")))?;

    let printer_options = PrinterOptions {
        minify: true,
        ..Default::default()
    };
    let result = stylesheet
        .to_css(printer_options)
        .map_err(|e| Error::CssMinify(format!("failed to serialize CSS: {e}")))?;

    Ok(LightningOutput::Minified(result.code))
}

/// Where a call-shaped token sits in a stylesheet, as far as lightningcss is
/// concerned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CallPosition {
    /// Part of a selector: the next `{`, `}` or `;` is a `{`
    Selector,
    /// `${name}: value`
    PropertyName,
    /// Top level, outside any block
    Rule,
    /// Inside a block where a declaration may start
    Declaration,
    /// Anywhere else inside a declaration
    Value,
}

fn call_position(before: &str, after: &str) -> CallPosition {
    if after.find(['{', '}', ';']).is_some_and(|i| after[i..].starts_with('{')) {
        return CallPosition::Selector;
    }

    let depth = before.matches('{').count() as isize - before.matches('}').count() as isize;
    if depth <= 0 {
        return CallPosition::Rule;
    }
    if after.starts_with(':') {
        return CallPosition::PropertyName;
    }

    let before = before.trim_end();
    if before.ends_with('{') || before.ends_with(';') {
        CallPosition::Declaration
    } else {
        CallPosition::Value
    }
}

/// Whether `before` ends inside an at-rule prelude (`@media (min-width: `).
fn in_at_rule_prelude(before: &str) -> bool {
    let statement = before
        .rfind(['{', '}', ';'])
        .map_or(before, |i| &before[i + 1..]);
    statement.trim_start().starts_with('@')
}

/// A prefix for stand-in identifiers that occurs nowhere in `css`.
fn unique_stem(css: &str, base: &str) -> String {
    let mut stem = base.to_string();
    while css.contains(&stem) {
        stem.push('x');
    }
    stem
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Swap {
    /// Spelling expected in the minified output
    stand_in: String,
    /// Text to put back in its place
    original: String,
}

/// Placeholder tokens swapped for syntax lightningcss accepts and leaves
/// alone, and swapped back after minifying.
///
/// - call-shaped tokens become a class selector, a rule, a custom property
///   name, a declaration or a `var()`, depending on where they sit
/// - numerals become `var()` together with their unit, since lightningcss
///   rewrites dimensions (`987276ms` prints as `987.276s`)
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct StandIns {
    swaps: Vec<Swap>,
}

impl StandIns {
    /// Returns the stylesheet to hand to lightningcss, and the swaps to undo.
    pub(crate) fn hide(css: &str, placeholder: &Placeholder) -> (String, Self) {
        match placeholder {
            Placeholder::Single(token) => Self::hide_call_token(css, token),
            Placeholder::Ordered(tokens) => Self::hide_numerals(css, tokens),
        }
    }

    fn hide_call_token(css: &str, token: &str) -> (String, Self) {
        let Some(name) = call_token_name(token) else {
            return (css.to_string(), Self::default());
        };
        let base = name.trim_start_matches('@').to_ascii_lowercase().replace('_', "-");
        let stem = unique_stem(css, &base);
        // The splitter accepts the token with or without its `;`
        let truncated = token.strip_suffix(';').unwrap_or(token);

        let starts: Vec<usize> = css.match_indices(token).map(|(i, _)| i).collect();
        let width = starts.len().to_string().len();
        let mut hidden = String::with_capacity(css.len());
        let mut swaps = Vec::with_capacity(starts.len());
        let mut cursor = 0;

        for (k, start) in starts.into_iter().enumerate() {
            let end = start + token.len();
            let id = format!("{stem}-{k:0width$}");
            // Later tokens end in `;`, which would hide the `{` that follows them
            let after = css[end..].replace(token, "");
            let (input, swap) = match call_position(&css[..start], &after) {
                CallPosition::Selector => (format!(".{id}"), Swap {
                    stand_in: format!(".{id}"),
                    original: token.to_string(),
                }),
                CallPosition::PropertyName => (format!("--{id}"), Swap {
                    stand_in: format!("--{id}"),
                    original: token.to_string(),
                }),
                CallPosition::Rule => (format!(".{id}{{--{id}:0}}"), Swap {
                    stand_in: format!(".{id}{{--{id}:0}}"),
                    original: token.to_string(),
                }),
                // The trailing `;` may be dropped before `}`
                CallPosition::Declaration => (format!("--{id}:0;"), Swap {
                    stand_in: format!("--{id}:0"),
                    original: truncated.to_string(),
                }),
                CallPosition::Value => (format!("var(--{id})"), Swap {
                    stand_in: format!("var(--{id})"),
                    original: token.to_string(),
                }),
            };

            hidden.push_str(&css[cursor..start]);
            hidden.push_str(&input);
            swaps.push(swap);
            cursor = end;
        }
        hidden.push_str(&css[cursor..]);

        (hidden, Self { swaps })
    }

    fn hide_numerals(css: &str, tokens: &[String]) -> (String, Self) {
        let stem = unique_stem(css, "template-numeral");
        let width = tokens.len().to_string().len();
        let mut hidden = css.to_string();
        let mut swaps = Vec::new();

        for (k, token) in tokens.iter().enumerate() {
            if !token.bytes().all(|b| b.is_ascii_digit()) {
                continue;
            }
            let Some(start) = hidden.find(token.as_str()) else {
                continue;
            };
            // Media query features do not take var()
            if in_at_rule_prelude(&hidden[..start]) {
                continue;
            }

            let unit_start = start + token.len();
            let unit_len = hidden[unit_start..]
                .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
                .unwrap_or(hidden.len() - unit_start);
            let end = unit_start + unit_len;

            let stand_in = format!("var(--{stem}-{k:0width$})");
            let original = hidden[start..end].to_string();
            hidden.replace_range(start..end, &stand_in);
            swaps.push(Swap { stand_in, original });
        }

        (hidden, Self { swaps })
    }

    /// Undo the swaps, or `None` if the minifier rewrote a stand-in.
    pub(crate) fn restore(&self, minified: &str) -> Option<String> {
        let mut result = minified.to_string();
        for swap in &self.swaps {
            if !result.contains(&swap.stand_in) {
                return None;
            }
            result = result.replace(&swap.stand_in, &swap.original);
        }
        Some(result)
    }
}

/// Whether `minified` still splits into as many parts as `combined`.
pub(crate) fn slots_intact(combined: &str, minified: &str, placeholder: &Placeholder) -> bool {
    match (split(combined, placeholder), split(minified, placeholder)) {
        (Ok(before), Ok(after)) => before.len() == after.len(),
        _ => false,
    }
}

/// Put back whitespace inside pseudo-class arguments that a minifier removed.
///
/// Scans `original` for `:name(args) {` where `args` contains whitespace; if
/// the spaceless form appears in `minified`, the spaced form is substituted.
pub fn restore_pseudo_class_spacing(original: &str, minified: &str) -> String {
    let mut result = minified.to_string();

    for caps in PSEUDO_CLASS.captures_iter(original) {
        let pseudo_class = &caps[1];
        let parameters = &caps[2];
        if !parameters.contains(char::is_whitespace) {
            continue;
        }

        let spaceless: String = parameters.chars().filter(|c| !c.is_whitespace()).collect();
        let minified_form = pseudo_class.replacen(parameters, &spaceless, 1);
        if let Some(index) = result.find(&minified_form) {
            result.replace_range(index..index + minified_form.len(), pseudo_class);
        }
    }

    result
}
