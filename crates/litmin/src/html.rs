//! HTML side of the minifier adapter: minify-html plus the fix-ups that keep
//! placeholder tokens intact through it.

use std::sync::LazyLock;

use minify_html::{Cfg, minify};
use regex::{Captures, Regex};

use crate::options::{CssFn, HtmlOptions};
use crate::placeholder::{Placeholder, call_token_name};
use crate::{Error, Result};

static HTML_COMMENT: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?s)<!--.*?-->").unwrap());

static LINE_BREAK: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\r?\n").unwrap());

/// Elements whose text keeps its whitespace: `<pre>`, `<textarea>`, and
/// anything carrying `xml:space="preserve"`
static PRESERVE_WHITESPACE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)<(pre|textarea)\b|<([a-z][\w:-]*)\b[^>]*\bxml:space\s*=\s*["']preserve["']"#)
        .unwrap()
});

static STYLE_ELEMENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)(<style\b[^>]*>)(.*?)(</style)").unwrap());

/// Get a minify-html config for template fragments
fn html_cfg(options: &HtmlOptions, minify_css: bool) -> Cfg {
    Cfg {
        keep_closing_tags: options.keep_closing_tags,
        keep_comments: !options.remove_comments,
        keep_spaces_between_attributes: options.keep_spaces_between_attributes,
        // Fragments are not documents; leave document-level structure alone
        keep_html_and_head_opening_tags: true,
        do_not_minify_doctype: true,
        ensure_spec_compliant_unquoted_attribute_values: true,
        minify_css,
        minify_js: options.minify_js,
        ..Cfg::default()
    }
}

/// Run minify-html.
pub(crate) fn minify_markup(html: &str, options: &HtmlOptions, minify_css: bool) -> Result<String> {
    let result = minify(html.as_bytes(), &html_cfg(options, minify_css));
    String::from_utf8(result).map_err(|e| Error::HtmlMinify(e.to_string()))
}

/// Whether any placeholder token sits inside an HTML comment.
///
/// Comments may be dropped or kept wholesale, taking slots with them, so such
/// templates are not minified at all.
pub(crate) fn expression_in_comment(html: &str, placeholder: &Placeholder) -> bool {
    HTML_COMMENT.find_iter(html).any(|comment| {
        placeholder.tokens().iter().any(|token| {
            let token = token.strip_suffix(';').unwrap_or(token);
            comment.as_str().contains(token)
        })
    })
}

/// Swaps `<@TOKEN` / `</@TOKEN` for a plain element name while minifying.
#[derive(Debug, Clone)]
pub(crate) struct TagNameGuard {
    token: String,
    tag: String,
}

impl TagNameGuard {
    /// `None` if the token never opens a tag, or the stand-in name is taken.
    pub(crate) fn new(html: &str, placeholder: &Placeholder) -> Option<Self> {
        let token = placeholder.as_single()?;
        let name = call_token_name(token)?;
        // minify-html ends a tag name at anything outside `[a-z0-9-]`
        let tag = format!(
            "{}-tag",
            name.trim_start_matches('@').to_ascii_lowercase().replace('_', "-")
        );

        let opens_tag = html.contains(&format!("<{token}")) || html.contains(&format!("</{token}"));
        if !opens_tag || html.contains(&tag) {
            return None;
        }
        Some(Self {
            token: token.to_string(),
            tag,
        })
    }

    pub(crate) fn hide(&self, html: &str) -> String {
        html.replace(&format!("</{}", self.token), &format!("</{}", self.tag))
            .replace(&format!("<{}", self.token), &format!("<{}", self.tag))
    }

    pub(crate) fn restore(&self, html: &str) -> String {
        html.replace(&format!("</{}", self.tag), &format!("</{}", self.token))
            .replace(&format!("<{}", self.tag), &format!("<{}", self.token))
    }
}

/// Remove line breaks inside `<svg>` elements.
///
/// minify-html keeps newlines inside SVG attributes (`d`, `points`, ...).
/// Only the `<svg ...>` .. `</svg` range is touched, and within it any
/// `<pre>`, `<textarea>` or `xml:space="preserve"` element is left alone.
pub(crate) fn strip_svg_line_breaks(html: &str) -> String {
    let mut result = html.to_string();
    let starts: Vec<usize> = result.match_indices("<svg").map(|(i, _)| i).collect();

    for start in starts.into_iter().rev() {
        let Some(close) = result[start..].find("</svg").map(|i| start + i) else {
            continue;
        };
        let svg = strip_outside_preserved(&result[start..close]);
        result.replace_range(start..close, &svg);
    }

    result
}

fn strip_outside_preserved(svg: &str) -> String {
    let mut result = String::with_capacity(svg.len());
    let mut cursor = 0;

    while let Some(caps) = PRESERVE_WHITESPACE.captures_at(svg, cursor) {
        let Some(open) = caps.get(0) else { break };
        let Some(name) = caps.get(1).or_else(|| caps.get(2)) else {
            break;
        };
        let closing = format!("</{}", name.as_str().to_ascii_lowercase());
        let end = svg[open.end()..]
            .to_ascii_lowercase()
            .find(&closing)
            .map_or(svg.len(), |i| open.end() + i + closing.len());

        result.push_str(&LINE_BREAK.replace_all(&svg[cursor..open.start()], ""));
        result.push_str(&svg[open.start()..end]);
        cursor = end;
    }
    result.push_str(&LINE_BREAK.replace_all(&svg[cursor..], ""));

    result
}

/// Apply a caller-supplied CSS minifier to every `<style>` element body.
pub(crate) fn minify_style_elements(html: &str, minify_css: &CssFn) -> String {
    STYLE_ELEMENT
        .replace_all(html, |caps: &Captures<'_>| {
            format!("{}{}{}", &caps[1], minify_css(&caps[2]), &caps[3])
        })
        .into_owned()
}
