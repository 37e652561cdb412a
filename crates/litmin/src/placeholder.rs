//! Placeholder tokens standing in for `${...}` expressions.
//!
//! Markup templates use one call-shaped token, `@TEMPLATE_EXPRESSION();`, for
//! every slot. Stylesheet templates get one token per slot, shaped for the
//! syntactic position of that slot (`var(--…)` for values, `--…` for property
//! names, a bare numeral before a unit). When a stylesheet expression stands
//! for a selector or a whole rule, the template falls back to the single
//! call-shaped token.
//!
//! Tokens are derived from a hash of the template text, so the same parts
//! always produce the same placeholder.

use std::hash::Hasher;
use std::sync::LazyLock;

use litmin_literals::Part;
use rapidhash::fast::RapidHasher;
use regex::Regex;

/// Name portion of the call-shaped token
pub(crate) const EXPRESSION_NAME: &str = "@TEMPLATE_EXPRESSION";

/// Appended to the name portion; the splitter tolerates losing the `;`
const CALL_SUFFIX: &str = "();";

/// Prefix for stylesheet custom-property tokens
const CUSTOM_PROPERTY_PREFIX: &str = "--TEMPLATE-EXPRESSION";

/// Letters used to encode the per-template base string
const BASE_ALPHABET: &[u8; 26] = b"abcdefghijklmnopqrstuvwxyz";

/// Length of the per-template base string
const BASE_LEN: usize = 8;

static CSS_COMMENT: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?s)/\*.*?\*/").unwrap());

/// Which minifier a template is headed for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Language {
    Html,
    Css,
}

/// Token(s) substituted for the expression slots of one template.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Placeholder {
    /// One token reused for every slot
    Single(String),
    /// One token per slot, in slot order
    Ordered(Vec<String>),
}

impl Placeholder {
    /// All distinct tokens in this placeholder.
    pub fn tokens(&self) -> &[String] {
        match self {
            Placeholder::Single(token) => std::slice::from_ref(token),
            Placeholder::Ordered(tokens) => tokens,
        }
    }

    /// The token, if this is a single-token placeholder.
    pub fn as_single(&self) -> Option<&str> {
        match self {
            Placeholder::Single(token) => Some(token),
            Placeholder::Ordered(_) => None,
        }
    }
}

/// Generate a placeholder for `parts`, none of whose tokens occur in any part.
pub fn generate_placeholder(parts: &[Part], language: Language) -> Placeholder {
    match language {
        Language::Html => Placeholder::Single(call_token(parts)),
        Language::Css => css_placeholder(parts),
    }
}

/// `@TEMPLATE_EXPRESSION();`, padded with `_` until no part contains it.
pub(crate) fn call_token(parts: &[Part]) -> String {
    let mut name = EXPRESSION_NAME.to_string();
    // The splitter also cuts on the token minus its `;`, so check that form
    while parts.iter().any(|p| p.text.contains(&format!("{name}()"))) {
        name.push('_');
    }
    format!("{name}{CALL_SUFFIX}")
}

/// The name portion of a call-shaped token (`@TEMPLATE_EXPRESSION__`).
pub(crate) fn call_token_name(token: &str) -> Option<&str> {
    token
        .strip_suffix(CALL_SUFFIX)
        .filter(|name| name.starts_with(EXPRESSION_NAME))
}

/// Where an expression sits inside a stylesheet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CssContext {
    /// `${sel} { ... }`
    Selector,
    /// `${name}: value;`
    PropertyName,
    /// `} ${rules}` or a template that opens with an expression
    Rule,
    /// `${n}px`
    NumericUnit,
    /// `color: ${value};`
    DeclarationValue,
    /// `rgb(${r}, ...)`
    FunctionParameter,
}

fn classify(before: &str, after: &str) -> CssContext {
    if after.trim_start().starts_with('{') {
        return CssContext::Selector;
    }
    if after.starts_with(':') {
        return CssContext::PropertyName;
    }

    let before = before.trim_end();
    if before.is_empty() || before.ends_with('}') {
        CssContext::Rule
    } else if after
        .chars()
        .next()
        .is_some_and(|c| c.is_alphanumeric() || c == '_')
    {
        CssContext::NumericUnit
    } else if before.ends_with(':') {
        CssContext::DeclarationValue
    } else {
        CssContext::FunctionParameter
    }
}

fn strip_css_comments(css: &str) -> String {
    CSS_COMMENT.replace_all(css, "").into_owned()
}

fn css_placeholder(parts: &[Part]) -> Placeholder {
    let boundaries = parts.len().saturating_sub(1);
    let mut contexts = Vec::with_capacity(boundaries);
    let mut before = String::new();

    for i in 0..boundaries {
        before.push_str(&parts[i].text);
        let context = classify(
            &strip_css_comments(&before),
            &strip_css_comments(&parts[i + 1].text),
        );
        tracing::trace!(boundary = i, ?context, "classified stylesheet expression");

        // A selector or rule expression cannot be split per slot
        if matches!(context, CssContext::Selector | CssContext::Rule) {
            return Placeholder::Single(call_token(parts));
        }
        contexts.push(context);
    }

    let width = boundaries.to_string().len();
    let mut salt = 0;
    loop {
        let seed = parts_hash(parts, salt);
        let base = encode_base(seed);
        let mut tokens: Vec<String> = Vec::with_capacity(boundaries);

        for (i, context) in contexts.iter().enumerate() {
            let token = match context {
                CssContext::PropertyName => {
                    format!("{CUSTOM_PROPERTY_PREFIX}-{base}-{i:0width$}")
                }
                CssContext::NumericUnit => unique_numeral(parts, &tokens, seed, i),
                _ => format!("var({CUSTOM_PROPERTY_PREFIX}-{base}-{i:0width$})"),
            };
            tokens.push(token);
        }

        if !tokens.iter().any(|t| parts.iter().any(|p| p.text.contains(t))) {
            return Placeholder::Ordered(tokens);
        }
        salt += 1;
    }
}

/// A numeral found in no part and overlapping no earlier token.
///
/// Never ends in `0`. lightningcss still rewrites dimensions (`987276ms` prints
/// as `987.276s`), so the stylesheet adapter hides the numeral and its unit
/// behind a `var()` while minifying.
fn unique_numeral(parts: &[Part], tokens: &[String], seed: u64, boundary: usize) -> String {
    let mut attempt = 0u64;
    loop {
        let mut hasher = RapidHasher::default();
        hasher.write_u64(seed);
        hasher.write_usize(boundary);
        hasher.write_u64(attempt);
        let mut n = 100_000 + hasher.finish() % 900_000;
        if n % 10 == 0 {
            n += 1;
        }
        let numeral = n.to_string();

        let in_text = parts.iter().any(|p| p.text.contains(&numeral));
        let overlaps = tokens
            .iter()
            .any(|t| t.contains(&numeral) || numeral.contains(t.as_str()));
        if !in_text && !overlaps {
            return numeral;
        }
        attempt += 1;
    }
}

fn parts_hash(parts: &[Part], salt: u64) -> u64 {
    let mut hasher = RapidHasher::default();
    hasher.write_u64(salt);
    for part in parts {
        hasher.write(part.text.as_bytes());
        hasher.write_u8(0xff);
    }
    hasher.finish()
}

/// Encode a hash as a lowercase base-26 string
fn encode_base(mut hash: u64) -> String {
    let mut result = String::with_capacity(BASE_LEN);
    for _ in 0..BASE_LEN {
        result.push(BASE_ALPHABET[(hash % 26) as usize] as char);
        hash /= 26;
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parts(texts: &[&str]) -> Vec<Part> {
        let mut offset = 0;
        texts
            .iter()
            .map(|t| {
                let part = Part::new(*t, offset, offset + t.len());
                offset += t.len() + 4;
                part
            })
            .collect()
    }

    fn ordered(placeholder: Placeholder) -> Vec<String> {
        match placeholder {
            Placeholder::Ordered(tokens) => tokens,
            other => panic!("expected ordered placeholder, got {other:?}"),
        }
    }

    #[test]
    fn test_markup_placeholder() {
        let placeholder = generate_placeholder(&parts(&["<p>", "</p>"]), Language::Html);
        assert_eq!(placeholder, Placeholder::Single("@TEMPLATE_EXPRESSION();".into()));
    }

    #[test]
    fn test_markup_placeholder_avoids_collision() {
        let p = parts(&["<p>@TEMPLATE_EXPRESSION();", "@TEMPLATE_EXPRESSION_()</p>"]);
        let placeholder = generate_placeholder(&p, Language::Html);
        assert_eq!(placeholder.as_single(), Some("@TEMPLATE_EXPRESSION__();"));
        for part in &p {
            assert!(!part.text.contains(placeholder.tokens()[0].as_str()));
        }
    }

    #[test]
    fn test_selector_position() {
        let p = parts(&["", " { color: red; }"]);
        let placeholder = generate_placeholder(&p, Language::Css);
        assert_eq!(placeholder.as_single(), Some("@TEMPLATE_EXPRESSION();"));
    }

    #[test]
    fn test_rule_position() {
        let p = parts(&[".a { color: red; }\n", "\n.b { color: blue; }"]);
        let placeholder = generate_placeholder(&p, Language::Css);
        assert!(placeholder.as_single().is_some());
    }

    #[test]
    fn test_declaration_value_position() {
        let p = parts(&[".a { color: ", "; }"]);
        let tokens = ordered(generate_placeholder(&p, Language::Css));
        assert_eq!(tokens.len(), 1);
        assert!(tokens[0].starts_with("var(--TEMPLATE-EXPRESSION-"));
        assert!(tokens[0].ends_with(')'));
    }

    #[test]
    fn test_property_name_position() {
        let p = parts(&[".a { ", ": red; }"]);
        let tokens = ordered(generate_placeholder(&p, Language::Css));
        assert!(tokens[0].starts_with("--TEMPLATE-EXPRESSION-"));
        assert!(!tokens[0].starts_with("var("));
    }

    #[test]
    fn test_numeric_unit_position() {
        let p = parts(&[".a { width: 123456px; margin: ", "px; }"]);
        let tokens = ordered(generate_placeholder(&p, Language::Css));
        assert!(tokens[0].chars().all(|c| c.is_ascii_digit()));
        assert!(!tokens[0].ends_with('0'));
        assert!(!p[0].text.contains(&tokens[0]));
    }

    #[test]
    fn test_function_parameter_position() {
        let p = parts(&[".a { color: rgb(", ", 0, 0); }"]);
        let tokens = ordered(generate_placeholder(&p, Language::Css));
        assert!(tokens[0].starts_with("var(--TEMPLATE-EXPRESSION-"));
    }

    #[test]
    fn test_comments_do_not_mislead_classifier() {
        // Without stripping, the comment's `{` would look like a selector
        let p = parts(&[".a { color: ", " /* { */; }"]);
        let placeholder = generate_placeholder(&p, Language::Css);
        assert!(matches!(placeholder, Placeholder::Ordered(_)));
    }

    #[test]
    fn test_tokens_share_base_and_are_distinct() {
        let p = parts(&[".a { color: ", "; background: ", "; }"]);
        let tokens = ordered(generate_placeholder(&p, Language::Css));
        assert_eq!(tokens.len(), 2);
        assert_ne!(tokens[0], tokens[1]);
        let base = |t: &str| t.split('-').nth(4).map(str::to_string);
        assert_eq!(base(&tokens[0]), base(&tokens[1]));
    }

    #[test]
    fn test_deterministic() {
        let p = parts(&[".a { color: ", "; width: ", "px; }"]);
        assert_eq!(
            generate_placeholder(&p, Language::Css),
            generate_placeholder(&p, Language::Css)
        );
    }

    #[test]
    fn test_no_expressions() {
        let p = parts(&[".a { color: red; }"]);
        assert_eq!(
            generate_placeholder(&p, Language::Css),
            Placeholder::Ordered(vec![])
        );
    }

    #[test]
    fn test_encode_base() {
        let encoded = encode_base(0);
        assert_eq!(encoded, "aaaaaaaa");
        let encoded = encode_base(u64::MAX);
        assert_eq!(encoded.len(), BASE_LEN);
        assert!(encoded.chars().all(|c| c.is_ascii_lowercase()));
    }
}
