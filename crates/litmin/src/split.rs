//! Joining parts around placeholder tokens, and cutting them apart again.

use litmin_literals::Part;

use crate::placeholder::Placeholder;
use crate::{Error, Result};

/// Join template parts into one document, with placeholder tokens in the slots.
pub fn combine(parts: &[Part], placeholder: &Placeholder) -> String {
    match placeholder {
        Placeholder::Single(token) => parts
            .iter()
            .map(|p| p.text.as_str())
            .collect::<Vec<_>>()
            .join(token),
        Placeholder::Ordered(tokens) => {
            let mut combined = String::new();
            for (i, part) in parts.iter().enumerate() {
                combined.push_str(&part.text);
                if i + 1 < parts.len()
                    && let Some(token) = tokens.get(i)
                {
                    combined.push_str(token);
                }
            }
            combined
        }
    }
}

/// Cut a minified document back into parts at the placeholder tokens.
///
/// A single token is matched anywhere, with or without its trailing `;`
/// (minifiers drop it before `>` or at the end of input). Ordered tokens are
/// matched strictly left to right; a missing token is an error.
pub fn split(minified: &str, placeholder: &Placeholder) -> Result<Vec<String>> {
    match placeholder {
        Placeholder::Single(token) => Ok(split_single(minified, token)),
        Placeholder::Ordered(tokens) => split_ordered(minified, tokens),
    }
}

fn split_single(minified: &str, token: &str) -> Vec<String> {
    let truncated = token.strip_suffix(';').filter(|t| !t.is_empty());

    minified
        .split(token)
        .flat_map(|piece| match truncated {
            Some(short) => piece.split(short).map(str::to_string).collect::<Vec<_>>(),
            None => vec![piece.to_string()],
        })
        .collect()
}

fn split_ordered(minified: &str, tokens: &[String]) -> Result<Vec<String>> {
    let mut pieces = Vec::with_capacity(tokens.len() + 1);
    let mut cursor = 0;

    for token in tokens {
        let offset = minified[cursor..]
            .find(token.as_str())
            .ok_or_else(|| Error::PlaceholderNotFound {
                token: token.clone(),
                from: cursor,
            })?;
        pieces.push(minified[cursor..cursor + offset].to_string());
        cursor += offset + token.len();
    }
    pieces.push(minified[cursor..].to_string());

    Ok(pieces)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::placeholder::{Language, generate_placeholder};

    fn parts(texts: &[&str]) -> Vec<Part> {
        texts.iter().map(|t| Part::new(*t, 0, t.len())).collect()
    }

    const TOKEN: &str = "@TEMPLATE_EXPRESSION();";

    #[test]
    fn test_combine_single() {
        let p = parts(&["<a href=\"", "\">", "</a>"]);
        let combined = combine(&p, &Placeholder::Single(TOKEN.into()));
        assert_eq!(
            combined,
            "<a href=\"@TEMPLATE_EXPRESSION();\">@TEMPLATE_EXPRESSION();</a>"
        );
    }

    #[test]
    fn test_combine_ordered() {
        let p = parts(&["a{color:", ";width:", "px}"]);
        let placeholder = Placeholder::Ordered(vec!["var(--x-0)".into(), "12345".into()]);
        assert_eq!(combine(&p, &placeholder), "a{color:var(--x-0);width:12345px}");
    }

    #[test]
    fn test_split_single() {
        let pieces = split("<p>@TEMPLATE_EXPRESSION();</p>", &Placeholder::Single(TOKEN.into()))
            .unwrap();
        assert_eq!(pieces, vec!["<p>", "</p>"]);
    }

    #[test]
    fn test_split_single_tolerates_dropped_semicolon() {
        let minified = "<a class=@TEMPLATE_EXPRESSION()>x</a>@TEMPLATE_EXPRESSION();";
        let pieces = split(minified, &Placeholder::Single(TOKEN.into())).unwrap();
        assert_eq!(pieces, vec!["<a class=", ">x</a>", ""]);
    }

    #[test]
    fn test_split_ordered() {
        let placeholder = Placeholder::Ordered(vec!["var(--x-0)".into(), "12345".into()]);
        let pieces = split("a{color:var(--x-0);width:12345px}", &placeholder).unwrap();
        assert_eq!(pieces, vec!["a{color:", ";width:", "px}"]);
    }

    #[test]
    fn test_split_ordered_missing_token() {
        let placeholder = Placeholder::Ordered(vec!["var(--x-0)".into(), "12345".into()]);
        let err = split("a{color:var(--x-0)}", &placeholder).unwrap_err();
        assert!(matches!(err, Error::PlaceholderNotFound { ref token, .. } if token == "12345"));
    }

    #[test]
    fn test_split_ordered_out_of_order() {
        let placeholder = Placeholder::Ordered(vec!["var(--a)".into(), "var(--b)".into()]);
        assert!(split("x:var(--b);y:var(--a)", &placeholder).is_err());
    }

    #[test]
    fn test_round_trip_preserves_part_count() {
        let cases: &[(&[&str], Language)] = &[
            (&["<div class=\"", "\">", "</div>"], Language::Html),
            (&["", "", ""], Language::Html),
            (&[".a { color: ", "; margin: ", "px; }"], Language::Css),
            (&["", " { color: red; }"], Language::Css),
            (&[":host { ", ": blue; }"], Language::Css),
        ];

        for (texts, language) in cases {
            let p = parts(texts);
            let placeholder = generate_placeholder(&p, *language);
            let combined = combine(&p, &placeholder);
            let pieces = split(&combined, &placeholder).unwrap();
            assert_eq!(pieces.len(), p.len(), "{texts:?}");
            for (piece, part) in pieces.iter().zip(&p) {
                assert_eq!(piece, &part.text);
            }
        }
    }
}
