//! Template literal extraction using OXC.

use std::path::Path;

use oxc::allocator::Allocator;
use oxc::ast::ast::{TaggedTemplateExpression, TemplateElement, TemplateLiteral};
use oxc::ast_visit::{Visit, walk};
use oxc::parser::Parser;
use oxc::span::{GetSpan, SourceType};

use crate::{LiteralParser, ParseError, Part, Result, Template};

/// [`LiteralParser`] backed by the OXC parser.
#[derive(Debug, Clone, Copy, Default)]
pub struct OxcLiteralParser;

impl LiteralParser for OxcLiteralParser {
    fn parse(&self, source: &str, file_name: Option<&str>) -> Result<Vec<Template>> {
        let allocator = Allocator::default();
        let source_type = source_type_for(file_name);
        let parser_result = Parser::new(&allocator, source, source_type).parse();

        if parser_result.panicked || !parser_result.errors.is_empty() {
            return Err(ParseError::Syntax {
                file: file_name.unwrap_or("<input>").to_string(),
                messages: parser_result
                    .errors
                    .iter()
                    .map(|e| e.to_string())
                    .collect(),
            });
        }

        let mut collector = TemplateCollector {
            source,
            pending_tag: None,
            templates: Vec::new(),
            error: None,
        };
        collector.visit_program(&parser_result.program);

        if let Some(e) = collector.error {
            return Err(e);
        }

        let mut templates = collector.templates;
        templates.sort_by_key(Template::start);
        tracing::debug!(count = templates.len(), "collected template literals");
        Ok(templates)
    }
}

/// Pick the dialect from the file extension, defaulting to an ES module.
fn source_type_for(file_name: Option<&str>) -> SourceType {
    match file_name.map(|name| SourceType::from_path(Path::new(name))) {
        Some(Ok(source_type)) => source_type,
        Some(Err(_)) => {
            tracing::debug!(?file_name, "unknown extension, parsing as ES module");
            SourceType::mjs()
        }
        None => SourceType::mjs(),
    }
}

/// Visitor that collects every template literal along with its tag
struct TemplateCollector<'s> {
    source: &'s str,
    /// (quasi start, tag text) set by the enclosing tagged template
    pending_tag: Option<(u32, String)>,
    templates: Vec<Template>,
    error: Option<ParseError>,
}

impl TemplateCollector<'_> {
    fn part_for(&self, quasi: &TemplateElement<'_>) -> Result<Part> {
        let raw = quasi.value.raw.as_str();
        let span_start = quasi.span.start as usize;
        let span_end = quasi.span.end as usize;

        // Element spans exclude the delimiters, but tolerate a leading "`" or "}".
        let aligned = [span_start, span_start + 1]
            .into_iter()
            .find(|&start| self.source.get(start..start + raw.len()) == Some(raw));

        match aligned {
            Some(start) => Ok(Part::new(raw, start, start + raw.len())),
            None => {
                let text = self.source.get(span_start..span_end).ok_or(
                    ParseError::OutOfBounds {
                        offset: span_end,
                        len: self.source.len(),
                    },
                )?;
                Ok(Part::new(text, span_start, span_end))
            }
        }
    }
}

impl<'a> Visit<'a> for TemplateCollector<'_> {
    fn visit_tagged_template_expression(&mut self, expr: &TaggedTemplateExpression<'a>) {
        let span = expr.tag.span();
        let tag = self.source[span.start as usize..span.end as usize].to_string();
        self.pending_tag = Some((expr.quasi.span.start, tag));
        walk::walk_tagged_template_expression(self, expr);
    }

    fn visit_template_literal(&mut self, lit: &TemplateLiteral<'a>) {
        let tag = match self.pending_tag.take() {
            Some((start, tag)) if start == lit.span.start => Some(tag),
            other => {
                self.pending_tag = other;
                None
            }
        };

        let parts: Result<Vec<Part>> = lit.quasis.iter().map(|q| self.part_for(q)).collect();
        match parts {
            Ok(parts) => self.templates.push(Template::new(tag, parts)),
            Err(e) => {
                self.error.get_or_insert(e);
            }
        }

        // Nested templates live inside the expressions
        for expr in &lit.expressions {
            self.visit_expression(expr);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(source: &str) -> Vec<Template> {
        OxcLiteralParser.parse(source, None).unwrap()
    }

    #[test]
    fn test_tagged_template() {
        let source = "const t = html`<div class=\"${cls}\">hi</div>`;";
        let templates = parse(source);

        assert_eq!(templates.len(), 1);
        let template = &templates[0];
        assert_eq!(template.tag.as_deref(), Some("html"));
        assert_eq!(template.parts.len(), 2);
        assert_eq!(template.parts[0].text, "<div class=\"");
        assert_eq!(template.parts[1].text, "\">hi</div>");
        for part in &template.parts {
            assert_eq!(&source[part.start..part.end], part.text);
        }
    }

    #[test]
    fn test_untagged_template() {
        let templates = parse("const s = `hello ${name}`;");
        assert_eq!(templates.len(), 1);
        assert_eq!(templates[0].tag, None);
        assert_eq!(templates[0].parts[0].text, "hello ");
        assert_eq!(templates[0].parts[1].text, "");
    }

    #[test]
    fn test_member_tag() {
        let templates = parse("this.html`<p></p>`;");
        assert_eq!(templates[0].tag.as_deref(), Some("this.html"));
    }

    #[test]
    fn test_nested_templates_are_ordered() {
        let source = "html`<ul>${items.map(i => html`<li>${i}</li>`)}</ul>`;";
        let templates = parse(source);

        assert_eq!(templates.len(), 2);
        assert_eq!(templates[0].parts[0].text, "<ul>");
        assert_eq!(templates[1].parts[0].text, "<li>");
        assert!(templates[0].start() < templates[1].start());
        // Outer parts never overlap inner parts
        assert!(templates[1].parts[1].end <= templates[0].parts[1].start);
    }

    #[test]
    fn test_adjacent_expressions_give_empty_part() {
        let source = "css`${a}${b}`;";
        let templates = parse(source);
        assert_eq!(templates[0].parts.len(), 3);
        assert!(templates[0].parts[1].is_empty());
        assert_eq!(templates[0].expression_count(), 2);
    }

    #[test]
    fn test_typescript_by_extension() {
        let source = "const x: number = 1; const t = css`a{}`;";
        let templates = OxcLiteralParser.parse(source, Some("style.ts")).unwrap();
        assert_eq!(templates.len(), 1);
        assert_eq!(templates[0].tag.as_deref(), Some("css"));
    }

    #[test]
    fn test_syntax_error() {
        let err = OxcLiteralParser.parse("const = ;", Some("broken.js")).unwrap_err();
        assert!(matches!(err, ParseError::Syntax { ref file, .. } if file == "broken.js"));
    }
}
