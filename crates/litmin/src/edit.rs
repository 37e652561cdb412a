//! Range-addressed edits on the original source.
//!
//! Edits are keyed by offsets in the original text and never reindexed, so
//! they may be applied in any order as long as they do not overlap.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use sourcemap::SourceMapBuilder;

use crate::source_map::{MapOptions, SourceMapOutput};
use crate::{Error, Result};

/// A text buffer that accepts overwrites and can emit a source map.
pub trait SourceEditor: Send {
    /// Replace original bytes `start..end` with `content`.
    fn overwrite(&mut self, start: usize, end: usize, content: &str) -> Result<()>;

    /// The edited text.
    fn to_code(&self) -> String;

    /// A source map from the edited text back to the original.
    fn generate_map(&self, options: &MapOptions) -> Result<SourceMapOutput>;
}

/// Creates an editor over a source string.
pub type EditorFactory = Arc<dyn Fn(&str) -> Box<dyn SourceEditor> + Send + Sync>;

#[derive(Debug, Clone)]
struct Edit {
    end: usize,
    content: String,
}

/// Default [`SourceEditor`].
#[derive(Debug, Clone)]
pub struct EditBuffer {
    original: String,
    /// Keyed by original start offset
    edits: BTreeMap<usize, Edit>,
}

impl EditBuffer {
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            original: source.into(),
            edits: BTreeMap::new(),
        }
    }

    /// A factory producing [`EditBuffer`]s.
    pub fn factory() -> EditorFactory {
        Arc::new(|source: &str| Box::new(EditBuffer::new(source)) as Box<dyn SourceEditor>)
    }

    pub fn original(&self) -> &str {
        &self.original
    }

    fn check_range(&self, start: usize, end: usize) -> Result<()> {
        let len = self.original.len();
        if start >= end
            || end > len
            || !self.original.is_char_boundary(start)
            || !self.original.is_char_boundary(end)
        {
            return Err(Error::InvalidEdit { start, end, len });
        }
        Ok(())
    }
}

impl SourceEditor for EditBuffer {
    fn overwrite(&mut self, start: usize, end: usize, content: &str) -> Result<()> {
        self.check_range(start, end)?;

        if let Some(edit) = self.edits.get_mut(&start)
            && edit.end == end
        {
            edit.content = content.to_string();
            return Ok(());
        }

        if let Some((&prev_start, prev)) = self.edits.range(..=start).next_back()
            && prev.end > start
        {
            return Err(Error::OverlappingEdit {
                a_start: prev_start,
                a_end: prev.end,
                b_start: start,
                b_end: end,
            });
        }
        if let Some((&next_start, next)) = self.edits.range(start..).next()
            && next_start < end
        {
            return Err(Error::OverlappingEdit {
                a_start: next_start,
                a_end: next.end,
                b_start: start,
                b_end: end,
            });
        }

        self.edits.insert(
            start,
            Edit {
                end,
                content: content.to_string(),
            },
        );
        Ok(())
    }

    fn to_code(&self) -> String {
        let mut code = String::with_capacity(self.original.len());
        let mut cursor = 0;
        for (&start, edit) in &self.edits {
            code.push_str(&self.original[cursor..start]);
            code.push_str(&edit.content);
            cursor = edit.end;
        }
        code.push_str(&self.original[cursor..]);
        code
    }

    fn generate_map(&self, options: &MapOptions) -> Result<SourceMapOutput> {
        let mut builder = SourceMapBuilder::new(Some(options.file.as_str()));
        let source_id = builder.add_source(options.source.as_str());
        if options.include_content {
            builder.set_source_contents(source_id, Some(self.original.as_str()));
        }

        let mut mapper = Mapper {
            builder,
            source_id,
            hires: options.hires,
            generated: Position::default(),
            original: Position::default(),
        };

        let mut cursor = 0;
        for (&start, edit) in &self.edits {
            mapper.unchanged(&self.original[cursor..start]);
            mapper.edited(&edit.content, &self.original[start..edit.end]);
            cursor = edit.end;
        }
        mapper.unchanged(&self.original[cursor..]);

        SourceMapOutput::from_sourcemap(&mapper.builder.into_sourcemap())
    }
}

impl fmt::Display for EditBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_code())
    }
}

/// Zero-based line and UTF-16 column
#[derive(Debug, Clone, Copy, Default)]
struct Position {
    line: u32,
    col: u32,
}

impl Position {
    fn advance(&mut self, text: &str) {
        for ch in text.chars() {
            self.step(ch);
        }
    }

    fn step(&mut self, ch: char) {
        if ch == '\n' {
            self.line += 1;
            self.col = 0;
        } else {
            self.col += ch.len_utf16() as u32;
        }
    }
}

struct Mapper {
    builder: SourceMapBuilder,
    source_id: u32,
    hires: bool,
    generated: Position,
    original: Position,
}

impl Mapper {
    fn add(&mut self) {
        self.builder.add_raw(
            self.generated.line,
            self.generated.col,
            self.original.line,
            self.original.col,
            Some(self.source_id),
            None,
            false,
        );
    }

    /// Text copied through: generated and original advance together.
    fn unchanged(&mut self, text: &str) {
        let mut line_start = true;
        for ch in text.chars() {
            if ch != '\n' && (self.hires || line_start) {
                self.add();
            }
            line_start = ch == '\n';
            self.generated.step(ch);
            self.original.step(ch);
        }
    }

    /// Replacement text: every generated line maps to the start of the edit.
    fn edited(&mut self, content: &str, replaced: &str) {
        if !content.is_empty() {
            for (i, line) in content.split('\n').enumerate() {
                if i > 0 {
                    self.generated.step('\n');
                }
                if i == 0 || !line.is_empty() {
                    self.add();
                }
                self.generated.advance(line);
            }
        }
        self.original.advance(replaced);
    }
}
