//! Source map records.

use std::fmt;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use facet::Facet;

use crate::{Error, Result};

/// Options for [`SourceEditor::generate_map`](crate::SourceEditor::generate_map).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MapOptions {
    /// Value of the map's `file` field, e.g. `app.js.map`
    pub file: String,
    /// Name of the single source, e.g. `app.js`
    pub source: String,
    /// Embed the original text as `sourcesContent`
    pub include_content: bool,
    /// Map every character instead of every edit
    pub hires: bool,
}

impl MapOptions {
    /// `<file_name>.map` sourced from `<file_name>`, high resolution.
    pub fn for_file(file_name: &str) -> Self {
        Self {
            file: format!("{file_name}.map"),
            source: file_name.to_string(),
            include_content: true,
            hires: true,
        }
    }
}

/// A version 3 source map.
#[derive(Debug, Clone, PartialEq, Eq, Facet)]
pub struct SourceMapOutput {
    pub version: u32,

    #[facet(default)]
    pub file: Option<String>,

    pub sources: Vec<String>,

    #[facet(rename = "sourcesContent", default)]
    pub sources_content: Vec<Option<String>>,

    #[facet(default)]
    pub names: Vec<String>,

    pub mappings: String,

    /// The JSON this record was read from
    #[facet(default)]
    json: String,
}

impl SourceMapOutput {
    /// Read a map from its JSON text.
    pub fn from_json(json: String) -> Result<Self> {
        let mut output = facet_json::from_str::<SourceMapOutput>(&json)
            .map_err(|e| Error::SourceMap(format!("{e:?}")))?;
        output.json = json;
        Ok(output)
    }

    /// Convert a map built with the `sourcemap` crate.
    pub fn from_sourcemap(map: &sourcemap::SourceMap) -> Result<Self> {
        let mut buf = Vec::new();
        map.to_writer(&mut buf)?;
        let json = String::from_utf8(buf).map_err(|e| Error::SourceMap(e.to_string()))?;
        Self::from_json(json)
    }

    /// The map as JSON.
    pub fn to_json_string(&self) -> &str {
        &self.json
    }

    /// The map as a `data:` URL, for inline `sourceMappingURL` comments.
    pub fn to_url(&self) -> String {
        format!(
            "data:application/json;charset=utf-8;base64,{}",
            STANDARD.encode(self.json.as_bytes())
        )
    }
}

impl fmt::Display for SourceMapOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.json)
    }
}
