// Source map recording for concatenated bundles
//
// A concatenated document carries `///#source <line> <col> <path>` headers.
// `SourceSegments` uses them to attribute document positions back to the
// original files, and `V3SourceMap` records the attributed positions.

use crate::core::interfaces::SymbolMap;
use crate::core::models::{SourceMapping, SOURCE_HEADER_PREFIX};
use crate::utils::{BundleError, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use sourcemap::SourceMapBuilder;
use std::io::Write;

static SOURCE_HEADER_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^///#source\s+(\d+)\s+(\d+)\s+(.+?)\s*$").expect("valid source header regex")
});

#[derive(Debug, Clone)]
struct Segment {
    path: String,
    /// 1-based position in the original file of the first content line
    start_line: u32,
    start_column: u32,
    content_start: usize,
    content_end: usize,
}

/// The files that make up a concatenated document, located by their headers.
///
/// Positions coming from the parser count lines the way JavaScript does
/// (U+2028 and U+2029 included) and columns in UTF-16 units. Positions handed
/// back count lines the way an editor shows the original file.
#[derive(Debug, Clone, Default)]
pub struct SourceSegments<'a> {
    document: &'a str,
    segments: Vec<Segment>,
    script_lines: Vec<usize>,
    text_lines: Vec<usize>,
}

impl<'a> SourceSegments<'a> {
    pub fn scan(document: &'a str) -> Self {
        let text_lines = line_starts(document, false);
        let mut segments: Vec<Segment> = Vec::new();

        for (index, &start) in text_lines.iter().enumerate() {
            let next = text_lines.get(index + 1).copied().unwrap_or(document.len());
            let line = document[start..next].trim_end_matches(|c: char| c == '\r' || c == '\n');
            if !line.starts_with(SOURCE_HEADER_PREFIX) {
                continue;
            }
            let Some(caps) = SOURCE_HEADER_REGEX.captures(line) else {
                continue;
            };

            if let Some(previous) = segments.last_mut() {
                previous.content_end = start;
            }
            segments.push(Segment {
                path: caps[3].to_string(),
                start_line: caps[1].parse::<u32>().unwrap_or(1).max(1),
                start_column: caps[2].parse::<u32>().unwrap_or(1).max(1),
                content_start: next,
                content_end: document.len(),
            });
        }

        Self {
            document,
            segments,
            script_lines: line_starts(document, true),
            text_lines,
        }
    }

    /// Each file's text as it appears in the document
    pub fn contents(&self) -> impl Iterator<Item = (&str, &str)> {
        self.segments.iter().map(move |segment| {
            let text = &self.document[segment.content_start..segment.content_end];
            let text = text.strip_suffix('\n').unwrap_or(text);
            let text = text.strip_suffix('\r').unwrap_or(text);
            (segment.path.as_str(), text)
        })
    }

    /// Map a 0-based parser (line, UTF-16 column) to (file, 0-based line, 0-based column)
    pub fn resolve(&self, line: u32, column: u32) -> Option<(&str, u32, u32)> {
        let start = *self.script_lines.get(line as usize)?;
        let end = self
            .script_lines
            .get(line as usize + 1)
            .copied()
            .unwrap_or(self.document.len());
        let text = self.document[start..end].trim_end_matches(is_line_terminator);
        self.locate(start + utf16_advance(text, column))
    }

    /// Map a byte offset in the document to (file, 0-based line, 0-based column)
    pub fn locate(&self, offset: usize) -> Option<(&str, u32, u32)> {
        let offset = offset.min(self.document.len());
        let index = self.segments.partition_point(|s| s.content_start <= offset);
        let segment = self.segments.get(index.checked_sub(1)?)?;
        // Past the end of this file means inside the next header
        let followed = index < self.segments.len();
        if offset > segment.content_end || (followed && offset == segment.content_end) {
            return None;
        }

        let first_line = self.text_line_index(segment.content_start);
        let line_index = self.text_line_index(offset);
        let line_start = self.text_lines[line_index].max(segment.content_start);
        let column = self
            .document
            .get(line_start..offset)
            .map(|text| text.encode_utf16().count() as u32)
            .unwrap_or(0);

        let relative_line = (line_index - first_line) as u32;
        let original_column = if relative_line == 0 {
            column + segment.start_column - 1
        } else {
            column
        };

        Some((
            segment.path.as_str(),
            relative_line + segment.start_line - 1,
            original_column,
        ))
    }

    fn text_line_index(&self, offset: usize) -> usize {
        self.text_lines
            .partition_point(|&start| start <= offset)
            .saturating_sub(1)
    }
}

fn is_line_terminator(c: char) -> bool {
    matches!(c, '\r' | '\n' | '\u{2028}' | '\u{2029}')
}

/// Byte offsets where lines begin. `\r\n`, `\n` and `\r` always end a line;
/// U+2028 and U+2029 only when `script` is set.
fn line_starts(document: &str, script: bool) -> Vec<usize> {
    let mut starts = vec![0];
    let mut chars = document.char_indices().peekable();

    while let Some((index, c)) = chars.next() {
        match c {
            '\r' => match chars.peek() {
                Some(&(next, '\n')) => {
                    chars.next();
                    starts.push(next + 1);
                }
                _ => starts.push(index + 1),
            },
            '\n' => starts.push(index + 1),
            '\u{2028}' | '\u{2029}' if script => starts.push(index + c.len_utf8()),
            _ => {}
        }
    }

    starts
}

/// Byte length of the first `units` UTF-16 code units of `text`, clamped to its end
fn utf16_advance(text: &str, units: u32) -> usize {
    let mut remaining = units as usize;
    for (index, c) in text.char_indices() {
        if remaining == 0 {
            return index;
        }
        remaining = remaining.saturating_sub(c.len_utf16());
    }
    text.len()
}

/// Version 3 source map recorder writing its JSON to `W`
pub struct V3SourceMap<W: Write> {
    writer: W,
    builder: Option<SourceMapBuilder>,
    map_path: Option<String>,
}

impl<W: Write> V3SourceMap<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            builder: None,
            map_path: None,
        }
    }
}

impl<W: Write> SymbolMap for V3SourceMap<W> {
    fn start_package(&mut self, source_path: &str, map_path: &str) {
        self.builder = Some(SourceMapBuilder::new(Some(source_path)));
        self.map_path = Some(map_path.to_string());
    }

    fn set_source_content(&mut self, source: &str, content: &str) {
        if let Some(builder) = self.builder.as_mut() {
            let id = builder.add_source(source);
            builder.set_source_contents(id, Some(content));
        }
    }

    fn add_mapping(&mut self, mapping: SourceMapping) {
        let Some(builder) = self.builder.as_mut() else {
            return;
        };
        builder.add(
            mapping.generated_line,
            mapping.generated_column,
            mapping.original_line,
            mapping.original_column,
            Some(mapping.source.as_str()),
            mapping.name.as_deref(),
            false,
        );
    }

    fn end_package(&mut self) -> Result<()> {
        let builder = self
            .builder
            .take()
            .ok_or_else(|| BundleError::SourceMap("end_package called before start_package".to_string()))?;

        builder.into_sourcemap().to_writer(&mut self.writer)?;
        self.writer.flush()?;
        Ok(())
    }

    fn end_file(&mut self, out: &mut String, newline: &str) -> Result<()> {
        let map_path = self
            .map_path
            .as_deref()
            .ok_or_else(|| BundleError::SourceMap("end_file called before start_package".to_string()))?;

        // Legacy marker, the bundler normalizes it
        out.push_str(newline);
        out.push_str("//@ sourceMappingURL=");
        out.push_str(map_path);
        out.push_str(newline);
        Ok(())
    }
}
