use crate::core::interfaces::{ScriptMinifier, SymbolMap};
use crate::core::models::{CodeSettings, EvalTreatment, MinifierError, MinifyOutput, SourceMapping};
use crate::infrastructure::processors::source_map::SourceSegments;
use crate::utils::Result;
use once_cell::sync::Lazy;
use oxc_allocator::Allocator;
use oxc_codegen::{Codegen, CodegenOptions};
use oxc_diagnostics::OxcDiagnostic;
use oxc_minifier::{CompressOptions, MangleOptions, Minifier, MinifierOptions};
use oxc_parser::Parser;
use oxc_span::SourceType;
use regex::Regex;
use std::path::PathBuf;

static DIRECT_EVAL_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(^|[^.\w$])eval\s*\(").expect("valid eval regex"));

static EVAL_REFERENCE_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\beval\b").expect("valid eval reference regex"));

/// JavaScript minification using oxc, reporting positions per original file
pub struct OxcMinifier {
    source_type: SourceType,
}

impl OxcMinifier {
    pub fn new() -> Self {
        Self {
            // Bundles are served as classic scripts sharing one global scope
            source_type: SourceType::default().with_script(true),
        }
    }

    fn should_mangle(&self, source: &str, settings: &CodeSettings) -> bool {
        // Renaming is unsafe once code can look names up by string
        let eval_safe = match settings.eval_treatment {
            EvalTreatment::Ignore => true,
            EvalTreatment::MakeImmediateSafe => !DIRECT_EVAL_REGEX.is_match(source),
            EvalTreatment::MakeAllSafe => !EVAL_REFERENCE_REGEX.is_match(source),
        };
        settings.mangle && eval_safe
    }

    fn locate_error(&self, error: &OxcDiagnostic, segments: &SourceSegments) -> MinifierError {
        let message = error.to_string();
        let located = error
            .labels
            .as_ref()
            .and_then(|labels| labels.first())
            .and_then(|label| segments.locate(label.offset()));

        match located {
            Some((path, line, column)) => {
                MinifierError::new(message).at(path, line as usize + 1, column as usize + 1)
            }
            None => MinifierError::new(message),
        }
    }

    /// Re-attribute codegen tokens from document positions to original files
    fn record_mappings(
        &self,
        map_json: &str,
        segments: &SourceSegments,
        line_offset: u32,
        symbols_map: &mut dyn SymbolMap,
    ) -> Result<usize> {
        let generated = sourcemap::SourceMap::from_slice(map_json.as_bytes())?;
        let mut recorded = 0;

        for token in generated.tokens() {
            if token.get_source().is_none() {
                continue;
            }
            let Some((path, line, column)) = segments.resolve(token.get_src_line(), token.get_src_col()) else {
                continue;
            };

            symbols_map.add_mapping(SourceMapping {
                generated_line: token.get_dst_line() + line_offset,
                generated_column: token.get_dst_col(),
                source: path.to_string(),
                original_line: line,
                original_column: column,
                name: token.get_name().map(str::to_string),
            });
            recorded += 1;
        }

        Ok(recorded)
    }
}

impl Default for OxcMinifier {
    fn default() -> Self {
        Self::new()
    }
}

impl ScriptMinifier for OxcMinifier {
    fn minify(
        &self,
        source: &str,
        settings: &CodeSettings,
        symbols_map: &mut dyn SymbolMap,
    ) -> Result<MinifyOutput> {
        let segments = SourceSegments::scan(source);
        let allocator = Allocator::default();

        // Parse the concatenated document
        let parse_result = Parser::new(&allocator, source, self.source_type).parse();
        if !parse_result.errors.is_empty() {
            let errors = parse_result
                .errors
                .iter()
                .map(|e| self.locate_error(e, &segments))
                .collect();
            return Ok(MinifyOutput {
                code: String::new(),
                errors,
            });
        }

        if settings.include_sources_content {
            for (path, content) in segments.contents() {
                symbols_map.set_source_content(path, content);
            }
        }

        // Legal comments come from the parser so look-alikes inside literals stay put
        let important_comments: Vec<&str> = if settings.preserve_important_comments {
            parse_result
                .program
                .comments
                .iter()
                .map(|comment| comment.span.source_text(source))
                .filter(|text| text.starts_with("/*!"))
                .collect()
        } else {
            Vec::new()
        };

        // Minify the AST
        let mut program = parse_result.program;
        let options = MinifierOptions {
            mangle: self.should_mangle(source, settings).then(MangleOptions::default),
            compress: Some(CompressOptions::default()),
        };
        let minified = Minifier::new(options).minify(&allocator, &mut program);

        // Generate minified code with a document-relative map
        let codegen_options = CodegenOptions {
            source_map_path: Some(PathBuf::from("concatenated.js")),
            ..CodegenOptions::minify()
        };
        let generated = Codegen::new()
            .with_options(codegen_options)
            .with_scoping(minified.scoping)
            .build(&program);

        let mut code = String::new();
        for comment in important_comments {
            code.push_str(comment);
            code.push('\n');
        }
        let line_offset = code.matches('\n').count() as u32;
        code.push_str(&generated.code);

        if settings.term_semicolons {
            let trimmed_len = code.trim_end().len();
            code.truncate(trimmed_len);
            if !code.is_empty() && !code.ends_with(';') && !code.ends_with('}') {
                code.push(';');
            }
        }

        if let Some(map) = generated.map {
            self.record_mappings(&map.to_json_string(), &segments, line_offset, symbols_map)?;
        }

        Ok(MinifyOutput {
            code,
            errors: Vec::new(),
        })
    }
}
