use crate::config::{BundlerConfig, LineEnding};
use crate::core::artifacts::publish_artifact;
use crate::core::{interfaces::*, models::*};
use crate::infrastructure::{OxcMinifier, V3SourceMap};
use crate::utils::{BundleError, Logger, Result, Timer};
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

const LEGACY_MAP_URL_MARKER: &str = "//@ sourceMappingURL=";
const MAP_URL_MARKER: &str = "//# sourceMappingURL=";

const MINIFIER_ERRORS_PREAMBLE: &str =
    "An error occurred during minification, see errors below - returning concatenated content unminified.";
const GENERIC_ERROR_PREAMBLE: &str =
    "An error occurred during minification, see Trace log for more details - returning concatenated content unminified.";

/// What a build needs from its host: the bundle registry and where the application lives
#[derive(Clone)]
pub struct BundleContext {
    registry: Arc<dyn BundleRegistry>,
    application_path: String,
}

impl BundleContext {
    pub fn new(registry: Arc<dyn BundleRegistry>) -> Self {
        Self {
            registry,
            application_path: "/".to_string(),
        }
    }

    pub fn with_application_path(mut self, application_path: &str) -> Self {
        let trimmed = application_path.trim_end_matches('/');
        self.application_path = if trimmed.is_empty() {
            "/".to_string()
        } else if trimmed.starts_with('/') {
            trimmed.to_string()
        } else {
            format!("/{}", trimmed)
        };
        self
    }

    pub fn registry(&self) -> &dyn BundleRegistry {
        self.registry.as_ref()
    }

    pub fn application_path(&self) -> &str {
        &self.application_path
    }

    /// Resolve an app-relative `~/` path against the application path
    pub fn to_absolute(&self, virtual_path: &str) -> String {
        let relative = match virtual_path.strip_prefix('~') {
            Some(rest) if rest.is_empty() || rest.starts_with('/') => rest.trim_start_matches('/'),
            _ => return virtual_path.to_string(),
        };

        if self.application_path == "/" {
            format!("/{}", relative)
        } else if relative.is_empty() {
            self.application_path.clone()
        } else {
            format!("{}/{}", self.application_path, relative)
        }
    }
}

/// Concatenates, minifies and source-maps one script bundle
pub struct SourceMappingBundler {
    minifier: Arc<dyn ScriptMinifier>,
    settings: CodeSettings,
    line_ending: LineEnding,
}

impl SourceMappingBundler {
    pub fn new(minifier: Arc<dyn ScriptMinifier>) -> Self {
        Self {
            minifier,
            settings: CodeSettings::default(),
            line_ending: LineEnding::default(),
        }
    }

    pub fn from_config(config: &BundlerConfig) -> Self {
        Self::new(Arc::new(OxcMinifier::new()))
            .with_settings(config.code_settings())
            .with_line_ending(config.line_ending)
    }

    pub fn with_settings(mut self, settings: CodeSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn with_line_ending(mut self, line_ending: LineEnding) -> Self {
        self.line_ending = line_ending;
        self
    }

    /// Build the minified content of `bundle` and publish its source map.
    ///
    /// Only host misconfiguration is returned as an error; every minification
    /// failure degrades to the unminified concatenation behind a comment block.
    pub fn build(
        &self,
        bundle: Option<&Bundle>,
        context: Option<&BundleContext>,
        files: Option<&[InputFile]>,
    ) -> Result<String> {
        let Some(files) = files else {
            return Ok(String::new());
        };
        let context = context.ok_or(BundleError::invalid_argument("context"))?;
        let bundle = bundle.ok_or(BundleError::invalid_argument("bundle"))?;
        let bundle_path = bundle.virtual_path();

        if files.is_empty() {
            Logger::empty_bundle(bundle_path);
            return Ok(String::new());
        }

        let _timer = Timer::start(&format!("Building {}", bundle_path));
        Logger::build_start(bundle_path, files.len());

        let source_path = context.to_absolute(bundle_path);
        let map_virtual_path = ArtifactPaths::map_path(bundle_path);
        let map_path = context.to_absolute(&map_virtual_path);

        let document = self.concatenate(context, files)?;

        match self.minify_guarded(document.as_str(), &source_path, &map_path) {
            Ok(result) if !result.errors.is_empty() => {
                Logger::minifier_errors(bundle_path, result.errors.len());
                Ok(self.minifier_errors_content(document.as_str(), &result.errors))
            }
            Ok(result) => {
                let content = result
                    .minified_content
                    .replace(LEGACY_MAP_URL_MARKER, MAP_URL_MARKER);
                publish_artifact(context, &map_virtual_path, &result.source_map_text)?;
                Logger::minified(bundle_path, document.as_str().len(), content.len());
                Ok(content)
            }
            Err(err) => {
                Logger::minification_failed(bundle_path, &err.to_string());
                Ok(self.generic_errors_content(document.as_str()))
            }
        }
    }

    fn concatenate(&self, context: &BundleContext, files: &[InputFile]) -> Result<ConcatenatedDocument> {
        let mut document = ConcatenatedDocument::new(self.line_ending.as_str());

        for file in files {
            Logger::processing_file(&file.virtual_path, file.transform_count());

            // Transforms shift positions the minifier cannot see, keep a copy to debug against
            let content = file.apply_transforms()?;
            if file.transform_count() > 0 {
                let transformed_path = ArtifactPaths::transformed_path(&file.virtual_path);
                publish_artifact(context, &transformed_path, &content)?;
            }

            document.push(&file.virtual_path, &content);
        }

        Ok(document)
    }

    /// Run the minifier, turning a panic inside it into an ordinary failure
    fn minify_guarded(&self, document: &str, source_path: &str, map_path: &str) -> Result<MinificationResult> {
        panic::catch_unwind(AssertUnwindSafe(|| {
            self.minify_with_map(document, source_path, map_path)
        }))
        .unwrap_or_else(|payload| {
            let reason = payload
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| payload.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "minifier panicked".to_string());
            Err(BundleError::Minification(reason))
        })
    }

    fn minify_with_map(&self, document: &str, source_path: &str, map_path: &str) -> Result<MinificationResult> {
        let mut map_buffer = Vec::new();
        let mut minified_content = String::new();

        {
            let mut source_map = V3SourceMap::new(&mut map_buffer);
            source_map.start_package(source_path, map_path);

            let output = self.minifier.minify(document, &self.settings, &mut source_map)?;
            if !output.errors.is_empty() {
                return Ok(MinificationResult {
                    minified_content: output.code,
                    errors: output.errors,
                    source_map_text: String::new(),
                });
            }

            minified_content.push_str(&output.code);
            source_map.end_package()?;
            source_map.end_file(&mut minified_content, self.line_ending.as_str())?;
        }

        let source_map_text = String::from_utf8(map_buffer)
            .map_err(|e| BundleError::SourceMap(format!("Map is not valid UTF-8: {}", e)))?;

        Ok(MinificationResult {
            minified_content,
            errors: Vec::new(),
            source_map_text,
        })
    }

    fn minifier_errors_content(&self, document: &str, errors: &[MinifierError]) -> String {
        let newline = self.line_ending.as_str();
        let mut content = String::with_capacity(document.len() + 256);
        content.push_str("/* ");
        content.push_str(MINIFIER_ERRORS_PREAMBLE);
        content.push_str(newline);
        for error in errors {
            content.push_str(&comment_safe(&error.to_string()));
            content.push_str(newline);
        }
        content.push_str(" */");
        content.push_str(newline);
        content.push_str(document);
        content
    }

    fn generic_errors_content(&self, document: &str) -> String {
        let newline = self.line_ending.as_str();
        let mut content = String::with_capacity(document.len() + 160);
        content.push_str("/* ");
        content.push_str(GENERIC_ERROR_PREAMBLE);
        content.push_str(newline);
        content.push_str(" */");
        content.push_str(newline);
        content.push_str(document);
        content
    }
}

impl BundleBuilder for SourceMappingBundler {
    fn build_bundle_content(
        &self,
        bundle: Option<&Bundle>,
        context: Option<&BundleContext>,
        files: Option<&[InputFile]>,
    ) -> Result<String> {
        self.build(bundle, context, files)
    }
}

/// One error per line, and nothing that closes the enclosing comment early
fn comment_safe(message: &str) -> String {
    message
        .replace("*/", "* /")
        .replace("\r\n", " ")
        .replace(['\r', '\n'], " ")
}
