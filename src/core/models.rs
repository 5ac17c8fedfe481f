use crate::core::artifacts::AdHocBundleBuilder;
use crate::core::interfaces::{BundleBuilder, ContentTransform};
use crate::core::services::{BundleContext, SourceMappingBundler};
use crate::utils::Result;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Inline marker the minifier uses to attribute the following lines to a file
pub const SOURCE_HEADER_PREFIX: &str = "///#source";

/// Header line recording that the next line is line 1, column 1 of `virtual_path`
pub fn source_header(virtual_path: &str) -> String {
    format!("{} 1 1 {}", SOURCE_HEADER_PREFIX, virtual_path)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BundleKind {
    AdHocArtifact,
    SourceMapped,
    HostDefined,
}

impl fmt::Display for BundleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BundleKind::AdHocArtifact => write!(f, "ad-hoc artifact"),
            BundleKind::SourceMapped => write!(f, "source-mapped script"),
            BundleKind::HostDefined => write!(f, "host-defined"),
        }
    }
}

/// Literal precomputed content (a source map, a transformed snapshot) served verbatim.
///
/// Clones share the same content cell, so a handle obtained from the registry
/// observes every later `set_content`.
#[derive(Debug, Clone)]
pub struct AdHocArtifact {
    virtual_path: String,
    content: Arc<RwLock<String>>,
}

impl AdHocArtifact {
    pub fn new(virtual_path: impl Into<String>) -> Self {
        Self {
            virtual_path: virtual_path.into(),
            content: Arc::new(RwLock::new(String::new())),
        }
    }

    pub fn virtual_path(&self) -> &str {
        &self.virtual_path
    }

    /// Replace any prior content
    pub fn set_content(&self, text: impl Into<String>) {
        *self.content.write() = text.into();
    }

    pub fn content(&self) -> String {
        self.content.read().clone()
    }
}

/// Script bundle whose content comes from the source-mapping pipeline
#[derive(Clone)]
pub struct ScriptBundle {
    virtual_path: String,
    bundler: Arc<SourceMappingBundler>,
}

impl ScriptBundle {
    pub fn new(virtual_path: impl Into<String>, bundler: Arc<SourceMappingBundler>) -> Self {
        Self {
            virtual_path: virtual_path.into(),
            bundler,
        }
    }

    pub fn virtual_path(&self) -> &str {
        &self.virtual_path
    }
}

impl fmt::Debug for ScriptBundle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScriptBundle")
            .field("virtual_path", &self.virtual_path)
            .finish_non_exhaustive()
    }
}

/// Bundle owned by the host, built by whatever builder the host supplies
#[derive(Clone)]
pub struct HostBundle {
    virtual_path: String,
    builder: Arc<dyn BundleBuilder>,
}

impl HostBundle {
    pub fn new(virtual_path: impl Into<String>, builder: Arc<dyn BundleBuilder>) -> Self {
        Self {
            virtual_path: virtual_path.into(),
            builder,
        }
    }

    pub fn virtual_path(&self) -> &str {
        &self.virtual_path
    }
}

impl fmt::Debug for HostBundle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HostBundle")
            .field("virtual_path", &self.virtual_path)
            .finish_non_exhaustive()
    }
}

/// Every bundle the host registry can hold, tagged by kind
#[derive(Debug, Clone)]
pub enum Bundle {
    AdHocArtifact(AdHocArtifact),
    SourceMapped(ScriptBundle),
    HostDefined(HostBundle),
}

impl Bundle {
    pub fn ad_hoc(virtual_path: impl Into<String>) -> Self {
        Bundle::AdHocArtifact(AdHocArtifact::new(virtual_path))
    }

    pub fn kind(&self) -> BundleKind {
        match self {
            Bundle::AdHocArtifact(_) => BundleKind::AdHocArtifact,
            Bundle::SourceMapped(_) => BundleKind::SourceMapped,
            Bundle::HostDefined(_) => BundleKind::HostDefined,
        }
    }

    pub fn virtual_path(&self) -> &str {
        match self {
            Bundle::AdHocArtifact(artifact) => artifact.virtual_path(),
            Bundle::SourceMapped(script) => script.virtual_path(),
            Bundle::HostDefined(host) => host.virtual_path(),
        }
    }

    /// Materialize this bundle with the builder its kind calls for
    pub fn build(&self, context: &BundleContext, files: Option<&[InputFile]>) -> Result<String> {
        match self {
            Bundle::AdHocArtifact(_) => {
                AdHocBundleBuilder.build_bundle_content(Some(self), Some(context), files)
            }
            Bundle::SourceMapped(script) => {
                script
                    .bundler
                    .build_bundle_content(Some(self), Some(context), files)
            }
            Bundle::HostDefined(host) => {
                host.builder
                    .build_bundle_content(Some(self), Some(context), files)
            }
        }
    }
}

/// One source file of a bundle, with the transforms the host attached to it
#[derive(Clone)]
pub struct InputFile {
    pub virtual_path: String,
    pub raw_content: String,
    pub transforms: Vec<Arc<dyn ContentTransform>>,
}

impl InputFile {
    pub fn new(virtual_path: impl Into<String>, raw_content: impl Into<String>) -> Self {
        Self {
            virtual_path: virtual_path.into(),
            raw_content: raw_content.into(),
            transforms: Vec::new(),
        }
    }

    pub fn with_transform(mut self, transform: Arc<dyn ContentTransform>) -> Self {
        self.transforms.push(transform);
        self
    }

    pub fn transform_count(&self) -> usize {
        self.transforms.len()
    }

    /// Run every attached transform, in order, over the raw content
    pub fn apply_transforms(&self) -> Result<String> {
        let mut content = self.raw_content.clone();
        for transform in &self.transforms {
            content = transform.process(&self.virtual_path, &content)?;
        }
        Ok(content)
    }
}

impl fmt::Debug for InputFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InputFile")
            .field("virtual_path", &self.virtual_path)
            .field("raw_content_len", &self.raw_content.len())
            .field(
                "transforms",
                &self.transforms.iter().map(|t| t.name()).collect::<Vec<_>>(),
            )
            .finish()
    }
}

/// Header-annotated concatenation of every file of a bundle, in input order
#[derive(Debug, Clone)]
pub struct ConcatenatedDocument {
    text: String,
    newline: &'static str,
}

impl ConcatenatedDocument {
    pub fn new(newline: &'static str) -> Self {
        Self {
            text: String::new(),
            newline,
        }
    }

    pub fn push(&mut self, virtual_path: &str, content: &str) {
        self.text.push_str(&source_header(virtual_path));
        self.text.push_str(self.newline);
        self.text.push_str(content);
        self.text.push_str(self.newline);
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }
}

/// A problem the minifier found in the input script
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MinifierError {
    pub message: String,
    pub source: Option<String>,
    /// 1-based
    pub line: usize,
    /// 1-based
    pub column: usize,
}

impl MinifierError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            source: None,
            line: 0,
            column: 0,
        }
    }

    pub fn at(mut self, source: impl Into<String>, line: usize, column: usize) -> Self {
        self.source = Some(source.into());
        self.line = line;
        self.column = column;
        self
    }
}

impl fmt::Display for MinifierError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.source {
            Some(source) => write!(f, "{}({},{}): {}", source, self.line, self.column, self.message),
            None => write!(f, "{}", self.message),
        }
    }
}

/// What a minifier hands back; the source map goes to the recorder instead
#[derive(Debug, Clone, Default)]
pub struct MinifyOutput {
    pub code: String,
    pub errors: Vec<MinifierError>,
}

#[derive(Debug, Clone, Default)]
pub struct MinificationResult {
    pub minified_content: String,
    pub errors: Vec<MinifierError>,
    pub source_map_text: String,
}

/// Generated position attributed to an original file position, all 0-based
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceMapping {
    pub generated_line: u32,
    pub generated_column: u32,
    pub source: String,
    pub original_line: u32,
    pub original_column: u32,
    pub name: Option<String>,
}

/// Virtual paths of derived artifacts, computed from their source paths
pub struct ArtifactPaths;

impl ArtifactPaths {
    pub fn map_path(bundle_path: &str) -> String {
        format!("{}.map", bundle_path)
    }

    /// `foo.js` → `foo.transformed.js`; a name without extension gets the suffix appended
    pub fn transformed_path(file_path: &str) -> String {
        let name_start = file_path.rfind('/').map(|i| i + 1).unwrap_or(0);
        match file_path[name_start..].rfind('.') {
            Some(dot) if dot > 0 => {
                let split = name_start + dot;
                format!("{}.transformed{}", &file_path[..split], &file_path[split..])
            }
            _ => format!("{}.transformed", file_path),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum EvalTreatment {
    /// Treat eval like any other call; local names are always mangled
    Ignore,
    /// Skip mangling when the bundle calls `eval(` directly
    #[default]
    MakeImmediateSafe,
    /// Skip mangling when `eval` is referenced at all, e.g. `window.eval` or an alias
    MakeAllSafe,
}

/// Options handed to the minifier for one run
#[derive(Debug, Clone)]
pub struct CodeSettings {
    pub eval_treatment: EvalTreatment,
    pub preserve_important_comments: bool,
    pub term_semicolons: bool,
    pub mangle: bool,
    pub include_sources_content: bool,
}

impl Default for CodeSettings {
    fn default() -> Self {
        Self {
            eval_treatment: EvalTreatment::MakeImmediateSafe,
            preserve_important_comments: false,
            term_semicolons: true,
            mangle: true,
            include_sources_content: true,
        }
    }
}
