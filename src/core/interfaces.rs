use crate::core::models::*;
use crate::core::services::BundleContext;
use crate::utils::Result;
use async_trait::async_trait;
use std::path::Path;

/// Host bundle collection, keyed uniquely by virtual path
///
/// The default `get_or_add` is a lookup followed by an insert and is not
/// atomic; hosts using it must serialize builds per virtual path.
pub trait BundleRegistry: Send + Sync {
    fn get_bundle_for(&self, virtual_path: &str) -> Option<Bundle>;
    fn add(&self, bundle: Bundle);
    fn remove(&self, virtual_path: &str) -> Option<Bundle>;

    /// Return the bundle at `virtual_path`, registering `create()` first if absent
    fn get_or_add(&self, virtual_path: &str, create: &mut dyn FnMut() -> Bundle) -> Bundle {
        if let Some(existing) = self.get_bundle_for(virtual_path) {
            return existing;
        }
        let bundle = create();
        self.add(bundle.clone());
        bundle
    }
}

/// Produces the content of one bundle from its files
pub trait BundleBuilder: Send + Sync {
    fn build_bundle_content(
        &self,
        bundle: Option<&Bundle>,
        context: Option<&BundleContext>,
        files: Option<&[InputFile]>,
    ) -> Result<String>;
}

/// Per-file content transform attached by the host
pub trait ContentTransform: Send + Sync {
    fn name(&self) -> &str;
    fn process(&self, virtual_path: &str, content: &str) -> Result<String>;
}

/// Source-map recorder a minifier reports generated positions to
pub trait SymbolMap {
    fn start_package(&mut self, source_path: &str, map_path: &str);
    fn set_source_content(&mut self, source: &str, content: &str);
    fn add_mapping(&mut self, mapping: SourceMapping);
    /// Serialize the recorded map
    fn end_package(&mut self) -> Result<()>;
    /// Append the map-URL comment to the generated output
    fn end_file(&mut self, out: &mut String, newline: &str) -> Result<()>;
}

/// Script minification capability
pub trait ScriptMinifier: Send + Sync {
    fn minify(
        &self,
        source: &str,
        settings: &CodeSettings,
        symbols_map: &mut dyn SymbolMap,
    ) -> Result<MinifyOutput>;
}

/// File system operations used by the command-line host
#[async_trait]
pub trait FileSystemService: Send + Sync {
    async fn read_file(&self, path: &Path) -> Result<String>;
    /// Write `content`, creating missing parent directories
    async fn write_file(&self, path: &Path, content: &str) -> Result<()>;
}
