use bundlemap::core::artifacts::{publish_artifact, AdHocBundleBuilder};
use bundlemap::core::interfaces::{BundleBuilder, BundleRegistry};
use bundlemap::core::models::{Bundle, BundleKind, HostBundle, InputFile};
use bundlemap::core::services::BundleContext;
use bundlemap::infrastructure::InMemoryBundleRegistry;
use bundlemap::{BundleError, Result};
use std::sync::Arc;

/// Plain concatenation, standing in for a builder the host brings along
struct ConcatBuilder;

impl BundleBuilder for ConcatBuilder {
    fn build_bundle_content(
        &self,
        _bundle: Option<&Bundle>,
        _context: Option<&BundleContext>,
        files: Option<&[InputFile]>,
    ) -> Result<String> {
        Ok(files
            .unwrap_or_default()
            .iter()
            .map(|f| f.raw_content.as_str())
            .collect::<Vec<_>>()
            .join("\n"))
    }
}

fn context() -> (Arc<InMemoryBundleRegistry>, BundleContext) {
    let registry = Arc::new(InMemoryBundleRegistry::new());
    (registry.clone(), BundleContext::new(registry))
}

#[test]
fn test_bundles_dispatch_on_kind() {
    let (registry, context) = context();
    registry.add(Bundle::HostDefined(HostBundle::new("/site.css", Arc::new(ConcatBuilder))));
    publish_artifact(&context, "/site.js.map", "{}").unwrap();

    let files = [InputFile::new("a.css", "a{}"), InputFile::new("b.css", "b{}")];
    let host = registry.get_bundle_for("/site.css").unwrap();
    assert_eq!(host.build(&context, Some(&files)).unwrap(), "a{}\nb{}");

    let artifact = registry.get_bundle_for("/site.js.map").unwrap();
    assert_eq!(artifact.kind(), BundleKind::AdHocArtifact);
    assert_eq!(artifact.build(&context, Some(&files)).unwrap(), "{}");
}

#[test]
fn test_ad_hoc_builder_rejects_misregistered_bundle() {
    let (registry, context) = context();
    registry.add(Bundle::HostDefined(HostBundle::new("/site.css", Arc::new(ConcatBuilder))));
    let host = registry.get_bundle_for("/site.css").unwrap();

    let err = AdHocBundleBuilder
        .build_bundle_content(Some(&host), Some(&context), None)
        .unwrap_err();
    match err {
        BundleError::TypeMismatch {
            virtual_path,
            expected,
            found,
        } => {
            assert_eq!(virtual_path, "/site.css");
            assert_eq!(expected, BundleKind::AdHocArtifact);
            assert_eq!(found, BundleKind::HostDefined);
        }
        other => panic!("unexpected error: {}", other),
    }
}

#[test]
fn test_collision_leaves_host_bundle_in_place() {
    let (registry, context) = context();
    registry.add(Bundle::HostDefined(HostBundle::new("/app.transformed.js", Arc::new(ConcatBuilder))));

    assert!(publish_artifact(&context, "/app.transformed.js", "snapshot").is_err());
    assert_eq!(
        registry.get_bundle_for("/app.transformed.js").unwrap().kind(),
        BundleKind::HostDefined
    );
}
