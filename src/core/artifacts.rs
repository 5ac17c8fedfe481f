// Derived artifacts (source maps, transformed snapshots) living in the host registry

use crate::core::interfaces::BundleBuilder;
use crate::core::models::{Bundle, BundleKind, InputFile};
use crate::core::services::BundleContext;
use crate::utils::{BundleError, Logger, Result};

/// Serves the literal content of an ad-hoc artifact bundle
pub struct AdHocBundleBuilder;

impl BundleBuilder for AdHocBundleBuilder {
    fn build_bundle_content(
        &self,
        bundle: Option<&Bundle>,
        _context: Option<&BundleContext>,
        _files: Option<&[InputFile]>,
    ) -> Result<String> {
        match bundle.ok_or(BundleError::invalid_argument("bundle"))? {
            Bundle::AdHocArtifact(artifact) => Ok(artifact.content()),
            other => Err(BundleError::type_mismatch(
                other.virtual_path(),
                BundleKind::AdHocArtifact,
                other.kind(),
            )),
        }
    }
}

/// Store `content` at `virtual_path`, creating the artifact bundle if needed.
///
/// A path held by any other kind of bundle is reserved and left untouched.
pub fn publish_artifact(context: &BundleContext, virtual_path: &str, content: &str) -> Result<()> {
    let bundle = context
        .registry()
        .get_or_add(virtual_path, &mut || Bundle::ad_hoc(virtual_path));

    match bundle {
        Bundle::AdHocArtifact(artifact) => {
            artifact.set_content(content);
            Logger::artifact_published(virtual_path, content.len());
            Ok(())
        }
        other => Err(BundleError::type_mismatch(
            virtual_path,
            BundleKind::AdHocArtifact,
            other.kind(),
        )),
    }
}
