use crate::core::interfaces::BundleRegistry;
use crate::core::models::Bundle;
use dashmap::DashMap;

/// Process-wide bundle collection held in memory
///
/// `get_or_add` goes through the map's entry API, so two builds publishing the
/// same derived path never register two bundles for it.
#[derive(Default)]
pub struct InMemoryBundleRegistry {
    bundles: DashMap<String, Bundle>,
}

impl InMemoryBundleRegistry {
    pub fn new() -> Self {
        Self {
            bundles: DashMap::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.bundles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bundles.is_empty()
    }

    /// Registered virtual paths, sorted
    pub fn paths(&self) -> Vec<String> {
        let mut paths: Vec<String> = self.bundles.iter().map(|e| e.key().clone()).collect();
        paths.sort();
        paths
    }
}

impl BundleRegistry for InMemoryBundleRegistry {
    fn get_bundle_for(&self, virtual_path: &str) -> Option<Bundle> {
        self.bundles.get(virtual_path).map(|entry| entry.value().clone())
    }

    fn add(&self, bundle: Bundle) {
        self.bundles.insert(bundle.virtual_path().to_string(), bundle);
    }

    fn remove(&self, virtual_path: &str) -> Option<Bundle> {
        self.bundles.remove(virtual_path).map(|(_, bundle)| bundle)
    }

    fn get_or_add(&self, virtual_path: &str, create: &mut dyn FnMut() -> Bundle) -> Bundle {
        self.bundles
            .entry(virtual_path.to_string())
            .or_insert_with(create)
            .value()
            .clone()
    }
}
