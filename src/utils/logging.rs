use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;
use std::time::Instant;

pub struct Logger;

impl Logger {
    pub fn init() {
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new("bundlemap=info"));

        // A host may already own the global subscriber
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .try_init();
    }

    pub fn build_start(bundle_path: &str, file_count: usize) {
        info!("🔨 Building {} from {} file(s)", bundle_path, file_count);
    }

    pub fn empty_bundle(bundle_path: &str) {
        debug!("📭 {} has no files, nothing to build", bundle_path);
    }

    pub fn processing_file(virtual_path: &str, transform_count: usize) {
        debug!("⚡ Processing: {} ({} transform(s))", virtual_path, transform_count);
    }

    pub fn artifact_published(virtual_path: &str, bytes: usize) {
        debug!("📦 Published artifact {} ({} bytes)", virtual_path, bytes);
    }

    pub fn minified(bundle_path: &str, original: usize, minified: usize) {
        let reduction = if original == 0 {
            0.0
        } else {
            (original.saturating_sub(minified) as f64 / original as f64) * 100.0
        };
        debug!(
            "✂️  Minified {}: {:.1}% reduction ({} → {} bytes)",
            bundle_path, reduction, original, minified
        );
    }

    pub fn minifier_errors(bundle_path: &str, count: usize) {
        warn!(
            "⚠️  Minifier reported {} error(s) for {}, serving unminified content",
            count, bundle_path
        );
    }

    /// Diagnostic sink for unexpected minification failures
    pub fn minification_failed(bundle_path: &str, reason: &str) {
        warn!(
            bundle = bundle_path,
            error = reason,
            "⚠️  An exception occurred trying to build bundle contents, serving unminified content"
        );
    }

    pub fn info(msg: &str) {
        info!("{}", msg);
    }
}

pub struct Timer {
    start: Instant,
    name: String,
}

impl Timer {
    pub fn start(name: &str) -> Self {
        debug!("⏱️  Starting: {}", name);
        Self {
            start: Instant::now(),
            name: name.to_string(),
        }
    }

    pub fn elapsed(&self) -> std::time::Duration {
        self.start.elapsed()
    }
}

impl Drop for Timer {
    fn drop(&mut self) {
        debug!("⏱️  Completed: {} in {:.2?}", self.name, self.elapsed());
    }
}
