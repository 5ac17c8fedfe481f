// Per-file content transforms a host can attach to bundle inputs

use crate::core::interfaces::ContentTransform;
use crate::utils::{BundleError, Result};
use regex::Regex;
use std::sync::Arc;

/// Regex-based replacement
#[derive(Debug, Clone)]
pub struct RegexTransform {
    name: String,
    pattern: Regex,
    replacement: String,
}

impl RegexTransform {
    pub fn new(name: impl Into<String>, pattern: &str, replacement: impl Into<String>) -> Result<Self> {
        let name = name.into();
        let pattern = Regex::new(pattern).map_err(|e| {
            BundleError::transform(&name, "<config>", format!("Invalid regex pattern: {}", e))
        })?;
        Ok(Self {
            name,
            pattern,
            replacement: replacement.into(),
        })
    }
}

impl ContentTransform for RegexTransform {
    fn name(&self) -> &str {
        &self.name
    }

    fn process(&self, _virtual_path: &str, content: &str) -> Result<String> {
        Ok(self
            .pattern
            .replace_all(content, self.replacement.as_str())
            .into_owned())
    }
}

type TransformFn = dyn Fn(&str) -> Result<String> + Send + Sync;

/// Closure transform
pub struct FnTransform {
    name: String,
    func: Arc<TransformFn>,
}

impl FnTransform {
    pub fn new<F>(name: impl Into<String>, func: F) -> Self
    where
        F: Fn(&str) -> Result<String> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            func: Arc::new(func),
        }
    }
}

impl ContentTransform for FnTransform {
    fn name(&self) -> &str {
        &self.name
    }

    fn process(&self, _virtual_path: &str, content: &str) -> Result<String> {
        (self.func)(content)
    }
}

/// Adds a comment banner to the top of script files
///
/// # Example
/// ```
/// use bundlemap::core::models::InputFile;
/// use bundlemap::infrastructure::transforms::BannerTransform;
/// use std::sync::Arc;
///
/// let file = InputFile::new("~/scripts/app.js", "run();")
///     .with_transform(Arc::new(BannerTransform::new("/*! MyApp v1.0.0 */")));
/// assert!(file.apply_transforms().unwrap().starts_with("/*! MyApp"));
/// ```
#[derive(Debug, Clone)]
pub struct BannerTransform {
    banner: String,
}

impl BannerTransform {
    pub fn new(banner: impl Into<String>) -> Self {
        Self {
            banner: banner.into(),
        }
    }
}

impl ContentTransform for BannerTransform {
    fn name(&self) -> &str {
        "banner"
    }

    fn process(&self, virtual_path: &str, content: &str) -> Result<String> {
        if virtual_path.ends_with(".js") {
            Ok(format!("{}\n{}", self.banner, content))
        } else {
            Ok(content.to_string())
        }
    }
}

/// Applies `inner` only to files whose path contains `file_pattern`
pub struct ConditionalTransform {
    file_pattern: String,
    inner: Arc<dyn ContentTransform>,
}

impl ConditionalTransform {
    pub fn new(file_pattern: impl Into<String>, inner: Arc<dyn ContentTransform>) -> Self {
        Self {
            file_pattern: file_pattern.into(),
            inner,
        }
    }
}

impl ContentTransform for ConditionalTransform {
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn process(&self, virtual_path: &str, content: &str) -> Result<String> {
        if virtual_path.contains(&self.file_pattern) {
            self.inner.process(virtual_path, content)
        } else {
            Ok(content.to_string())
        }
    }
}
