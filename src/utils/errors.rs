use crate::core::models::BundleKind;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BundleError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A required collaborator was not supplied by the host
    #[error("Invalid argument: {name} must be provided")]
    InvalidArgument { name: &'static str },

    /// A virtual path is occupied by a bundle of the wrong kind
    #[error(
        "There is a bundle on the virtual path '{virtual_path}' of kind '{found}' when it was expected to be of kind '{expected}'"
    )]
    TypeMismatch {
        virtual_path: String,
        expected: BundleKind,
        found: BundleKind,
    },

    #[error("Transform '{transform}' failed for {virtual_path}: {message}")]
    Transform {
        transform: String,
        virtual_path: String,
        message: String,
    },

    #[error("Source map error: {0}")]
    SourceMap(String),

    #[error("Minification error: {0}")]
    Minification(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl BundleError {
    pub fn invalid_argument(name: &'static str) -> Self {
        Self::InvalidArgument { name }
    }

    pub fn type_mismatch(virtual_path: &str, expected: BundleKind, found: BundleKind) -> Self {
        Self::TypeMismatch {
            virtual_path: virtual_path.to_string(),
            expected,
            found,
        }
    }

    pub fn transform(transform: &str, virtual_path: &str, message: impl Into<String>) -> Self {
        Self::Transform {
            transform: transform.to_string(),
            virtual_path: virtual_path.to_string(),
            message: message.into(),
        }
    }

    /// Format error for terminal display
    pub fn format_detailed(&self) -> String {
        match self {
            BundleError::TypeMismatch { virtual_path, .. } => format!(
                "❌ {}\n📁 Path: {} is reserved for derived artifacts",
                self, virtual_path
            ),
            BundleError::Transform { virtual_path, .. } => {
                format!("❌ {}\n📁 File: {}", self, virtual_path)
            }
            _ => format!("❌ {}", self),
        }
    }
}

pub type Result<T> = std::result::Result<T, BundleError>;

impl From<regex::Error> for BundleError {
    fn from(err: regex::Error) -> Self {
        BundleError::Config(format!("Regex error: {}", err))
    }
}

impl From<sourcemap::Error> for BundleError {
    fn from(err: sourcemap::Error) -> Self {
        BundleError::SourceMap(err.to_string())
    }
}

impl From<serde_json::Error> for BundleError {
    fn from(err: serde_json::Error) -> Self {
        BundleError::Config(format!("JSON error: {}", err))
    }
}
