use std::path::PathBuf;

/// Errors deriving an identity or URI from a path.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IdentityError {
	/// The path is not absolute and cannot become a `file:` URI.
	#[error("path is not absolute: {}", .0.display())]
	NotAbsolute(PathBuf),
	/// The URI is not a `file:` URI with a local path.
	#[error("not a file URI: {0}")]
	NotFileUri(String),
}
