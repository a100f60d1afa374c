use std::path::{Path, PathBuf};

use gbs_protocol::BuildTargetIdentifier;
use url::Url;

use crate::IdentityError;

/// Query parameter carrying the source set name.
const SOURCE_SET_QUERY: &str = "sourceset";

/// Derives the externally visible identity of a source set.
///
/// The identity is the project directory URI with the source set name as a query, so equal
/// (directory, name) pairs always yield equal identities.
pub fn target_id(project_dir: &Path, source_set_name: &str) -> Result<BuildTargetIdentifier, IdentityError> {
	let mut url = directory_url(project_dir)?;
	url.query_pairs_mut().append_pair(SOURCE_SET_QUERY, source_set_name);
	Ok(BuildTargetIdentifier::new(String::from(url)))
}

/// `file:` URI of a directory, with a trailing slash.
pub fn dir_uri(path: &Path) -> Result<String, IdentityError> {
	directory_url(path).map(String::from)
}

/// `file:` URI of a path.
pub fn file_uri(path: &Path) -> Result<String, IdentityError> {
	Url::from_file_path(path)
		.map(String::from)
		.map_err(|()| IdentityError::NotAbsolute(path.to_path_buf()))
}

/// Local path of a `file:` URI.
pub fn uri_to_path(uri: &str) -> Result<PathBuf, IdentityError> {
	Url::parse(uri)
		.ok()
		.filter(|url| url.scheme() == "file")
		.and_then(|url| url.to_file_path().ok())
		.ok_or_else(|| IdentityError::NotFileUri(uri.to_owned()))
}

fn directory_url(path: &Path) -> Result<Url, IdentityError> {
	Url::from_directory_path(path).map_err(|()| IdentityError::NotAbsolute(path.to_path_buf()))
}

#[cfg(test)]
mod tests {
	use pretty_assertions::assert_eq;

	use super::*;

	#[test]
	fn identity_is_directory_uri_with_source_set_query() {
		let id = target_id(Path::new("/work/app"), "main").unwrap();
		assert_eq!(id.uri, "file:///work/app/?sourceset=main");
	}

	#[test]
	fn identity_depends_only_on_dir_and_name() {
		assert_eq!(
			target_id(Path::new("/work/app"), "test").unwrap(),
			target_id(Path::new("/work/app/"), "test").unwrap()
		);
		assert_ne!(
			target_id(Path::new("/work/app"), "test").unwrap(),
			target_id(Path::new("/work/app"), "main").unwrap()
		);
	}

	#[test]
	fn names_with_reserved_characters_stay_distinct() {
		let dir = Path::new("/work/app");
		let ids: Vec<_> = ["a b", "a%20b", "a+b", "a&sourceset=b", "a=b"]
			.into_iter()
			.map(|name| target_id(dir, name).unwrap())
			.collect();
		for (i, left) in ids.iter().enumerate() {
			for right in &ids[i + 1..] {
				assert_ne!(left, right);
			}
		}
		assert_eq!(ids[2].uri, "file:///work/app/?sourceset=a%2Bb");
	}

	#[test]
	fn relative_dir_is_rejected() {
		assert_eq!(
			target_id(Path::new("app"), "main"),
			Err(IdentityError::NotAbsolute(PathBuf::from("app")))
		);
	}

	#[test]
	fn uri_round_trips_to_path() {
		let uri = file_uri(Path::new("/work/app/src/Main.java")).unwrap();
		assert_eq!(uri_to_path(&uri).unwrap(), PathBuf::from("/work/app/src/Main.java"));
		assert!(matches!(uri_to_path("https://example.com/x"), Err(IdentityError::NotFileUri(_))));
	}
}
