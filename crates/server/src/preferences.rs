use gbs_rpc::JsonValue;
use gbs_targets::DisplayNaming;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Client whose defaults differ from everyone else's.
pub const INTELLIJ_CLIENT: &str = "IntelliJ-BSP";

/// Client preferences from the `build/initialize` data.
///
/// Every field is optional on the wire; [`Preferences::for_client`] fills in the defaults
/// for the connecting client, and the filled-in value is echoed back in the initialize
/// result.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Preferences {
	/// Display name style.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub display_naming: Option<DisplayNaming>,
	/// Whether `workspace/buildTargets` reports base directories.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub include_target_base_directory: Option<bool>,
	/// Whether output paths carry a `?kind=` suffix.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub use_qualified_output_paths: Option<bool>,
	/// Whether a successful compile schedules a reload.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub reload_after_compile: Option<bool>,
	/// Extra orchestrator arguments for every run.
	#[serde(skip_serializing_if = "Vec::is_empty")]
	pub gradle_arguments: Vec<String>,
	/// Extra JVM arguments for the orchestrator.
	#[serde(skip_serializing_if = "Vec::is_empty")]
	pub gradle_jvm_arguments: Vec<String>,
}

impl Preferences {
	/// Decodes `data` and fills unset fields with the defaults for `client`.
	///
	/// Data that does not decode is ignored.
	pub fn for_client(client: &str, data: Option<&JsonValue>) -> Self {
		let mut prefs = match data {
			Some(data) if !data.is_null() => serde_json::from_value(data.clone()).unwrap_or_else(|error| {
				debug!(%error, "preferences.undecodable");
				Self::default()
			}),
			_ => Self::default(),
		};
		let intellij = client == INTELLIJ_CLIENT;
		prefs.use_qualified_output_paths.get_or_insert(!intellij);
		prefs.include_target_base_directory.get_or_insert(!intellij);
		prefs.display_naming.get_or_insert(if intellij {
			DisplayNaming::Dot
		} else {
			DisplayNaming::Bracket
		});
		prefs.reload_after_compile.get_or_insert(true);
		prefs
	}

	/// Display name style.
	pub fn naming(&self) -> DisplayNaming {
		self.display_naming.unwrap_or_default()
	}

	/// Whether base directories are reported.
	pub fn base_directory(&self) -> bool {
		self.include_target_base_directory.unwrap_or(true)
	}

	/// Whether output paths are qualified.
	pub fn qualified_output_paths(&self) -> bool {
		self.use_qualified_output_paths.unwrap_or(true)
	}

	/// Whether compiles trigger a reload.
	pub fn reload_after_compile(&self) -> bool {
		self.reload_after_compile.unwrap_or(true)
	}
}
