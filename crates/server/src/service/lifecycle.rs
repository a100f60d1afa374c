use std::sync::Arc;

use gbs_model::LanguageExtension;
use gbs_protocol::{
	BSP_VERSION, BuildServerCapabilities, InitializeBuildParams, InitializeBuildResult, LanguageProvider,
	PREFERENCES_DATA_KIND,
};
use gbs_rpc::{ErrorCode, ResponseError};
use gbs_targets::uri_to_path;
use tracing::{debug, info};

use super::{BuildServer, Session};
use crate::ServiceError;
use crate::preferences::Preferences;

/// Server name reported by `build/initialize`.
pub const SERVER_NAME: &str = "gbs";

/// Connection lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
	/// Waiting for `build/initialize`.
	Uninitialized,
	/// `build/initialize` answered, `build/initialized` not seen yet.
	Initializing,
	/// Serving.
	Initialized,
	/// `build/shutdown` answered.
	ShutDown,
}

fn capabilities() -> BuildServerCapabilities {
	let languages = || LanguageProvider {
		language_ids: LanguageExtension::ALL_IDS.iter().map(|id| (*id).to_owned()).collect(),
	};
	BuildServerCapabilities {
		compile_provider: Some(languages()),
		test_provider: Some(languages()),
		run_provider: Some(languages()),
		inverse_sources_provider: Some(true),
		dependency_sources_provider: Some(true),
		dependency_modules_provider: Some(true),
		resources_provider: Some(true),
		output_paths_provider: Some(true),
		jvm_run_environment_provider: Some(true),
		jvm_test_environment_provider: Some(true),
		jvm_compile_classpath_provider: Some(true),
		build_target_changed_provider: Some(true),
		can_reload: Some(true),
	}
}

impl BuildServer {
	/// Current lifecycle state.
	pub fn lifecycle(&self) -> LifecycleState {
		*self.lifecycle.lock()
	}

	/// Rejects requests that arrive before `build/initialize`.
	pub fn check_ready(&self, method: &str) -> Result<(), ServiceError> {
		if method == <gbs_protocol::methods::Initialize as gbs_rpc::Request>::METHOD
			|| self.lifecycle() != LifecycleState::Uninitialized
		{
			Ok(())
		} else {
			Err(ServiceError::NotInitialized)
		}
	}

	/// `build/initialize`: records the workspace root and the client's preferences.
	pub fn initialize(&self, params: InitializeBuildParams) -> Result<InitializeBuildResult, ServiceError> {
		let mut lifecycle = self.lifecycle.lock();
		if *lifecycle != LifecycleState::Uninitialized {
			return Err(ServiceError::Protocol(ResponseError::new(
				ErrorCode::INVALID_REQUEST,
				"build/initialize was already received",
			)));
		}
		let root = uri_to_path(&params.root_uri).map_err(|e| ServiceError::InvalidParams(e.to_string()))?;
		let preferences = Preferences::for_client(&params.display_name, params.data.as_ref());
		let data = serde_json::to_value(&preferences).map_err(|e| ServiceError::Internal(e.to_string()))?;
		info!(
			client = %params.display_name,
			client_version = %params.version,
			bsp_version = %params.bsp_version,
			root = %root.display(),
			languages = ?params.capabilities.language_ids,
			"server.initialize"
		);
		*self.session.write() = Some(Arc::new(Session { root, preferences }));
		*lifecycle = LifecycleState::Initializing;

		Ok(InitializeBuildResult {
			display_name: SERVER_NAME.to_owned(),
			version: env!("CARGO_PKG_VERSION").to_owned(),
			bsp_version: BSP_VERSION.to_owned(),
			capabilities: capabilities(),
			data_kind: Some(PREFERENCES_DATA_KIND.to_owned()),
			data: Some(data),
		})
	}

	/// `build/initialized`.
	pub fn initialized(&self) {
		let mut lifecycle = self.lifecycle.lock();
		if *lifecycle == LifecycleState::Initializing {
			*lifecycle = LifecycleState::Initialized;
		} else {
			debug!(state = ?*lifecycle, "server.initialized.unexpected");
		}
	}

	/// `build/shutdown`.
	pub fn shutdown(&self) {
		info!("server.shutdown");
		*self.lifecycle.lock() = LifecycleState::ShutDown;
	}

	/// Process exit code for `build/exit`: 0 after a shutdown, 1 otherwise.
	pub fn exit_code(&self) -> i32 {
		if self.lifecycle() == LifecycleState::ShutDown { 0 } else { 1 }
	}
}
