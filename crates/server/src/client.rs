//! Outbound notifications to the connected client.

use gbs_protocol::methods;
use gbs_protocol::{DidChangeBuildTarget, LogMessageParams, TaskFinishParams, TaskProgressParams, TaskStartParams};
use gbs_rpc::{ClientSocket, Notification};
use tracing::debug;

/// Sink for server-to-client notifications.
///
/// Delivery is best effort: a client that went away simply stops receiving.
pub trait BuildClient: Send + Sync {
	/// `build/taskStart`.
	fn on_task_start(&self, params: TaskStartParams);
	/// `build/taskProgress`.
	fn on_task_progress(&self, params: TaskProgressParams);
	/// `build/taskFinish`.
	fn on_task_finish(&self, params: TaskFinishParams);
	/// `build/logMessage`.
	fn on_log_message(&self, params: LogMessageParams);
	/// `buildTarget/didChange`.
	fn on_build_targets_changed(&self, params: DidChangeBuildTarget);
}

fn send<N: Notification>(socket: &ClientSocket, params: N::Params) {
	if let Err(error) = socket.notify::<N>(params) {
		debug!(method = N::METHOD, %error, "client.notify.dropped");
	}
}

impl BuildClient for ClientSocket {
	fn on_task_start(&self, params: TaskStartParams) {
		send::<methods::TaskStart>(self, params);
	}

	fn on_task_progress(&self, params: TaskProgressParams) {
		send::<methods::TaskProgress>(self, params);
	}

	fn on_task_finish(&self, params: TaskFinishParams) {
		send::<methods::TaskFinish>(self, params);
	}

	fn on_log_message(&self, params: LogMessageParams) {
		send::<methods::LogMessage>(self, params);
	}

	fn on_build_targets_changed(&self, params: DidChangeBuildTarget) {
		send::<methods::DidChangeBuildTarget>(self, params);
	}
}
