//! Build server core.
//!
//! * [`Dispatcher`]: runs every request body off the transport, with per-request
//!   cancellation and a guarded request state machine.
//! * [`BuildServer`]: lifecycle, target queries, and compile/test/clean execution over the
//!   [`gbs_targets::TargetCache`].
//! * [`runner`]: the task runner contract and the progress events its runs emit, which the
//!   server translates into task, compile, and test notifications.
//! * [`bridge`]: provider and runner adapters driving the orchestrator through external
//!   commands.
//! * [`router`]: wires the protocol methods to a [`BuildServer`].

#![warn(missing_docs)]

pub mod bridge;
mod client;
pub mod config;
mod dispatch;
mod error;
pub mod preferences;
mod provider;
mod report;
pub mod router;
pub mod runner;
mod service;

#[cfg(test)]
mod testing;

use std::ops::ControlFlow;
use std::sync::Arc;

use gbs_protocol::methods;

pub use client::BuildClient;
pub use dispatch::{Dispatcher, RequestState};
pub use error::ServiceError;
pub use provider::ProjectModelProvider;
use router::Router;
pub use service::{BuildServer, LifecycleState};

/// Registers every protocol method of `server`.
///
/// `build/exit` stops the main loop; the caller reads [`BuildServer::exit_code`] afterwards.
pub fn router(server: Arc<BuildServer>) -> Router<Arc<BuildServer>> {
	let mut router = Router::new(server);
	router
		.request::<methods::Initialize, _, _>(|s, params, _| async move { s.initialize(params) })
		.request::<methods::Shutdown, _, _>(|s, _, _| async move {
			s.shutdown();
			Ok(None)
		})
		.request::<methods::WorkspaceBuildTargets, _, _>(|s, _, token| async move {
			s.workspace_build_targets(token).await
		})
		.request::<methods::WorkspaceReload, _, _>(|s, _, token| async move {
			s.reload(token).await?;
			Ok(None)
		})
		.request::<methods::BuildTargetSources, _, _>(|s, params, token| async move { s.sources(params, token).await })
		.request::<methods::BuildTargetResources, _, _>(|s, params, token| async move {
			s.resources(params, token).await
		})
		.request::<methods::BuildTargetOutputPaths, _, _>(|s, params, token| async move {
			s.output_paths(params, token).await
		})
		.request::<methods::BuildTargetDependencyModules, _, _>(|s, params, token| async move {
			s.dependency_modules(params, token).await
		})
		.request::<methods::BuildTargetDependencySources, _, _>(|s, params, token| async move {
			s.dependency_sources(params, token).await
		})
		.request::<methods::BuildTargetInverseSources, _, _>(|s, params, token| async move {
			s.inverse_sources(params, token).await
		})
		.request::<methods::BuildTargetJavacOptions, _, _>(|s, params, token| async move {
			s.javac_options(params, token).await
		})
		.request::<methods::BuildTargetScalacOptions, _, _>(|s, params, token| async move {
			s.scalac_options(params, token).await
		})
		.request::<methods::BuildTargetJvmCompileClasspath, _, _>(|s, params, token| async move {
			s.jvm_compile_classpath(params, token).await
		})
		.request::<methods::BuildTargetJvmRunEnvironment, _, _>(|s, params, token| async move {
			s.jvm_run_environment(params, token).await
		})
		.request::<methods::BuildTargetJvmTestEnvironment, _, _>(|s, params, token| async move {
			s.jvm_test_environment(params, token).await
		})
		.request::<methods::BuildTargetCompile, _, _>(|s, params, token| async move { s.compile(params, token).await })
		.request::<methods::BuildTargetTest, _, _>(|s, params, token| async move { s.test(params, token).await })
		.request::<methods::BuildTargetRun, _, _>(|s, params, token| async move {
			s.run_main_class(params, token).await
		})
		.request::<methods::BuildTargetCleanCache, _, _>(|s, params, token| async move {
			s.clean_cache(params, token).await
		})
		.notification::<methods::Initialized, _>(|s, _| {
			s.initialized();
			ControlFlow::Continue(())
		})
		.notification::<methods::Exit, _>(|s, _| {
			tracing::info!(exit_code = s.exit_code(), "server.exit");
			ControlFlow::Break(Ok(()))
		})
		.gate(|s, method| s.check_ready(method));
	router
}
