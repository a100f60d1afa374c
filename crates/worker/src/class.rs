/// Shared execution classes used for worker scheduling and observability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaskClass {
	/// Body of a dispatched client request.
	Request,
	/// Work not tied to a client request (post-compile reloads, event pumps).
	Background,
	/// Child-process plumbing for orchestrator bridges.
	Bridge,
}

impl TaskClass {
	pub(crate) const fn as_str(self) -> &'static str {
		match self {
			Self::Request => "request",
			Self::Background => "background",
			Self::Bridge => "bridge",
		}
	}
}
