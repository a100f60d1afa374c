//! Typed method descriptors.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::RequestId;

/// A request method with typed parameters and result.
pub trait Request {
	/// Wire method name.
	const METHOD: &'static str;
	/// Parameters type.
	type Params: Serialize + DeserializeOwned + Send + 'static;
	/// Result type.
	type Result: Serialize + DeserializeOwned + Send + 'static;
}

/// A notification method with typed parameters.
pub trait Notification {
	/// Wire method name.
	const METHOD: &'static str;
	/// Parameters type.
	type Params: Serialize + DeserializeOwned + Send + 'static;
}

/// Parameters of `$/cancelRequest`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CancelParams {
	/// Identifier of the request to cancel.
	pub id: RequestId,
}

/// Simple counter-based ID generator.
#[derive(Debug, Default, Clone, Copy)]
pub struct CounterIdGen(pub i64);

impl CounterIdGen {
	/// Creates a new counter starting at 0.
	#[must_use]
	pub const fn new() -> Self {
		Self(0)
	}

	/// Generates the next unique ID and increments the counter.
	#[allow(clippy::should_implement_trait, reason = "convention")]
	pub fn next(&mut self) -> RequestId {
		let id = self.0;
		self.0 += 1;
		RequestId::Number(id)
	}
}
