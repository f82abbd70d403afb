//! Operation descriptors and the Target Operation seam.
//!
//! An [`OperationDescriptor`] is an immutable description of one unit of work:
//! a kind tag, an opaque JSON payload and a logical case identifier. The
//! workload composer creates descriptors; the concurrency driver hands each one
//! to a caller-supplied [`TargetOperation`] through timed invocation.
//!
//! Both styles of work the framework drives are expressed through the same
//! trait:
//! - [`FnTarget`] wraps an async closure and runs on the tokio scheduler
//! - [`BlockingTarget`] wraps a synchronous closure and runs it on the blocking
//!   thread pool, which is how CPU-bound or thread-style operations are driven

use anyhow::Result;
use futures::future::{BoxFuture, FutureExt};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

/// Tag naming the category of an operation (`cpu`, `io`, `search`, ...).
///
/// Kinds are an open set: the composer accepts any tag and the target decides
/// what it means. Ordering is lexical so kinds can key a [`std::collections::BTreeMap`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OperationKind(String);

impl OperationKind {
    /// CPU-bound computation.
    pub const CPU: &'static str = "cpu";
    /// I/O-bound access such as a database query.
    pub const IO: &'static str = "io";
    /// Search-style request with higher latency.
    pub const SEARCH: &'static str = "search";
    /// Short calculation with a small fixed latency.
    pub const CALCULATION: &'static str = "calculation";

    /// Create a kind from any tag.
    pub fn new(tag: impl Into<String>) -> Self {
        Self(tag.into())
    }

    /// The tag as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for OperationKind {
    fn from(tag: &str) -> Self {
        Self::new(tag)
    }
}

/// Immutable description of one unit of work.
///
/// Descriptors are owned by the batch that contains them and are never mutated
/// after construction; the driver clones them into each invocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OperationDescriptor {
    case_id: String,
    kind: OperationKind,
    payload: Value,
}

impl OperationDescriptor {
    /// Create a descriptor.
    pub fn new(case_id: impl Into<String>, kind: impl Into<OperationKind>, payload: Value) -> Self {
        Self {
            case_id: case_id.into(),
            kind: kind.into(),
            payload,
        }
    }

    /// Logical case identifier, unique within a batch.
    #[must_use]
    pub fn case_id(&self) -> &str {
        &self.case_id
    }

    /// Kind tag of the operation.
    #[must_use]
    pub const fn kind(&self) -> &OperationKind {
        &self.kind
    }

    /// Opaque parameter payload handed to the target.
    #[must_use]
    pub const fn payload(&self) -> &Value {
        &self.payload
    }
}

/// The caller-supplied unit of work the framework times.
///
/// `call` returns a `'static` future so the invocation can run it on its own
/// task, which is what allows a hard timeout to abandon it and a panic to be
/// captured as a failure. Implementations clone whatever they need out of the
/// descriptor before returning the future.
///
/// A returned `Err` is recorded as an `OPERATION_FAILURE`; the full error chain
/// is preserved in the failure record.
///
/// # Examples
///
/// ```rust,no_run
/// use loadprobe_cli::core::{OperationDescriptor, TargetOperation};
/// use futures::future::{BoxFuture, FutureExt};
/// use serde_json::{json, Value};
///
/// struct Echo;
///
/// impl TargetOperation for Echo {
///     fn call(&self, descriptor: &OperationDescriptor) -> BoxFuture<'static, anyhow::Result<Value>> {
///         let payload = descriptor.payload().clone();
///         async move { Ok(json!({ "echo": payload })) }.boxed()
///     }
/// }
/// ```
pub trait TargetOperation: Send + Sync + 'static {
    /// Start executing the operation described by `descriptor`.
    fn call(&self, descriptor: &OperationDescriptor) -> BoxFuture<'static, Result<Value>>;
}

impl<T: TargetOperation + ?Sized> TargetOperation for Arc<T> {
    fn call(&self, descriptor: &OperationDescriptor) -> BoxFuture<'static, Result<Value>> {
        (**self).call(descriptor)
    }
}

/// Adapter turning an async closure into a [`TargetOperation`].
pub struct FnTarget<F> {
    func: F,
}

impl<F> FnTarget<F> {
    /// Wrap `func`, which receives an owned copy of each descriptor.
    pub const fn new(func: F) -> Self {
        Self { func }
    }
}

impl<F, Fut> TargetOperation for FnTarget<F>
where
    F: Fn(OperationDescriptor) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Value>> + Send + 'static,
{
    fn call(&self, descriptor: &OperationDescriptor) -> BoxFuture<'static, Result<Value>> {
        (self.func)(descriptor.clone()).boxed()
    }
}

/// Adapter running a synchronous closure on tokio's blocking thread pool.
///
/// This is the thread-pool style of execution. When such an invocation times
/// out, the framework stops waiting for it but the OS thread keeps running
/// until the closure returns; blocking closures should therefore be bounded.
pub struct BlockingTarget<F> {
    func: Arc<F>,
}

impl<F> BlockingTarget<F> {
    /// Wrap `func`.
    pub fn new(func: F) -> Self {
        Self {
            func: Arc::new(func),
        }
    }
}

impl<F> TargetOperation for BlockingTarget<F>
where
    F: Fn(&OperationDescriptor) -> Result<Value> + Send + Sync + 'static,
{
    fn call(&self, descriptor: &OperationDescriptor) -> BoxFuture<'static, Result<Value>> {
        let func = Arc::clone(&self.func);
        let descriptor = descriptor.clone();
        async move {
            match tokio::task::spawn_blocking(move || func(&descriptor)).await {
                Ok(result) => result,
                // Re-raise so the invocation records the original panic message
                Err(join_error) if join_error.is_panic() => {
                    std::panic::resume_unwind(join_error.into_panic())
                }
                Err(join_error) => Err(anyhow::anyhow!("blocking task was cancelled: {join_error}")),
            }
        }
        .boxed()
    }
}
