//! The unit of work executed by a task.

use crate::error::WorkItemError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};
use std::future::Future;

/// Named call arguments, keyed by string.
pub type NamedArgs = Map<String, JsonValue>;

/// Positional and named arguments handed to a work-item.
///
/// Every task receives its own copy, so work-items never share argument state.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WorkArgs {
    /// Positional arguments in call order.
    #[serde(default)]
    pub positional: Vec<JsonValue>,
    /// Named arguments.
    #[serde(default)]
    pub named: NamedArgs,
}

impl WorkArgs {
    /// Creates an empty argument set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an argument set from already-collected parts.
    pub fn from_parts(positional: Vec<JsonValue>, named: NamedArgs) -> Self {
        Self { positional, named }
    }

    /// Appends a positional argument.
    pub fn with_positional(mut self, value: impl Into<JsonValue>) -> Self {
        self.positional.push(value.into());
        self
    }

    /// Sets a named argument, replacing any previous value for `key`.
    pub fn with_named(mut self, key: impl Into<String>, value: impl Into<JsonValue>) -> Self {
        self.named.insert(key.into(), value.into());
        self
    }

    /// Looks up a named argument.
    pub fn named(&self, key: &str) -> Option<&JsonValue> {
        self.named.get(key)
    }

    /// Looks up a named argument holding a string.
    pub fn named_str(&self, key: &str) -> Option<&str> {
        self.named.get(key).and_then(JsonValue::as_str)
    }
}

/// A callable unit of logic that either completes or fails.
///
/// Implementations must be stateless between invocations; the task that owns a
/// work-item calls [`WorkItem::run`] exactly once.
#[async_trait]
pub trait WorkItem: Send + Sync {
    /// A short identifier used in logs and error messages.
    fn name(&self) -> &str;

    /// Executes the work-item.
    async fn run(&self, args: WorkArgs) -> Result<(), WorkItemError>;
}

/// Adapts an async closure into a [`WorkItem`].
///
/// Built with [`work_item_fn`].
pub struct FnWorkItem<F> {
    name: String,
    func: F,
}

/// Wraps `func` as a named work-item.
///
/// # Examples
///
/// ```ignore
/// use parallel_validation::{WorkItemError, work_item_fn};
///
/// let item = work_item_fn("always_fails", |_args| async {
///     Err(WorkItemError::new("nope"))
/// });
/// ```
pub fn work_item_fn<F, Fut>(name: impl Into<String>, func: F) -> FnWorkItem<F>
where
    F: Fn(WorkArgs) -> Fut + Send + Sync,
    Fut: Future<Output = Result<(), WorkItemError>> + Send + 'static,
{
    FnWorkItem {
        name: name.into(),
        func,
    }
}

#[async_trait]
impl<F, Fut> WorkItem for FnWorkItem<F>
where
    F: Fn(WorkArgs) -> Fut + Send + Sync,
    Fut: Future<Output = Result<(), WorkItemError>> + Send + 'static,
{
    fn name(&self) -> &str {
        &self.name
    }

    async fn run(&self, args: WorkArgs) -> Result<(), WorkItemError> {
        (self.func)(args).await
    }
}
