//! Units of work accepted by the [`WorkQueue`](super::WorkQueue).

use anyhow::Result;

/// One operation. Runs at most once, on a worker thread.
pub trait RunnableOperation: Send {
    /// Short description for logs and failure reports.
    fn description(&self) -> String;

    fn run(self: Box<Self>) -> Result<()>;

    /// Called instead of [`run`](Self::run) when the queue was cancelled before this operation started.
    /// Operations that own a result slot must fill it here.
    fn cancel(self: Box<Self>) {}
}

/// Adapter so plain closures can be submitted.
pub struct FnOperation<F> {
    description: String,
    f: F,
}

impl<F> FnOperation<F>
where
    F: FnOnce() -> Result<()> + Send,
{
    pub fn new(description: impl Into<String>, f: F) -> Self {
        Self {
            description: description.into(),
            f,
        }
    }
}

impl<F> RunnableOperation for FnOperation<F>
where
    F: FnOnce() -> Result<()> + Send,
{
    fn description(&self) -> String {
        self.description.clone()
    }

    fn run(self: Box<Self>) -> Result<()> {
        (self.f)()
    }
}
