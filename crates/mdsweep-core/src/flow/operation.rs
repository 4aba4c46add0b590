use crate::core::job::Job;
use crate::engine::error::EngineError;
use serde::Serialize;
use std::fmt;

pub type OperationFn = Box<dyn Fn(&Job) -> Result<(), EngineError> + Send + Sync>;

/// Resource directives consumed by the launcher and the submission templates, never by the
/// scheduling logic itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Directives {
    pub ngpu: u32,
    pub executable: String,
}

impl Default for Directives {
    fn default() -> Self {
        Self {
            ngpu: 0,
            executable: "python -u".to_string(),
        }
    }
}

/// A named unit of work gated by pre- and post-condition labels.
///
/// An operation is eligible for a job when every pre-condition holds and at least one
/// post-condition does not. Operations are expected to be idempotent: once the
/// post-conditions hold, the operation is never dispatched again.
pub struct Operation {
    name: &'static str,
    pre: Vec<&'static str>,
    post: Vec<&'static str>,
    directives: Directives,
    action: OperationFn,
}

impl Operation {
    pub fn new(
        name: &'static str,
        action: impl Fn(&Job) -> Result<(), EngineError> + Send + Sync + 'static,
    ) -> Self {
        Self {
            name,
            pre: Vec::new(),
            post: Vec::new(),
            directives: Directives::default(),
            action: Box::new(action),
        }
    }

    pub fn pre(mut self, label: &'static str) -> Self {
        self.pre.push(label);
        self
    }

    pub fn post(mut self, label: &'static str) -> Self {
        self.post.push(label);
        self
    }

    pub fn with_directives(mut self, directives: Directives) -> Self {
        self.directives = directives;
        self
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn pre_labels(&self) -> &[&'static str] {
        &self.pre
    }

    pub fn post_labels(&self) -> &[&'static str] {
        &self.post
    }

    pub fn directives(&self) -> &Directives {
        &self.directives
    }

    pub fn execute(&self, job: &Job) -> Result<(), EngineError> {
        (self.action)(job)
    }
}

impl fmt::Debug for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Operation")
            .field("name", &self.name)
            .field("pre", &self.pre)
            .field("post", &self.post)
            .field("directives", &self.directives)
            .finish_non_exhaustive()
    }
}
