use crate::core::document::JobDocument;
use std::fmt;

pub type Predicate = fn(&JobDocument) -> bool;

/// A named boolean condition over a job document. Labels have no side effects; they exist
/// purely to drive scheduling decisions.
#[derive(Clone, Copy)]
pub struct Label {
    name: &'static str,
    predicate: Predicate,
}

impl Label {
    pub const fn new(name: &'static str, predicate: Predicate) -> Self {
        Self { name, predicate }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    #[inline]
    pub fn holds(&self, document: &JobDocument) -> bool {
        (self.predicate)(document)
    }
}

impl fmt::Debug for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Label").field("name", &self.name).finish()
    }
}
