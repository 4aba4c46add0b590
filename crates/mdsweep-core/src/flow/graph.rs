use super::error::FlowError;
use super::label::{Label, Predicate};
use super::operation::Operation;
use crate::core::document::JobDocument;
use std::collections::{BTreeSet, HashMap, HashSet};

#[derive(Default)]
pub struct FlowGraphBuilder {
    labels: Vec<Label>,
    operations: Vec<Operation>,
}

impl FlowGraphBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn label(mut self, name: &'static str, predicate: Predicate) -> Self {
        self.labels.push(Label::new(name, predicate));
        self
    }

    pub fn operation(mut self, operation: Operation) -> Self {
        self.operations.push(operation);
        self
    }

    /// Validates the declarations and orders the operations topologically.
    ///
    /// Operation `A` precedes `B` when one of `A`'s post-conditions is a pre-condition of
    /// `B`. Ties keep declaration order.
    pub fn build(self) -> Result<FlowGraph, FlowError> {
        let mut label_names = HashSet::new();
        for label in &self.labels {
            if !label_names.insert(label.name()) {
                return Err(FlowError::DuplicateLabel(label.name().to_string()));
            }
        }

        let mut operation_names = HashSet::new();
        for op in &self.operations {
            if !operation_names.insert(op.name()) {
                return Err(FlowError::DuplicateOperation(op.name().to_string()));
            }
            if op.post_labels().is_empty() {
                return Err(FlowError::MissingPostCondition(op.name().to_string()));
            }
            for label in op.pre_labels().iter().chain(op.post_labels()) {
                if !label_names.contains(label) {
                    return Err(FlowError::UnknownLabel {
                        operation: op.name().to_string(),
                        label: label.to_string(),
                    });
                }
            }
        }

        let n = self.operations.len();
        let mut upstream: Vec<Vec<usize>> = vec![Vec::new(); n];
        for (b, op_b) in self.operations.iter().enumerate() {
            for (a, op_a) in self.operations.iter().enumerate() {
                let feeds = op_a
                    .post_labels()
                    .iter()
                    .any(|label| op_b.pre_labels().contains(label));
                if feeds {
                    upstream[b].push(a);
                }
            }
        }

        let mut indegree: Vec<usize> = upstream.iter().map(Vec::len).collect();
        let mut ready: BTreeSet<usize> = (0..n).filter(|&i| indegree[i] == 0).collect();
        let mut order = Vec::with_capacity(n);
        while let Some(next) = ready.pop_first() {
            order.push(next);
            for (b, ups) in upstream.iter().enumerate() {
                if ups.contains(&next) {
                    indegree[b] -= 1;
                    if indegree[b] == 0 {
                        ready.insert(b);
                    }
                }
            }
        }

        if order.len() < n {
            let cyclic = (0..n)
                .filter(|i| !order.contains(i))
                .map(|i| self.operations[i].name().to_string())
                .collect();
            return Err(FlowError::Cycle(cyclic));
        }

        let mut slots: Vec<Option<Operation>> = self.operations.into_iter().map(Some).collect();
        let position: HashMap<usize, usize> =
            order.iter().enumerate().map(|(pos, &i)| (i, pos)).collect();
        let dependencies = order
            .iter()
            .map(|&i| upstream[i].iter().map(|u| position[u]).collect())
            .collect();
        let operations = order
            .iter()
            .filter_map(|&i| slots[i].take())
            .collect();

        Ok(FlowGraph {
            labels: self.labels,
            operations,
            dependencies,
        })
    }
}

/// The validated set of labels and operations of a project, with operations held in
/// dependency order.
#[derive(Debug)]
pub struct FlowGraph {
    labels: Vec<Label>,
    operations: Vec<Operation>,
    dependencies: Vec<Vec<usize>>,
}

impl FlowGraph {
    pub fn labels(&self) -> &[Label] {
        &self.labels
    }

    /// Operations in topological order.
    pub fn operations(&self) -> &[Operation] {
        &self.operations
    }

    pub fn operation(&self, name: &str) -> Option<&Operation> {
        self.operations.iter().find(|op| op.name() == name)
    }

    /// Operations that must complete before `name` can become eligible.
    pub fn dependencies(&self, name: &str) -> Vec<&Operation> {
        self.operations
            .iter()
            .position(|op| op.name() == name)
            .map(|i| {
                self.dependencies[i]
                    .iter()
                    .map(|&d| &self.operations[d])
                    .collect()
            })
            .unwrap_or_default()
    }

    fn label_holds(&self, name: &str, document: &JobDocument) -> bool {
        self.labels
            .iter()
            .find(|label| label.name() == name)
            .is_some_and(|label| label.holds(document))
    }

    /// Names of the labels that hold for `document`, in declaration order.
    pub fn labels_for(&self, document: &JobDocument) -> Vec<&'static str> {
        self.labels
            .iter()
            .filter(|label| label.holds(document))
            .map(Label::name)
            .collect()
    }

    pub fn is_eligible(&self, operation: &Operation, document: &JobDocument) -> bool {
        let pre_ok = operation
            .pre_labels()
            .iter()
            .all(|label| self.label_holds(label, document));
        let complete = operation
            .post_labels()
            .iter()
            .all(|label| self.label_holds(label, document));
        pre_ok && !complete
    }

    pub fn eligible_operations(&self, document: &JobDocument) -> Vec<&Operation> {
        self.operations
            .iter()
            .filter(|op| self.is_eligible(op, document))
            .collect()
    }

    /// True when no operation is eligible for `document`.
    pub fn is_complete(&self, document: &JobDocument) -> bool {
        self.eligible_operations(document).is_empty()
    }
}
