//! The parent/child graph of cascading fields.
//!
//! Built from the `dependency.dependents` declarations of a [`FormSchema`].
//! Every child has exactly one parent, so the graph is a forest; cascades
//! walk it breadth-first from the changed field.

use std::collections::VecDeque;

use dynform_core::{FormError, FormResult};

use crate::schema::{FieldId, FormSchema};

/// One parent to child edge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Edge {
    /// The dependent field.
    pub child: FieldId,
    /// URL prefix the parent's value is appended to.
    pub child_url: String,
}

/// Checked dependency edges of a schema.
#[derive(Debug, Clone, Default)]
pub struct DependencyGraph {
    children: Vec<Vec<Edge>>,
    parents: Vec<Option<(FieldId, usize)>>,
}

impl DependencyGraph {
    /// Builds the graph, rejecting unknown children, self-dependencies,
    /// children with more than one parent, and cycles.
    pub fn build(schema: &FormSchema) -> FormResult<Self> {
        let len = schema.fields.len();
        let mut children: Vec<Vec<Edge>> = vec![Vec::new(); len];
        let mut parents: Vec<Option<(FieldId, usize)>> = vec![None; len];

        for parent in schema.ids() {
            let spec = schema.field(parent);
            for dependent in spec.dependents() {
                let child = schema.field_id(&dependent.child_field).ok_or_else(|| {
                    FormError::ImproperlyConfigured(format!(
                        "field '{}' declares unknown dependent '{}'",
                        spec.name, dependent.child_field
                    ))
                })?;
                if child == parent {
                    return Err(FormError::ImproperlyConfigured(format!(
                        "field '{}' cannot depend on itself",
                        spec.name
                    )));
                }
                if let Some((existing, _)) = parents[child.index()] {
                    return Err(FormError::ImproperlyConfigured(format!(
                        "field '{}' is a dependent of both '{}' and '{}'",
                        dependent.child_field,
                        schema.field(existing).name,
                        spec.name
                    )));
                }
                parents[child.index()] = Some((parent, children[parent.index()].len()));
                children[parent.index()].push(Edge {
                    child,
                    child_url: dependent.child_url.clone(),
                });
            }
        }

        let graph = Self { children, parents };
        graph.check_acyclic(schema)?;
        Ok(graph)
    }

    fn check_acyclic(&self, schema: &FormSchema) -> FormResult<()> {
        let len = self.parents.len();
        for start in schema.ids() {
            let mut current = start;
            let mut steps = 0;
            while let Some((parent, _)) = self.parents[current.index()] {
                steps += 1;
                if parent == start || steps > len {
                    return Err(FormError::ImproperlyConfigured(format!(
                        "dependency cycle through field '{}'",
                        schema.field(start).name
                    )));
                }
                current = parent;
            }
        }
        Ok(())
    }

    /// Direct dependents of `parent`, in declaration order.
    pub fn dependents(&self, parent: FieldId) -> &[Edge] {
        self.children
            .get(parent.index())
            .map_or(&[], Vec::as_slice)
    }

    /// The parent of `child` and the edge connecting them.
    pub fn parent_of(&self, child: FieldId) -> Option<(FieldId, &Edge)> {
        let (parent, slot) = (*self.parents.get(child.index())?)?;
        Some((parent, &self.children[parent.index()][slot]))
    }

    /// Whether `field` is the dependent of another field.
    pub fn has_parent(&self, field: FieldId) -> bool {
        self.parents.get(field.index()).is_some_and(Option::is_some)
    }

    /// Every field below `parent` except its direct dependents, breadth-first.
    pub fn descendants(&self, parent: FieldId) -> Vec<FieldId> {
        let mut out = Vec::new();
        let mut queue: VecDeque<FieldId> =
            self.dependents(parent).iter().map(|e| e.child).collect();
        while let Some(field) = queue.pop_front() {
            for edge in self.dependents(field) {
                out.push(edge.child);
                queue.push_back(edge.child);
            }
        }
        out
    }
}
