//! Core data types shared by the backend, the ingestion pipeline, and the
//! tool surface: [`GraphComponents`], [`Relationship`], and [`ProgressEvent`].

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Result of a text-to-graph extraction: a node mapping plus an ordered
/// relationship sequence.
///
/// Node keys are unique identifiers; the value is the node label. Every
/// relationship endpoint is expected to reference a key in `nodes` — the
/// backend guarantees this, the tool surface passes it through untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphComponents {
    /// Node identifier → node label.
    #[serde(default)]
    pub nodes: BTreeMap<String, String>,
    /// Relationship records in extraction order.
    #[serde(default)]
    pub relationships: Vec<Relationship>,
}

impl GraphComponents {
    /// True when the graph carries neither nodes nor relationships.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty() && self.relationships.is_empty()
    }

    /// Merge another extraction into this one. Node labels from `other`
    /// win on key collision; relationships are appended in order, skipping
    /// any whose `(source, target, relation)` triple is already present so
    /// re-ingesting a document never duplicates its edges.
    pub fn merge(&mut self, other: GraphComponents) {
        self.nodes.extend(other.nodes);
        for rel in other.relationships {
            let present = self
                .relationships
                .iter()
                .any(|r| r.source == rel.source && r.target == rel.target && r.relation == rel.relation);
            if !present {
                self.relationships.push(rel);
            }
        }
    }

    /// Render the node mapping as one `id: label` line per node.
    pub fn nodes_str(&self) -> String {
        self.nodes
            .iter()
            .map(|(id, label)| format!("{}: {}", id, label))
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Render the relationships as one `source -[relation]-> target` line each.
    pub fn edges_str(&self) -> String {
        self.relationships
            .iter()
            .map(|r| format!("{} -[{}]-> {}", r.source, r.relation, r.target))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// A single directed relationship between two nodes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Relationship {
    /// Source node identifier.
    pub source: String,
    /// Target node identifier.
    pub target: String,
    /// Relation label (e.g. `"works_at"`).
    pub relation: String,
    /// Optional free-form attributes attached to the edge.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attributes: Option<BTreeMap<String, String>>,
}

impl Relationship {
    pub fn new(
        source: impl Into<String>,
        target: impl Into<String>,
        relation: impl Into<String>,
    ) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
            relation: relation.into(),
            attributes: None,
        }
    }
}

/// One unit of an ingestion progress sequence.
///
/// A stream of these is produced lazily by
/// [`GraphBackend::process_documents`](crate::backend::GraphBackend::process_documents).
/// The stream yields at most one [`ProgressEvent::Failed`] and nothing after
/// it; exhaustion without a `Failed` means success.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProgressEvent {
    /// A human-readable status line, forwarded to the caller incrementally.
    Status(String),
    /// Terminal error sentinel: definite failure, sequence over.
    Failed,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> GraphComponents {
        GraphComponents {
            nodes: [
                ("a".to_string(), "Alice".to_string()),
                ("b".to_string(), "Bob".to_string()),
            ]
            .into(),
            relationships: vec![Relationship::new("a", "b", "knows")],
        }
    }

    #[test]
    fn merge_extends_nodes_and_appends_relationships() {
        let mut g = sample();
        g.merge(GraphComponents {
            nodes: [("c".to_string(), "Carol".to_string())].into(),
            relationships: vec![Relationship::new("b", "c", "manages")],
        });
        assert_eq!(g.nodes.len(), 3);
        assert_eq!(g.relationships.len(), 2);
        assert_eq!(g.relationships[1].relation, "manages");
    }

    #[test]
    fn merge_skips_edges_already_present() {
        let mut g = sample();
        g.merge(sample());
        assert_eq!(g.nodes.len(), 2);
        assert_eq!(g.relationships.len(), 1);

        // Same endpoints under a different relation is a distinct edge.
        g.merge(GraphComponents {
            nodes: BTreeMap::new(),
            relationships: vec![Relationship::new("a", "b", "manages")],
        });
        assert_eq!(g.relationships.len(), 2);
    }

    #[test]
    fn string_renderings() {
        let g = sample();
        assert_eq!(g.nodes_str(), "a: Alice\nb: Bob");
        assert_eq!(g.edges_str(), "a -[knows]-> b");
    }

    #[test]
    fn relationship_attributes_omitted_when_absent() {
        let json = serde_json::to_value(Relationship::new("a", "b", "knows")).unwrap();
        assert!(json.get("attributes").is_none());
        assert_eq!(json["relation"], "knows");
    }
}
