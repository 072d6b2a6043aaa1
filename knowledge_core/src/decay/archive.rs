//! Archival of decayed knowledge.
//!
//! Pruned nodes are announced to the attached [`SignalSink`](crate::providers::SignalSink)
//! before they are dropped, so an outer layer can persist them elsewhere.
//! Sink failures are logged and never block the prune.

use memory_model::NodeId;
use tracing::{info, warn};

use super::DecayOptions;
use crate::knowledge_base::KnowledgeGraph;
use crate::providers::ArchivalSignal;

/// Share of total capacity at which [`KnowledgeGraph::decay_and_archive`]
/// starts doing work.
pub const ARCHIVE_PRESSURE: f64 = 0.8;

/// Options for [`KnowledgeGraph::prune_and_archive`].
#[derive(Debug, Clone, PartialEq)]
pub struct ArchiveOptions {
    /// Relevance below which unpinned nodes are archived; defaults to the
    /// graph's `prune_threshold`.
    pub threshold: Option<f64>,
    /// Reason carried on every archival signal.
    pub reason: String,
}

impl Default for ArchiveOptions {
    fn default() -> Self {
        Self {
            threshold: None,
            reason: "decayed".to_string(),
        }
    }
}

impl ArchiveOptions {
    /// Archive below this relevance.
    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.threshold = Some(threshold);
        self
    }

    /// Reason carried on archival signals.
    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = reason.into();
        self
    }
}

/// Options for [`KnowledgeGraph::decay_and_archive`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DecayArchiveOptions {
    /// Exponential decay settings.
    pub decay: DecayOptions,
    /// Archival settings.
    pub archive: ArchiveOptions,
    /// Run even when the graph is below capacity pressure.
    pub force: bool,
}

/// What a decay-and-archive pass did.
#[derive(Debug, Clone, PartialEq)]
pub enum ArchiveOutcome {
    /// The graph was below [`ARCHIVE_PRESSURE`] and nothing changed.
    Skipped { node_count: usize, capacity: usize },
    /// Decay ran and these nodes were archived.
    Ran { archived: Vec<NodeId> },
}

impl ArchiveOutcome {
    /// Archived ids; empty when skipped.
    pub fn archived(&self) -> &[NodeId] {
        match self {
            ArchiveOutcome::Skipped { .. } => &[],
            ArchiveOutcome::Ran { archived } => archived.as_slice(),
        }
    }
}

impl KnowledgeGraph {
    /// Remove every unpinned node below the threshold, signalling each one
    /// to the attached sink first. Returns the archived ids.
    pub fn prune_and_archive(&mut self, options: &ArchiveOptions) -> Vec<NodeId> {
        let threshold = options.threshold.unwrap_or(self.config.prune_threshold);
        let doomed = self.prune_candidates(threshold);
        if doomed.is_empty() {
            return Vec::new();
        }

        if let Some(sink) = &self.signals {
            for node in doomed.iter().filter_map(|id| self.nodes.get(id)) {
                let signal = ArchivalSignal {
                    agent_id: self.agent_id.clone(),
                    node_id: node.id.clone(),
                    node_type: node.node_type,
                    reason: options.reason.clone(),
                };
                if let Err(e) = sink.archived(&signal) {
                    warn!(agent_id = %self.agent_id, node_id = %node.id, error = %e, "archival signal failed");
                }
            }
        }

        let mut archived: Vec<NodeId> = self
            .detach_nodes(&doomed)
            .into_iter()
            .map(|n| n.id)
            .collect();
        archived.sort();

        info!(agent_id = %self.agent_id, archived = archived.len(), threshold, "archived nodes");
        archived
    }

    /// Exponential decay then archival, but only once the graph holds at
    /// least [`ARCHIVE_PRESSURE`] of its total capacity (or when forced).
    pub fn decay_and_archive(&mut self, options: &DecayArchiveOptions) -> ArchiveOutcome {
        let node_count = self.nodes.len();
        let capacity = self.config.total_capacity();

        if !options.force && (node_count as f64) < ARCHIVE_PRESSURE * capacity as f64 {
            return ArchiveOutcome::Skipped {
                node_count,
                capacity,
            };
        }

        self.apply_decay(&options.decay);
        let archived = self.prune_and_archive(&options.archive);
        ArchiveOutcome::Ran { archived }
    }

    /// Periodic maintenance: [`decay_and_archive`](Self::decay_and_archive)
    /// followed by an active-set refresh.
    pub fn run_maintenance(&mut self, options: &DecayArchiveOptions) -> ArchiveOutcome {
        let outcome = self.decay_and_archive(options);
        self.refresh_active_set();
        outcome
    }
}
