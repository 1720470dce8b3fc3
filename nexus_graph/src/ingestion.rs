//! Ingestion Engine - applies extraction batches to the graph store.
//!
//! Every entity of a batch is merged before any of its relationships, since
//! relationship upserts only connect nodes that already exist in the session.
//! A failed record is counted and skipped; the rest of the batch proceeds.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use nexus_schema::{ExtractionBatch, QueryId, SessionId};

use crate::error::GraphResult;
use crate::knowledge_base::{GraphStore, UpsertOutcome};

/// Tally of one `ingest` call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngestReport {
    pub entities_written: usize,
    pub relationships_written: usize,
    /// Malformed records ignored (empty names, endpoints missing in session).
    pub skipped: usize,
    /// Records the backend rejected or could not reach.
    pub failed: usize,
}

impl IngestReport {
    /// True when nothing was attempted.
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    fn record(&mut self, outcome: GraphResult<UpsertOutcome>, entity: bool) {
        match outcome {
            Ok(UpsertOutcome::Written) if entity => self.entities_written += 1,
            Ok(UpsertOutcome::Written) => self.relationships_written += 1,
            Ok(UpsertOutcome::Skipped(_)) => self.skipped += 1,
            Err(_) => self.failed += 1,
        }
    }
}

/// Writes extraction batches into a shared store.
pub struct Ingestor {
    store: Arc<GraphStore>,
}

impl Ingestor {
    /// Create an ingestor writing to `store`.
    pub fn new(store: Arc<GraphStore>) -> Self {
        Self { store }
    }

    /// Merge `batch` into `session_id`, tagging every write with `query_id`.
    ///
    /// Idempotent: repeating the call with the same batch and tags leaves the
    /// graph as it was, apart from refreshing attributes that have values.
    pub fn ingest(
        &self,
        batch: &ExtractionBatch,
        session_id: &SessionId,
        query_id: Option<&QueryId>,
    ) -> IngestReport {
        info!(
            session = %session_id,
            query = query_id.map(QueryId::as_str).unwrap_or("-"),
            summary = %batch.summary(),
            "committing extraction to graph"
        );

        let mut report = IngestReport::default();
        if batch.is_empty() {
            debug!("no entities to update");
            return report;
        }

        for entity in batch.entities() {
            report.record(self.store.upsert_entity(entity, session_id, query_id), true);
        }
        for rel in &batch.relationships {
            report.record(self.store.upsert_relationship(rel, session_id, query_id), false);
        }

        if report.failed > 0 {
            warn!(
                failed = report.failed,
                skipped = report.skipped,
                "graph update finished with failures"
            );
        } else {
            info!(
                entities = report.entities_written,
                relationships = report.relationships_written,
                skipped = report.skipped,
                "graph update successful"
            );
        }
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nexus_schema::{Concept, Organization, Person, Relationship};

    fn ingestor() -> (Ingestor, Arc<GraphStore>) {
        let store = Arc::new(GraphStore::open_in_memory().unwrap());
        (Ingestor::new(Arc::clone(&store)), store)
    }

    fn acme_batch() -> ExtractionBatch {
        ExtractionBatch::new()
            .with_organization(Organization::new("Acme").with_industry("Aerospace"))
            .with_person(Person::new("Jane").with_role("Founder"))
            .with_relationship(Relationship::new("Acme", "Jane", "FOUNDED_BY"))
    }

    #[test]
    fn test_empty_batch_writes_nothing() {
        let (ingestor, store) = ingestor();
        let report = ingestor.ingest(&ExtractionBatch::new(), &SessionId::new("s1"), None);
        assert!(report.is_empty());
        assert_eq!(store.stats(None).nodes, 0);
    }

    #[test]
    fn test_entities_land_before_relationships() {
        // Listed ahead of its endpoints; entity upserts still run first.
        let batch = ExtractionBatch::new()
            .with_relationship(Relationship::new("Fusion", "Tokamak", "USES"))
            .with_concept(Concept::new("Fusion"))
            .with_concept(Concept::new("Tokamak"));

        let (ingestor, _store) = ingestor();
        let report = ingestor.ingest(&batch, &SessionId::new("s1"), None);
        assert_eq!(report.entities_written, 2);
        assert_eq!(report.relationships_written, 1);
    }

    #[test]
    fn test_bad_records_do_not_abort_batch() {
        let batch = acme_batch()
            .with_person(Person::new(""))
            .with_relationship(Relationship::new("Acme", "Nobody", "EMPLOYS"))
            .with_relationship(Relationship::new("Acme", "Jane", "(invalid)"));

        let (ingestor, _store) = ingestor();
        let report = ingestor.ingest(&batch, &SessionId::new("s1"), Some(&QueryId::new("q1")));
        assert_eq!(report.entities_written, 2);
        assert_eq!(report.relationships_written, 1);
        assert_eq!(report.skipped, 2);
        assert_eq!(report.failed, 1);
    }

    #[test]
    fn test_reingest_is_idempotent() {
        let (ingestor, store) = ingestor();
        let session = SessionId::new("s1");
        let query = QueryId::new("q1");

        ingestor.ingest(&acme_batch(), &session, Some(&query));
        let once = store.stats(Some(&session));
        ingestor.ingest(&acme_batch(), &session, Some(&query));
        let twice = store.stats(Some(&session));

        assert_eq!(once, twice);
        assert_eq!(once.nodes, 2);
        assert_eq!(once.edges, 1);
    }
}
