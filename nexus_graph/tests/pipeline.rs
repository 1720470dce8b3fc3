//! End-to-end behaviour of ingestion and retrieval against one shared store.

use std::sync::Arc;

use nexus_graph::{
    ContextAssembler, ContextStatus, GraphStats, GraphStore, Ingestor, Params, RetrievalConfig,
    StoreConfig, FAILURE_PREFIX, NO_MATCHES_CONTEXT,
};
use nexus_schema::{
    Concept, EntityKind, ExtractionBatch, Organization, Person, QueryId, Relationship, SessionId,
};

struct Pipeline {
    store: Arc<GraphStore>,
    ingestor: Ingestor,
    assembler: ContextAssembler,
}

impl Pipeline {
    fn in_memory() -> Self {
        Self::with_store(GraphStore::open_in_memory().unwrap(), RetrievalConfig::default())
    }

    fn with_store(store: GraphStore, retrieval: RetrievalConfig) -> Self {
        let store = Arc::new(store);
        Self {
            ingestor: Ingestor::new(Arc::clone(&store)),
            assembler: ContextAssembler::new(Arc::clone(&store), retrieval),
            store,
        }
    }
}

fn acme_batch() -> ExtractionBatch {
    ExtractionBatch::new()
        .with_organization(
            Organization::new("Acme")
                .with_description("A rocket company")
                .with_industry("Aerospace"),
        )
        .with_person(Person::new("Jane").with_role("Founder"))
        .with_relationship(
            Relationship::new("Acme", "Jane", "founded by").with_evidence("Jane founded Acme in 1999"),
        )
}

#[test]
fn test_acme_scenario() {
    let pipeline = Pipeline::in_memory();
    let s1 = SessionId::new("s1");

    let report = pipeline.ingestor.ingest(&acme_batch(), &s1, Some(&QueryId::new("q1")));
    assert_eq!(report.entities_written, 2);
    assert_eq!(report.relationships_written, 1);

    assert_eq!(pipeline.store.stats(Some(&s1)), GraphStats { nodes: 2, edges: 1 });

    let matches = pipeline.store.search_nodes("acm", &s1, 3).unwrap();
    assert_eq!(matches.len(), 1);
    assert_eq!(matches[0].name, "Acme");
    assert_eq!(matches[0].label, "Organization");

    let edges = pipeline.store.get_neighborhood(&[matches[0].id], &s1, 50).unwrap();
    assert_eq!(edges.len(), 1);
    assert_eq!(edges[0].source, "Acme");
    assert_eq!(edges[0].relationship, "FOUNDED_BY");
    assert_eq!(edges[0].target, "Jane");
    assert_eq!(edges[0].evidence.as_deref(), Some("Jane founded Acme in 1999"));

    let context = pipeline.assembler.retrieve(&["Acme"], &s1);
    assert_eq!(context.status, ContextStatus::Found);
    assert!(context.text.contains("- Acme (Organization): A rocket company"));
    assert!(context.text.contains("- Acme --[FOUNDED_BY]--> Jane"));
    assert!(context.text.contains("(Evidence: Jane founded Acme in 1999)"));
}

#[test]
fn test_unmatched_keywords_yield_sentinel() {
    let pipeline = Pipeline::in_memory();
    let s1 = SessionId::new("s1");
    pipeline.ingestor.ingest(&acme_batch(), &s1, None);

    assert!(pipeline.store.search_nodes("zzz", &s1, 3).unwrap().is_empty());

    let context = pipeline.assembler.retrieve(&["zzz", "  "], &s1);
    assert_eq!(context.status, ContextStatus::NoMatches);
    assert_eq!(context.text, NO_MATCHES_CONTEXT);
    assert!(context.anchors.is_empty());
}

#[test]
fn test_store_failure_yields_failed_context() {
    let pipeline = Pipeline::in_memory();
    let s1 = SessionId::new("s1");
    pipeline.ingestor.ingest(&acme_batch(), &s1, None);
    pipeline
        .store
        .raw_query("DROP TABLE relationships", &Params::new())
        .unwrap();

    let context = pipeline.assembler.retrieve(&["acme"], &s1);
    assert!(matches!(context.status, ContextStatus::Failed(_)));
    assert!(context.text.starts_with(FAILURE_PREFIX));
    assert_ne!(context.text, NO_MATCHES_CONTEXT);
    assert!(context.anchors.is_empty());
    assert!(context.edges.is_empty());

    assert_eq!(pipeline.store.stats(Some(&s1)), GraphStats::default());
}

#[test]
fn test_accented_keyword_anchors_regardless_of_case() {
    let pipeline = Pipeline::in_memory();
    let s1 = SessionId::new("s1");
    pipeline.ingestor.ingest(
        &ExtractionBatch::new().with_organization(Organization::new("École Polytechnique")),
        &s1,
        None,
    );

    let context = pipeline.assembler.retrieve(&["école"], &s1);
    assert!(context.is_found());
    assert_eq!(context.anchors[0].name, "École Polytechnique");
}

#[test]
fn test_anchor_without_edges_omits_relationships() {
    let pipeline = Pipeline::in_memory();
    let s1 = SessionId::new("s1");
    let batch = ExtractionBatch::new().with_concept(Concept::new("Entropy"));
    pipeline.ingestor.ingest(&batch, &s1, None);

    let context = pipeline.assembler.retrieve(&["entropy"], &s1);
    assert!(context.is_found());
    assert!(context.edges.is_empty());
    assert!(!context.text.contains("Key Relationships"));
}

#[test]
fn test_sessions_are_isolated() {
    let pipeline = Pipeline::in_memory();
    let s1 = SessionId::new("s1");
    let s2 = SessionId::new("s2");

    pipeline.ingestor.ingest(&acme_batch(), &s1, None);
    pipeline.ingestor.ingest(
        &ExtractionBatch::new().with_organization(Organization::new("Acme Two")),
        &s2,
        None,
    );

    let in_s2 = pipeline.assembler.retrieve(&["Acme"], &s2);
    assert_eq!(in_s2.anchors.len(), 1);
    assert_eq!(in_s2.anchors[0].name, "Acme Two");
    assert!(in_s2.edges.is_empty());

    // An edge named in s2 cannot reach the s1 endpoints.
    let cross = ExtractionBatch::new().with_relationship(Relationship::new("Acme", "Jane", "KNOWS"));
    let report = pipeline.ingestor.ingest(&cross, &s2, None);
    assert_eq!(report.skipped, 1);
    assert_eq!(pipeline.store.stats(Some(&s2)).edges, 0);
}

#[test]
fn test_delete_session_leaves_others_unchanged() {
    let pipeline = Pipeline::in_memory();
    let s1 = SessionId::new("s1");
    let s2 = SessionId::new("s2");
    pipeline.ingestor.ingest(&acme_batch(), &s1, None);
    pipeline.ingestor.ingest(&acme_batch(), &s2, None);

    let before = pipeline.store.stats(Some(&s2));
    let removed = pipeline.store.delete(Some(&s1)).unwrap();

    assert_eq!(removed, GraphStats { nodes: 2, edges: 1 });
    assert_eq!(pipeline.store.stats(Some(&s1)), GraphStats::default());
    assert_eq!(pipeline.store.stats(Some(&s2)), before);
    assert_eq!(pipeline.store.stats(None), before);
}

#[test]
fn test_reingest_changes_nothing() {
    let pipeline = Pipeline::in_memory();
    let s1 = SessionId::new("s1");
    let q1 = QueryId::new("q1");

    pipeline.ingestor.ingest(&acme_batch(), &s1, Some(&q1));
    let nodes = pipeline.store.query_tagged_nodes(Some(&s1), Some(&q1)).unwrap();
    let edges = pipeline.store.query_tagged_edges(Some(&s1), Some(&q1)).unwrap();

    pipeline.ingestor.ingest(&acme_batch(), &s1, Some(&q1));
    assert_eq!(pipeline.store.query_tagged_nodes(Some(&s1), Some(&q1)).unwrap(), nodes);
    assert_eq!(pipeline.store.query_tagged_edges(Some(&s1), Some(&q1)).unwrap(), edges);
    assert_eq!(pipeline.store.stats(Some(&s1)), GraphStats { nodes: 2, edges: 1 });
}

#[test]
fn test_tagged_reads_exclude_legacy_data() {
    let pipeline = Pipeline::in_memory();
    let s1 = SessionId::new("s1");
    let q1 = QueryId::new("q1");

    pipeline.ingestor.ingest(&acme_batch(), &s1, None);
    pipeline.ingestor.ingest(
        &ExtractionBatch::new()
            .with_concept(Concept::new("Propulsion"))
            .with_relationship(Relationship::new("Acme", "Propulsion", "RESEARCHES")),
        &s1,
        Some(&q1),
    );

    let nodes = pipeline.store.query_tagged_nodes(Some(&s1), None).unwrap();
    assert_eq!(nodes.len(), 1);
    assert_eq!(nodes[0].name, "Propulsion");
    assert_eq!(nodes[0].query_id, "q1");

    let edges = pipeline.store.query_tagged_edges(None, None).unwrap();
    assert_eq!(edges.len(), 1);
    assert_eq!(edges[0].relationship, "RESEARCHES");

    // Untagged data stays visible to ordinary retrieval.
    assert_eq!(pipeline.store.stats(Some(&s1)), GraphStats { nodes: 3, edges: 2 });
}

#[test]
fn test_expansion_is_bounded() {
    let retrieval = RetrievalConfig {
        anchors_per_keyword: 2,
        neighborhood_limit: 5,
        ..RetrievalConfig::default()
    };
    let pipeline = Pipeline::with_store(GraphStore::open_in_memory().unwrap(), retrieval);
    let s1 = SessionId::new("s1");

    let mut batch = ExtractionBatch::new();
    for i in 0..4 {
        batch = batch.with_concept(Concept::new(format!("Star {i}")));
    }
    for i in 0..20 {
        let planet = format!("Planet {i}");
        batch = batch
            .with_concept(Concept::new(planet.clone()))
            .with_relationship(Relationship::new(format!("Star {}", i % 4), planet, "ORBITED_BY"));
    }
    pipeline.ingestor.ingest(&batch, &s1, None);

    let context = pipeline.assembler.retrieve(&["star", "Star 0"], &s1);
    assert_eq!(context.anchors.len(), 2);
    assert_eq!(context.anchors[0].name, "Star 0");
    assert_eq!(context.edges.len(), 5);
}

#[test]
fn test_file_store_persists_across_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let config = StoreConfig::file(dir.path().join("graphs").join("nexus.db"));
    let s1 = SessionId::new("s1");

    {
        let pipeline = Pipeline::with_store(GraphStore::open(&config).unwrap(), RetrievalConfig::default());
        pipeline.ingestor.ingest(&acme_batch(), &s1, Some(&QueryId::new("q1")));
    }

    let store = GraphStore::open(&config).unwrap();
    assert_eq!(store.stats(Some(&s1)), GraphStats { nodes: 2, edges: 1 });
    assert_eq!(store.ensure_constraints(), EntityKind::ALL.len());
    assert!(store.find_node(EntityKind::Person, "Jane", &s1).unwrap().is_some());
}

#[test]
fn test_batch_from_json_round_trips_through_store() {
    let pipeline = Pipeline::in_memory();
    let s1 = SessionId::default();
    let batch = ExtractionBatch::from_json(
        r#"{
            "organizations": [{"name": "Acme", "industry": "Aerospace"}],
            "people": [{"name": "Jane", "role": "Founder"}],
            "relationships": [{"source": "Jane", "target": "Acme", "type": "works at"}]
        }"#,
    )
    .unwrap();

    let report = pipeline.ingestor.ingest(&batch, &s1, None);
    assert_eq!(report.entities_written, 2);
    assert_eq!(report.relationships_written, 1);

    let context = pipeline.assembler.retrieve(&["jane"], &s1);
    assert!(context.text.contains("- Jane --[WORKS_AT]--> Acme"));
}
