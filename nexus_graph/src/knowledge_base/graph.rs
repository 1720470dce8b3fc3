//! Graph Store - the shared, session-partitioned property graph.

use std::sync::{Mutex, MutexGuard};
use std::time::{Duration, Instant};

use rusqlite::functions::FunctionFlags;
use rusqlite::{named_params, Connection, OptionalExtension};
use tracing::{debug, info, instrument, warn};

use nexus_schema::{
    is_well_formed_type, EntityKind, EntityRef, QueryId, Relationship, SessionId,
};

use super::raw::{self, Params, Record};
use super::statements as sql;
use super::{
    EdgeRecord, GraphStats, NodeId, NodeRecord, SkipReason, TaggedEdge, TaggedNode, UpsertOutcome,
};
use crate::config::StoreConfig;
use crate::error::{from_sqlite, GraphError, GraphResult};

/// Virtual machine steps between deadline checks.
const PROGRESS_STEPS: i32 = 1_000;

/// Acquire the connection, recovering from a poisoned lock.
fn acquire_lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => {
            warn!("graph connection mutex was poisoned, recovering");
            poisoned.into_inner()
        }
    }
}

/// Register `casefold(text)`, a Unicode-aware `lower()`; SQLite's own only folds ASCII.
fn register_casefold(conn: &Connection) -> rusqlite::Result<()> {
    conn.create_scalar_function(
        sql::CASEFOLD_FN,
        1,
        FunctionFlags::SQLITE_UTF8 | FunctionFlags::SQLITE_DETERMINISTIC,
        |ctx| {
            let text: Option<String> = ctx.get(0)?;
            Ok(text.map(|t| t.to_lowercase()))
        },
    )
}

/// Blank strings count as absent so they never overwrite stored values.
fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

/// The graph store.
///
/// One handle is built at startup and shared (`Arc<GraphStore>`) by the
/// ingestion and retrieval paths. Every operation runs a single bounded-time
/// statement (stats and delete run a short fixed sequence); nothing here
/// spans a multi-statement transaction.
pub struct GraphStore {
    conn: Mutex<Connection>,
    statement_timeout: Duration,
}

impl GraphStore {
    /// Open the store described by `config`, creating tables and constraints.
    pub fn open(config: &StoreConfig) -> GraphResult<Self> {
        info!(path = %config.path.display(), "opening graph store");

        let conn = if config.is_in_memory() {
            Connection::open_in_memory()
        } else {
            if let Some(parent) = config.path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent)?;
            }
            Connection::open(&config.path)
        }
        .map_err(|e| GraphError::Connectivity(format!("cannot open graph store: {e}")))?;

        conn.busy_timeout(config.busy_timeout())
            .map_err(|e| GraphError::Connectivity(e.to_string()))?;
        if !config.is_in_memory() {
            conn.execute_batch("PRAGMA journal_mode = WAL; PRAGMA synchronous = NORMAL;")
                .map_err(|e| GraphError::Connectivity(e.to_string()))?;
        }
        conn.execute_batch("PRAGMA foreign_keys = ON;")
            .map_err(|e| GraphError::Connectivity(e.to_string()))?;
        register_casefold(&conn).map_err(|e| GraphError::Connectivity(e.to_string()))?;

        let store = Self {
            conn: Mutex::new(conn),
            statement_timeout: config.statement_timeout(),
        };
        store.run(|conn| conn.execute_batch(sql::SCHEMA))?;
        store.ensure_constraints();
        Ok(store)
    }

    /// Private in-memory store with default timeouts.
    pub fn open_in_memory() -> GraphResult<Self> {
        Self::open(&StoreConfig::in_memory())
    }

    /// Deadline applied to every statement.
    pub fn statement_timeout(&self) -> Duration {
        self.statement_timeout
    }

    /// Run one unit of work under the statement deadline.
    fn run<T>(&self, work: impl FnOnce(&Connection) -> rusqlite::Result<T>) -> GraphResult<T> {
        let conn = acquire_lock(&self.conn);
        let deadline = Instant::now() + self.statement_timeout;
        conn.progress_handler(PROGRESS_STEPS, Some(move || Instant::now() >= deadline));
        let result = work(&conn);
        conn.progress_handler(0, None::<fn() -> bool>);
        result.map_err(|e| from_sqlite(e, self.statement_timeout))
    }

    /// Declare the per-kind uniqueness constraints.
    ///
    /// Idempotent. A failure is logged and the remaining kinds are still
    /// attempted; the store stays usable either way. Returns how many
    /// constraints are in place.
    pub fn ensure_constraints(&self) -> usize {
        let mut in_place = 0;
        for kind in EntityKind::ALL {
            match self.run(|conn| conn.execute_batch(sql::constraint(kind))) {
                Ok(()) => in_place += 1,
                Err(e) if e.to_string().contains("already exists") => in_place += 1,
                Err(e) => {
                    let err = GraphError::ConstraintSetup {
                        label: kind.label(),
                        reason: e.to_string(),
                    };
                    warn!(error = %err, "constraint not created");
                }
            }
        }
        debug!(in_place, "constraints ensured");
        in_place
    }

    /// Merge a node keyed by `(kind, name, session_id)`.
    ///
    /// Only attributes with values are written; `query_id` is set when given.
    /// An empty name is skipped, not an error.
    #[instrument(skip_all, fields(kind = %entity.kind(), name = entity.name()))]
    pub fn upsert_entity(
        &self,
        entity: EntityRef<'_>,
        session_id: &SessionId,
        query_id: Option<&QueryId>,
    ) -> GraphResult<UpsertOutcome> {
        if let Err(reason) = entity.validate() {
            debug!(%reason, "skipping entity");
            return Ok(UpsertOutcome::Skipped(SkipReason::EmptyName));
        }

        let name = entity.name();
        let session = session_id.as_str();
        let query = query_id.map(QueryId::as_str);

        let result = self.run(|conn| match entity {
            EntityRef::Organization(e) => conn.execute(
                sql::UPSERT_ORGANIZATION,
                named_params! {
                    ":name": name,
                    ":session_id": session,
                    ":query_id": query,
                    ":description": present(&e.description),
                    ":org_type": present(&e.org_type),
                    ":industry": present(&e.industry),
                    ":location": present(&e.location),
                },
            ),
            EntityRef::Person(e) => conn.execute(
                sql::UPSERT_PERSON,
                named_params! {
                    ":name": name,
                    ":session_id": session,
                    ":query_id": query,
                    ":description": present(&e.description),
                    ":role": present(&e.role),
                    ":affiliation": present(&e.affiliation),
                },
            ),
            EntityRef::Concept(e) => conn.execute(
                sql::UPSERT_CONCEPT,
                named_params! {
                    ":name": name,
                    ":session_id": session,
                    ":query_id": query,
                    ":description": present(&e.description),
                    ":category": present(&e.category),
                },
            ),
            EntityRef::Location(e) => conn.execute(
                sql::UPSERT_LOCATION,
                named_params! {
                    ":name": name,
                    ":session_id": session,
                    ":query_id": query,
                    ":location_type": present(&e.location_type),
                },
            ),
            EntityRef::Event(e) => conn.execute(
                sql::UPSERT_EVENT,
                named_params! {
                    ":name": name,
                    ":session_id": session,
                    ":query_id": query,
                    ":description": present(&e.description),
                    ":date": present(&e.date),
                },
            ),
        });

        match result {
            Ok(_) => Ok(UpsertOutcome::Written),
            Err(e) => {
                let err = if e.is_connectivity() {
                    e
                } else {
                    GraphError::Upsert {
                        record: format!("{} '{}'", entity.kind(), name),
                        reason: e.to_string(),
                    }
                };
                warn!(error = %err, "entity upsert failed, skipping");
                Err(err)
            }
        }
    }

    /// Merge a directed edge between two nodes of the same session.
    ///
    /// Endpoints are matched by name strictly within `session_id`. When either
    /// is missing nothing is written and no node is created.
    #[instrument(skip_all, fields(source = rel.source_name(), target = rel.target_name()))]
    pub fn upsert_relationship(
        &self,
        rel: &Relationship,
        session_id: &SessionId,
        query_id: Option<&QueryId>,
    ) -> GraphResult<UpsertOutcome> {
        if let Err(reason) = rel.validate() {
            debug!(%reason, "skipping relationship");
            return Ok(UpsertOutcome::Skipped(SkipReason::MissingEndpoint));
        }

        let rel_type = rel.normalized_type();
        let record = format!("{} -[{}]-> {}", rel.source_name(), rel_type, rel.target_name());
        if !is_well_formed_type(&rel_type) {
            let err = GraphError::Upsert {
                record,
                reason: format!("malformed relationship type '{}'", rel.rel_type),
            };
            warn!(error = %err, "relationship upsert failed, skipping");
            return Err(err);
        }

        let result = self.run(|conn| {
            conn.execute(
                sql::UPSERT_RELATIONSHIP,
                named_params! {
                    ":source": rel.source_name(),
                    ":target": rel.target_name(),
                    ":session_id": session_id.as_str(),
                    ":rel_type": rel_type,
                    ":evidence": present(&rel.evidence),
                    ":query_id": query_id.map(QueryId::as_str),
                },
            )
        });

        match result {
            Ok(0) => {
                debug!(%record, "endpoint missing in session, skipping");
                Ok(UpsertOutcome::Skipped(SkipReason::MissingEndpoint))
            }
            Ok(_) => Ok(UpsertOutcome::Written),
            Err(e) => {
                let err = if e.is_connectivity() {
                    e
                } else {
                    GraphError::Upsert {
                        record,
                        reason: e.to_string(),
                    }
                };
                warn!(error = %err, "relationship upsert failed, skipping");
                Err(err)
            }
        }
    }

    /// Escape hatch for read and maintenance statements.
    ///
    /// Parameters are bound by name (`:sid` reads `params["sid"]`).
    pub fn raw_query(&self, statement: &str, params: &Params) -> GraphResult<Vec<Record>> {
        self.run(|conn| raw::query(conn, statement, params))
    }

    /// Node and edge counts, optionally for one session.
    ///
    /// A session's edges are those with both endpoints in it. Failures are
    /// logged and reported as zero.
    pub fn stats(&self, session_id: Option<&SessionId>) -> GraphStats {
        let counts = self.run(|conn| {
            let (nodes, edges): (i64, i64) = match session_id {
                Some(session) => (
                    conn.query_row(
                        sql::COUNT_NODES_IN_SESSION,
                        named_params! { ":session_id": session.as_str() },
                        |row| row.get(0),
                    )?,
                    conn.query_row(
                        sql::COUNT_EDGES_IN_SESSION,
                        named_params! { ":session_id": session.as_str() },
                        |row| row.get(0),
                    )?,
                ),
                None => (
                    conn.query_row(sql::COUNT_NODES, [], |row| row.get(0))?,
                    conn.query_row(sql::COUNT_EDGES, [], |row| row.get(0))?,
                ),
            };
            Ok(GraphStats {
                nodes: nodes.max(0) as u64,
                edges: edges.max(0) as u64,
            })
        });

        counts.unwrap_or_else(|e| {
            warn!(error = %e, "stats unavailable, reporting zero");
            GraphStats::default()
        })
    }

    /// Remove a session's nodes and every edge touching them, or the whole
    /// graph when unscoped. Returns what was removed.
    pub fn delete(&self, session_id: Option<&SessionId>) -> GraphResult<GraphStats> {
        let removed = self.run(|conn| match session_id {
            Some(session) => {
                let edges: i64 = conn.query_row(
                    sql::COUNT_EDGES_TOUCHING_SESSION,
                    named_params! { ":session_id": session.as_str() },
                    |row| row.get(0),
                )?;
                let nodes = conn.execute(
                    sql::DELETE_SESSION,
                    named_params! { ":session_id": session.as_str() },
                )?;
                Ok(GraphStats {
                    nodes: nodes as u64,
                    edges: edges.max(0) as u64,
                })
            }
            None => {
                let edges: i64 = conn.query_row(sql::COUNT_EDGES, [], |row| row.get(0))?;
                let nodes = conn.execute(sql::DELETE_ALL, [])?;
                Ok(GraphStats {
                    nodes: nodes as u64,
                    edges: edges.max(0) as u64,
                })
            }
        });

        match &removed {
            Ok(stats) => info!(
                session = session_id.map(SessionId::as_str).unwrap_or("<all>"),
                nodes = stats.nodes,
                edges = stats.edges,
                "graph data deleted"
            ),
            Err(e) => warn!(error = %e, "delete failed"),
        }
        removed
    }

    /// Case-insensitive substring match on node names within one session.
    ///
    /// Case is folded with Unicode rules on both sides. Ties are broken by
    /// folded name, then node id.
    pub fn search_nodes(
        &self,
        query: &str,
        session_id: &SessionId,
        limit: usize,
    ) -> GraphResult<Vec<NodeRecord>> {
        let folded = query.trim().to_lowercase();
        self.run(|conn| {
            let mut stmt = conn.prepare_cached(sql::SEARCH_NODES)?;
            let rows = stmt.query_map(
                named_params! {
                    ":session_id": session_id.as_str(),
                    ":query": folded,
                    ":limit": limit as i64,
                },
                |row| {
                    Ok(NodeRecord {
                        id: NodeId(row.get(0)?),
                        name: row.get(1)?,
                        label: row.get(2)?,
                        description: row.get(3)?,
                    })
                },
            )?;
            rows.collect()
        })
        .inspect_err(|e| warn!(error = %e, query, "node search failed"))
    }

    /// Direct edges touching any of `node_ids`, both endpoints in session,
    /// at most `limit` in total.
    pub fn get_neighborhood(
        &self,
        node_ids: &[NodeId],
        session_id: &SessionId,
        limit: usize,
    ) -> GraphResult<Vec<EdgeRecord>> {
        if node_ids.is_empty() {
            return Ok(Vec::new());
        }
        let ids = serde_json::to_string(node_ids)
            .map_err(|e| GraphError::Query(format!("cannot encode node ids: {e}")))?;

        self.run(|conn| {
            let mut stmt = conn.prepare_cached(sql::NEIGHBORHOOD)?;
            let rows = stmt.query_map(
                named_params! {
                    ":node_ids": ids,
                    ":session_id": session_id.as_str(),
                    ":limit": limit as i64,
                },
                |row| {
                    Ok(EdgeRecord {
                        source: row.get(0)?,
                        relationship: row.get(1)?,
                        target: row.get(2)?,
                        evidence: row.get(3)?,
                    })
                },
            )?;
            rows.collect()
        })
        .inspect_err(|e| warn!(error = %e, "neighborhood expansion failed"))
    }

    /// Tagged nodes only; legacy nodes without a query tag never appear.
    pub fn query_tagged_nodes(
        &self,
        session_id: Option<&SessionId>,
        query_id: Option<&QueryId>,
    ) -> GraphResult<Vec<TaggedNode>> {
        self.run(|conn| {
            let mut stmt = conn.prepare_cached(sql::TAGGED_NODES)?;
            let rows = stmt.query_map(
                named_params! {
                    ":session_id": session_id.map(SessionId::as_str),
                    ":query_id": query_id.map(QueryId::as_str),
                },
                |row| {
                    Ok(TaggedNode {
                        id: NodeId(row.get(0)?),
                        name: row.get(1)?,
                        label: row.get(2)?,
                        session_id: row.get(3)?,
                        query_id: row.get(4)?,
                        description: row.get(5)?,
                    })
                },
            )?;
            rows.collect()
        })
    }

    /// Tagged edges only; legacy edges without a query tag never appear.
    pub fn query_tagged_edges(
        &self,
        session_id: Option<&SessionId>,
        query_id: Option<&QueryId>,
    ) -> GraphResult<Vec<TaggedEdge>> {
        self.run(|conn| {
            let mut stmt = conn.prepare_cached(sql::TAGGED_EDGES)?;
            let rows = stmt.query_map(
                named_params! {
                    ":session_id": session_id.map(SessionId::as_str),
                    ":query_id": query_id.map(QueryId::as_str),
                },
                |row| {
                    Ok(TaggedEdge {
                        source: NodeId(row.get(0)?),
                        target: NodeId(row.get(1)?),
                        relationship: row.get(2)?,
                        evidence: row.get(3)?,
                        query_id: row.get(4)?,
                    })
                },
            )?;
            rows.collect()
        })
    }

    /// Look up one node's id by kind and name within a session.
    pub fn find_node(
        &self,
        kind: EntityKind,
        name: &str,
        session_id: &SessionId,
    ) -> GraphResult<Option<NodeId>> {
        self.run(|conn| {
            conn.query_row(
                "SELECT id FROM entities WHERE label = :label AND name = :name AND session_id = :session_id",
                named_params! {
                    ":label": kind.label(),
                    ":name": name.trim(),
                    ":session_id": session_id.as_str(),
                },
                |row| row.get(0).map(NodeId),
            )
            .optional()
        })
    }
}
