//! Fixed statement templates, one per operation.
//!
//! Entity upserts are selected by kind; every value is a bound parameter.

use nexus_schema::EntityKind;

pub(crate) const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS entities (
    id            INTEGER PRIMARY KEY AUTOINCREMENT,
    label         TEXT NOT NULL,
    name          TEXT NOT NULL,
    session_id    TEXT NOT NULL,
    query_id      TEXT,
    description   TEXT,
    org_type      TEXT,
    industry      TEXT,
    location      TEXT,
    role          TEXT,
    affiliation   TEXT,
    category      TEXT,
    location_type TEXT,
    date          TEXT
);
CREATE INDEX IF NOT EXISTS idx_entities_session ON entities(session_id, name);
CREATE INDEX IF NOT EXISTS idx_entities_query ON entities(query_id);

CREATE TABLE IF NOT EXISTS relationships (
    id        INTEGER PRIMARY KEY AUTOINCREMENT,
    source_id INTEGER NOT NULL REFERENCES entities(id) ON DELETE CASCADE,
    target_id INTEGER NOT NULL REFERENCES entities(id) ON DELETE CASCADE,
    rel_type  TEXT NOT NULL,
    evidence  TEXT,
    query_id  TEXT,
    UNIQUE (source_id, target_id, rel_type)
);
CREATE INDEX IF NOT EXISTS idx_relationships_target ON relationships(target_id);
";

/// Per-kind uniqueness of `(name, session_id)`.
pub(crate) fn constraint(kind: EntityKind) -> &'static str {
    match kind {
        EntityKind::Organization => {
            "CREATE UNIQUE INDEX IF NOT EXISTS uq_organization_name
             ON entities(name, session_id) WHERE label = 'Organization'"
        }
        EntityKind::Person => {
            "CREATE UNIQUE INDEX IF NOT EXISTS uq_person_name
             ON entities(name, session_id) WHERE label = 'Person'"
        }
        EntityKind::Concept => {
            "CREATE UNIQUE INDEX IF NOT EXISTS uq_concept_name
             ON entities(name, session_id) WHERE label = 'Concept'"
        }
        EntityKind::Location => {
            "CREATE UNIQUE INDEX IF NOT EXISTS uq_location_name
             ON entities(name, session_id) WHERE label = 'Location'"
        }
        EntityKind::Event => {
            "CREATE UNIQUE INDEX IF NOT EXISTS uq_event_name
             ON entities(name, session_id) WHERE label = 'Event'"
        }
    }
}

// The conflict target is omitted so the merge keys on whichever per-kind
// unique index exists; a missing index degrades to a plain insert.

pub(crate) const UPSERT_ORGANIZATION: &str = "
INSERT INTO entities (label, name, session_id, query_id, description, org_type, industry, location)
VALUES ('Organization', :name, :session_id, :query_id, :description, :org_type, :industry, :location)
ON CONFLICT DO UPDATE SET
    query_id    = COALESCE(excluded.query_id, entities.query_id),
    description = COALESCE(excluded.description, entities.description),
    org_type    = COALESCE(excluded.org_type, entities.org_type),
    industry    = COALESCE(excluded.industry, entities.industry),
    location    = COALESCE(excluded.location, entities.location)
";

pub(crate) const UPSERT_PERSON: &str = "
INSERT INTO entities (label, name, session_id, query_id, description, role, affiliation)
VALUES ('Person', :name, :session_id, :query_id, :description, :role, :affiliation)
ON CONFLICT DO UPDATE SET
    query_id    = COALESCE(excluded.query_id, entities.query_id),
    description = COALESCE(excluded.description, entities.description),
    role        = COALESCE(excluded.role, entities.role),
    affiliation = COALESCE(excluded.affiliation, entities.affiliation)
";

pub(crate) const UPSERT_CONCEPT: &str = "
INSERT INTO entities (label, name, session_id, query_id, description, category)
VALUES ('Concept', :name, :session_id, :query_id, :description, :category)
ON CONFLICT DO UPDATE SET
    query_id    = COALESCE(excluded.query_id, entities.query_id),
    description = COALESCE(excluded.description, entities.description),
    category    = COALESCE(excluded.category, entities.category)
";

pub(crate) const UPSERT_LOCATION: &str = "
INSERT INTO entities (label, name, session_id, query_id, location_type)
VALUES ('Location', :name, :session_id, :query_id, :location_type)
ON CONFLICT DO UPDATE SET
    query_id      = COALESCE(excluded.query_id, entities.query_id),
    location_type = COALESCE(excluded.location_type, entities.location_type)
";

pub(crate) const UPSERT_EVENT: &str = "
INSERT INTO entities (label, name, session_id, query_id, description, date)
VALUES ('Event', :name, :session_id, :query_id, :description, :date)
ON CONFLICT DO UPDATE SET
    query_id    = COALESCE(excluded.query_id, entities.query_id),
    description = COALESCE(excluded.description, entities.description),
    date        = COALESCE(excluded.date, entities.date)
";

/// Endpoints are resolved inside the statement; no match inserts nothing.
pub(crate) const UPSERT_RELATIONSHIP: &str = "
INSERT INTO relationships (source_id, target_id, rel_type, evidence, query_id)
SELECT a.id, b.id, :rel_type, :evidence, :query_id
FROM entities a, entities b
WHERE a.name = :source AND a.session_id = :session_id
  AND b.name = :target AND b.session_id = :session_id
ON CONFLICT (source_id, target_id, rel_type) DO UPDATE SET
    evidence = COALESCE(excluded.evidence, relationships.evidence),
    query_id = COALESCE(excluded.query_id, relationships.query_id)
";

/// Name of the Unicode-aware lowercase function registered on every connection.
pub(crate) const CASEFOLD_FN: &str = "casefold";

/// `:query` is expected already folded.
pub(crate) const SEARCH_NODES: &str = "
SELECT id, name, label, description
FROM entities
WHERE session_id = :session_id
  AND instr(casefold(name), :query) > 0
ORDER BY casefold(name), id
LIMIT :limit
";

/// `:node_ids` is a JSON array of node ids.
pub(crate) const NEIGHBORHOOD: &str = "
SELECT s.name, r.rel_type, t.name, r.evidence
FROM relationships r
JOIN entities s ON s.id = r.source_id
JOIN entities t ON t.id = r.target_id
WHERE (r.source_id IN (SELECT value FROM json_each(:node_ids))
       OR r.target_id IN (SELECT value FROM json_each(:node_ids)))
  AND s.session_id = :session_id
  AND t.session_id = :session_id
ORDER BY r.id
LIMIT :limit
";

pub(crate) const COUNT_NODES: &str = "SELECT count(*) FROM entities";

pub(crate) const COUNT_NODES_IN_SESSION: &str =
    "SELECT count(*) FROM entities WHERE session_id = :session_id";

pub(crate) const COUNT_EDGES: &str = "SELECT count(*) FROM relationships";

pub(crate) const COUNT_EDGES_IN_SESSION: &str = "
SELECT count(*)
FROM relationships r
JOIN entities s ON s.id = r.source_id
JOIN entities t ON t.id = r.target_id
WHERE s.session_id = :session_id AND t.session_id = :session_id
";

pub(crate) const COUNT_EDGES_TOUCHING_SESSION: &str = "
SELECT count(*)
FROM relationships r
WHERE r.source_id IN (SELECT id FROM entities WHERE session_id = :session_id)
   OR r.target_id IN (SELECT id FROM entities WHERE session_id = :session_id)
";

/// Edges go with their endpoints through `ON DELETE CASCADE`.
pub(crate) const DELETE_SESSION: &str = "DELETE FROM entities WHERE session_id = :session_id";

pub(crate) const DELETE_ALL: &str = "DELETE FROM entities";

pub(crate) const TAGGED_NODES: &str = "
SELECT id, name, label, session_id, query_id, description
FROM entities
WHERE query_id IS NOT NULL
  AND (:session_id IS NULL OR session_id = :session_id)
  AND (:query_id IS NULL OR query_id = :query_id)
ORDER BY id
";

pub(crate) const TAGGED_EDGES: &str = "
SELECT r.source_id, r.target_id, r.rel_type, r.evidence, r.query_id
FROM relationships r
JOIN entities s ON s.id = r.source_id
WHERE r.query_id IS NOT NULL
  AND (:session_id IS NULL OR s.session_id = :session_id)
  AND (:query_id IS NULL OR r.query_id = :query_id)
ORDER BY r.id
";
