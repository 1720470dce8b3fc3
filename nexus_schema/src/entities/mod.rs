//! Entity definitions for the knowledge graph.

mod kinds;

pub use kinds::*;

use serde::{Deserialize, Serialize};

/// The five node labels a graph entity can carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityKind {
    Organization,
    Person,
    Concept,
    Location,
    Event,
}

impl EntityKind {
    /// Every kind, in ingestion order.
    pub const ALL: [EntityKind; 5] = [
        EntityKind::Organization,
        EntityKind::Person,
        EntityKind::Concept,
        EntityKind::Location,
        EntityKind::Event,
    ];

    /// Node label as persisted in the store.
    pub fn label(&self) -> &'static str {
        match self {
            EntityKind::Organization => "Organization",
            EntityKind::Person => "Person",
            EntityKind::Concept => "Concept",
            EntityKind::Location => "Location",
            EntityKind::Event => "Event",
        }
    }
}

impl std::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// A borrowed view of an entity, as handed to the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityRef<'a> {
    Organization(&'a Organization),
    Person(&'a Person),
    Concept(&'a Concept),
    Location(&'a Location),
    Event(&'a Event),
}

impl<'a> EntityRef<'a> {
    /// The kind this entity is stored under.
    pub fn kind(&self) -> EntityKind {
        match self {
            EntityRef::Organization(_) => EntityKind::Organization,
            EntityRef::Person(_) => EntityKind::Person,
            EntityRef::Concept(_) => EntityKind::Concept,
            EntityRef::Location(_) => EntityKind::Location,
            EntityRef::Event(_) => EntityKind::Event,
        }
    }

    /// The natural key, trimmed of surrounding whitespace.
    pub fn name(&self) -> &'a str {
        let raw = match self {
            EntityRef::Organization(e) => &e.name,
            EntityRef::Person(e) => &e.name,
            EntityRef::Concept(e) => &e.name,
            EntityRef::Location(e) => &e.name,
            EntityRef::Event(e) => &e.name,
        };
        raw.trim()
    }

    /// Boundary check run before the entity reaches the store.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.name().is_empty() {
            return Err(ValidationError::EmptyName { kind: self.kind() });
        }
        Ok(())
    }
}

macro_rules! entity_conversions {
    ($($kind:ident),*) => {
        $(
            impl<'a> From<&'a $kind> for EntityRef<'a> {
                fn from(entity: &'a $kind) -> Self {
                    EntityRef::$kind(entity)
                }
            }
        )*
    };
}

entity_conversions!(Organization, Person, Concept, Location, Event);

/// Malformed extraction records. These are expected and never fatal.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("{kind} entity has an empty name")]
    EmptyName { kind: EntityKind },

    #[error("relationship has an empty {endpoint} name")]
    EmptyEndpoint { endpoint: &'static str },
}
