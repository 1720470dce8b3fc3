//! The extraction batch - everything one extraction call produced.

use serde::{Deserialize, Serialize};

use crate::{
    Concept, EntityRef, Event, Location, Organization, Person, Relationship, SchemaResult,
};

/// Container for all entities and relationships found in one piece of text.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionBatch {
    pub organizations: Vec<Organization>,
    pub people: Vec<Person>,
    pub concepts: Vec<Concept>,
    pub locations: Vec<Location>,
    pub events: Vec<Event>,
    pub relationships: Vec<Relationship>,
}

impl ExtractionBatch {
    /// Create an empty batch.
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode the producer's JSON output.
    pub fn from_json(json: &str) -> SchemaResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Add an organization.
    pub fn with_organization(mut self, organization: Organization) -> Self {
        self.organizations.push(organization);
        self
    }

    /// Add a person.
    pub fn with_person(mut self, person: Person) -> Self {
        self.people.push(person);
        self
    }

    /// Add a concept.
    pub fn with_concept(mut self, concept: Concept) -> Self {
        self.concepts.push(concept);
        self
    }

    /// Add a location.
    pub fn with_location(mut self, location: Location) -> Self {
        self.locations.push(location);
        self
    }

    /// Add an event.
    pub fn with_event(mut self, event: Event) -> Self {
        self.events.push(event);
        self
    }

    /// Add a relationship.
    pub fn with_relationship(mut self, relationship: Relationship) -> Self {
        self.relationships.push(relationship);
        self
    }

    /// Entities across all kinds, relationships excluded.
    pub fn total_entity_count(&self) -> usize {
        self.organizations.len()
            + self.people.len()
            + self.concepts.len()
            + self.locations.len()
            + self.events.len()
    }

    /// True when there is nothing to write.
    pub fn is_empty(&self) -> bool {
        self.total_entity_count() == 0 && self.relationships.is_empty()
    }

    /// One-line description for logs.
    pub fn summary(&self) -> String {
        format!(
            "{} orgs, {} people, {} concepts, {} relationships",
            self.organizations.len(),
            self.people.len(),
            self.concepts.len(),
            self.relationships.len()
        )
    }

    /// Every entity in the batch, grouped by kind.
    pub fn entities(&self) -> impl Iterator<Item = EntityRef<'_>> {
        self.organizations
            .iter()
            .map(EntityRef::from)
            .chain(self.people.iter().map(EntityRef::from))
            .chain(self.concepts.iter().map(EntityRef::from))
            .chain(self.locations.iter().map(EntityRef::from))
            .chain(self.events.iter().map(EntityRef::from))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::EntityKind;

    fn sample_batch() -> ExtractionBatch {
        ExtractionBatch::new()
            .with_organization(Organization::new("Acme"))
            .with_person(Person::new("Jane").with_role("Founder"))
            .with_concept(Concept::new("Rockets"))
            .with_location(Location::new("Nevada"))
            .with_relationship(Relationship::new("Acme", "Jane", "FOUNDED_BY"))
    }

    #[test]
    fn test_counts_and_summary() {
        let batch = sample_batch();
        assert_eq!(batch.total_entity_count(), 4);
        assert!(!batch.is_empty());
        assert_eq!(batch.summary(), "1 orgs, 1 people, 1 concepts, 1 relationships");
    }

    #[test]
    fn test_empty_batch() {
        let batch = ExtractionBatch::new();
        assert!(batch.is_empty());
        assert_eq!(batch.entities().count(), 0);
    }

    #[test]
    fn test_relationships_alone_are_not_empty() {
        let batch = ExtractionBatch::new().with_relationship(Relationship::new("A", "B", "KNOWS"));
        assert_eq!(batch.total_entity_count(), 0);
        assert!(!batch.is_empty());
    }

    #[test]
    fn test_entities_iterates_every_kind() {
        let kinds: Vec<_> = sample_batch().entities().map(|e| e.kind()).collect();
        assert_eq!(
            kinds,
            vec![
                EntityKind::Organization,
                EntityKind::Person,
                EntityKind::Concept,
                EntityKind::Location,
            ]
        );
    }

    #[test]
    fn test_from_json_with_missing_sections() {
        let batch = ExtractionBatch::from_json(
            r#"{
                "organizations": [{"name": "Acme", "industry": "Aerospace"}],
                "relationships": [{"source": "Acme", "target": "Jane", "type": "founded by", "evidence": "Jane started Acme"}]
            }"#,
        )
        .unwrap();

        assert_eq!(batch.organizations[0].industry.as_deref(), Some("Aerospace"));
        assert!(batch.people.is_empty());
        assert_eq!(batch.relationships.len(), 1);
    }

    #[test]
    fn test_from_json_rejects_garbage() {
        assert!(ExtractionBatch::from_json("not json").is_err());
        assert!(ExtractionBatch::from_json(r#"{"people": [{"role": "CEO"}]}"#).is_err());
    }
}
