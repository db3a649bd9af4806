use async_graphql_value::Name;
use derive_more::Display;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Display)]
pub enum Direction {
    /// seen from the table holding the foreign key
    #[display(fmt = "forward")]
    Forward,
    /// seen from the referenced table, one remote row to many local rows
    #[display(fmt = "backward")]
    Backward,
}

/// A foreign key between two entities. `local_entity` always holds the key columns; the
/// direction says from which end the relationship was advertised.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Relationship {
    pub local_entity: Name,
    pub remote_entity: Name,
    pub local_attributes: Vec<Name>,
    #[serde(default)]
    pub remote_attributes: Vec<Name>,
    #[serde(default)]
    pub is_referencee: bool,
}

impl Relationship {
    pub fn direction(&self) -> Direction {
        if self.is_referencee {
            Direction::Backward
        } else {
            Direction::Forward
        }
    }

    //composite keys are named after their first column only
    pub fn first_local_attribute(&self) -> Option<&Name> {
        self.local_attributes.first()
    }
}

/// entity -> relationship key -> relationship, as advertised by the host
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RelationRegistry {
    relations: BTreeMap<String, BTreeMap<String, Relationship>>,
}

impl RelationRegistry {
    pub fn insert(&mut self, entity: &str, key: impl Into<String>, relationship: Relationship) {
        self.relations
            .entry(entity.to_string())
            .or_default()
            .insert(key.into(), relationship);
    }

    pub fn get(&self, entity: &str, key: &str) -> Option<&Relationship> {
        self.relations.get(entity).and_then(|relations| relations.get(key))
    }

    /// Every relationship exactly once, ordered by entity then key.
    pub fn read(&self) -> impl Iterator<Item = &Relationship> {
        self.relations.values().flat_map(|relations| relations.values())
    }

    pub fn len(&self) -> usize {
        self.relations.values().map(BTreeMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
