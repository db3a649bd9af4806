use async_graphql_value::Name;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Attribute {
    pub name: Name,
    /// GraphQL scalar the column maps to
    #[serde(rename = "type")]
    pub ty: Name,
    #[serde(default)]
    pub not_null: bool,
    /// array column, a list of `ty`
    #[serde(default)]
    pub is_list: bool,
}

/// A row-shaped type, e.g. a table.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityDescriptor {
    pub name: Name,
    #[serde(default)]
    pub attributes: Vec<Attribute>,
    #[serde(default = "insertable_by_default")]
    pub insertable: bool,
}

fn insertable_by_default() -> bool {
    true
}

impl EntityDescriptor {
    pub fn attribute(&self, name: &str) -> Option<&Attribute> {
        self.attributes.iter().find(|attribute| attribute.name.as_str() == name)
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityCatalog {
    entities: Vec<EntityDescriptor>,
}

impl EntityCatalog {
    /// Adds `entity`, replacing any entity with the same name.
    pub fn insert(&mut self, entity: EntityDescriptor) {
        match self.entities.iter_mut().find(|e| e.name == entity.name) {
            Some(existing) => *existing = entity,
            None => self.entities.push(entity),
        }
    }

    pub fn get(&self, name: &str) -> Option<&EntityDescriptor> {
        self.entities.iter().find(|entity| entity.name.as_str() == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &EntityDescriptor> {
        self.entities.iter()
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }
}

impl FromIterator<EntityDescriptor> for EntityCatalog {
    fn from_iter<I: IntoIterator<Item = EntityDescriptor>>(iter: I) -> Self {
        let mut catalog = EntityCatalog::default();
        for entity in iter {
            catalog.insert(entity);
        }
        catalog
    }
}

/// Attributes whose not-null constraint is lifted while building mutation inputs. The
/// entity descriptors themselves stay untouched.
#[derive(Clone, Debug, Default)]
pub struct NullableOverrides {
    relaxed: HashSet<(Name, Name)>,
}

impl NullableOverrides {
    /// Returns false if the attribute was already relaxed.
    pub fn relax(&mut self, entity: &Name, attribute: &Name) -> bool {
        self.relaxed.insert((entity.clone(), attribute.clone()))
    }

    pub fn is_relaxed(&self, entity: &str, attribute: &str) -> bool {
        self.relaxed
            .contains(&(Name::new(entity), Name::new(attribute)))
    }

    pub fn len(&self) -> usize {
        self.relaxed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.relaxed.is_empty()
    }

    /// Nullability of `attribute` as seen by mutation inputs.
    pub fn is_nullable(&self, entity: &EntityDescriptor, attribute: &Attribute) -> bool {
        !attribute.not_null || self.is_relaxed(entity.name.as_str(), attribute.name.as_str())
    }
}
