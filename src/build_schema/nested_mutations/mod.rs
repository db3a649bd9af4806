#[cfg(test)]
#[path = "./test.rs"]
mod test;
use crate::build_schema::inflection;
use crate::build_schema::relations::{Direction, Relationship};
use crate::build_schema::type_registry::{
    extend, list_of, named, ExtendOutcome, InputField, InputFields, TypeScope,
};
use crate::build_schema::{BuildContext, InputTypeContext, SchemaPlugin};
use crate::error::BuildError;
use async_graphql_value::Name;
use serde::Deserialize;
use std::collections::HashMap;

const PLUGIN_NAME: &str = "NestedMutationsPlugin";

/// What to do when a relationship field would take a name the input type already uses for
/// something else.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConflictPolicy {
    /// log and leave the existing field alone
    #[default]
    Warn,
    /// abort the schema build
    Fail,
}

/// The synthesized input type of one relationship direction.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DerivedInputDescriptor {
    pub type_name: Name,
    pub field_name: Name,
    pub direction: Direction,
    pub local_entity: Name,
    pub remote_entity: Name,
    pub key_attribute: Name,
    /// the entity input the field is attached to
    pub owner_input: Option<Name>,
    /// the entity input offered under `create`
    pub related_input: Option<Name>,
    local_input: Option<Name>,
    remote_input: Option<Name>,
}

impl DerivedInputDescriptor {
    fn same_relationship(&self, other: &DerivedInputDescriptor) -> bool {
        self.direction == other.direction
            && self.local_entity == other.local_entity
            && self.remote_entity == other.remote_entity
            && self.key_attribute == other.key_attribute
    }

    fn describe(&self) -> String {
        format!(
            "{}.{} -> {} ({})",
            self.local_entity, self.key_attribute, self.remote_entity, self.direction
        )
    }
}

/// Entity input type name -> descriptors whose local or remote entity resolves to it.
#[derive(Debug, Default)]
pub struct RelationshipIndex {
    descriptors: Vec<DerivedInputDescriptor>,
    by_type_name: HashMap<Name, usize>,
    by_input_type: HashMap<Name, Vec<usize>>,
}

impl RelationshipIndex {
    /// Returns false, leaving the index untouched, if the type name is already indexed.
    pub fn insert(&mut self, descriptor: DerivedInputDescriptor) -> bool {
        if self.by_type_name.contains_key(&descriptor.type_name) {
            return false;
        }
        let position = self.descriptors.len();
        self.by_type_name
            .insert(descriptor.type_name.clone(), position);
        for input in descriptor
            .local_input
            .iter()
            .chain(descriptor.remote_input.iter())
        {
            let entries = self.by_input_type.entry(input.clone()).or_default();
            //self referencing relationships resolve both ends to the same input
            if !entries.contains(&position) {
                entries.push(position);
            }
        }
        self.descriptors.push(descriptor);
        true
    }

    pub fn get(&self, type_name: &str) -> Option<&DerivedInputDescriptor> {
        self.by_type_name
            .get(type_name)
            .map(|position| &self.descriptors[*position])
    }

    pub fn touching<'a>(
        &'a self,
        input_type: &str,
    ) -> impl Iterator<Item = &'a DerivedInputDescriptor> + 'a {
        self.by_input_type
            .get(input_type)
            .into_iter()
            .flatten()
            .map(move |position| &self.descriptors[*position])
    }

    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }
}

/// Build scoped state, kept in the [`BuildContext`] under this type.
#[derive(Debug, Default)]
pub struct NestedMutationsState {
    pub index: RelationshipIndex,
}

/// Derives a `create`/`update`/`deleteOthers` input type for every relationship direction
/// and hangs it off the owning entity's mutation input.
#[derive(Debug, Default)]
pub struct NestedMutationsPlugin {
    conflict_policy: ConflictPolicy,
}

impl NestedMutationsPlugin {
    pub fn new(conflict_policy: ConflictPolicy) -> Self {
        NestedMutationsPlugin { conflict_policy }
    }

    fn describe_relationship(
        ctx: &BuildContext,
        relationship: &Relationship,
    ) -> Result<DerivedInputDescriptor, BuildError> {
        let type_name = inflection::relation_type_name(relationship)?;
        let key_attribute = relationship
            .first_local_attribute()
            .cloned()
            .ok_or_else(|| BuildError::MissingKeyAttribute {
                local: relationship.local_entity.clone(),
                remote: relationship.remote_entity.clone(),
            })?;
        let local_input = ctx.input_type_name(relationship.local_entity.as_str());
        let remote_input = ctx.input_type_name(relationship.remote_entity.as_str());
        let (owner_input, related_input) = match relationship.direction() {
            Direction::Forward => (remote_input.clone(), local_input.clone()),
            Direction::Backward => (local_input.clone(), remote_input.clone()),
        };
        Ok(DerivedInputDescriptor {
            type_name,
            field_name: inflection::relation_field_name(relationship),
            direction: relationship.direction(),
            local_entity: relationship.local_entity.clone(),
            remote_entity: relationship.remote_entity.clone(),
            key_attribute,
            owner_input,
            related_input,
            local_input,
            remote_input,
        })
    }

    /// Registers the derived input type of `relationship` and relaxes its key attribute.
    /// Running it again for the same relationship changes nothing.
    pub fn synthesize(
        &self,
        ctx: &mut BuildContext,
        relationship: &Relationship,
    ) -> Result<(), BuildError> {
        let descriptor = Self::describe_relationship(ctx, relationship)?;

        let state = ctx
            .typed_get::<NestedMutationsState>()
            .ok_or(BuildError::MissingState(PLUGIN_NAME))?;
        if let Some(existing) = state.index.get(descriptor.type_name.as_str()) {
            if existing.same_relationship(&descriptor) {
                tracing::debug!(type_name = %descriptor.type_name, "relationship already synthesized");
            } else {
                tracing::warn!(
                    type_name = %descriptor.type_name,
                    kept = %existing.describe(),
                    dropped = %descriptor.describe(),
                    "relationships derive the same input type name, keeping the first"
                );
            }
            return Ok(());
        }

        //a create list only makes sense when the type hangs off an owner
        let create_input = descriptor
            .owner_input
            .as_ref()
            .and(descriptor.related_input.clone());
        let description = format!(
            "Nested mutations on `{}` through `{}`",
            descriptor.local_entity, descriptor.key_attribute
        );
        let origin = descriptor.describe();
        let registered = ctx.registry.register_input_object_type(
            descriptor.type_name.clone(),
            TypeScope {
                is_input_type: true,
                is_mutation_input: true,
                ..Default::default()
            },
            Some(description),
            &origin,
            Box::new(move |ctx: &BuildContext| -> Result<InputFields, BuildError> {
                let mut fields = InputFields::new();
                if let Some(create_input) = &create_input {
                    let create = InputField::new(
                        "create",
                        list_of(ctx.registry.input_type_ref(create_input.as_str())?, true),
                    );
                    fields.insert(create.name.clone(), create);
                }
                let update = InputField::new("update", named(&Name::new("String"), true))
                    .with_description("Reference to an existing row to attach");
                fields.insert(update.name.clone(), update);
                let delete_others =
                    InputField::new("deleteOthers", named(&Name::new("Boolean"), true))
                        .with_description("Remove related rows not referenced by this mutation");
                fields.insert(delete_others.name.clone(), delete_others);
                Ok(fields)
            }),
        );
        //the name belongs to some other type, no field may point at it
        if !registered {
            return Ok(());
        }

        //nested creates get the key from the parent mutation
        ctx.nullable_overrides
            .relax(&descriptor.local_entity, &descriptor.key_attribute);
        ctx.typed_get_mut::<NestedMutationsState>()
            .ok_or(BuildError::MissingState(PLUGIN_NAME))?
            .index
            .insert(descriptor);
        Ok(())
    }

    /// Attaches a field for every relationship owned by `self_name`. Fields already present
    /// are never replaced, so running this twice yields the same field set.
    pub fn inject_fields(
        &self,
        mut fields: InputFields,
        ctx: &BuildContext,
        self_name: &Name,
    ) -> Result<InputFields, BuildError> {
        let state = match ctx.typed_get::<NestedMutationsState>() {
            Some(state) => state,
            None => return Ok(fields),
        };
        for descriptor in state
            .index
            .touching(self_name.as_str())
            .filter(|descriptor| descriptor.owner_input.as_ref() == Some(self_name))
        {
            let field = InputField::new(
                descriptor.field_name.clone(),
                ctx.registry.input_type_ref(descriptor.type_name.as_str())?,
            );
            match extend(&mut fields, field, self_name.as_str()) {
                ExtendOutcome::Added => {
                    tracing::trace!(type_name = %self_name, field = %descriptor.field_name, "nested field added")
                }
                ExtendOutcome::SkippedAsDuplicate => {}
                ExtendOutcome::Conflict(detail) => match self.conflict_policy {
                    ConflictPolicy::Warn => {
                        tracing::warn!(type_name = %self_name, "{}", detail)
                    }
                    ConflictPolicy::Fail => {
                        return Err(BuildError::FieldConflict {
                            type_name: self_name.clone(),
                            detail,
                        })
                    }
                },
            }
        }
        Ok(fields)
    }
}

impl SchemaPlugin for NestedMutationsPlugin {
    fn name(&self) -> &'static str {
        PLUGIN_NAME
    }

    fn build(&self, ctx: &mut BuildContext) -> Result<(), BuildError> {
        ctx.typed_insert(NestedMutationsState::default());
        Ok(())
    }

    fn init(&self, ctx: &mut BuildContext) -> Result<(), BuildError> {
        let relationships: Vec<Relationship> = ctx.relations.read().cloned().collect();
        for relationship in &relationships {
            self.synthesize(ctx, relationship)?;
        }
        tracing::debug!(
            relationships = relationships.len(),
            "nested mutation input types synthesized"
        );
        Ok(())
    }

    fn input_object_fields(
        &self,
        fields: InputFields,
        ctx: &BuildContext,
        this: &InputTypeContext<'_>,
    ) -> Result<InputFields, BuildError> {
        let scope = this.scope;
        if !scope.is_row_type || !scope.is_input_type || !scope.is_mutation_input {
            return Ok(fields);
        }
        self.inject_fields(fields, ctx, this.name)
    }
}
