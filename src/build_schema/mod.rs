pub mod entity;
pub mod inflection;
pub mod nested_mutations;
pub mod read_database;
pub mod relations;
pub mod sdl;
pub mod type_registry;
use crate::error::BuildError;
use async_graphql_parser::types::Type;
use async_graphql_value::Name;
use entity::{Attribute, EntityCatalog, NullableOverrides};
use indexmap::IndexMap;
use relations::RelationRegistry;
use std::any::{Any, TypeId};
use std::collections::HashMap;
use type_registry::{
    list_of, named, InputField, InputFields, InputObjectType, PendingType, TypeRegistry,
    TypeScope,
};

/// Everything a schema build accumulates. It is passed explicitly to every hook and dropped
/// once the schema is finalized.
pub struct BuildContext {
    pub catalog: EntityCatalog,
    pub relations: RelationRegistry,
    pub registry: TypeRegistry,
    pub nullable_overrides: NullableOverrides,
    by_type: HashMap<TypeId, Box<dyn Any>>,
}

impl BuildContext {
    pub fn new(catalog: EntityCatalog, relations: RelationRegistry) -> Self {
        BuildContext {
            catalog,
            relations,
            registry: TypeRegistry::default(),
            nullable_overrides: NullableOverrides::default(),
            by_type: HashMap::new(),
        }
    }

    /// The mutation input type of `entity`, if the entity has one.
    pub fn input_type_name(&self, entity: &str) -> Option<Name> {
        let descriptor = self.catalog.get(entity)?;
        if !descriptor.insertable {
            return None;
        }
        let name = inflection::entity_input_type_name(entity);
        self.registry.contains(name.as_str()).then(|| name)
    }

    pub fn typed_get<T: 'static>(&self) -> Option<&T> {
        self.by_type
            .get(&TypeId::of::<T>())
            .and_then(|value| value.downcast_ref::<T>())
    }

    pub fn typed_get_mut<T: 'static>(&mut self) -> Option<&mut T> {
        self.by_type
            .get_mut(&TypeId::of::<T>())
            .and_then(|value| value.downcast_mut::<T>())
    }

    pub fn typed_insert<T: 'static>(&mut self, value: T) {
        self.by_type.insert(TypeId::of::<T>(), Box::new(value));
    }
}

/// The input type whose fields are being finalized.
#[derive(Debug)]
pub struct InputTypeContext<'a> {
    pub name: &'a Name,
    pub scope: &'a TypeScope,
}

/// Hooks run by [`SchemaBuilder::build`], in order: every plugin's `build`, then every
/// plugin's `init`, then `input_object_fields` once per input type.
pub trait SchemaPlugin {
    fn name(&self) -> &'static str;

    fn build(&self, _ctx: &mut BuildContext) -> Result<(), BuildError> {
        Ok(())
    }

    fn init(&self, _ctx: &mut BuildContext) -> Result<(), BuildError> {
        Ok(())
    }

    fn input_object_fields(
        &self,
        fields: InputFields,
        _ctx: &BuildContext,
        _this: &InputTypeContext<'_>,
    ) -> Result<InputFields, BuildError> {
        Ok(fields)
    }
}

#[derive(Debug)]
pub struct Schema {
    input_types: IndexMap<Name, InputObjectType>,
    scalars: Vec<Name>,
}

impl Schema {
    pub fn input_type(&self, name: &str) -> Option<&InputObjectType> {
        self.input_types.get(name)
    }

    pub fn input_types(&self) -> impl Iterator<Item = &InputObjectType> {
        self.input_types.values()
    }

    pub fn scalars(&self) -> &[Name] {
        &self.scalars
    }

    pub fn to_sdl(&self) -> String {
        sdl::print(self)
    }
}

pub struct SchemaBuilder {
    catalog: EntityCatalog,
    relations: RelationRegistry,
    plugins: Vec<Box<dyn SchemaPlugin>>,
}

impl SchemaBuilder {
    pub fn new(catalog: EntityCatalog, relations: RelationRegistry) -> Self {
        SchemaBuilder {
            catalog,
            relations,
            plugins: Vec::new(),
        }
    }

    pub fn plugin(mut self, plugin: impl SchemaPlugin + 'static) -> Self {
        self.plugins.push(Box::new(plugin));
        self
    }

    pub fn build(self) -> Result<Schema, BuildError> {
        let mut ctx = BuildContext::new(self.catalog, self.relations);
        for plugin in &self.plugins {
            tracing::trace!(plugin = plugin.name(), "build hook");
            plugin.build(&mut ctx)?;
        }
        register_entity_input_types(&mut ctx);
        for plugin in &self.plugins {
            tracing::trace!(plugin = plugin.name(), "init hook");
            plugin.init(&mut ctx)?;
        }
        for PendingType {
            name,
            description,
            scope,
            builder,
        } in ctx.registry.take_pending()
        {
            let mut fields = builder(&ctx)?;
            let this = InputTypeContext {
                name: &name,
                scope: &scope,
            };
            for plugin in &self.plugins {
                fields = plugin.input_object_fields(fields, &ctx, &this)?;
            }
            ctx.registry.insert_built(InputObjectType {
                name,
                description,
                scope,
                fields,
            });
        }
        let (input_types, scalars) = ctx.registry.finish();
        tracing::debug!(input_types = input_types.len(), "schema finalized");
        Ok(Schema {
            input_types,
            scalars,
        })
    }
}

//array elements stay nullable, only the list itself follows the column
fn attribute_type(attribute: &Attribute, nullable: bool) -> Type {
    if attribute.is_list {
        list_of(named(&attribute.ty, true), nullable)
    } else {
        named(&attribute.ty, nullable)
    }
}

/// One `<Entity>Input` per insertable entity, with a field per attribute. Nullability is read
/// when the type is built, after every plugin has had the chance to relax it.
pub(crate) fn register_entity_input_types(ctx: &mut BuildContext) {
    let mut scalars = Vec::new();
    let mut registrations = Vec::new();
    for entity in ctx.catalog.iter().filter(|entity| entity.insertable) {
        scalars.extend(entity.attributes.iter().map(|attribute| attribute.ty.clone()));
        registrations.push(entity.name.clone());
    }
    for scalar in &scalars {
        ctx.registry.register_scalar(scalar);
    }
    for entity_name in registrations {
        let type_name = inflection::entity_input_type_name(entity_name.as_str());
        let description = format!("An input for mutations affecting `{}`", entity_name);
        let scope = TypeScope {
            is_row_type: true,
            is_input_type: true,
            is_mutation_input: true,
            entity: Some(entity_name.clone()),
        };
        let origin = format!("entity {}", entity_name);
        ctx.registry.register_input_object_type(
            type_name,
            scope,
            Some(description),
            &origin,
            Box::new(move |ctx: &BuildContext| -> Result<InputFields, BuildError> {
                let entity = ctx
                    .catalog
                    .get(entity_name.as_str())
                    .ok_or_else(|| BuildError::UnknownEntity(entity_name.clone()))?;
                Ok(entity
                    .attributes
                    .iter()
                    .map(|attribute| {
                        let nullable = ctx.nullable_overrides.is_nullable(entity, attribute);
                        let field = InputField::new(
                            inflection::attribute_field_name(attribute.name.as_str()),
                            attribute_type(attribute, nullable),
                        );
                        (field.name.clone(), field)
                    })
                    .collect())
            }),
        );
    }
}
