use crate::build_schema::BuildContext;
use crate::error::BuildError;
use async_graphql_parser::types::{BaseType, Type};
use async_graphql_value::Name;
use indexmap::{IndexMap, IndexSet};

pub const BUILTIN_SCALARS: [&str; 5] = ["String", "Int", "Float", "Boolean", "ID"];

/// What a registered input type stands for; hooks use it to decide whether to touch the type.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TypeScope {
    pub is_row_type: bool,
    pub is_input_type: bool,
    pub is_mutation_input: bool,
    pub entity: Option<Name>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InputField {
    pub name: Name,
    pub ty: Type,
    pub description: Option<String>,
}

impl InputField {
    pub fn new(name: impl AsRef<str>, ty: Type) -> Self {
        InputField {
            name: Name::new(name),
            ty,
            description: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

pub type InputFields = IndexMap<Name, InputField>;

pub type FieldsBuilder = Box<dyn FnOnce(&BuildContext) -> Result<InputFields, BuildError>>;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InputObjectType {
    pub name: Name,
    pub description: Option<String>,
    pub scope: TypeScope,
    pub fields: InputFields,
}

#[derive(Debug)]
struct Declared {
    scope: TypeScope,
    origin: String,
}

pub(crate) struct PendingType {
    pub name: Name,
    pub description: Option<String>,
    pub scope: TypeScope,
    pub builder: FieldsBuilder,
}

/// Result of attaching one field to a field set.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ExtendOutcome {
    Added,
    /// the same field, with the same type, is already there
    SkippedAsDuplicate,
    /// the name is taken by a field of another type
    Conflict(String),
}

/// Name to input type registry. Types are declared first and built at finalize time, so a
/// type can reference any other declared type regardless of registration order.
#[derive(Default)]
pub struct TypeRegistry {
    declared: IndexMap<Name, Declared>,
    pending: Vec<PendingType>,
    built: IndexMap<Name, InputObjectType>,
    scalars: IndexSet<Name>,
}

impl TypeRegistry {
    /// Registers `name` unless it is already taken. The first registration wins; `origin`
    /// tells apart a harmless re-registration from two sources fighting over one name.
    pub fn register_input_object_type(
        &mut self,
        name: Name,
        scope: TypeScope,
        description: Option<String>,
        origin: &str,
        builder: FieldsBuilder,
    ) -> bool {
        if let Some(existing) = self.declared.get(&name) {
            if existing.origin == origin {
                tracing::debug!(type_name = %name, "input type already registered");
            } else {
                tracing::warn!(
                    type_name = %name,
                    kept = %existing.origin,
                    dropped = %origin,
                    "two different sources registered the same input type name, keeping the first"
                );
            }
            return false;
        }
        self.declared.insert(
            name.clone(),
            Declared {
                scope: scope.clone(),
                origin: origin.to_string(),
            },
        );
        self.pending.push(PendingType {
            name,
            description,
            scope,
            builder,
        });
        true
    }

    /// Returns false for builtin scalars and for names GraphQL does not accept.
    pub fn register_scalar(&mut self, name: &Name) -> bool {
        if BUILTIN_SCALARS.contains(&name.as_str()) {
            return false;
        }
        if !is_valid_name(name.as_str()) {
            tracing::warn!(scalar = %name, "not a valid GraphQL name, scalar skipped");
            return false;
        }
        self.scalars.insert(name.clone())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.declared.contains_key(name)
    }

    pub fn scope(&self, name: &str) -> Result<&TypeScope, BuildError> {
        self.declared
            .get(name)
            .map(|declared| &declared.scope)
            .ok_or_else(|| BuildError::UnknownType(Name::new(name)))
    }

    /// A nullable reference to a declared input type.
    pub fn input_type_ref(&self, name: &str) -> Result<Type, BuildError> {
        match self.declared.get_key_value(name) {
            Some((name, _)) => Ok(named(name, true)),
            None => Err(BuildError::UnknownType(Name::new(name))),
        }
    }

    pub fn len(&self) -> usize {
        self.declared.len()
    }

    pub fn is_empty(&self) -> bool {
        self.declared.is_empty()
    }

    pub(crate) fn take_pending(&mut self) -> Vec<PendingType> {
        std::mem::take(&mut self.pending)
    }

    pub(crate) fn insert_built(&mut self, built: InputObjectType) {
        self.built.insert(built.name.clone(), built);
    }

    pub(crate) fn finish(self) -> (IndexMap<Name, InputObjectType>, Vec<Name>) {
        (self.built, self.scalars.into_iter().collect())
    }
}

pub fn named(name: &Name, nullable: bool) -> Type {
    Type {
        base: BaseType::Named(name.clone()),
        nullable,
    }
}

pub fn list_of(item: Type, nullable: bool) -> Type {
    Type {
        base: BaseType::List(Box::new(item)),
        nullable,
    }
}

/// `/[_A-Za-z][_0-9A-Za-z]*/`
pub fn is_valid_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if first == '_' || first.is_ascii_alphabetic() => {
            chars.all(|c| c == '_' || c.is_ascii_alphanumeric())
        }
        _ => false,
    }
}

/// Attaches `addition` to `fields` unless the name is already taken. Never overwrites.
pub fn extend(fields: &mut InputFields, addition: InputField, label: &str) -> ExtendOutcome {
    match fields.get(&addition.name) {
        None => {
            fields.insert(addition.name.clone(), addition);
            ExtendOutcome::Added
        }
        Some(existing) if existing.ty == addition.ty => ExtendOutcome::SkippedAsDuplicate,
        Some(existing) => ExtendOutcome::Conflict(format!(
            "{}: field `{}` already has type `{}`, cannot add it as `{}`",
            label, existing.name, existing.ty, addition.ty
        )),
    }
}
