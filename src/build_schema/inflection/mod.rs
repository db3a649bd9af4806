use crate::build_schema::relations::{Direction, Relationship};
use crate::error::BuildError;
use async_graphql_value::Name;
use convert_case::{Case, Casing};
use inflector::Inflector;

fn key_type_name_prefix(relationship: &Relationship) -> Result<String, BuildError> {
    let attribute = relationship.first_local_attribute().ok_or_else(|| {
        BuildError::MissingKeyAttribute {
            local: relationship.local_entity.clone(),
            remote: relationship.remote_entity.clone(),
        }
    })?;
    Ok([
        relationship.remote_entity.as_str().to_case(Case::UpperCamel),
        relationship.local_entity.as_str().to_case(Case::UpperCamel),
        attribute.as_str().to_case(Case::UpperCamel),
    ]
    .concat())
}

pub fn forward_type_name(relationship: &Relationship) -> Result<Name, BuildError> {
    Ok(Name::new(
        key_type_name_prefix(relationship)? + "FkeyInput",
    ))
}

pub fn backward_type_name(relationship: &Relationship) -> Result<Name, BuildError> {
    Ok(Name::new(
        key_type_name_prefix(relationship)? + "FkeyInverseInput",
    ))
}

pub fn relation_type_name(relationship: &Relationship) -> Result<Name, BuildError> {
    match relationship.direction() {
        Direction::Forward => forward_type_name(relationship),
        Direction::Backward => backward_type_name(relationship),
    }
}

///forward fields hold many local rows and are pluralized, backward fields keep the bare
///local name
pub fn relation_field_name(relationship: &Relationship) -> Name {
    let local = relationship.local_entity.as_str().to_camel_case();
    match relationship.direction() {
        Direction::Forward => Name::new(local.to_plural()),
        Direction::Backward => Name::new(local),
    }
}

pub fn entity_input_type_name(entity: &str) -> Name {
    Name::new(format!("{}Input", entity.to_case(Case::UpperCamel)))
}

pub fn attribute_field_name(attribute: &str) -> Name {
    Name::new(attribute.to_camel_case())
}
