use async_graphql_value::Name;
use thiserror::Error;

/// Anything that aborts schema construction. A failed build is never retried.
#[derive(Debug, Error)]
pub enum BuildError {
    #[error("unknown type `{0}`")]
    UnknownType(Name),

    #[error("entity `{0}` is not in the catalog")]
    UnknownEntity(Name),

    #[error("relationship from `{local}` to `{remote}` has no local key attributes")]
    MissingKeyAttribute { local: Name, remote: Name },

    #[error("conflicting field on `{type_name}`: {detail}")]
    FieldConflict { type_name: Name, detail: String },

    #[error("plugin `{0}` has no build state, was its build hook run?")]
    MissingState(&'static str),
}
