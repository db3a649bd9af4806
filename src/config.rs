use crate::build_schema::nested_mutations::ConflictPolicy;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct NestedConfig {
    /// database schema to introspect
    #[serde(default = "default_schema")]
    pub schema: String,
    #[serde(default)]
    pub conflict_policy: ConflictPolicy,
}

fn default_schema() -> String {
    String::from("public")
}

impl Default for NestedConfig {
    fn default() -> Self {
        NestedConfig {
            schema: default_schema(),
            conflict_policy: ConflictPolicy::default(),
        }
    }
}

/// Read from the environment (and `.env`), `__` separating nesting levels, e.g.
/// `PG__HOST` or `NESTED__CONFLICT_POLICY`.
#[derive(Debug, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub pg: deadpool_postgres::Config,
    #[serde(default)]
    pub nested: NestedConfig,
}

impl Config {
    pub fn from_env() -> Result<Self, ::config::ConfigError> {
        dotenv::dotenv().ok();
        let mut cfg = ::config::Config::new();
        cfg.merge(::config::Environment::new().separator("__"))?;
        cfg.try_into()
    }
}
