use pogg_nested::build_schema::nested_mutations::NestedMutationsPlugin;
use pogg_nested::build_schema::{read_database, SchemaBuilder};
use pogg_nested::config::Config;
use tokio_postgres::NoTls;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let config = Config::from_env()?;
    let pool = config.pg.create_pool(None, NoTls)?;
    let client = pool.get().await?;
    let rows = read_database::read_columns(&client, &config.nested.schema).await?;
    let (catalog, relations) = read_database::assemble(&rows);
    tracing::info!(
        schema = %config.nested.schema,
        entities = catalog.len(),
        relationships = relations.len(),
        "introspected database"
    );

    let schema = SchemaBuilder::new(catalog, relations)
        .plugin(NestedMutationsPlugin::new(config.nested.conflict_policy))
        .build()?;
    println!("{}", schema.to_sdl());
    Ok(())
}
