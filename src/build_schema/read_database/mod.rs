use crate::build_schema::entity::{Attribute, EntityCatalog, EntityDescriptor};
use crate::build_schema::relations::{RelationRegistry, Relationship};
use async_graphql_value::Name;
use convert_case::{Case, Casing};
use petgraph::graph::DiGraph;
use petgraph::prelude::NodeIndex;
use petgraph::visit::EdgeRef;
use serde::Deserialize;
use tokio_postgres::Client;

/// One column of one table, with the foreign key it takes part in if any.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct ColumnRow {
    pub table_name: String,
    pub column_name: String,
    pub data_type: String,
    pub is_not_null: bool,
    pub is_insertable: bool,
    pub constraint_name: Option<String>,
    pub foreign_table_name: Option<String>,
    pub foreign_column_name: Option<String>,
}

#[derive(Debug)]
pub struct ForeignKey {
    pub constraint_name: String,
    pub local_columns: Vec<String>,
    pub foreign_columns: Vec<String>,
}

const COLUMNS_QUERY: &str = "
    select
      cls.relname::text as table_name,
      att.attname::text as column_name,
      format_type(att.atttypid, null) as data_type,
      att.attnotnull as is_not_null,
      has_table_privilege(cls.oid, 'INSERT') as is_insertable,
      fk.constraint_name,
      fk.foreign_table_name,
      fk.foreign_column_name
    from
      pg_class cls
      join pg_namespace ns on ns.oid = cls.relnamespace
      join pg_attribute att on att.attrelid = cls.oid
      and att.attnum > 0
      and not att.attisdropped
      left join lateral (
        select
          con.conname::text as constraint_name,
          fcls.relname::text as foreign_table_name,
          fatt.attname::text as foreign_column_name,
          keys.ord
        from
          pg_constraint con
          join lateral unnest(con.conkey, con.confkey) with ordinality as keys(local_num, foreign_num, ord) on true
          join pg_class fcls on fcls.oid = con.confrelid
          join pg_attribute fatt on fatt.attrelid = con.confrelid
          and fatt.attnum = keys.foreign_num
        where
          con.conrelid = cls.oid
          and con.contype = 'f'
          and keys.local_num = att.attnum
      ) as fk on true
    where
      ns.nspname = $1
      and cls.relkind in ('r', 'p')
    order by
      cls.relname,
      att.attnum,
      fk.ord";

pub async fn read_columns(
    client: &Client,
    schema: &str,
) -> Result<Vec<ColumnRow>, tokio_postgres::Error> {
    let rows = client.query(COLUMNS_QUERY, &[&schema]).await?;
    Ok(rows
        .iter()
        .map(|row| ColumnRow {
            table_name: row.get("table_name"),
            column_name: row.get("column_name"),
            data_type: row.get("data_type"),
            is_not_null: row.get("is_not_null"),
            is_insertable: row.get("is_insertable"),
            constraint_name: row.get("constraint_name"),
            foreign_table_name: row.get("foreign_table_name"),
            foreign_column_name: row.get("foreign_column_name"),
        })
        .collect())
}

/// `text[]` is a list of `text`. Postgres reports every array dimension as one `[]`.
pub fn split_array(data_type: &str) -> (&str, bool) {
    match data_type.strip_suffix("[]") {
        Some(element) => (element.trim_end_matches("[]"), true),
        None => (data_type, false),
    }
}

/// Maps an element type reported by `format_type` to a GraphQL scalar name. Schema qualifiers
/// and identifier quotes are dropped, so `app.mood` becomes `Mood`.
pub fn convert_pg_to_gql(data_type: &str) -> String {
    let unqualified = data_type.rsplit('.').next().unwrap_or(data_type);
    match unqualified.trim_matches('"') {
        "integer" | "smallint" | "bigint" => String::from("Int"),
        "character varying" | "text" | "character" | "uuid" => String::from("String"),
        "boolean" => String::from("Boolean"),
        "double precision" | "real" | "numeric" => String::from("Float"),
        "json" | "jsonb" => String::from("JSON"),
        "timestamp with time zone" | "timestamp without time zone" | "timestamp" => {
            String::from("Datetime")
        }
        other => {
            let name: String = other
                .to_case(Case::UpperCamel)
                .chars()
                .filter(|c| *c == '_' || c.is_ascii_alphanumeric())
                .collect();
            match name.chars().next() {
                Some(first) if first.is_ascii_alphabetic() || first == '_' => name,
                _ => format!("_{}", name),
            }
        }
    }
}

fn find_or_add_table(
    g: &mut DiGraph<EntityDescriptor, ForeignKey>,
    table_name: &str,
) -> NodeIndex<u32> {
    //referenced tables can show up before their own columns do
    let index_optional = g.node_indices().find(|i| g[*i].name.as_str() == table_name);
    match index_optional {
        Some(index) => index,
        None => g.add_node(EntityDescriptor {
            name: Name::new(table_name),
            attributes: Vec::new(),
            insertable: false,
        }),
    }
}

/// Tables as nodes, foreign keys as edges from the referencing to the referenced table.
pub fn create_graph(rows: &[ColumnRow]) -> DiGraph<EntityDescriptor, ForeignKey> {
    let mut g: DiGraph<EntityDescriptor, ForeignKey> = DiGraph::new();
    for row in rows {
        let table_index = find_or_add_table(&mut g, &row.table_name);
        let table = &mut g[table_index];
        table.insertable = row.is_insertable;
        if table.attribute(&row.column_name).is_none() {
            let (element_type, is_list) = split_array(&row.data_type);
            table.attributes.push(Attribute {
                name: Name::new(&row.column_name),
                ty: Name::new(convert_pg_to_gql(element_type)),
                not_null: row.is_not_null,
                is_list,
            });
        }

        if let (Some(constraint_name), Some(foreign_table_name), Some(foreign_column_name)) = (
            &row.constraint_name,
            &row.foreign_table_name,
            &row.foreign_column_name,
        ) {
            let foreign_index = find_or_add_table(&mut g, foreign_table_name);
            let existing = g
                .edges_connecting(table_index, foreign_index)
                .find(|edge| &edge.weight().constraint_name == constraint_name)
                .map(|edge| edge.id());
            match existing {
                //composite key, one row per column
                Some(edge) => {
                    let foreign_key = &mut g[edge];
                    foreign_key.local_columns.push(row.column_name.clone());
                    foreign_key.foreign_columns.push(foreign_column_name.clone());
                }
                None => {
                    g.add_edge(
                        table_index,
                        foreign_index,
                        ForeignKey {
                            constraint_name: constraint_name.clone(),
                            local_columns: vec![row.column_name.clone()],
                            foreign_columns: vec![foreign_column_name.clone()],
                        },
                    );
                }
            }
        }
    }
    g
}

/// Every foreign key is advertised twice: forward on the referencing table and backward
/// on the referenced one. Both keep the referencing table as the local entity.
pub fn relations_from_graph(g: &DiGraph<EntityDescriptor, ForeignKey>) -> RelationRegistry {
    let mut relations = RelationRegistry::default();
    for edge in g.edge_references() {
        let local = &g[edge.source()];
        let remote = &g[edge.target()];
        let foreign_key = edge.weight();
        let forward = Relationship {
            local_entity: local.name.clone(),
            remote_entity: remote.name.clone(),
            local_attributes: foreign_key.local_columns.iter().map(Name::new).collect(),
            remote_attributes: foreign_key.foreign_columns.iter().map(Name::new).collect(),
            is_referencee: false,
        };
        let backward = Relationship {
            is_referencee: true,
            ..forward.clone()
        };
        relations.insert(local.name.as_str(), foreign_key.constraint_name.clone(), forward);
        relations.insert(
            remote.name.as_str(),
            format!("{}.{}", local.name, foreign_key.constraint_name),
            backward,
        );
    }
    relations
}

pub fn assemble(rows: &[ColumnRow]) -> (EntityCatalog, RelationRegistry) {
    let g = create_graph(rows);
    let relations = relations_from_graph(&g);
    let catalog = g.node_weights().cloned().collect();
    (catalog, relations)
}
