use super::*;
use crate::build_schema::entity::EntityCatalog;
use crate::build_schema::register_entity_input_types;
use crate::build_schema::relations::RelationRegistry;
use crate::build_schema::SchemaBuilder;
use serde_json::json;

fn catalog() -> EntityCatalog {
    serde_json::from_value(json!([
        {
            "name": "Author",
            "attributes": [
                {"name": "id", "type": "Int", "notNull": true},
                {"name": "name", "type": "String", "notNull": true}
            ]
        },
        {
            "name": "Post",
            "attributes": [
                {"name": "id", "type": "Int", "notNull": true},
                {"name": "authorId", "type": "Int", "notNull": true},
                {"name": "title", "type": "String"}
            ]
        }
    ]))
    .unwrap()
}

fn forward() -> Relationship {
    serde_json::from_value(json!({
        "localEntity": "Post",
        "remoteEntity": "Author",
        "localAttributes": ["authorId"],
        "remoteAttributes": ["id"]
    }))
    .unwrap()
}

fn backward() -> Relationship {
    Relationship {
        is_referencee: true,
        ..forward()
    }
}

fn registry(relationships: &[(&str, &str, Relationship)]) -> RelationRegistry {
    let mut registry = RelationRegistry::default();
    for (entity, key, relationship) in relationships {
        registry.insert(entity, *key, relationship.clone());
    }
    registry
}

///a context that has been through the build and init hooks
fn initialized(
    plugin: &NestedMutationsPlugin,
    catalog: EntityCatalog,
    relations: RelationRegistry,
) -> BuildContext {
    let mut ctx = BuildContext::new(catalog, relations);
    plugin.build(&mut ctx).unwrap();
    register_entity_input_types(&mut ctx);
    plugin.init(&mut ctx).unwrap();
    ctx
}

fn field_names(fields: &InputFields) -> Vec<&str> {
    fields.keys().map(|name| name.as_str()).collect()
}

#[test]
fn forward_relationship_is_owned_by_remote_input() {
    let plugin = NestedMutationsPlugin::default();
    let ctx = initialized(
        &plugin,
        catalog(),
        registry(&[("Post", "post_author_id_fkey", forward())]),
    );
    let state = ctx.typed_get::<NestedMutationsState>().unwrap();
    let descriptor = state.index.get("AuthorPostAuthorIdFkeyInput").unwrap();
    assert_eq!(descriptor.field_name.as_str(), "posts");
    assert_eq!(descriptor.owner_input.as_ref().unwrap().as_str(), "AuthorInput");
    assert_eq!(descriptor.related_input.as_ref().unwrap().as_str(), "PostInput");
}

#[test]
fn backward_relationship_is_owned_by_local_input() {
    let plugin = NestedMutationsPlugin::default();
    let ctx = initialized(
        &plugin,
        catalog(),
        registry(&[("Author", "post.post_author_id_fkey", backward())]),
    );
    let state = ctx.typed_get::<NestedMutationsState>().unwrap();
    let descriptor = state
        .index
        .get("AuthorPostAuthorIdFkeyInverseInput")
        .unwrap();
    assert_eq!(descriptor.field_name.as_str(), "post");
    assert_eq!(descriptor.owner_input.as_ref().unwrap().as_str(), "PostInput");
    assert_eq!(descriptor.related_input.as_ref().unwrap().as_str(), "AuthorInput");
}

#[test]
fn index_is_keyed_by_both_ends() {
    let plugin = NestedMutationsPlugin::default();
    let ctx = initialized(
        &plugin,
        catalog(),
        registry(&[("Post", "post_author_id_fkey", forward())]),
    );
    let index = &ctx.typed_get::<NestedMutationsState>().unwrap().index;
    assert_eq!(index.touching("AuthorInput").count(), 1);
    assert_eq!(index.touching("PostInput").count(), 1);
    assert_eq!(index.touching("CommentInput").count(), 0);
}

#[test]
fn injecting_twice_is_the_same_as_injecting_once() {
    let plugin = NestedMutationsPlugin::default();
    let ctx = initialized(
        &plugin,
        catalog(),
        registry(&[("Post", "post_author_id_fkey", forward())]),
    );
    let author_input = Name::new("AuthorInput");
    let once = plugin
        .inject_fields(InputFields::new(), &ctx, &author_input)
        .unwrap();
    let twice = plugin
        .inject_fields(once.clone(), &ctx, &author_input)
        .unwrap();
    assert_eq!(field_names(&once), vec!["posts"]);
    assert_eq!(field_names(&once), field_names(&twice));
    assert_eq!(once, twice);
}

#[test]
fn injection_only_adds_fields() {
    let plugin = NestedMutationsPlugin::default();
    let ctx = initialized(
        &plugin,
        catalog(),
        registry(&[("Post", "post_author_id_fkey", forward())]),
    );
    let mut fields = InputFields::new();
    let id = InputField::new("id", named(&Name::new("Int"), false));
    fields.insert(id.name.clone(), id.clone());
    let injected = plugin
        .inject_fields(fields, &ctx, &Name::new("AuthorInput"))
        .unwrap();
    assert_eq!(field_names(&injected), vec!["id", "posts"]);
    assert_eq!(injected["id"], id);
}

#[test]
fn non_row_input_types_are_left_alone() {
    let plugin = NestedMutationsPlugin::default();
    let ctx = initialized(
        &plugin,
        catalog(),
        registry(&[("Post", "post_author_id_fkey", forward())]),
    );
    let name = Name::new("AuthorInput");
    let scope = TypeScope {
        is_input_type: true,
        ..Default::default()
    };
    let this = InputTypeContext {
        name: &name,
        scope: &scope,
    };
    let fields = plugin
        .input_object_fields(InputFields::new(), &ctx, &this)
        .unwrap();
    assert!(fields.is_empty());
}

#[test]
fn row_inputs_outside_mutations_are_left_alone() {
    let plugin = NestedMutationsPlugin::default();
    let ctx = initialized(
        &plugin,
        catalog(),
        registry(&[("Post", "post_author_id_fkey", forward())]),
    );
    let name = Name::new("AuthorInput");
    let scope = TypeScope {
        is_row_type: true,
        is_input_type: true,
        is_mutation_input: false,
        entity: Some(Name::new("Author")),
    };
    let this = InputTypeContext {
        name: &name,
        scope: &scope,
    };
    let fields = plugin
        .input_object_fields(InputFields::new(), &ctx, &this)
        .unwrap();
    assert!(fields.is_empty());
}

#[test]
fn synthesizing_twice_relaxes_the_key_once() {
    let plugin = NestedMutationsPlugin::default();
    let mut ctx = initialized(
        &plugin,
        catalog(),
        registry(&[("Post", "post_author_id_fkey", forward())]),
    );
    plugin.init(&mut ctx).unwrap();
    plugin.synthesize(&mut ctx, &forward()).unwrap();
    assert_eq!(ctx.nullable_overrides.len(), 1);
    assert!(ctx.nullable_overrides.is_relaxed("Post", "authorId"));
    assert_eq!(
        ctx.typed_get::<NestedMutationsState>().unwrap().index.len(),
        1
    );
    //the shared descriptor is untouched
    assert!(ctx.catalog.get("Post").unwrap().attribute("authorId").unwrap().not_null);
}

#[test]
fn synthesize_without_build_hook_fails() {
    let plugin = NestedMutationsPlugin::default();
    let mut ctx = BuildContext::new(catalog(), RelationRegistry::default());
    register_entity_input_types(&mut ctx);
    assert!(matches!(
        plugin.synthesize(&mut ctx, &forward()),
        Err(BuildError::MissingState(PLUGIN_NAME))
    ));
}

#[test]
fn conflicting_attribute_is_kept_under_warn_policy() {
    let mut catalog = catalog();
    let mut author = catalog.get("Author").unwrap().clone();
    author.attributes.push(
        serde_json::from_value(json!({"name": "posts", "type": "String"})).unwrap(),
    );
    catalog.insert(author);
    let schema = SchemaBuilder::new(
        catalog,
        registry(&[("Post", "post_author_id_fkey", forward())]),
    )
    .plugin(NestedMutationsPlugin::new(ConflictPolicy::Warn))
    .build()
    .unwrap();
    let author_input = schema.input_type("AuthorInput").unwrap();
    assert_eq!(author_input.fields["posts"].ty.to_string(), "String");
}

#[test]
fn conflicting_attribute_fails_under_fail_policy() {
    let mut catalog = catalog();
    let mut author = catalog.get("Author").unwrap().clone();
    author.attributes.push(
        serde_json::from_value(json!({"name": "posts", "type": "String"})).unwrap(),
    );
    catalog.insert(author);
    let result = SchemaBuilder::new(
        catalog,
        registry(&[("Post", "post_author_id_fkey", forward())]),
    )
    .plugin(NestedMutationsPlugin::new(ConflictPolicy::Fail))
    .build();
    match result {
        Err(BuildError::FieldConflict { type_name, detail }) => {
            assert_eq!(type_name.as_str(), "AuthorInput");
            assert!(detail.contains("posts"), "{}", detail);
        }
        other => panic!("expected a field conflict, got {:?}", other.map(|_| ())),
    }
}

#[test]
fn colliding_type_names_keep_the_first_relationship() {
    let catalog: EntityCatalog = serde_json::from_value(json!([
        {"name": "a", "attributes": [{"name": "id", "type": "Int", "notNull": true}]},
        {"name": "b_c", "attributes": [{"name": "x", "type": "Int", "notNull": true}]},
        {"name": "a_b", "attributes": [{"name": "id", "type": "Int", "notNull": true}]},
        {"name": "c", "attributes": [{"name": "x", "type": "Int", "notNull": true}]}
    ]))
    .unwrap();
    let into_a: Relationship = serde_json::from_value(json!({
        "localEntity": "b_c", "remoteEntity": "a", "localAttributes": ["x"]
    }))
    .unwrap();
    let into_a_b: Relationship = serde_json::from_value(json!({
        "localEntity": "c", "remoteEntity": "a_b", "localAttributes": ["x"]
    }))
    .unwrap();
    let plugin = NestedMutationsPlugin::default();
    let ctx = initialized(
        &plugin,
        catalog,
        registry(&[("b_c", "b_c_x_fkey", into_a), ("c", "c_x_fkey", into_a_b)]),
    );
    let index = &ctx.typed_get::<NestedMutationsState>().unwrap().index;
    assert_eq!(index.len(), 1);
    assert_eq!(
        index.get("ABCXFkeyInput").unwrap().local_entity.as_str(),
        "b_c"
    );
    assert_eq!(index.touching("ABInput").count(), 0);
}

#[test]
fn conflict_policy_deserializes_lowercase() {
    let policy: ConflictPolicy = serde_json::from_value(json!("fail")).unwrap();
    assert_eq!(policy, ConflictPolicy::Fail);
    assert_eq!(ConflictPolicy::default(), ConflictPolicy::Warn);
}

#[test]
fn type_name_taken_by_entity_input_is_not_wired() {
    let catalog: EntityCatalog = serde_json::from_value(json!([
        {"name": "a", "attributes": [{"name": "id", "type": "Int", "notNull": true}]},
        {"name": "b", "attributes": [{"name": "c", "type": "Int", "notNull": true}]},
        {"name": "a_b_c_fkey", "attributes": [{"name": "secret", "type": "String"}]}
    ]))
    .unwrap();
    let into_a: Relationship = serde_json::from_value(json!({
        "localEntity": "b", "remoteEntity": "a", "localAttributes": ["c"]
    }))
    .unwrap();
    let relations = registry(&[("b", "b_c_fkey", into_a)]);

    let plugin = NestedMutationsPlugin::default();
    let ctx = initialized(&plugin, catalog.clone(), relations.clone());
    let state = ctx.typed_get::<NestedMutationsState>().unwrap();
    assert!(state.index.is_empty());
    assert!(ctx.nullable_overrides.is_empty());

    let schema = SchemaBuilder::new(catalog, relations)
        .plugin(NestedMutationsPlugin::default())
        .build()
        .unwrap();
    assert_eq!(field_names(&schema.input_type("AInput").unwrap().fields), vec!["id"]);
    assert_eq!(
        field_names(&schema.input_type("ABCFkeyInput").unwrap().fields),
        vec!["secret"]
    );
    assert_eq!(field_names(&schema.input_type("BInput").unwrap().fields), vec!["c"]);
    assert_eq!(schema.input_types().count(), 3);
}
