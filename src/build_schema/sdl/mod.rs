use crate::build_schema::type_registry::InputObjectType;
use crate::build_schema::Schema;

fn push_description(sdl: &mut String, description: &Option<String>, indent: &str) {
    if let Some(description) = description {
        sdl.push_str(indent);
        sdl.push_str("\"\"\"");
        sdl.push_str(&description.replace("\"\"\"", "\\\"\"\""));
        sdl.push_str("\"\"\"\n");
    }
}

fn push_input_type(sdl: &mut String, input_type: &InputObjectType) {
    push_description(sdl, &input_type.description, "");
    sdl.push_str("input ");
    sdl.push_str(input_type.name.as_str());
    if input_type.fields.is_empty() {
        sdl.push('\n');
        return;
    }
    sdl.push_str(" {\n");
    for field in input_type.fields.values() {
        push_description(sdl, &field.description, "  ");
        sdl.push_str("  ");
        sdl.push_str(field.name.as_str());
        sdl.push_str(": ");
        sdl.push_str(&field.ty.to_string());
        sdl.push('\n');
    }
    sdl.push_str("}\n");
}

/// Renders the custom scalars and input types of `schema` as SDL.
pub fn print(schema: &Schema) -> String {
    let mut definitions: Vec<String> = schema
        .scalars()
        .iter()
        .map(|scalar| format!("scalar {}\n", scalar))
        .collect();
    for input_type in schema.input_types() {
        let mut sdl = String::new();
        push_input_type(&mut sdl, input_type);
        definitions.push(sdl);
    }
    definitions.join("\n")
}
