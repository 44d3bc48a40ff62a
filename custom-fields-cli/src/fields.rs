//! Field definition commands: types, create, get, update, delete, list.

use anyhow::{anyhow, bail, Result};
use serde_json::{json, Value};
use tracing::debug;

use custom_fields::{registry, CustomField, FieldInput, FieldProperties, ListInput};

use crate::cli::FieldArgs;
use crate::context::CommandContext;
use crate::table::{flag, new_table, truncate_str};

pub fn run_types(ctx: &CommandContext) -> Result<()> {
    let types = registry::field_types();
    if ctx.json {
        return ctx.print_json(&serde_json::to_value(types)?);
    }

    let mut table = new_table();
    table.set_header(vec!["Id", "Name", "Options", "Properties", "Multiple"]);
    for ft in types {
        table.add_row(vec![
            ft.id.to_string(),
            ft.name.to_string(),
            flag(ft.has_options).to_string(),
            flag(ft.has_properties).to_string(),
            flag(ft.allow_multiple_values).to_string(),
        ]);
    }
    println!("{table}");
    Ok(())
}

pub fn run_create(ctx: &CommandContext, args: &FieldArgs) -> Result<()> {
    let input = field_input(args)?;
    let manager = ctx.manager()?;
    let id = manager.create(&input)?;

    if ctx.json {
        return ctx.print_json(&json!({ "id": id }));
    }
    println!("Created field {} ({})", id, input.name);
    Ok(())
}

pub fn run_get(ctx: &CommandContext, id: i64) -> Result<()> {
    let field = ctx.manager()?.get(id)?;
    if ctx.json {
        return ctx.print_json(&serde_json::to_value(&field)?);
    }
    print_field(&field);
    Ok(())
}

pub fn run_update(ctx: &CommandContext, id: i64, args: &FieldArgs) -> Result<()> {
    let input = field_input(args)?;
    ctx.manager()?.update(id, &input)?;

    if ctx.json {
        return ctx.print_json(&json!({ "id": id, "updated": true }));
    }
    println!("Updated field {}", id);
    Ok(())
}

pub fn run_delete(ctx: &CommandContext, id: i64) -> Result<()> {
    ctx.manager()?.delete(id)?;

    if ctx.json {
        return ctx.print_json(&json!({ "id": id, "deleted": true }));
    }
    println!("Deleted field {}", id);
    Ok(())
}

pub fn run_list(ctx: &CommandContext, group_id: i64) -> Result<()> {
    let fields = ctx.manager()?.fields_in_group(group_id)?;
    if ctx.json {
        return ctx.print_json(&json!({ "fields": fields }));
    }
    if fields.is_empty() {
        println!("No fields in group {}.", group_id);
        return Ok(());
    }

    let mut table = new_table();
    table.set_header(vec!["Id", "Order", "Name", "Label", "Type", "Required", "Duplicate"]);
    for field in &fields {
        let def = &field.definition;
        table.add_row(vec![
            def.id.to_string(),
            def.display_order.to_string(),
            def.name.clone(),
            truncate_str(&def.label, 40),
            field.field_type.name.to_string(),
            flag(def.required).to_string(),
            flag(def.duplicate).to_string(),
        ]);
    }
    println!("{table}");
    Ok(())
}

fn print_field(field: &CustomField) {
    let def = &field.definition;
    let mut table = new_table();
    table.set_header(vec!["Property", "Value"]);
    table.add_row(vec!["Id".to_string(), def.id.to_string()]);
    table.add_row(vec!["Group".to_string(), def.group_id.to_string()]);
    table.add_row(vec!["Name".to_string(), def.name.clone()]);
    table.add_row(vec!["Label".to_string(), def.label.clone()]);
    table.add_row(vec![
        "Type".to_string(),
        format!("{} ({})", field.field_type.name, def.type_id),
    ]);
    table.add_row(vec!["Order".to_string(), def.display_order.to_string()]);
    table.add_row(vec!["Required".to_string(), flag(def.required).to_string()]);
    table.add_row(vec!["Duplicate".to_string(), flag(def.duplicate).to_string()]);
    if let Some(help) = &def.help_text {
        table.add_row(vec!["Help".to_string(), help.clone()]);
    }
    if let Some(css) = &def.css {
        table.add_row(vec!["CSS".to_string(), css.clone()]);
    }
    if let Some(options) = &field.options {
        table.add_row(vec!["Options".to_string(), options.options.join("\n")]);
        table.add_row(vec!["Defaults".to_string(), options.default_values.join("\n")]);
    }
    if let Some(properties) = &field.properties {
        for (key, value) in properties {
            table.add_row(vec![format!("property: {key}"), value.to_string()]);
        }
    }
    println!("{table}");
}

/// Build library input from command-line arguments.
pub fn field_input(args: &FieldArgs) -> Result<FieldInput> {
    let field_type = registry::resolve(&args.field_type)
        .ok_or_else(|| anyhow!("unknown field type '{}'", args.field_type))?;

    let mut input = FieldInput::new(args.group, &args.name, &args.label, field_type.id)
        .with_order(args.order)
        .required(args.required)
        .duplicate(args.duplicate)
        .with_options(ListInput::List(args.options.clone()))
        .with_default_values(ListInput::List(args.defaults.clone()));
    input.properties = parse_properties(&args.properties)?;
    input.help_text = args.help_text.clone();
    input.css = args.css.clone();

    debug!(name = %input.name, type_id = input.type_id, "parsed field arguments");
    Ok(input)
}

/// Parse `key=value` pairs. Values that are valid JSON keep their type,
/// anything else is a string.
fn parse_properties(pairs: &[String]) -> Result<FieldProperties> {
    let mut properties = FieldProperties::new();
    for pair in pairs {
        let Some((key, raw)) = pair.split_once('=') else {
            bail!("property '{}' must be KEY=VALUE", pair);
        };
        let key = key.trim();
        if key.is_empty() {
            bail!("property '{}' has an empty key", pair);
        }
        let value =
            serde_json::from_str::<Value>(raw).unwrap_or_else(|_| Value::String(raw.to_string()));
        properties.insert(key.to_string(), value);
    }
    Ok(properties)
}
