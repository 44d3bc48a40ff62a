//! Value commands: read and write field values on posts.

use anyhow::Result;
use serde_json::json;

use custom_fields::{FieldValue, MetaSlot, ValueMode};

use crate::cli::{SlotArgs, ValueCommand};
use crate::context::CommandContext;
use crate::table::new_table;

pub fn run_value(ctx: &CommandContext, action: &ValueCommand) -> Result<()> {
    match action {
        ValueCommand::Get { slot, multiple } => run_get(ctx, slot, *multiple),
        ValueCommand::Set { slot, values } => run_set(ctx, slot, values),
        ValueCommand::Order { post, field } => run_order(ctx, *post, field),
        ValueCommand::Data { slot } => run_data(ctx, slot),
    }
}

fn meta_slot(args: &SlotArgs) -> MetaSlot {
    MetaSlot::new(args.post, &args.field)
        .group(args.group_index)
        .field(args.field_index)
}

fn run_get(ctx: &CommandContext, args: &SlotArgs, multiple: bool) -> Result<()> {
    let mode = if multiple {
        ValueMode::Multiple
    } else {
        ValueMode::Single
    };
    let value = ctx
        .manager()?
        .get_custom_field_values(&meta_slot(args), mode)?;

    if ctx.json {
        return ctx.print_json(&json!({ "value": value }));
    }
    if let Some(text) = value.as_text() {
        println!("{text}");
        return Ok(());
    }
    for item in value.into_list() {
        println!("{item}");
    }
    Ok(())
}

fn run_set(ctx: &CommandContext, args: &SlotArgs, values: &[String]) -> Result<()> {
    let value = match values {
        [single] => FieldValue::Text(single.clone()),
        many => FieldValue::List(many.to_vec()),
    };
    let meta_id = ctx.manager()?.set_field_value(&meta_slot(args), &value)?;

    if ctx.json {
        return ctx.print_json(&json!({ "meta_id": meta_id }));
    }
    println!("Stored {} on post {} (meta {})", args.field, args.post, meta_id);
    Ok(())
}

fn run_order(ctx: &CommandContext, post: i64, field: &str) -> Result<()> {
    let manager = ctx.manager()?;
    let groups = manager.get_order_duplicates(post, field)?;
    let mut rows = Vec::with_capacity(groups.len());
    for group in &groups {
        rows.push((*group, manager.get_fields_order(post, field, *group)?));
    }

    if ctx.json {
        let groups: Vec<_> = rows
            .iter()
            .map(|(group, fields)| json!({ "group_index": group, "field_indexes": fields }))
            .collect();
        return ctx.print_json(&json!({
            "group_count": manager.get_field_group_duplicates(post, field)?,
            "groups": groups,
        }));
    }

    let mut table = new_table();
    table.set_header(vec!["Group", "Fields"]);
    for (group, fields) in rows {
        let fields: Vec<String> = fields.iter().map(i64::to_string).collect();
        table.add_row(vec![group.to_string(), fields.join(", ")]);
    }
    println!("{table}");
    Ok(())
}

fn run_data(ctx: &CommandContext, args: &SlotArgs) -> Result<()> {
    let data = ctx.manager()?.get_data_field(&meta_slot(args))?;

    if ctx.json {
        return ctx.print_json(&json!({ "data": data }));
    }
    let Some(data) = data else {
        println!("No value for {} on post {}.", args.field, args.post);
        return Ok(());
    };

    let mut table = new_table();
    table.set_header(vec!["Property", "Value"]);
    table.add_row(vec!["Field".to_string(), data.id.to_string()]);
    table.add_row(vec!["Label".to_string(), data.label.clone()]);
    table.add_row(vec!["Type".to_string(), data.type_id.to_string()]);
    table.add_row(vec!["Meta id".to_string(), data.meta_id.to_string()]);
    let value = match data.value.as_text() {
        Some(text) => text.to_string(),
        None => data.value.clone().into_list().join("\n"),
    };
    table.add_row(vec!["Value".to_string(), value]);
    println!("{table}");
    Ok(())
}
