//! Panel and group commands.

use anyhow::Result;
use serde_json::json;

use crate::cli::{GroupCommand, PanelCommand};
use crate::context::CommandContext;
use crate::table::{flag, new_table};

pub fn run_panel(ctx: &CommandContext, action: &PanelCommand) -> Result<()> {
    let manager = ctx.manager()?;
    match action {
        PanelCommand::Create { name } => {
            let panel = manager.create_panel(name)?;
            if ctx.json {
                return ctx.print_json(&serde_json::to_value(&panel)?);
            }
            println!("Created panel {} ({})", panel.id, panel.name);
        }
        PanelCommand::List => {
            let panels = manager.panels()?;
            if ctx.json {
                return ctx.print_json(&json!({ "panels": panels }));
            }
            let mut table = new_table();
            table.set_header(vec!["Id", "Name", "Global"]);
            for panel in &panels {
                table.add_row(vec![
                    panel.id.to_string(),
                    panel.name.clone(),
                    flag(panel.name == ctx.config.panels.global_panel).to_string(),
                ]);
            }
            println!("{table}");
        }
        PanelCommand::Assign { post, panel } => {
            manager.assign_post_to_panel(*post, *panel)?;
            if ctx.json {
                return ctx.print_json(&json!({ "post": post, "panel": panel }));
            }
            println!("Post {} now uses panel {}", post, panel);
        }
    }
    Ok(())
}

pub fn run_group(ctx: &CommandContext, action: &GroupCommand) -> Result<()> {
    let manager = ctx.manager()?;
    match action {
        GroupCommand::Create {
            panel,
            name,
            duplicate,
        } => {
            let group = manager.create_group(*panel, name, *duplicate)?;
            if ctx.json {
                return ctx.print_json(&serde_json::to_value(&group)?);
            }
            println!("Created group {} ({}) in panel {}", group.id, group.name, panel);
        }
        GroupCommand::List { panel } => {
            let groups = manager.groups(*panel)?;
            if ctx.json {
                return ctx.print_json(&json!({ "groups": groups }));
            }
            let mut table = new_table();
            table.set_header(vec!["Id", "Name", "Duplicate"]);
            for group in &groups {
                table.add_row(vec![
                    group.id.to_string(),
                    group.name.clone(),
                    flag(group.duplicate).to_string(),
                ]);
            }
            println!("{table}");
        }
    }
    Ok(())
}
