//! Custom fields command-line front end.
//!
//! Commands are thin wrappers over [`custom_fields::CustomFieldManager`]; the
//! binary in `main.rs` parses arguments, sets up logging and dispatches here.

pub mod cli;
pub mod context;
pub mod fields;
pub mod panels;
pub mod table;
pub mod upload;
pub mod values;

pub use cli::{Cli, Commands, FieldArgs, GroupCommand, PanelCommand, SlotArgs, ValueCommand};
pub use context::CommandContext;

use anyhow::Result;

/// Run one parsed command.
pub fn run(cli: Cli) -> Result<()> {
    let ctx = CommandContext::load(cli.database, cli.json)?;
    match &cli.command {
        Commands::Types => fields::run_types(&ctx),
        Commands::Create(args) => fields::run_create(&ctx, args),
        Commands::Get { id } => fields::run_get(&ctx, *id),
        Commands::Update { id, field } => fields::run_update(&ctx, *id, field),
        Commands::Delete { id } => fields::run_delete(&ctx, *id),
        Commands::List { group } => fields::run_list(&ctx, *group),
        Commands::Value { action } => values::run_value(&ctx, action),
        Commands::Panel { action } => panels::run_panel(&ctx, action),
        Commands::Group { action } => panels::run_group(&ctx, action),
        Commands::UploadWidget {
            input_name,
            file_type,
            canvas,
            size,
        } => upload::run_upload_widget(&ctx, input_name, file_type, *canvas, *size),
    }
}
