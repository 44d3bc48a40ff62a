//! custom-fields CLI - manage typed custom fields attached to posts.
//!
//! Commands:
//! - `custom-fields types`: List the registered field types
//! - `custom-fields create ...`: Create a field in a group
//! - `custom-fields get <id>`: Show a field
//! - `custom-fields update <id> ...`: Replace a field's definition
//! - `custom-fields delete <id>`: Delete a field
//! - `custom-fields list --group <id>`: List the fields of a group
//! - `custom-fields value get|set|order|data`: Read and write values on posts
//! - `custom-fields panel create|list|assign`: Manage panels
//! - `custom-fields group create|list`: Manage groups
//! - `custom-fields upload-widget <input>`: Print upload widget markup
//!
//! Exit codes:
//! - 0: Success
//! - 1: Error

use clap::Parser;
use tracing_subscriber::EnvFilter;

use custom_fields_cli::{run, Cli};

fn main() {
    let cli = Cli::parse();

    let filter = if cli.debug {
        EnvFilter::new("custom_fields=debug,custom_fields_upload=debug,custom_fields_cli=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_ansi(false)
        .with_writer(std::io::stderr)
        .init();

    let exit_code = match run(cli) {
        Ok(()) => 0,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            1
        }
    };

    std::process::exit(exit_code);
}

#[cfg(test)]
mod tests {
    use super::*;
    use custom_fields_cli::{Commands, ValueCommand};

    #[test]
    fn test_cli_parsing_types() {
        let cli = Cli::parse_from(["custom-fields", "types"]);
        assert!(matches!(cli.command, Commands::Types));
        assert!(!cli.json);
    }

    #[test]
    fn test_cli_parsing_create() {
        let cli = Cli::parse_from([
            "custom-fields",
            "--database",
            "site.db",
            "create",
            "--group",
            "2",
            "--name",
            "colour",
            "--label",
            "Colour",
            "--type",
            "dropdown_list",
            "--option",
            "red",
            "--option",
            "blue",
            "--json",
        ]);
        assert!(cli.json);
        assert_eq!(cli.database.as_deref(), Some(std::path::Path::new("site.db")));
        match cli.command {
            Commands::Create(args) => {
                assert_eq!(args.group, 2);
                assert_eq!(args.options, vec!["red", "blue"]);
                assert_eq!(args.order, 1);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_cli_parsing_value_set() {
        let cli = Cli::parse_from([
            "custom-fields",
            "value",
            "set",
            "--post",
            "5",
            "--field",
            "sizes",
            "--group-index",
            "2",
            "S",
            "M",
        ]);
        match cli.command {
            Commands::Value {
                action: ValueCommand::Set { slot, values },
            } => {
                assert_eq!(slot.post, 5);
                assert_eq!(slot.group_index, 2);
                assert_eq!(slot.field_index, 1);
                assert_eq!(values, vec!["S", "M"]);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_cli_parsing_upload_widget_defaults() {
        let cli = Cli::parse_from(["custom-fields", "upload-widget", "photo"]);
        match cli.command {
            Commands::UploadWidget {
                file_type,
                canvas,
                size,
                ..
            } => {
                assert_eq!(file_type, "image");
                assert!(!canvas);
                assert_eq!(size, None);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }
}
