//! CLI definition for the custom fields command-line interface.
//!
//! Only depends on `clap` and `std`.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// Manage custom field definitions and the values stored on posts.
///
/// The database, table prefix and upload endpoint come from
/// ~/.custom-fields/config.toml, ./.custom-fields/config.toml and
/// CUSTOM_FIELDS_* environment variables, in that order.
#[derive(Parser, Debug)]
#[command(name = "custom-fields")]
#[command(version)]
#[command(about = "Manage typed custom fields attached to posts")]
#[command(
    long_about = "Create, inspect and update custom field definitions, read and write their \
    values on posts, and render upload widgets.\n\n\
    Environment variables:\n  \
    CUSTOM_FIELDS_DATABASE__PATH          Override the database file\n  \
    CUSTOM_FIELDS_DATABASE__TABLE_PREFIX  Override the table prefix\n  \
    RUST_LOG                              Log filter when --debug is not given"
)]
pub struct Cli {
    /// Enable debug output to stderr
    #[arg(short, long, global = true)]
    pub debug: bool,

    /// SQLite database file, overriding the configured path
    #[arg(long, global = true, value_name = "PATH")]
    pub database: Option<PathBuf>,

    /// Output as JSON
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List the registered field types
    Types,

    /// Create a field in a group
    Create(FieldArgs),

    /// Show a field with its options and properties
    Get {
        /// Field id
        id: i64,
    },

    /// Replace a field's definition, options and properties
    ///
    /// Renaming a field moves every value stored under the old name.
    Update {
        /// Field id
        id: i64,
        #[command(flatten)]
        field: FieldArgs,
    },

    /// Delete a field with its options and properties
    Delete {
        /// Field id
        id: i64,
    },

    /// List the fields of a group in display order
    List {
        /// Group id
        #[arg(long)]
        group: i64,
    },

    /// Read or write field values on posts
    Value {
        #[command(subcommand)]
        action: ValueCommand,
    },

    /// Manage panels
    Panel {
        #[command(subcommand)]
        action: PanelCommand,
    },

    /// Manage groups inside panels
    Group {
        #[command(subcommand)]
        action: GroupCommand,
    },

    /// Print the upload widget markup for a form input
    UploadWidget {
        /// Form input name, e.g. magicfields[photo][1][1]
        input_name: String,
        /// File type passed to the upload endpoint
        #[arg(long = "type", value_name = "TYPE", default_value = "image")]
        file_type: String,
        /// Use the compact canvas layout
        #[arg(long)]
        canvas: bool,
        /// Width of the upload-by-URL input
        #[arg(long, value_name = "N")]
        size: Option<u32>,
    },
}

/// Definition of a field, shared by `create` and `update`.
#[derive(Args, Debug, Clone)]
pub struct FieldArgs {
    /// Group id
    #[arg(long)]
    pub group: i64,
    /// Field name; spaces become underscores
    #[arg(long)]
    pub name: String,
    /// Label shown beside the field
    #[arg(long)]
    pub label: String,
    /// Field type id or key (e.g. 6 or dropdown_list)
    #[arg(long = "type", value_name = "TYPE")]
    pub field_type: String,
    /// Display order inside the group
    #[arg(long, default_value_t = 1)]
    pub order: i64,
    /// Value is required when saving a post
    #[arg(long)]
    pub required: bool,
    /// Field may repeat inside its group
    #[arg(long)]
    pub duplicate: bool,
    /// Selectable option, repeatable
    #[arg(long = "option", value_name = "VALUE")]
    pub options: Vec<String>,
    /// Default value, repeatable
    #[arg(long = "default", value_name = "VALUE")]
    pub defaults: Vec<String>,
    /// Extra property as key=value; the value is parsed as JSON when possible
    #[arg(long = "property", value_name = "KEY=VALUE")]
    pub properties: Vec<String>,
    /// Help text shown under the field
    #[arg(long)]
    pub help_text: Option<String>,
    /// CSS class of the field
    #[arg(long)]
    pub css: Option<String>,
}

/// Address of a value on a post.
#[derive(Args, Debug, Clone)]
pub struct SlotArgs {
    /// Post id
    #[arg(long)]
    pub post: i64,
    /// Field name
    #[arg(long)]
    pub field: String,
    /// Group repetition index, starting at 1
    #[arg(long, default_value_t = 1)]
    pub group_index: i64,
    /// Field repetition index, starting at 1
    #[arg(long, default_value_t = 1)]
    pub field_index: i64,
}

#[derive(Subcommand, Debug)]
pub enum ValueCommand {
    /// Read a value, falling back to legacy post meta
    Get {
        #[command(flatten)]
        slot: SlotArgs,
        /// Decode the stored value as a list
        #[arg(long)]
        multiple: bool,
    },
    /// Store a value; more than one value is stored as a list
    Set {
        #[command(flatten)]
        slot: SlotArgs,
        /// Value(s) to store
        #[arg(required = true)]
        values: Vec<String>,
    },
    /// Show the group and field repetition of a field on a post
    Order {
        /// Post id
        #[arg(long)]
        post: i64,
        /// Field name
        #[arg(long)]
        field: String,
    },
    /// Resolve a field's metadata and live value on a post
    Data {
        #[command(flatten)]
        slot: SlotArgs,
    },
}

#[derive(Subcommand, Debug)]
pub enum PanelCommand {
    /// Create a panel
    Create {
        /// Panel name; the global panel applies to every post
        name: String,
    },
    /// List panels
    List,
    /// Edit a post with a panel
    Assign {
        /// Post id
        #[arg(long)]
        post: i64,
        /// Panel id
        #[arg(long)]
        panel: i64,
    },
}

#[derive(Subcommand, Debug)]
pub enum GroupCommand {
    /// Create a group in a panel
    Create {
        /// Panel id
        #[arg(long)]
        panel: i64,
        /// Group name
        name: String,
        /// Group may repeat on a post
        #[arg(long)]
        duplicate: bool,
    },
    /// List the groups of a panel
    List {
        /// Panel id
        #[arg(long)]
        panel: i64,
    },
}
