use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "mcli", about = "Document store client with a JSON editor", version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Configuration file
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Directory holding the store snapshot
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,

    /// Database name
    #[arg(short, long, global = true)]
    pub database: Option<String>,

    /// Collection name
    #[arg(short, long, global = true)]
    pub collection: Option<String>,

    /// Editor command
    #[arg(long, global = true)]
    pub editor: Option<String>,

    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// List databases
    ListDbs,
    /// List collections in the database
    ListCols,
    /// List document ids in the collection
    ListDocs(ListDocsArgs),
    /// Show a document
    ShowDoc(ShowDocArgs),
    /// Add a document through the editor
    AddDoc,
    /// Edit a document in the editor
    EditDoc(IdArgs),
    /// Delete a document
    DelDoc(IdArgs),
}

#[derive(Debug, Args)]
pub struct ListDocsArgs {
    /// Filter as JSON
    #[arg(short, long, default_value = "{}")]
    pub filter: String,
}

/// Document selection by `_id`.
#[derive(Debug, Args)]
pub struct IdArgs {
    /// Document `_id` value
    #[arg(short = 'i', long)]
    pub document_id: Option<String>,
    /// Document object id (24 hex characters)
    #[arg(short = 'o', long)]
    pub document_object_id: Option<String>,
}

#[derive(Debug, Args)]
pub struct ShowDocArgs {
    #[command(flatten)]
    pub id: IdArgs,
    /// Print one `path: value` line per field
    #[arg(short, long)]
    pub flatten: bool,
}
