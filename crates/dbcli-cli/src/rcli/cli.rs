use std::path::PathBuf;

use anyhow::bail;
use clap::{Args, Parser, Subcommand};
use dbcli_kv::ValueTag;

#[derive(Debug, Parser)]
#[command(name = "rcli", about = "Key-value store client with a JSON editor", version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Configuration file
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Directory holding the store snapshots
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,

    /// Database number
    #[arg(short = 'n', long, global = true)]
    pub db: Option<u32>,

    /// Editor command
    #[arg(long, global = true)]
    pub editor: Option<String>,

    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// List keys starting with a pattern
    ListKeys(ListKeysArgs),
    /// Show data in `key : value` format
    ShowDb(ShowDbArgs),
    /// Add a key of one type through the editor
    AddKey(AddKeyArgs),
    /// Add several keys at once through the editor
    AddData,
    /// Edit a key's value in the editor
    EditDoc(KeyArgs),
    /// Delete a key
    DelKey(KeyArgs),
    /// Turn a list into a set
    ToSet(KeyArgs),
    /// Turn a hash into a sorted set
    ToZset(KeyArgs),
}

#[derive(Debug, Args)]
pub struct ListKeysArgs {
    /// Key prefix (glob syntax allowed)
    #[arg(short, long, default_value = "")]
    pub pattern: String,
}

#[derive(Debug, Args)]
pub struct ShowDbArgs {
    /// Show only this key
    #[arg(short, long)]
    pub key: Option<String>,
    /// Keys search pattern
    #[arg(short, long, default_value = "*")]
    pub pattern: String,
}

#[derive(Debug, Args)]
pub struct AddKeyArgs {
    pub key: String,
    /// Bitmap key
    #[arg(short, long)]
    pub bits: bool,
    /// List key
    #[arg(short, long)]
    pub list: bool,
    /// Hash key
    #[arg(long)]
    pub hash: bool,
    /// Set key
    #[arg(short, long)]
    pub set: bool,
    /// Sorted set key
    #[arg(short, long)]
    pub zset: bool,
    /// HyperLogLog key
    #[arg(short = 'e', long)]
    pub hyll: bool,
}

impl AddKeyArgs {
    /// The requested type; a plain string when no flag is given.
    pub fn tag(&self) -> anyhow::Result<ValueTag> {
        let flags = [
            (self.bits, ValueTag::Bitmap),
            (self.list, ValueTag::List),
            (self.hash, ValueTag::Hash),
            (self.set, ValueTag::Set),
            (self.zset, ValueTag::SortedSet),
            (self.hyll, ValueTag::HyperLogLogSet),
        ];
        let mut chosen = flags.iter().filter(|(on, _)| *on).map(|(_, tag)| *tag);
        match (chosen.next(), chosen.next()) {
            (None, _) => Ok(ValueTag::String),
            (Some(tag), None) => Ok(tag),
            (Some(_), Some(_)) => bail!("only one key type can be set"),
        }
    }
}

#[derive(Debug, Args)]
pub struct KeyArgs {
    pub key: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_globals_after_subcommand() {
        let cli = Cli::try_parse_from(["rcli", "show-db", "-k", "k1", "-n", "3", "-v"]).unwrap();
        assert_eq!(cli.db, Some(3));
        assert!(cli.verbose);
        match cli.command {
            Command::ShowDb(args) => {
                assert_eq!(args.key.as_deref(), Some("k1"));
                assert_eq!(args.pattern, "*");
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn list_keys_defaults_to_everything() {
        let cli = Cli::try_parse_from(["rcli", "list-keys"]).unwrap();
        assert!(matches!(cli.command, Command::ListKeys(ListKeysArgs { ref pattern }) if pattern.is_empty()));
    }

    fn parse(args: &[&str]) -> AddKeyArgs {
        match Cli::try_parse_from(args).unwrap().command {
            Command::AddKey(a) => a,
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn add_key_type_flags() {
        assert_eq!(parse(&["rcli", "add-key", "k"]).tag().unwrap(), ValueTag::String);
        assert_eq!(parse(&["rcli", "add-key", "k", "--zset"]).tag().unwrap(), ValueTag::SortedSet);
        assert_eq!(parse(&["rcli", "add-key", "k", "-e"]).tag().unwrap(), ValueTag::HyperLogLogSet);
        assert_eq!(parse(&["rcli", "add-key", "k", "--bits"]).tag().unwrap(), ValueTag::Bitmap);
        let err = parse(&["rcli", "add-key", "k", "--list", "--hash"]).tag().unwrap_err();
        assert_eq!(err.to_string(), "only one key type can be set");
    }

    #[test]
    fn subcommand_names() {
        assert!(Cli::try_parse_from(["rcli", "add-data"]).is_ok());
        for name in ["edit-doc", "del-key", "to-set", "to-zset"] {
            assert!(Cli::try_parse_from(["rcli", name, "k"]).is_ok(), "{name}");
            assert!(Cli::try_parse_from(["rcli", name]).is_err(), "{name} needs a key");
        }
    }
}
