use std::io::Write;

use colored::Colorize;
use dbcli_editor::{EditOutcome, Editor, ExternalEditor};
use dbcli_kv::{
    add_key, list_keys, run_add_data, show_db, to_set, to_zset, EditSession, FileKeyValueStore,
    KeyValueStore,
};

use super::cli::{Cli, Command};
use crate::config::Config;
use crate::logging;

/// Entry point of the `rcli` binary.
pub fn run(cli: Cli) -> anyhow::Result<()> {
    let config = Config::load(cli.config.as_deref())?;
    logging::init(cli.verbose, config.log_level.as_deref());
    let data_dir = cli.data_dir.clone().unwrap_or_else(|| config.data_dir.clone());
    let store = FileKeyValueStore::open_in(&data_dir, cli.db.unwrap_or(config.kv.db))?;
    let editor = ExternalEditor::resolve(cli.editor.as_deref().or(config.editor.as_deref()));
    let stdout = std::io::stdout();
    run_command(cli.command, &store, &editor, &mut stdout.lock())
}

/// Execute one subcommand, writing its output to `out`.
pub fn run_command<S, E, W>(command: Command, store: &S, editor: &E, out: &mut W) -> anyhow::Result<()>
where
    S: KeyValueStore + ?Sized,
    E: Editor + ?Sized,
    W: Write,
{
    match command {
        Command::ListKeys(args) => {
            for key in list_keys(store, &args.pattern)? {
                writeln!(out, "{key}")?;
            }
        }
        Command::ShowDb(args) => {
            for line in show_db(store, args.key.as_deref(), &args.pattern)? {
                writeln!(out, "{line}")?;
            }
        }
        Command::AddKey(args) => {
            let tag = args.tag()?;
            match add_key(store, editor, &args.key, tag)? {
                EditOutcome::Committed(key) => {
                    writeln!(out, "{} Added {} key {}", "✓".green().bold(), tag, key.yellow())?
                }
                other => report_skipped(out, "Key was not added", &other)?,
            }
        }
        Command::AddData => match run_add_data(store, editor)? {
            EditOutcome::Committed(keys) => {
                writeln!(out, "{} Added {} keys", "✓".green().bold(), keys.len())?;
                for key in keys {
                    writeln!(out, "  {}", key.yellow())?;
                }
            }
            other => report_skipped(out, "Keys were not added", &other)?,
        },
        Command::EditDoc(args) => match EditSession::new(store, args.key.as_str()).run(editor)? {
            EditOutcome::Committed(key) if key == args.key => {
                writeln!(out, "{} Edited key {}", "✓".green().bold(), key.yellow())?
            }
            EditOutcome::Committed(key) => writeln!(
                out,
                "{} Edited key {} → {}",
                "✓".green().bold(),
                args.key.yellow(),
                key.yellow()
            )?,
            other => report_skipped(out, "Key was not edited", &other)?,
        },
        Command::DelKey(args) => {
            if store.del(args.key.as_bytes())? {
                writeln!(out, "{} Deleted key {}", "✓".green().bold(), args.key.yellow())?;
            } else {
                writeln!(out, "No key {}", args.key.yellow())?;
            }
        }
        Command::ToSet(args) => {
            let members = to_set(store, &args.key)?;
            writeln!(out, "{} Converted {} to set ({members} members)", "✓".green().bold(), args.key.yellow())?;
        }
        Command::ToZset(args) => {
            let members = to_zset(store, &args.key)?;
            writeln!(
                out,
                "{} Converted {} to sorted set ({members} members)",
                "✓".green().bold(),
                args.key.yellow()
            )?;
        }
    }
    Ok(())
}

/// Report an editor round trip that ended without a write.
pub(crate) fn report_skipped<T, W: Write>(out: &mut W, what: &str, outcome: &EditOutcome<T>) -> anyhow::Result<()> {
    match outcome {
        EditOutcome::Unchanged => writeln!(out, "No changes made.")?,
        EditOutcome::InvalidJson(message) => writeln!(out, "{}: invalid JSON: {message}", what.yellow())?,
        EditOutcome::Committed(_) => {}
    }
    Ok(())
}
