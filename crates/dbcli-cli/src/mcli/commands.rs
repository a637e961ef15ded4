use std::io::Write;

use colored::Colorize;
use dbcli_doc::ops::describe_id;
use dbcli_doc::{
    add_document, build_filter, delete_document, edit_document, list_documents, show_document,
    DocumentStore, FileDocumentStore, Namespace,
};
use dbcli_editor::{EditOutcome, Editor, ExternalEditor};

use super::cli::{Cli, Command, IdArgs};
use crate::config::Config;
use crate::logging;
use crate::rcli::commands::report_skipped;

/// Database and collection chosen on the command line or in the config.
#[derive(Clone, Debug, Default)]
pub struct Target {
    pub database: Option<String>,
    pub collection: Option<String>,
}

impl Target {
    fn namespace(&self) -> anyhow::Result<Namespace> {
        Ok(Namespace::require(self.database.as_deref(), self.collection.as_deref())?)
    }
}

/// Entry point of the `mcli` binary.
pub fn run(cli: Cli) -> anyhow::Result<()> {
    let config = Config::load(cli.config.as_deref())?;
    logging::init(cli.verbose, config.log_level.as_deref());
    let data_dir = cli.data_dir.clone().unwrap_or_else(|| config.data_dir.clone());
    let store = FileDocumentStore::open_in(&data_dir)?;
    let editor = ExternalEditor::resolve(cli.editor.as_deref().or(config.editor.as_deref()));
    let target = Target {
        database: cli.database.or(config.doc.database),
        collection: cli.collection.or(config.doc.collection),
    };
    let stdout = std::io::stdout();
    run_command(cli.command, &target, &store, &editor, &mut stdout.lock())
}

fn filter_of(args: &IdArgs) -> anyhow::Result<dbcli_doc::Filter> {
    Ok(build_filter(
        args.document_id.as_deref(),
        args.document_object_id.as_deref(),
    )?)
}

/// Execute one subcommand, writing its output to `out`.
pub fn run_command<S, E, W>(
    command: Command,
    target: &Target,
    store: &S,
    editor: &E,
    out: &mut W,
) -> anyhow::Result<()>
where
    S: DocumentStore + ?Sized,
    E: Editor + ?Sized,
    W: Write,
{
    match command {
        Command::ListDbs => {
            for name in store.list_databases()? {
                writeln!(out, "{name}")?;
            }
        }
        Command::ListCols => {
            let database = Namespace::require_database(target.database.as_deref())?;
            for name in store.list_collections(database)? {
                writeln!(out, "{name}")?;
            }
        }
        Command::ListDocs(args) => {
            let ns = target.namespace()?;
            for line in list_documents(store, &ns, &args.filter)? {
                writeln!(out, "{line}")?;
            }
        }
        Command::ShowDoc(args) => {
            let ns = target.namespace()?;
            let filter = filter_of(&args.id)?;
            writeln!(out, "{}", show_document(store, &ns, &filter, args.flatten)?)?;
        }
        Command::AddDoc => {
            let ns = target.namespace()?;
            match add_document(store, &ns, editor)? {
                EditOutcome::Committed(id) => {
                    writeln!(out, "{} Inserted {}", "✓".green().bold(), describe_id(&id).yellow())?
                }
                other => report_skipped(out, "Document was not added", &other)?,
            }
        }
        Command::EditDoc(args) => {
            let ns = target.namespace()?;
            let filter = filter_of(&args)?;
            match edit_document(store, &ns, &filter, editor)? {
                EditOutcome::Committed(()) => writeln!(
                    out,
                    "{} Edited document {}",
                    "✓".green().bold(),
                    describe_id(&filter.id_value()).yellow()
                )?,
                other => report_skipped(out, "Document was not edited", &other)?,
            }
        }
        Command::DelDoc(args) => {
            let ns = target.namespace()?;
            let filter = filter_of(&args)?;
            let label = describe_id(&filter.id_value());
            if delete_document(store, &ns, &filter)? {
                writeln!(out, "{} Deleted document {}", "✓".green().bold(), label.yellow())?;
            } else {
                writeln!(out, "No document {}", label.yellow())?;
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mcli::cli::{ListDocsArgs, ShowDocArgs};
    use dbcli_doc::{DocError, InMemoryDocumentStore, ObjectId};
    use dbcli_editor::ScriptedEditor;

    fn target() -> Target {
        Target {
            database: Some("mcli_db_test".into()),
            collection: Some("first".into()),
        }
    }

    fn exec(command: Command, target: &Target, store: &InMemoryDocumentStore, editor: &ScriptedEditor) -> anyhow::Result<String> {
        colored::control::set_override(false);
        let mut out = Vec::new();
        run_command(command, target, store, editor, &mut out)?;
        Ok(String::from_utf8(out).unwrap())
    }

    fn by_id(id: &str) -> IdArgs {
        IdArgs {
            document_id: Some(id.into()),
            document_object_id: None,
        }
    }

    #[test]
    fn add_list_show_edit_delete() {
        let store = InMemoryDocumentStore::new();
        let editor = ScriptedEditor::new()
            .respond(r#"{"_id": "12", "key1": "value1"}"#)
            .respond(r#"{"key2": "value3"}"#)
            .respond(r#"{"_id": "12", "new_key1": "new_value1"}"#);
        let t = target();

        assert!(exec(Command::AddDoc, &t, &store, &editor).unwrap().contains("Inserted 12"));
        let second = exec(Command::AddDoc, &t, &store, &editor).unwrap();
        assert!(second.contains("Inserted ObjectId: "));
        let hex = second.trim_end().rsplit(' ').next().unwrap().to_string();
        assert!(hex.parse::<ObjectId>().is_ok());

        let listed = exec(Command::ListDocs(ListDocsArgs { filter: "{}".into() }), &t, &store, &editor).unwrap();
        assert_eq!(listed, format!("12\nObjectId: {hex}\n"));

        let shown = exec(
            Command::ShowDoc(ShowDocArgs {
                id: IdArgs {
                    document_id: None,
                    document_object_id: Some(hex.clone()),
                },
                flatten: false,
            }),
            &t,
            &store,
            &editor,
        )
        .unwrap();
        assert_eq!(shown, format!("{{\n    \"_id\": \"{hex}\",\n    \"key2\": \"value3\"\n}}\n"));

        assert!(exec(Command::EditDoc(by_id("12")), &t, &store, &editor).unwrap().contains("Edited document 12"));
        let shown = exec(
            Command::ShowDoc(ShowDocArgs { id: by_id("12"), flatten: true }),
            &t,
            &store,
            &editor,
        )
        .unwrap();
        assert_eq!(shown, "_id: 12\nnew_key1: new_value1\n");

        assert!(exec(Command::DelDoc(by_id("12")), &t, &store, &editor).unwrap().contains("Deleted document 12"));
        assert!(exec(Command::DelDoc(by_id("12")), &t, &store, &editor).unwrap().contains("No document 12"));
    }

    #[test]
    fn listings() {
        let store = InMemoryDocumentStore::new();
        let editor = ScriptedEditor::new().respond("{}");
        exec(Command::AddDoc, &target(), &store, &editor).unwrap();
        assert_eq!(exec(Command::ListDbs, &target(), &store, &editor).unwrap(), "mcli_db_test\n");
        assert_eq!(exec(Command::ListCols, &target(), &store, &editor).unwrap(), "first\n");
    }

    #[test]
    fn namespace_and_identifier_errors() {
        let store = InMemoryDocumentStore::new();
        let editor = ScriptedEditor::new();
        let no_ns = Target::default();

        let err = exec(Command::ListCols, &no_ns, &store, &editor).unwrap_err();
        assert!(matches!(err.downcast_ref::<DocError>(), Some(DocError::MissingNamespace(_))));

        let db_only = Target {
            database: Some("db".into()),
            collection: None,
        };
        let err = exec(Command::AddDoc, &db_only, &store, &editor).unwrap_err();
        assert!(matches!(err.downcast_ref::<DocError>(), Some(DocError::MissingNamespace(_))));

        let neither = IdArgs {
            document_id: None,
            document_object_id: None,
        };
        let err = exec(Command::DelDoc(neither), &target(), &store, &editor).unwrap_err();
        assert!(matches!(err.downcast_ref::<DocError>(), Some(DocError::MissingIdentifier)));

        let both = IdArgs {
            document_id: Some("1".into()),
            document_object_id: Some("5f1b2c3d4e5f6a7b8c9d0e1f".into()),
        };
        let err = exec(Command::EditDoc(both), &target(), &store, &editor).unwrap_err();
        assert!(matches!(err.downcast_ref::<DocError>(), Some(DocError::ConflictingIdentifiers)));
    }
}
