//! Command-line front end for the ZEL core.
//!
//! # Responsibility
//! - Drive store, guard and preference commands against the on-disk store.
//! - Keep output deterministic for scripting and quick local checks.
//!
//! Document commands run only in an unlocked session.

use clap::{Parser, Subcommand};
use log::info;
use std::error::Error;
use std::fs;
use std::path::PathBuf;
use zel_core::db::open_db;
use zel_core::export::share::fits_qr_code;
use zel_core::export::{backup_file_name, is_backup_file_name, text_file_name};
use zel_core::model::system_clock;
use zel_core::service::preferences::messages;
use zel_core::{
    init_logging, AppConfig, DocumentStore, GuardError, Preferences, SaveRequest, SessionGuard,
    SqliteKvStore,
};

/// ZEL document store and session guard
#[derive(Parser, Debug)]
#[command(name = "zel", version, about, long_about = None)]
struct Args {
    /// SQLite file backing the store
    #[arg(long, env = "ZEL_DB_PATH")]
    db: Option<PathBuf>,

    /// Absolute directory for rolling log files
    #[arg(long, env = "ZEL_LOG_DIR")]
    log_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print core linkage information
    Ping,
    /// List documents, newest first
    List,
    /// Print the active document
    Show,
    /// Create a document and make it active
    New {
        name: String,
        #[arg(long, default_value = "")]
        content: String,
    },
    /// Select the active document
    Select { id: String },
    /// Rename a document
    Rename { id: String, name: String },
    /// Delete a document
    Delete { id: String },
    /// Replace the active document's content
    Write { content: String },
    /// Replace the global memo
    Memo { text: String },
    /// Write a JSON backup (default file name when --out is omitted)
    Backup {
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Import a `.json` backup or any other file as a new document
    Import { path: PathBuf },
    /// Export the active document as plain text
    ExportText {
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Print a compressed share link for the active document's text
    Share {
        #[arg(long, default_value = "https://zel.local/")]
        base_url: String,
    },
    /// Create the shared secret
    Setup { secret: String, confirm: String },
    /// Lock the session
    Lock,
    /// Unlock the session
    Unlock { secret: String },
    /// Wipe every persisted key after confirming the secret
    Reset { secret: String },
    /// Set the UI language (pt|en|es)
    Lang { code: String },
    /// Start or cancel the pomodoro timer
    Pomodoro,
}

fn main() {
    if let Err(err) = run(Args::parse()) {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}

fn run(args: Args) -> Result<(), Box<dyn Error>> {
    let mut config = AppConfig::from_env();
    if let Some(db) = args.db {
        config.db_path = db;
    }
    if let Some(log_dir) = args.log_dir {
        config.log_dir = Some(log_dir);
    }
    if let Some(log_dir) = &config.log_dir {
        init_logging(&config.log_level, &log_dir.to_string_lossy())?;
    }

    let Some(command) = args.command else {
        return ping();
    };
    if let Command::Ping = command {
        return ping();
    }

    let conn = open_db(&config.db_path)?;
    let kv = SqliteKvStore::new(&conn);
    let mut guard = SessionGuard::new(kv);
    let state = guard.start()?;
    info!(
        "event=cli_command module=cli status=start command={} guard_state={:?}",
        command_name(&command),
        state
    );
    let language = Preferences::new(kv).language_or_default();

    match command {
        Command::Ping => ping(),
        Command::Setup { secret, confirm } => {
            guard.setup(&secret, &confirm)?;
            println!("session created");
            Ok(())
        }
        Command::Lock => {
            guard.lock()?;
            println!("locked");
            Ok(())
        }
        Command::Unlock { secret } => match guard.unlock(&secret) {
            Ok(_) => {
                println!("unlocked");
                Ok(())
            }
            Err(GuardError::Rejected) => Err(messages(language).wrong_pass.into()),
            Err(err) => Err(err.into()),
        },
        Command::Reset { secret } => {
            match guard.confirm_hard_reset(&secret) {
                Ok(()) => {
                    println!("all data removed");
                    Ok(())
                }
                Err(GuardError::Rejected) => Err(messages(language).wrong_pass.into()),
                Err(err) => Err(err.into()),
            }
        }
        Command::Lang { code } => {
            let language = Preferences::new(kv).set_language(&code)?;
            println!("{}", language.code());
            Ok(())
        }
        Command::Pomodoro => {
            let status = Preferences::new(kv).toggle_pomodoro(system_clock())?;
            println!("{}", status.label());
            Ok(())
        }
        document_command => {
            match guard.ensure_unlocked() {
                Ok(()) => {}
                Err(GuardError::Locked) => return Err(messages(language).locked.into()),
                Err(GuardError::NotConfigured) => {
                    return Err(messages(language).create_pass.into())
                }
                Err(err) => return Err(err.into()),
            }
            let mut store = DocumentStore::initialize(kv)?;
            run_document_command(&mut store, document_command)
        }
    }
}

fn run_document_command(
    store: &mut DocumentStore<SqliteKvStore<'_>>,
    command: Command,
) -> Result<(), Box<dyn Error>> {
    match command {
        Command::List => {
            store.get_active()?;
            let active = store.active_id().map(str::to_string);
            for document in store.documents() {
                let marker = if active.as_deref() == Some(document.id.as_str()) {
                    '*'
                } else {
                    ' '
                };
                println!("{marker} {}\t{}", document.id, document.name);
            }
        }
        Command::Show => match store.get_active()? {
            Some(document) => {
                println!("# {}", document.name);
                println!("{}", document.content);
            }
            None => println!("no documents"),
        },
        Command::New { name, content } => {
            let document = store.create_document(name, content)?;
            println!("{}", document.id);
        }
        Command::Select { id } => store.set_active(id)?,
        Command::Rename { id, name } => {
            if !store.rename_document(&id, name)? {
                println!("document {id} not found");
            }
        }
        Command::Delete { id } => {
            if !store.delete_document(&id)? {
                println!("document {id} not found");
            }
        }
        Command::Write { content } => store.save(SaveRequest {
            content: Some(content),
            ..SaveRequest::default()
        })?,
        Command::Memo { text } => store.save(SaveRequest {
            memo: Some(text),
            ..SaveRequest::default()
        })?,
        Command::Backup { out } => {
            let path = out.unwrap_or_else(|| PathBuf::from(backup_file_name(system_clock())));
            fs::write(&path, store.export_backup()?)?;
            println!("{}", path.display());
        }
        Command::Import { path } => {
            let text = fs::read_to_string(&path)?;
            let file_name = path
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_default();
            if is_backup_file_name(&file_name) {
                store.import_backup(&text)?;
                println!("backup restored");
            } else {
                let document = store.import_text_file(&file_name, text)?;
                println!("{}", document.id);
            }
        }
        Command::ExportText { out } => {
            let Some(text) = store.export_plain_text()? else {
                return Err("no active document".into());
            };
            let path = out.unwrap_or_else(|| PathBuf::from(text_file_name(system_clock())));
            fs::write(&path, text)?;
            println!("{}", path.display());
        }
        Command::Share { base_url } => {
            let text = store.export_plain_text()?.unwrap_or_default();
            let link = store.generate_share_link(&base_url, &text)?;
            if !fits_qr_code(&link) {
                eprintln!("warning: text too long for a QR code");
            }
            println!("{link}");
        }
        other => return Err(format!("unsupported command: {other:?}").into()),
    }
    Ok(())
}

fn command_name(command: &Command) -> &'static str {
    match command {
        Command::Ping => "ping",
        Command::List => "list",
        Command::Show => "show",
        Command::New { .. } => "new",
        Command::Select { .. } => "select",
        Command::Rename { .. } => "rename",
        Command::Delete { .. } => "delete",
        Command::Write { .. } => "write",
        Command::Memo { .. } => "memo",
        Command::Backup { .. } => "backup",
        Command::Import { .. } => "import",
        Command::ExportText { .. } => "export-text",
        Command::Share { .. } => "share",
        Command::Setup { .. } => "setup",
        Command::Lock => "lock",
        Command::Unlock { .. } => "unlock",
        Command::Reset { .. } => "reset",
        Command::Lang { .. } => "lang",
        Command::Pomodoro => "pomodoro",
    }
}

fn ping() -> Result<(), Box<dyn Error>> {
    println!("zel_core ping={}", zel_core::ping());
    println!("zel_core version={}", zel_core::core_version());
    Ok(())
}
