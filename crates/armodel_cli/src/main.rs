//! CLI smoke entry point.
//!
//! Walks one record through the Active Record lifecycle against a SQLite
//! document store and prints a deterministic transcript.
//!
//! Usage: `armodel_cli [--db <PATH>] [--log-dir <DIR>] [--log-level <LEVEL>]`

use armodel_core::{
    core_version, default_log_level, init_logging, install_registry, BeanRegistry, Entity,
    LoggingConfig, Model, RepositoryHandle, RepositorySlot, SqliteDocumentRepository,
};
use clap::Parser;
use log::info;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Memo {
    id: Option<Uuid>,
    title: Option<String>,
    body: Option<String>,
    #[serde(skip)]
    slot: RepositorySlot<Memo>,
}

impl Entity for Memo {
    type Id = Uuid;

    fn id(&self) -> Option<Uuid> {
        self.id
    }

    fn set_id(&mut self, id: Uuid) {
        self.id = Some(id);
    }

    fn generate_id() -> Option<Uuid> {
        Some(Uuid::new_v4())
    }
}

impl Model for Memo {
    fn repository_slot(&self) -> &RepositorySlot<Self> {
        &self.slot
    }
}

/// Walks one memo through the Active Record lifecycle.
#[derive(Debug, Parser)]
#[command(name = "armodel_cli", version)]
struct CliArgs {
    /// SQLite database file; an in-memory database is used when omitted.
    #[arg(long = "db", value_name = "PATH")]
    db_path: Option<PathBuf>,

    /// Absolute directory for rolling log files; logging is off when omitted.
    #[arg(long, value_name = "DIR")]
    log_dir: Option<PathBuf>,

    /// trace|debug|info|warn|error; defaults by build mode.
    #[arg(long, value_name = "LEVEL")]
    log_level: Option<String>,
}

fn run(args: CliArgs) -> Result<(), Box<dyn Error>> {
    if let Some(log_dir) = args.log_dir {
        let level = args
            .log_level
            .unwrap_or_else(|| default_log_level().to_string());
        init_logging(&LoggingConfig::new(level, log_dir))?;
    }

    let repo = match &args.db_path {
        Some(path) => SqliteDocumentRepository::<Memo>::open(path)?,
        None => SqliteDocumentRepository::<Memo>::in_memory()?,
    };

    let registry = Arc::new(BeanRegistry::new());
    registry.register_repository(
        "memoRepository",
        RepositoryHandle::partial_update(Arc::new(repo)),
    )?;
    install_registry(registry)?;
    info!("event=cli_start module=cli status=ok version={}", core_version());

    println!("armodel_core version={}", core_version());

    let draft = Memo {
        id: None,
        title: Some("groceries".to_string()),
        body: Some("milk, eggs".to_string()),
        slot: RepositorySlot::new(),
    };
    println!("bean={}", draft.repository_bean_name());

    let saved = draft.save_and_flush()?;
    let id = saved.id.ok_or("saved memo has no id")?;
    println!("saved exists={}", saved.exists_by_id()?);

    let patch = Memo {
        id: Some(id),
        title: Some("weekly groceries".to_string()),
        body: None,
        slot: RepositorySlot::new(),
    };
    let merged = patch.save_or_update_by_not_null_properties()?;
    println!(
        "merged title={} body={}",
        merged.title.as_deref().unwrap_or(""),
        merged.body.as_deref().unwrap_or("")
    );

    patch.delete_by_id()?;
    println!("deleted exists={}", patch.exists_by_id()?);
    Ok(())
}

fn main() -> ExitCode {
    match run(CliArgs::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}
