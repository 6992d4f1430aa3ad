//! # chatminer CLI
//!
//! Command-line front end: spawns the import and analysis workers and
//! prints their events.

use std::path::PathBuf;
use std::process;
use std::sync::Arc;
use std::time::Instant;

use clap::Parser as ClapParser;
use tracing_subscriber::EnvFilter;

use chatminer::cli::{Args, Command, DateWindow};
use chatminer::config::AppConfig;
use chatminer::extract::TaskStatus;
use chatminer::llm::{LlmClient, create_client};
use chatminer::parsers::ExportFormat;
use chatminer::pipeline::{
    AnalysisEvent, AnalysisJob, AnalysisOutcome, IngestEvent, spawn_analysis, spawn_ingestion,
};
use chatminer::store::{SqliteStore, Store};
use chatminer::{ChatminerError, Result};

fn main() {
    if let Err(e) = run() {
        eprintln!("❌ Error: {}", e);
        process::exit(1);
    }
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn run() -> Result<()> {
    let args = <Args as ClapParser>::parse();
    init_tracing(args.verbose);

    let mut config = AppConfig::load(&args.config)?;
    if let Some(db) = args.db {
        config.database.path = db;
    }
    if let Some(provider) = args.provider {
        config.llm.provider = provider;
    }

    println!("⛏️  chatminer v{}", env!("CARGO_PKG_VERSION"));
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!("🗄️  Database: {}", config.database.path.display());

    match args.command {
        Command::Import { files, format } => import(&config, files, format),
        Command::Analyze { window } => analyze(config, &window, AnalysisJob::Bulk),
        Command::Profile { name, window } => analyze(config, &window, AnalysisJob::Person(name)),
        Command::Alerts { names, window } => analyze(config, &window, AnalysisJob::Alerts(names)),
        Command::Me { name } => set_me(&config, &name),
        Command::Task { id, status } => set_task_status(&config, id, status),
        Command::Stats { json } => stats(&config, json),
    }
}

fn import(config: &AppConfig, files: Vec<PathBuf>, format: ExportFormat) -> Result<()> {
    println!("📖 Format:   {}", format);
    println!("📂 Files:    {}", files.len());
    println!();

    let start = Instant::now();
    let worker = spawn_ingestion(
        config.database.path.clone(),
        format,
        files,
        config.ingest.checkpoint_every,
    )?;
    let summary = worker.wait_with(|event| {
        if let IngestEvent::Progress(message) = event {
            println!("   {}", message);
        }
    })?;

    println!();
    println!("✅ Imported in {:.2}s", start.elapsed().as_secs_f64());
    println!();
    println!("📊 Summary:");
    println!("   Files:         {}", summary.files);
    println!("   Messages:      {}", summary.messages);
    println!("   Participants:  {}", summary.participants);
    println!("   Links:         {}", summary.links);
    Ok(())
}

fn analyze(config: AppConfig, window: &DateWindow, job: AnalysisJob) -> Result<()> {
    let filter = window.to_filter()?;
    if let Some(ref after) = window.after {
        println!("📅 After:    {}", after);
    }
    if let Some(ref before) = window.before {
        println!("📅 Before:   {}", before);
    }

    let client: Arc<dyn LlmClient> = Arc::from(create_client(&config.llm)?);
    println!("🤖 Provider: {} ({})", config.llm.provider, config.llm.effective_model());
    println!();

    let start = Instant::now();
    let worker = spawn_analysis(config, client, filter, job)?;
    let outcome = worker.wait_with(|event| {
        if let AnalysisEvent::Progress(progress) = event {
            println!("   {}", progress);
        }
    })?;

    println!();
    println!("✅ Done in {:.2}s", start.elapsed().as_secs_f64());
    print_outcome(&outcome);
    Ok(())
}

fn print_outcome(outcome: &AnalysisOutcome) {
    println!();
    if !outcome.tasks.is_empty() {
        println!("📋 Tasks: {}", outcome.tasks.len());
    }
    for person in &outcome.profiles {
        let profile = &person.profile;
        println!(
            "👤 {}: {} ({:.0}%), {} skills, {} commitments",
            person.name,
            profile.role,
            profile.role_confidence * 100.0,
            profile.skills.len(),
            profile.commitments.len()
        );
    }
    if !outcome.patterns.is_empty() {
        println!("🔁 Patterns: {}", outcome.patterns.len());
    }
    for person in &outcome.alerts {
        println!("🚩 {}: {} alerts", person.name, person.alerts.len());
    }
    for name in &outcome.skipped {
        println!("⏭️  Skipped {}", name);
    }
}

fn set_me(config: &AppConfig, name: &str) -> Result<()> {
    let store = SqliteStore::open(&config.database.path)?;
    let person = store
        .find_person(name)?
        .ok_or_else(|| ChatminerError::unknown_person(name))?;
    store.set_me(person.id)?;
    println!("✅ {} is now marked as you", person.name);
    Ok(())
}

fn set_task_status(config: &AppConfig, id: i64, status: TaskStatus) -> Result<()> {
    let store = SqliteStore::open(&config.database.path)?;
    store.update_task_status(id, status)?;
    println!("✅ Task {} is now {}", id, status);
    Ok(())
}

fn stats(config: &AppConfig, json: bool) -> Result<()> {
    let store = SqliteStore::open(&config.database.path)?;
    let stats = store.dashboard_stats()?;

    if json {
        println!("{}", serde_json::to_string_pretty(&stats)?);
        return Ok(());
    }

    println!();
    println!("📊 Stats:");
    println!("   People:       {}", stats.persons);
    println!("   Messages:     {}", stats.messages);
    println!(
        "   Tasks:        {} ({} pending, {} completed)",
        stats.tasks,
        stats.tasks_with(TaskStatus::Pending),
        stats.tasks_with(TaskStatus::Completed)
    );
    println!("   Patterns:     {}", stats.patterns);
    println!("   Links:        {}", stats.links);
    println!("   Commitments:  {}", stats.commitments);
    println!("   Alerts:       {}", stats.alerts);
    if let Some(me) = store.get_me()? {
        println!("   You:          {}", me.name);
    }
    Ok(())
}
