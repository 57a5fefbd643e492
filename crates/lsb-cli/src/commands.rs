use std::path::Path;

use anyhow::Context;
use colored::Colorize;
use lsb_document::{BackupDir, BackupStore};
use lsb_engine::{BackupClient, BackupConfig};
use lsb_runtime::{Operation, Outcome};
use lsb_sim::{MemoryWorld, Scene};
use tracing::debug;

use crate::cli::*;
use crate::progress::ConsoleProgress;

pub fn run_command(cli: Cli) -> anyhow::Result<()> {
    let config = load_config(cli.config.as_deref())?;
    match cli.command {
        Command::Inspect(args) => cmd_inspect(args),
        Command::Verify(args) => cmd_verify(args),
        Command::Export(args) => cmd_export(args, config),
        Command::Import(args) => cmd_import(args, config),
    }
}

fn load_config(path: Option<&Path>) -> anyhow::Result<BackupConfig> {
    match path {
        Some(path) => {
            let config = BackupConfig::load(path)
                .with_context(|| format!("loading config {}", path.display()))?;
            debug!(path = %path.display(), policy = %config.export_policy, "config loaded");
            Ok(config)
        }
        None => Ok(BackupConfig::default()),
    }
}

fn cmd_inspect(args: InspectArgs) -> anyhow::Result<()> {
    let backup = BackupDir::new(&args.document);
    let document = backup
        .read_document()
        .with_context(|| format!("reading {}", args.document.display()))?;

    let meta = &document.metadata;
    println!(
        "{} {} v{}",
        args.document.display().to_string().bold(),
        document.format.cyan(),
        document.version
    );
    if let Some(name) = &meta.name {
        println!("  Name: {name}");
    }
    if let Some(grid) = &meta.grid {
        println!("  Grid: {grid}");
    }
    if let Some(at) = meta.exported_at {
        println!("  Exported: {}", at.to_rfc3339());
    }
    println!("  Generator: {}", meta.generator.dimmed());

    for (index, linkset) in document.linksets.iter().enumerate() {
        let [x, y, z]: [f32; 3] = linkset.root_position.into();
        println!(
            "\n{} {} ({} prims) at <{x:.2}, {y:.2}, {z:.2}>",
            "Linkset".bold(),
            index + 1,
            linkset.len()
        );
        for prim in &linkset.prims {
            let role = match prim.parent {
                None => "root".green().to_string(),
                Some(parent) => format!("child of {parent}"),
            };
            println!(
                "  {} {:<24} {} faces  {}",
                prim.local_id.to_string().yellow(),
                prim.name,
                prim.faces.len(),
                role.dimmed()
            );
        }
    }

    let textures = document.referenced_assets();
    println!("\n{} ({})", "Textures".bold(), textures.len());
    for id in textures {
        let mark = if backup.has_texture(id) {
            "✓".green()
        } else {
            "✗".red()
        };
        println!("  {mark} {id}");
    }
    Ok(())
}

fn cmd_verify(args: VerifyArgs) -> anyhow::Result<()> {
    let backup = BackupDir::new(&args.document);
    let document = match backup.read_document() {
        Ok(document) => document,
        Err(e) => {
            println!("{} {}", "✗".red().bold(), e);
            anyhow::bail!("{} is not a valid backup", args.document.display());
        }
    };
    println!(
        "{} Structure: {} linksets, {} prims",
        "✓".green().bold(),
        document.linksets.len(),
        document.prim_count()
    );

    let missing = backup.missing_textures(&document);
    if missing.is_empty() {
        println!(
            "{} Companion images: {} present",
            "✓".green().bold(),
            document.referenced_assets().len()
        );
        return Ok(());
    }
    println!(
        "{} Companion images: {} missing",
        "!".yellow().bold(),
        missing.len()
    );
    for id in &missing {
        println!("  {} {}", "missing:".yellow(), id);
    }
    anyhow::bail!("{} companion images missing", missing.len())
}

fn cmd_export(args: ExportArgs, mut config: BackupConfig) -> anyhow::Result<()> {
    let scene = Scene::load(&args.scene)
        .with_context(|| format!("loading scene {}", args.scene.display()))?;
    if args.name.is_some() {
        config.document_name = args.name;
    }
    let world = MemoryWorld::from_scene(&scene);
    let mut client = BackupClient::new(world.clone(), config, Box::new(ConsoleProgress::default()));
    world.connect(client.sender());

    println!("Exporting {} linksets to {}", scene.linksets.len(), args.out.display().to_string().bold());
    client.start_export(Box::new(BackupDir::new(&args.out)));
    block_on(client.run_until_idle())?;
    report(Operation::Export, client.last_outcome(Operation::Export))
}

fn cmd_import(args: ImportArgs, mut config: BackupConfig) -> anyhow::Result<()> {
    let scene = Scene::load(&args.scene)
        .with_context(|| format!("loading scene {}", args.scene.display()))?;
    if args.no_reupload {
        config.reupload_textures = false;
    }
    let world = MemoryWorld::from_scene(&scene);
    let mut client = BackupClient::new(world.clone(), config, Box::new(ConsoleProgress::default()));
    world.connect(client.sender());

    println!("Importing {}", args.document.display().to_string().bold());
    client.start_import(Box::new(BackupDir::new(&args.document)));
    block_on(client.run_until_idle())?;
    let result = report(Operation::Import, client.last_outcome(Operation::Import));
    for object in world.objects() {
        let [x, y, z]: [f32; 3] = object.position.into();
        let name = object.attributes.map(|a| a.name).unwrap_or_default();
        println!("  {} {:<24} <{x:.2}, {y:.2}, {z:.2}>", object.id.short().yellow(), name);
    }
    result
}

fn block_on<F: std::future::Future>(future: F) -> anyhow::Result<F::Output> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("starting runtime")?;
    Ok(runtime.block_on(future))
}

fn report(operation: Operation, outcome: Option<&Outcome>) -> anyhow::Result<()> {
    match outcome {
        Some(Outcome::Success) => {
            println!("{} {operation} complete", "✓".green().bold());
            Ok(())
        }
        Some(Outcome::Partial(failures)) => {
            println!(
                "{} {operation} complete with {} problems",
                "!".yellow().bold(),
                failures.len()
            );
            for line in failures.summary() {
                println!("  {}", line.yellow());
            }
            Ok(())
        }
        Some(Outcome::Failed(reason)) => {
            println!("{} {operation} failed: {reason}", "✗".red().bold());
            anyhow::bail!("{operation} failed")
        }
        None => anyhow::bail!("{operation} did not finish"),
    }
}
