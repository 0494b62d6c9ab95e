use std::{
    fs::File,
    io::BufWriter,
    path::{Path, PathBuf},
};

use anyhow::Context as _;
use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "rigstage", version)]
struct Cli {
    /// Log debug output to stderr.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Parse, plan and construct a rig without building it.
    Validate(ValidateArgs),
    /// Build a rig against an in-memory scene seeded from its skeleton.
    Build(BuildArgs),
    /// List the registered component types.
    Kinds,
}

#[derive(Parser, Debug)]
struct ValidateArgs {
    /// Input rig JSON.
    #[arg(long = "in")]
    in_path: PathBuf,
}

#[derive(Parser, Debug)]
struct BuildArgs {
    /// Input rig JSON.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Run the optimize pass regardless of the rig file options.
    #[arg(long)]
    optimize: bool,

    /// Write the resulting scene as JSON.
    #[arg(long)]
    dump_scene: Option<PathBuf>,

    /// Write every component record as JSON.
    #[arg(long)]
    save_components: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let level = if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::WARN
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();

    match cli.cmd {
        Command::Validate(args) => cmd_validate(args),
        Command::Build(args) => cmd_build(args),
        Command::Kinds => {
            for tag in rigstage::ComponentCatalog::builtin().tags() {
                println!("{tag}");
            }
            Ok(())
        }
    }
}

fn read_rig(path: &Path) -> anyhow::Result<rigstage::RigFile> {
    rigstage::RigFile::from_path(path).with_context(|| format!("load rig '{}'", path.display()))
}

fn seeded_scene(rig: &rigstage::RigFile) -> anyhow::Result<rigstage::MemoryScene> {
    let mut scene = rigstage::MemoryScene::new();
    rig.seed_scene(&mut scene)
        .with_context(|| format!("seed skeleton of rig '{}'", rig.rig_name))?;
    Ok(scene)
}

fn cmd_validate(args: ValidateArgs) -> anyhow::Result<()> {
    let rig = read_rig(&args.in_path)?;
    let mut scene = seeded_scene(&rig)?;
    let mut cx = rigstage::BuildContext::with_coercion(&mut scene, rig.options.coercion);
    let orch = rigstage::BuildOrchestrator::from_rig_file(
        rigstage::ComponentCatalog::builtin(),
        &rig,
        &mut cx,
    )
    .context("construct components")?;

    println!("{}: {} components", rig.rig_name, orch.components().len());
    for (i, c) in orch.components().iter().enumerate() {
        println!("{:>3}. {} ({})", i + 1, c.name(), c.type_tag());
    }
    Ok(())
}

fn cmd_build(args: BuildArgs) -> anyhow::Result<()> {
    let mut rig = read_rig(&args.in_path)?;
    if args.optimize {
        rig.options.optimize = true;
    }
    let mut scene = seeded_scene(&rig)?;

    let summary = {
        let mut cx = rigstage::BuildContext::with_coercion(&mut scene, rig.options.coercion);
        let mut orch = rigstage::BuildOrchestrator::from_rig_file(
            rigstage::ComponentCatalog::builtin(),
            &rig,
            &mut cx,
        )
        .context("construct components")?;
        let summary = orch.run(&mut cx);

        if let Some(path) = &args.save_components {
            let mut store = rigstage::JsonFileStore;
            orch.save_components(&mut store, path)
                .with_context(|| format!("save components '{}'", path.display()))?;
            eprintln!("wrote {}", path.display());
        }
        summary
    };

    print!("{summary}");

    if let Some(path) = &args.dump_scene {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("create output dir '{}'", parent.display()))?;
        }
        let f = File::create(path).with_context(|| format!("create '{}'", path.display()))?;
        serde_json::to_writer_pretty(BufWriter::new(f), &scene)
            .with_context(|| format!("write scene '{}'", path.display()))?;
        eprintln!("wrote {}", path.display());
    }

    if !summary.is_success() {
        let failed: Vec<String> = summary
            .failures()
            .into_iter()
            .map(|(stage, name, status)| format!("{name} at {stage}: {status}"))
            .collect();
        anyhow::bail!("rig '{}' failed to build:\n  {}", rig.rig_name, failed.join("\n  "));
    }
    Ok(())
}
