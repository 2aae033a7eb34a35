use std::{
    fs::File,
    io::BufReader,
    path::{Path, PathBuf},
};

use anyhow::Context as _;
use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "nodebox", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Evaluate a document and write the rendered values as JSON.
    Render(RenderArgs),
    /// List the available node types and their parameters.
    Types,
}

#[derive(Parser, Debug)]
struct RenderArgs {
    /// Input document JSON.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Node to render (absolute path); defaults to the rendered child of the root.
    #[arg(long)]
    node: Option<String>,

    /// Frame to evaluate; overrides the document's frame.
    #[arg(long)]
    frame: Option<f64>,

    /// Output JSON path; stdout when omitted.
    #[arg(long)]
    out: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.cmd {
        Command::Render(args) => cmd_render(args),
        Command::Types => cmd_types(),
    }
}

fn read_document(path: &Path) -> anyhow::Result<nodebox::Document> {
    let f = File::open(path).with_context(|| format!("open document '{}'", path.display()))?;
    let r = BufReader::new(f);
    let doc: nodebox::Document =
        serde_json::from_reader(r).with_context(|| "parse document JSON")?;
    Ok(doc)
}

fn cmd_render(args: RenderArgs) -> anyhow::Result<()> {
    let doc = read_document(&args.in_path)?;
    let mut lib = nodebox::NodeLibrary::from_document(&doc)
        .with_context(|| format!("load document '{}'", args.in_path.display()))?;
    if let Some(frame) = args.frame {
        lib.set_frame(frame);
    }

    let values = match &args.node {
        Some(path) => lib
            .render_node(path)
            .with_context(|| format!("render node '{path}'"))?,
        None => lib.render().with_context(|| "render document")?,
    };

    let json = serde_json::to_string_pretty(&values).with_context(|| "serialize output")?;
    match &args.out {
        Some(out) => {
            if let Some(parent) = out.parent()
                && !parent.as_os_str().is_empty()
            {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("create output dir '{}'", parent.display()))?;
            }
            std::fs::write(out, json).with_context(|| format!("write '{}'", out.display()))?;
            eprintln!("wrote {}", out.display());
        }
        None => println!("{json}"),
    }
    Ok(())
}

fn cmd_types() -> anyhow::Result<()> {
    let repo = nodebox::NodeRepository::with_builtins();
    for ty in repo.types() {
        println!("{} -> {}", ty.id, ty.output_type);
        if !ty.description.is_empty() {
            println!("    {}", ty.description);
        }
        for p in &ty.parameters {
            println!(
                "    {}: {} = {}{}",
                p.name,
                p.value_type,
                p.default,
                if p.nullable { " (nullable)" } else { "" }
            );
        }
    }
    Ok(())
}
