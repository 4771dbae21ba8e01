use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use graphcore::{LogLine, NodeEntry, RunEvent, WorkflowDocument, WorkflowError};
use graphruntime::{GraphRuntime, NodeRegistry, RuntimeConfig, WorkflowGraph};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::broadcast::{self, error::TryRecvError};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "graph")]
#[command(about = "Graph Engine CLI", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Execute a workflow file
    Run {
        /// Path to workflow JSON file
        #[arg(short, long)]
        file: PathBuf,

        /// Show verbose output
        #[arg(short, long)]
        verbose: bool,
    },

    /// Validate a workflow file
    Validate {
        /// Path to workflow JSON file
        file: PathBuf,
    },

    /// List available node types
    Nodes,

    /// Create a new example workflow
    Init {
        /// Output file path
        #[arg(short, long, default_value = "workflow.json")]
        output: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Run { file, verbose } => {
            let level = if verbose { "debug" } else { "warn" };
            tracing_subscriber::fmt()
                .with_env_filter(
                    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level)),
                )
                .init();

            run_workflow(&file).await?;
        }

        Commands::Validate { file } => {
            validate_workflow(&file)?;
        }

        Commands::Nodes => {
            list_nodes();
        }

        Commands::Init { output } => {
            create_example_workflow(&output)?;
        }
    }

    Ok(())
}

fn load_document(file: &Path) -> Result<WorkflowDocument> {
    let json = std::fs::read_to_string(file)
        .with_context(|| format!("failed to read {}", file.display()))?;
    serde_json::from_str(&json).with_context(|| format!("failed to parse {}", file.display()))
}

fn print_logs(logs: &mut broadcast::Receiver<LogLine>) {
    loop {
        match logs.try_recv() {
            Ok(line) => println!("     {}", line.render()),
            Err(TryRecvError::Lagged(skipped)) => println!("     ... {} log lines skipped", skipped),
            Err(_) => break,
        }
    }
}

async fn run_workflow(file: &Path) -> Result<()> {
    println!("🚀 Loading workflow from: {}", file.display());
    let doc = load_document(file)?;
    println!("   Nodes: {}", doc.nodes.len());
    println!();

    let runtime = GraphRuntime::with_registry(
        Arc::new(graphnodes::standard_registry()),
        RuntimeConfig::default(),
    );
    let mut logs = runtime.subscribe_logs();

    let outcome = runtime
        .run_to_completion(&doc, |event| {
            print_logs(&mut logs);
            match event {
                RunEvent::Processing { node_id } => println!("  ⚡ Processing {}", node_id),
                RunEvent::Done { node_id } => println!("  ✅ Done {}", node_id),
                RunEvent::End(_) => {}
            }
        })
        .await?;
    print_logs(&mut logs);

    if let Some(error) = &outcome.error {
        bail!("💥 Run failed: {}", error);
    }

    println!();
    println!("📊 Results:");
    for id in &outcome.order {
        if let Some(value) = outcome.results.get(id) {
            println!("   {}: {}", id, value);
        }
    }

    if !outcome.failures.is_empty() {
        println!();
        println!("⚠️  Nodes that fell back to 0:");
        let mut failures: Vec<_> = outcome.failures.iter().collect();
        failures.sort();
        for (id, error) in failures {
            println!("   {}: {}", id, error);
        }
    }

    Ok(())
}

/// Warnings for a document that can still run. A cycle is an error.
fn check_document(doc: &WorkflowDocument, registry: &NodeRegistry) -> Result<Vec<String>> {
    let graph = WorkflowGraph::build(doc, registry);
    let report = graph.report();

    let mut warnings = Vec::new();
    for (id, node_type) in &report.unknown_types {
        warnings.push(format!("node {} has unknown type {:?} and is skipped", id, node_type));
    }
    for (id, slot, source) in &report.dangling {
        warnings.push(format!("input {}.{} references missing node {}", id, slot, source));
    }
    let sink_type = RuntimeConfig::default().sink_type;
    if graph.sinks(&sink_type).is_empty() {
        warnings.push(format!("no {} present, a run yields no results", sink_type));
    }

    if let Some(id) = graph.find_cycle() {
        return Err(WorkflowError::CyclicDependency(id).into());
    }
    Ok(warnings)
}

fn validate_workflow(file: &Path) -> Result<()> {
    println!("🔍 Validating workflow: {}", file.display());

    let doc = load_document(file)?;
    let warnings = check_document(&doc, &graphnodes::standard_registry())?;

    println!("✅ Workflow is valid:");
    println!("   Nodes: {}", doc.nodes.len());
    println!(
        "   Connections: {}",
        doc.nodes.iter().map(|n| n.connections.len()).sum::<usize>()
    );
    for warning in warnings {
        println!("   ⚠️  {}", warning);
    }

    Ok(())
}

fn list_nodes() {
    println!("📦 Available Node Types:");
    println!();

    let registry = graphnodes::standard_registry();
    for descriptor in registry.descriptors() {
        println!("  • {} ({})", descriptor.title, descriptor.category);
        for (label, ports) in [("inputs", &descriptor.inputs), ("outputs", &descriptor.outputs)] {
            let names: Vec<_> = ports.iter().map(|p| p.name.as_str()).collect();
            if !names.is_empty() {
                println!("    {}: {}", label, names.join(", "));
            }
        }
        for param in &descriptor.parameters {
            match &param.options {
                Some(options) => println!(
                    "    {} = {} [{}]",
                    param.name,
                    param.default,
                    options.join("|")
                ),
                None => println!("    {} = {}", param.name, param.default),
            }
        }
    }
}

/// Two integers added together and collected by a result node
fn example_workflow() -> WorkflowDocument {
    let mut doc = WorkflowDocument::new();
    doc.add_node(
        NodeEntry::new("n1", "Integer Node")
            .with_param("value", 5i64)
            .with_position(100.0, 100.0),
    );
    doc.add_node(
        NodeEntry::new("n2", "Integer Node")
            .with_param("value", 7i64)
            .with_position(100.0, 250.0),
    );
    doc.add_node(
        NodeEntry::new("n3", "BasicMath Node")
            .with_param("operation", "add")
            .connect("a", "n1")
            .connect("b", "n2")
            .with_position(350.0, 175.0),
    );
    doc.add_node(
        NodeEntry::new("n4", "Result Node")
            .connect("input", "n3")
            .with_position(600.0, 175.0),
    );
    doc
}

fn create_example_workflow(output: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(&example_workflow())?;
    std::fs::write(output, json)
        .with_context(|| format!("failed to write {}", output.display()))?;

    println!("✨ Created example workflow: {}", output.display());
    println!();
    println!("Run it with:");
    println!("  graph run --file {}", output.display());

    Ok(())
}
