use anyhow::{Context, Result, bail};
use camino::{Utf8Path, Utf8PathBuf};
use clap::{ArgAction, Parser, Subcommand};
use gatecraft::config::Config;
use gatecraft::generator::{generate_component_module_with, generate_with};
use gatecraft::geometry::world_ports_for;
use gatecraft::model::{Circuit, CircuitDoc};
use gatecraft::validate::validate_circuit;

#[derive(Parser, Debug)]
#[command(author, version, about = "Validate circuit documents and generate GGL programs", long_about = None)]
struct Cli {
    /// More log output (-v debug, -vv trace); RUST_LOG still applies
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// TOML settings file
    #[arg(long, value_name = "FILE", global = true)]
    config: Option<Utf8PathBuf>,

    /// Circuit id to use instead of the document's active circuit
    #[arg(long, value_name = "ID", global = true)]
    circuit: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the GGL program for a circuit
    Generate {
        /// Circuit document (JSON)
        #[arg(value_name = "CIRCUIT_FILE")]
        file: Utf8PathBuf,
        /// Leave out the trailing run() call
        #[arg(long)]
        no_run: bool,
        /// Emit an importable component module with this name (never calls run())
        #[arg(long, value_name = "NAME")]
        module: Option<String>,
        /// Fail instead of skipping wires that do not resolve
        #[arg(long)]
        strict: bool,
        /// Write the program here instead of stdout
        #[arg(short, long, value_name = "FILE")]
        output: Option<Utf8PathBuf>,
    },
    /// Check wire geometry and list the resulting connections
    Validate {
        #[arg(value_name = "CIRCUIT_FILE")]
        file: Utf8PathBuf,
        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },
    /// List the world positions of a component's ports
    Ports {
        #[arg(value_name = "CIRCUIT_FILE")]
        file: Utf8PathBuf,
        component: String,
    },
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .init();
}

fn load_doc(path: &Utf8Path) -> Result<CircuitDoc> {
    CircuitDoc::load_from_json(path).with_context(|| format!("Failed to load {}", path))
}

fn pick_circuit<'a>(doc: &'a CircuitDoc, id: Option<&str>) -> Result<&'a Circuit> {
    match id {
        Some(id) => doc
            .circuits
            .iter()
            .find(|c| c.id == id)
            .with_context(|| format!("No circuit with id `{id}`")),
        None => doc.active_circuit().context("Document contains no circuits"),
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = match &cli.config {
        Some(path) => Config::load(path).with_context(|| format!("Failed to read config {}", path))?,
        None => Config::default(),
    };

    match cli.command {
        Command::Generate {
            file,
            no_run,
            module,
            strict,
            output,
        } => {
            let doc = load_doc(&file)?;
            let circuit = pick_circuit(&doc, cli.circuit.as_deref())?;
            let program = match &module {
                Some(name) => generate_component_module_with(circuit, name, &config.generator),
                None => {
                    let options = config.generator.clone().with_run(config.generator.include_run && !no_run);
                    generate_with(&circuit.components, &circuit.wires, &circuit.junctions, &options)
                }
            };
            if !program.is_complete() {
                for error in &program.report.errors {
                    log::warn!("{error}");
                }
                if strict {
                    bail!(
                        "{} wire(s) in circuit `{}` did not resolve",
                        program.report.errors.len(),
                        circuit.id
                    );
                }
            }
            match output {
                Some(path) => std::fs::write(&path, &program.code).with_context(|| format!("Write {}", path))?,
                None => print!("{}", program.code),
            }
        }
        Command::Validate { file, json } => {
            let doc = load_doc(&file)?;
            let circuit = pick_circuit(&doc, cli.circuit.as_deref())?;
            let report = validate_circuit(circuit);
            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                for c in &report.connections {
                    println!("{}.{} -> {}.{}", c.source, c.source_port, c.dest, c.dest_port);
                }
                for warning in &report.warnings {
                    println!("warning: {warning}");
                }
                for error in &report.errors {
                    println!("error: {error}");
                }
            }
            if !report.valid {
                bail!("Circuit `{}` has {} error(s)", circuit.id, report.errors.len());
            }
        }
        Command::Ports { file, component } => {
            let doc = load_doc(&file)?;
            let circuit = pick_circuit(&doc, cli.circuit.as_deref())?;
            let component = circuit
                .component(&component)
                .with_context(|| format!("No component `{component}` in circuit `{}`", circuit.id))?;
            for port in world_ports_for(component) {
                println!("{} {} ({}) at {}", port.direction, port.index, port.name, port.pos);
            }
        }
    }
    Ok(())
}
