use clap::{Args, Parser, Subcommand};
use fc_codec::{
    DecodeOptions, EncodeOptions, Encoded, NotationVersion, Traversal, decode, encode,
    encode_variants, strip_notation,
};
use fc_core::{CodecError, DegradedMerge};
use fc_graph::FlowsheetGraph;
use fc_project::{CodecDef, FlowsheetDoc, ProjectError, doc_to_graph, graph_to_doc};
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Parser)]
#[command(name = "fc-cli")]
#[command(about = "flowcode CLI - canonical flowsheet notation", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate a flowsheet document
    Validate {
        /// Path to the flowsheet YAML or JSON file
        doc_path: PathBuf,
    },
    /// Encode a flowsheet document to notation
    Encode {
        /// Path to the flowsheet YAML or JSON file
        doc_path: PathBuf,
        #[command(flatten)]
        flags: EncodeFlags,
        /// Print this many randomized encodings instead of the canonical one
        #[arg(long)]
        variants: Option<u64>,
    },
    /// Decode notation into a flowsheet document
    Decode {
        /// Notation text, e.g. "(raw)(pump)(product)"
        notation: String,
        /// Keep heat-integration shadow units separate
        #[arg(long)]
        no_merge: bool,
        /// Output file (.yaml or .json); prints YAML to stdout if omitted
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Check whether two documents describe the same flowsheet
    Canon {
        first: PathBuf,
        second: PathBuf,
    },
    /// Material-only notation: drop control units and signals
    Strip {
        /// Notation text
        notation: String,
        #[command(flatten)]
        flags: EncodeFlags,
    },
}

#[derive(Args)]
struct EncodeFlags {
    /// Write v1 notation (no tags)
    #[arg(long)]
    v1: bool,
    /// Leave out heat-exchange role tags
    #[arg(long)]
    no_heat_tags: bool,
    /// Randomize traversal order with this seed
    #[arg(long)]
    seed: Option<u64>,
}

impl EncodeFlags {
    /// Document settings with command-line overrides applied.
    fn apply(&self, mut options: EncodeOptions) -> EncodeOptions {
        if self.v1 {
            options = options.with_version(NotationVersion::V1);
        }
        if self.no_heat_tags {
            options = options.with_heat_tags(false);
        }
        if let Some(seed) = self.seed {
            options = options.with_traversal(Traversal::Randomized { seed });
        }
        options
    }
}

#[derive(thiserror::Error, Debug)]
enum CliError {
    #[error(transparent)]
    Project(#[from] ProjectError),

    #[error(transparent)]
    Codec(#[from] CodecError),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

type CliResult<T> = Result<T, CliError>;

fn main() -> CliResult<()> {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Validate { doc_path } => cmd_validate(&doc_path),
        Commands::Encode {
            doc_path,
            flags,
            variants,
        } => cmd_encode(&doc_path, &flags, variants),
        Commands::Decode {
            notation,
            no_merge,
            output,
        } => cmd_decode(&notation, no_merge, output.as_deref()),
        Commands::Canon { first, second } => cmd_canon(&first, &second),
        Commands::Strip { notation, flags } => cmd_strip(&notation, &flags),
    }
}

fn load_graph(path: &Path) -> CliResult<(FlowsheetDoc, FlowsheetGraph)> {
    let doc = fc_project::load(path)?;
    let graph = doc_to_graph(&doc)?;
    info!(path = %path.display(), units = graph.unit_count(), "loaded flowsheet");
    Ok((doc, graph))
}

fn cmd_validate(doc_path: &Path) -> CliResult<()> {
    println!("Validating flowsheet: {}", doc_path.display());
    let (doc, graph) = load_graph(doc_path)?;
    println!(
        "✓ {} is valid ({} units, {} streams)",
        doc.name,
        graph.unit_count(),
        graph.stream_count()
    );
    Ok(())
}

fn cmd_encode(doc_path: &Path, flags: &EncodeFlags, variants: Option<u64>) -> CliResult<()> {
    let (doc, graph) = load_graph(doc_path)?;
    let options = flags.apply(doc.codec.encode);

    if let Some(count) = variants {
        for encoded in encode_variants(&graph, &options, count)? {
            println!("{}", encoded.notation);
        }
        return Ok(());
    }

    let encoded = encode(&graph, &options)?;
    print_encoded(&encoded);
    Ok(())
}

fn cmd_decode(notation: &str, no_merge: bool, output: Option<&Path>) -> CliResult<()> {
    let options = DecodeOptions::default().with_merge(!no_merge);
    let decoded = decode(notation, &options)?;
    print_warnings(&decoded.warnings);

    let codec = CodecDef {
        decode: options,
        ..CodecDef::default()
    };
    let doc = graph_to_doc("decoded", &decoded.graph, codec);
    match output {
        Some(path) => {
            fc_project::save(path, &doc)?;
            println!(
                "✓ Wrote {} units, {} streams to {}",
                doc.units.len(),
                doc.streams.len(),
                path.display()
            );
        }
        None => print!("{}", serde_yaml::to_string(&doc)?),
    }
    Ok(())
}

fn cmd_canon(first: &Path, second: &Path) -> CliResult<()> {
    let (first_doc, first_graph) = load_graph(first)?;
    let (_, second_graph) = load_graph(second)?;
    // Both sides use the first document's settings so the forms are comparable.
    let options = first_doc.codec.encode.with_traversal(Traversal::Canonical);
    let a = encode(&first_graph, &options)?;
    let b = encode(&second_graph, &options)?;

    if a.generalized == b.generalized {
        println!("✓ Same flowsheet");
        println!("  {}", a.generalized);
    } else {
        println!("✗ Flowsheets differ");
        println!("  {}: {}", first.display(), a.generalized);
        println!("  {}: {}", second.display(), b.generalized);
    }
    Ok(())
}

fn cmd_strip(notation: &str, flags: &EncodeFlags) -> CliResult<()> {
    let options = flags.apply(EncodeOptions::default());
    let encoded = strip_notation(notation, &options, &DecodeOptions::default())?;
    print_encoded(&encoded);
    Ok(())
}

fn print_encoded(encoded: &Encoded) {
    print_warnings(&encoded.warnings);
    println!("{}", encoded.notation);
    println!("{}", encoded.generalized);
}

fn print_warnings(warnings: &[DegradedMerge]) {
    for warning in warnings {
        eprintln!("! {warning}");
    }
}
