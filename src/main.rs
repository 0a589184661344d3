//! Command-line interface for xsd2jsonschema

#[cfg(feature = "cli")]
use clap::{Parser, Subcommand};

#[cfg(feature = "cli")]
use std::fs;
#[cfg(feature = "cli")]
use std::path::PathBuf;

#[cfg(feature = "cli")]
use xsd2jsonschema::analysis::XsdUsageVisitorSum;
#[cfg(feature = "cli")]
use xsd2jsonschema::{ConversionRun, DepthFirstTraversal, SchemaNode, XsdDocument};

#[cfg(feature = "cli")]
#[derive(Parser, Debug)]
#[command(name = "xsd2jsonschema")]
#[command(author, version, about = "Convert XML Schema documents to JSON Schema", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[cfg(feature = "cli")]
#[derive(Subcommand, Debug)]
enum Commands {
    /// Convert XSD files to JSON Schema files
    Convert {
        /// Paths to the XSD files to convert, processed in order
        #[arg(value_name = "SCHEMA", required = true)]
        schemas: Vec<PathBuf>,

        /// Output directory (defaults to the current directory)
        #[arg(short, long, default_value = ".")]
        output: PathBuf,

        /// Print the converted schemas to stdout instead of writing files
        #[arg(long)]
        stdout: bool,
    },

    /// Count tag usage across XSD files
    Usage {
        /// Paths to the XSD files to analyze
        #[arg(value_name = "SCHEMA", required = true)]
        schemas: Vec<PathBuf>,
    },
}

#[cfg(feature = "cli")]
fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Convert {
            schemas,
            output,
            stdout,
        } => cmd_convert(schemas, output, stdout),
        Commands::Usage { schemas } => cmd_usage(schemas),
    };

    if let Err(err) = result {
        eprintln!("error: {}", err);
        std::process::exit(1);
    }
}

#[cfg(feature = "cli")]
fn load_documents(paths: &[PathBuf]) -> Result<Vec<XsdDocument>, String> {
    let mut docs = Vec::new();
    for path in paths {
        let text = fs::read_to_string(path)
            .map_err(|e| format!("cannot read {}: {}", path.display(), e))?;
        let uri = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        let doc = XsdDocument::parse(uri, &text).map_err(|e| e.to_string())?;
        docs.push(doc);
    }
    Ok(docs)
}

#[cfg(feature = "cli")]
fn cmd_convert(schemas: Vec<PathBuf>, output: PathBuf, stdout: bool) -> Result<(), String> {
    let docs = load_documents(&schemas)?;
    let outcome = ConversionRun::new()
        .convert_all(&docs)
        .map_err(|e| e.to_string())?;

    for (uri, error) in &outcome.failures {
        eprintln!("skipped {}: {}", uri, error);
    }

    for (uri, schema) in &outcome.schemas {
        let value = schema.to_value();
        let pretty =
            serde_json::to_string_pretty(&value).map_err(|e| e.to_string())?;
        if stdout {
            println!("{}", pretty);
        } else {
            let stem = uri.strip_suffix(".xsd").unwrap_or(uri);
            let path = output.join(format!("{}.json", stem));
            fs::write(&path, pretty)
                .map_err(|e| format!("cannot write {}: {}", path.display(), e))?;
            println!("wrote {}", path.display());
        }
    }

    if !outcome.is_complete() {
        return Err(format!("{} document(s) failed to convert", outcome.failures.len()));
    }
    Ok(())
}

#[cfg(feature = "cli")]
fn cmd_usage(schemas: Vec<PathBuf>) -> Result<(), String> {
    let docs = load_documents(&schemas)?;
    let engine = DepthFirstTraversal::new();
    let mut visitor = XsdUsageVisitorSum::new();

    for doc in &docs {
        let scratch = SchemaNode::new();
        engine
            .traverse(&mut visitor, &scratch, doc)
            .map_err(|e| e.to_string())?;
    }

    for (tag, count) in visitor.counts() {
        println!("{:>8}  {}", count, tag);
    }
    Ok(())
}

#[cfg(not(feature = "cli"))]
fn main() {
    eprintln!("xsd2jsonschema was built without the 'cli' feature");
    std::process::exit(1);
}
