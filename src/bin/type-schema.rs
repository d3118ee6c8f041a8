//! Type Schema CLI
//!
//! Command-line interface for resolving and linting type universes.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;
use type_schema::{
    encode_document, lint, load_universe, resolve, Dialect, FileStatus, ItemDirectivePolicy,
    ResolveOptions, Severity, TypeRef,
};

#[derive(Parser)]
#[command(name = "type-schema")]
#[command(about = "Resolve type descriptors into named schema models")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve root types and print the schema document
    Resolve {
        /// Universe file (JSON with a "types" array)
        universe: PathBuf,

        /// Root type to resolve (repeatable; default: every described type)
        #[arg(long = "type", short = 't')]
        types: Vec<String>,

        /// Output dialect: 3.0 (single type) or 3.1 (type arrays)
        #[arg(long, default_value = "3.0")]
        dialect: String,

        /// Resolve roots as a property with this name
        #[arg(long)]
        property: Option<String>,

        /// Force roots to be required
        #[arg(long)]
        required: bool,

        /// Force roots to be nullable
        #[arg(long)]
        nullable: bool,

        /// Keep item-level array directives on items only
        #[arg(long)]
        items_only: bool,

        /// Output file (stdout if not specified)
        #[arg(long)]
        output: Option<PathBuf>,

        /// Pretty-print JSON output
        #[arg(long)]
        pretty: bool,
    },

    /// Lint universe files for errors (syntax, unknown types, cycles)
    Lint {
        /// File or directory to lint
        path: PathBuf,

        /// Output format: text (default) or json
        #[arg(long, default_value = "text")]
        format: String,

        /// Treat warnings as errors
        #[arg(long)]
        strict: bool,

        /// Suppress progress output, only show errors
        #[arg(long, short)]
        quiet: bool,
    },
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Resolve {
            universe,
            types,
            dialect,
            property,
            required,
            nullable,
            items_only,
            output,
            pretty,
        } => run_resolve(ResolveArgs {
            universe,
            types,
            dialect,
            property,
            required,
            nullable,
            items_only,
            output,
            pretty,
        }),

        Commands::Lint {
            path,
            format,
            strict,
            quiet,
        } => run_lint(&path, &format, strict, quiet),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(code) => ExitCode::from(code),
    }
}

struct ResolveArgs {
    universe: PathBuf,
    types: Vec<String>,
    dialect: String,
    property: Option<String>,
    required: bool,
    nullable: bool,
    items_only: bool,
    output: Option<PathBuf>,
    pretty: bool,
}

fn run_resolve(args: ResolveArgs) -> Result<(), u8> {
    let Some(dialect) = Dialect::parse(&args.dialect) else {
        eprintln!("Error: unknown dialect: {} (expected 3.0 or 3.1)", args.dialect);
        return Err(2);
    };

    let universe = load_universe(&args.universe).map_err(|e| {
        eprintln!("Error: {}", e);
        e.exit_code() as u8
    })?;

    let roots: Vec<TypeRef> = if args.types.is_empty() {
        universe
            .iter()
            .map(|descriptor| TypeRef::Named(descriptor.id.clone()))
            .collect()
    } else {
        args.types
            .iter()
            .map(|text| text.parse::<TypeRef>())
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| {
                eprintln!("Error: {}", e);
                e.exit_code() as u8
            })?
    };

    for root in &roots {
        if let Some(id) = root.unwrap_optional().0.named_id() {
            if universe.get(id).is_none() {
                eprintln!("Error: unknown type: {}", id);
                return Err(2);
            }
        }
    }

    let mut options = ResolveOptions::new(dialect);
    if let Some(name) = args.property {
        options = options.property_name(name);
    }
    if args.required {
        options = options.required(true);
    }
    if args.nullable {
        options = options.nullable(true);
    }
    if args.items_only {
        options = options.item_policy(ItemDirectivePolicy::ItemsOnly);
    }

    let resolution = resolve(&universe, &roots, &options).map_err(|e| {
        eprintln!("Error: {}", e);
        e.exit_code() as u8
    })?;

    for diagnostic in &resolution.diagnostics {
        eprintln!("{}", diagnostic);
    }

    let document = encode_document(&resolution, dialect);
    let json_output = if args.pretty {
        serde_json::to_string_pretty(&document)
    } else {
        serde_json::to_string(&document)
    }
    .map_err(|e| {
        eprintln!("Error serializing output: {}", e);
        2u8
    })?;

    match args.output {
        Some(path) => {
            std::fs::write(&path, &json_output).map_err(|e| {
                eprintln!("Error writing to {}: {}", path.display(), e);
                3u8
            })?;
        }
        None => {
            println!("{}", json_output);
        }
    }

    Ok(())
}

fn run_lint(path: &Path, format: &str, strict: bool, quiet: bool) -> Result<(), u8> {
    if !path.exists() {
        eprintln!("Error: path not found: {}", path.display());
        return Err(2);
    }

    let result = lint(path, strict);

    if format == "json" {
        let json_output = serde_json::to_string_pretty(&result).map_err(|e| {
            eprintln!("Error serializing output: {}", e);
            2u8
        })?;
        println!("{}", json_output);
    } else {
        if !quiet {
            println!("Linting {} ...\n", path.display());
        }

        for file_result in &result.results {
            let status_icon = match file_result.status {
                FileStatus::Ok => "\x1b[32m✓\x1b[0m",
                FileStatus::Warning => "\x1b[33m⚠\x1b[0m",
                FileStatus::Error => "\x1b[31m✗\x1b[0m",
            };

            if !quiet || file_result.status != FileStatus::Ok {
                println!("  {} {}", status_icon, file_result.file.display());
            }

            for diag in &file_result.diagnostics {
                let color = match diag.severity {
                    Severity::Error => "\x1b[31m",
                    Severity::Warning => "\x1b[33m",
                };
                if !quiet || diag.severity == Severity::Error {
                    println!("    {}{}\x1b[0m", color, diag);
                }
            }
        }

        println!();
        if result.is_ok() && (!strict || result.warnings == 0) {
            println!(
                "\x1b[32m✓ {} files checked, all passed\x1b[0m",
                result.files_checked
            );
        } else {
            println!(
                "\x1b[31m✗ {} files checked: {} passed, {} failed ({} errors, {} warnings)\x1b[0m",
                result.files_checked, result.passed, result.failed, result.errors, result.warnings
            );
        }
    }

    if result.is_ok() && (!strict || result.warnings == 0) {
        Ok(())
    } else {
        Err(1)
    }
}
