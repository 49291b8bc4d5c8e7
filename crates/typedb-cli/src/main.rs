use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use typedb::{CatalogOptions, TypeCatalog};
use typedb_cli::report::{self, MethodReport, PackageReport};
use typedb_cli::scan::{self, Diagnostic};
use typedb_config::{init_tracing, load_for_root, TypeDbConfig};

#[derive(Parser)]
#[command(
    name = "typedb",
    version,
    about = "Type catalog reports over declaration manifests"
)]
struct Cli {
    /// Config file to use instead of discovering `typedb.toml` in the scan root
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print every declared type with its interfaces and effective methods, per package
    Report(ReportArgs),
    /// Print the effective method surface of a single type
    Methods(MethodsArgs),
}

#[derive(Args)]
struct ReportArgs {
    /// Directory to scan for unit manifests
    root: PathBuf,
    /// Emit JSON suitable for CI
    #[arg(long)]
    json: bool,
}

#[derive(Args)]
struct MethodsArgs {
    /// Directory to scan for unit manifests
    root: PathBuf,
    /// Qualified name of the type; type arguments are ignored
    #[arg(value_name = "TYPE")]
    type_name: String,
    /// Emit JSON suitable for CI
    #[arg(long)]
    json: bool,
}

fn main() {
    let cli = Cli::parse();
    let exit_code = match run(cli) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("{:#}", err);
            2
        }
    };

    std::process::exit(exit_code);
}

fn run(cli: Cli) -> Result<i32> {
    let root = match &cli.command {
        Command::Report(args) => &args.root,
        Command::Methods(args) => &args.root,
    };
    if !root.is_dir() {
        bail!("scan root {} is not a directory", root.display());
    }

    let config = load_config(root, cli.config.as_deref())?;
    init_tracing(&config.logging);

    let loaded = scan::load_root(root, &config.scan);
    print_diagnostics(&loaded.diagnostics);

    let catalog = TypeCatalog::with_options(
        &loaded.store,
        CatalogOptions {
            skip_visited_interfaces: config.catalog.skip_visited_interfaces,
        },
    );
    for unit in &loaded.units {
        catalog.register_unit(unit);
    }
    tracing::debug!(
        target: "typedb.scan",
        units = loaded.units.len(),
        types = catalog.len(),
        "catalog populated"
    );

    match cli.command {
        Command::Report(args) => {
            let packages = report::build_report(&catalog, &config.report);
            print_packages(&packages, args.json)?;
            Ok(0)
        }
        Command::Methods(args) => {
            let Some(descriptor) = catalog.lookup_name(&args.type_name) else {
                eprintln!("type {} not found", args.type_name);
                return Ok(1);
            };
            let style = report::name_style(&config.report);
            let methods = descriptor
                .methods()
                .iter()
                .filter(|method| config.report.show_constructors || !method.is_constructor());
            if args.json {
                let reports: Vec<MethodReport> = methods
                    .map(|method| report::method_report(method, &catalog, style))
                    .collect();
                print_json(&reports)?;
            } else {
                for method in methods {
                    println!("{}", method.signature(&catalog, style));
                }
            }
            Ok(0)
        }
    }
}

fn load_config(root: &Path, explicit: Option<&Path>) -> Result<TypeDbConfig> {
    match explicit {
        Some(path) => TypeDbConfig::load_from_path(path)
            .with_context(|| format!("failed to load config {}", path.display())),
        None => {
            let (config, _path) = load_for_root(root).context("failed to load typedb config")?;
            Ok(config)
        }
    }
}

fn print_diagnostics(diagnostics: &[Diagnostic]) {
    if diagnostics.is_empty() {
        return;
    }
    let lines: Vec<String> = diagnostics.iter().map(ToString::to_string).collect();
    eprintln!("---------------\nErrors:\n{}", lines.join("\n"));
}

fn print_packages(packages: &[PackageReport], json: bool) -> Result<()> {
    if json {
        return print_json(packages);
    }
    for package in packages {
        print!("{package}");
    }
    Ok(())
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    let out = serde_json::to_string_pretty(value)?;
    println!("{out}");
    Ok(())
}
