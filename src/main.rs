use clap::{ArgAction, Parser, Subcommand};
use descriptor_tools::output::{print_method_index, write_json};
use descriptor_tools::types::Skipped;
use descriptor_tools::{
    Error, FailurePolicy, FsStore, IndexScope, Settings, SourceDir, SourceLookup, pipeline,
};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "descriptor-tools",
    version,
    about = "Convert solc metadata into contract descriptors and index their methods."
)]
struct Cli {
    /// Working directory that relative paths are resolved against
    #[arg(short = 'C', long, default_value = ".")]
    workdir: PathBuf,

    /// Settings file (defaults to descriptors.toml in the working directory, if present)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Leave out documents with a bad shape instead of aborting the run
    #[arg(long)]
    skip_invalid: bool,

    /// Pretty-print JSON output
    #[arg(long)]
    pretty: bool,

    /// Log more (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Turn every solc metadata file into a contract descriptor
    Convert {
        #[arg(long)]
        input: Option<PathBuf>,
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Write the contract name -> method names list
    Methods {
        #[arg(long)]
        input: Option<PathBuf>,
        #[arg(long)]
        output: Option<PathBuf>,
        /// Only index descriptors whose contract_type is "library"
        #[arg(long)]
        libraries_only: bool,
    },
    /// Merge every descriptor and its source code into the standalone-mode database
    Bundle {
        #[arg(long)]
        input: Option<PathBuf>,
        #[arg(long, conflicts_with = "without_sources")]
        sources: Option<PathBuf>,
        /// Do not embed contract source code
        #[arg(long)]
        without_sources: bool,
        #[arg(long)]
        output: Option<PathBuf>,
    },
}

fn main() -> eyre::Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Err(report) = run(cli) {
        let code = report.downcast_ref::<Error>().map_or(1, Error::exit_code);
        eprintln!("Error: {report:?}");
        std::process::exit(code);
    }

    Ok(())
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn run(cli: Cli) -> eyre::Result<()> {
    let workdir = cli.workdir.as_path();
    let mut settings = Settings::load(workdir, cli.config.as_deref())?;
    if cli.skip_invalid {
        settings.on_invalid = FailurePolicy::Skip;
    }
    if cli.pretty {
        settings.pretty = true;
    }
    let paths = settings.paths.rooted_at(workdir);
    let resolve = |arg: Option<PathBuf>, default: &Path| match arg {
        Some(path) => workdir.join(path),
        None => default.to_path_buf(),
    };
    let store = |dir: PathBuf| {
        FsStore::new(dir)
            .ignoring(settings.ignored_entries.iter().cloned())
            .pretty(settings.pretty)
    };

    match cli.command {
        Command::Convert { input, output } => {
            let source = store(resolve(input, &paths.metadata_dir));
            let target = store(resolve(output, &paths.descriptors_dir));

            let report = pipeline::convert(&source, &target, &settings.defaults, settings.on_invalid)?;

            print_skipped(&report.skipped);
            println!(
                "\nConverted {} metadata file(s) from {} into contract descriptors in {}\n",
                report.output.len(),
                source.root().display(),
                target.root().display()
            );
        }
        Command::Methods {
            input,
            output,
            libraries_only,
        } => {
            let (scope, default_output) = if libraries_only {
                (IndexScope::LibrariesOnly, &paths.libraries_file)
            } else {
                (IndexScope::All, &paths.methods_file)
            };
            let source = store(resolve(input, &paths.descriptors_dir));
            let output = resolve(output, default_output);

            let report =
                pipeline::index_methods(&source, scope, &settings.defaults, settings.on_invalid)?;
            write_json(&output, &report.output, settings.pretty)?;

            print_skipped(&report.skipped);
            println!("\nThe following contracts and methods were written to {}\n", output.display());
            print_method_index(&report.output);
            println!();
        }
        Command::Bundle {
            input,
            sources,
            without_sources,
            output,
        } => {
            let source = store(resolve(input, &paths.descriptors_dir));
            let source_dir = (!without_sources)
                .then(|| SourceDir::new(resolve(sources, &paths.sources_dir)));
            let output = resolve(output, &paths.database_file);

            let report = pipeline::bundle(
                &source,
                source_dir.as_ref().map(|dir| dir as &dyn SourceLookup),
                &settings.defaults,
                settings.on_invalid,
            )?;
            write_json(&output, &report.output, settings.pretty)?;

            print_skipped(&report.skipped);
            println!(
                "\nMerged {} contract descriptor(s) into {}\n",
                report.output.len(),
                output.display()
            );
        }
    }

    Ok(())
}

fn print_skipped(skipped: &[Skipped]) {
    for entry in skipped {
        eprintln!("Skipped {}: {}", entry.id, entry.reason);
    }
}
