use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use anyhow::{Context, Result, bail};
use biosis_compile::{CompileContext, DeckSettings, compile_all, standard_compilers};
use biosis_core::{AddressTree, Dispatch, Dispatcher, ListError, Surface, TerminalAlert};
use biosis_store::{ConfigStore, UnitResolver, default_base_dir, driver_program, load_all, user_root};
use clap::{Args, Parser, Subcommand};

const START_MSG: &str = "Starting the biosis CLI.";
const STOP_MSG: &str = "Stopping the biosis CLI.";

#[derive(Parser)]
#[command(
    name = "biosis",
    version,
    about = "Declare automation functions once; run them by address or compile them onto a deck, a task schedule, and voice phrases"
)]
struct Cli {
    /// Enable verbose debug output
    #[arg(long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run and search for functions by dot-syntax address
    Run(RunArgs),

    /// Compile every function onto its surfaces
    Compile {
        /// Only compile these surfaces (deck, schedule, voice)
        #[arg(long = "surface", value_name = "SURFACE")]
        surfaces: Vec<Surface>,

        /// Compile SURFACE ahead of surfaces with a lower priority
        #[arg(long = "priority", value_name = "SURFACE=N", value_parser = parse_priority)]
        priorities: Vec<(Surface, u32)>,
    },

    /// Start the user's driver program from the user root
    User {
        /// Do not wait for the driver to exit
        #[arg(short, long)]
        detached: bool,

        /// Arguments passed to the driver
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        args: Vec<String>,
    },

    /// Read and write configuration variables
    Config(ConfigArgs),

    /// A bare address runs that function
    #[command(external_subcommand)]
    External(Vec<String>),
}

#[derive(Args)]
struct RunArgs {
    /// Address of the function to run
    #[arg(short, long, value_name = "ADDRESS")]
    run: Option<String>,

    /// List addresses, optionally under one dot-syntax prefix
    #[arg(short, long, num_args = 0.., value_name = "PREFIX")]
    list: Option<Vec<String>>,

    /// Limit listed addresses to this many segments
    #[arg(short, long)]
    depth: Option<usize>,

    /// Argument passed through to the function; repeatable
    #[arg(short, long = "arg", value_name = "VALUE", allow_hyphen_values = true)]
    args: Vec<String>,

    /// Address to run when --run is not given
    addresses: Vec<String>,
}

#[derive(Args)]
struct ConfigArgs {
    /// List the config variables
    #[arg(short, long)]
    list: bool,

    /// Set KEY to VALUE; without VALUE the key is cleared
    #[arg(short, long, num_args = 1..=2, value_names = ["KEY", "VALUE"])]
    set: Option<Vec<String>>,

    /// Prompt for each variable
    #[arg(short, long)]
    interactive: bool,
}

fn init_tracing(verbose: bool) {
    use tracing_subscriber::EnvFilter;

    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::from_default_env().add_directive(tracing::Level::WARN.into())
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    println!("{START_MSG}");
    let result = match &cli.command {
        Commands::Run(args) => cmd_run(args),
        Commands::Compile {
            surfaces,
            priorities,
        } => cmd_compile(surfaces, priorities),
        Commands::User { detached, args } => cmd_user(*detached, args),
        Commands::Config(args) => cmd_config(args),
        Commands::External(args) => cmd_external(args),
    };
    println!("{STOP_MSG}");
    result
}

fn open_config() -> Result<ConfigStore> {
    ConfigStore::open(None).context("failed to read the biosis configuration")
}

fn resolve_root(config: &ConfigStore) -> Result<PathBuf> {
    user_root(config).context("cannot locate the user root")
}

// ---------------------------------------------------------------------------
// run
// ---------------------------------------------------------------------------

fn cmd_run(args: &RunArgs) -> Result<()> {
    println!("Running the RUN command.");
    let config = open_config()?;
    let root = resolve_root(&config)?;

    if let Some(prefixes) = &args.list {
        return list(&root, prefixes, args.depth);
    }
    if args.depth.is_some() {
        return Err(ListError::DepthWithoutList.into());
    }

    match (&args.run, args.addresses.as_slice()) {
        (Some(address), []) if address.trim().is_empty() => {
            println!(
                "No address was provided, so nothing was run. See `biosis run --help`."
            );
            Ok(())
        }
        (Some(address), []) => dispatch(&root, std::slice::from_ref(address), &args.args),
        (None, rest) => dispatch(&root, rest, &args.args),
        (Some(_), extra) => bail!("unexpected arguments after --run: {extra:?}"),
    }
}

fn list(root: &Path, prefixes: &[String], depth: Option<usize>) -> Result<()> {
    let registry = load_all(root, &[default_base_dir()]).context("failed to load units")?;
    let reconciled = registry.reconcile().context("failed to reconcile functions")?;
    let tree = AddressTree::build(reconciled.entries());
    let addresses = tree.list(prefixes, depth)?;

    match prefixes {
        [] => println!("Listing Everything"),
        [prefix] => println!("Listing by Dot-Syntax: {prefix}"),
        _ => {}
    }
    if addresses.is_empty()
        && let [prefix] = prefixes
    {
        println!("There were no matches for: {prefix}");
        return Ok(());
    }
    for address in addresses {
        println!("{address}");
    }
    Ok(())
}

fn dispatch(root: &Path, addresses: &[String], args: &[String]) -> Result<()> {
    let resolver = UnitResolver::new(root);
    let alert = TerminalAlert;
    let dispatcher = Dispatcher::new(&resolver, &alert);
    let outcome = match addresses {
        [address] => {
            println!("Calling: {address}");
            dispatcher.run_with(address, args)
        }
        other => dispatcher.run_unknown(other)?,
    };
    match outcome {
        Dispatch::Completed { address } => tracing::info!("{address} completed"),
        Dispatch::Failed { address, message } => {
            println!("Function {address} failed: {message}");
        }
        Dispatch::NotFound(e) => println!("Not found: {e}"),
    }
    Ok(())
}

fn cmd_external(args: &[String]) -> Result<()> {
    println!("Running the RUN command.");
    let config = open_config()?;
    let root = resolve_root(&config)?;
    dispatch(&root, args, &[])
}

// ---------------------------------------------------------------------------
// compile
// ---------------------------------------------------------------------------

fn parse_priority(raw: &str) -> std::result::Result<(Surface, u32), String> {
    let (surface, priority) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected SURFACE=N, got '{raw}'"))?;
    let surface = surface.trim().parse::<Surface>()?;
    let priority = priority
        .trim()
        .parse::<u32>()
        .map_err(|e| format!("invalid priority '{priority}': {e}"))?;
    Ok((surface, priority))
}

fn cmd_compile(surfaces: &[Surface], priorities: &[(Surface, u32)]) -> Result<()> {
    println!("Running the COMPILE command.");
    let config = open_config()?;
    let root = resolve_root(&config)?;

    let registry = load_all(&root, &[default_base_dir()]).context("failed to load units")?;
    let launcher = std::env::current_exe().context("cannot locate the biosis executable")?;
    let ctx = CompileContext::new(&root, launcher);

    let deck = DeckSettings {
        profiles_dir: config.get("deck_profiles").map(PathBuf::from),
        profile_id: config.get("profile_id").map(str::to_string),
    };
    let mut compilers = standard_compilers(deck, surfaces);
    let priority: HashMap<Surface, u32> = priorities.iter().copied().collect();
    let report = compile_all(&registry, &mut compilers, &ctx, &priority)
        .context("compilation aborted")?;

    println!("{report}");
    if report.has_failures() {
        bail!("one or more surfaces failed to compile");
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// user
// ---------------------------------------------------------------------------

fn cmd_user(detached: bool, args: &[String]) -> Result<()> {
    println!("Running the USER command.");
    let config = open_config()?;
    let root = resolve_root(&config)?;
    let driver = driver_program(&config, &root);

    let mut command = Command::new(&driver);
    command.args(args).current_dir(&root);
    if detached {
        command
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null());
        let child = command
            .spawn()
            .with_context(|| format!("failed to start {}", driver.display()))?;
        tracing::info!("driver running detached as PID {}", child.id());
        return Ok(());
    }

    let status = command
        .status()
        .with_context(|| format!("failed to start {}", driver.display()))?;
    if !status.success() {
        bail!("{} exited with {status}", driver.display());
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// config
// ---------------------------------------------------------------------------

fn cmd_config(args: &ConfigArgs) -> Result<()> {
    println!("Running the CONFIG command.");
    let mut config = open_config()?;

    if let Some(pair) = &args.set {
        match pair.as_slice() {
            [key] => {
                config.clear(key).context("failed to clear config value")?;
                println!("Cleared {key}");
            }
            [key, value] => {
                config.set(key, value).context("failed to set config value")?;
                println!("Set {key} to {value}");
            }
            _ => bail!("--set takes a KEY and an optional VALUE"),
        }
    }

    if args.interactive {
        let stdin = io::stdin();
        config
            .interactive(stdin.lock(), io::stdout())
            .context("interactive configuration failed")?;
    }

    if args.list || (args.set.is_none() && !args.interactive) {
        if config.is_empty() {
            println!("There are no configuration variables set.");
        }
        for line in config.list() {
            println!("{line}");
        }
    }
    Ok(())
}
