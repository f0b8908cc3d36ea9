use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use clap::{Args, CommandFactory, Parser, Subcommand};
use ks_core::{
    Arena, CommandKind, RenderOptions, Request, Settings, default_settings_path, home_dir,
    resolve_database,
};
use ks_sqlite::{Payload, Store};
use tracing::debug;
use tracing_subscriber::EnvFilter;

const PACKAGE_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Environment variable holding the log filter directives.
const LOG_ENV: &str = "KS_LOG";

#[derive(Debug, Parser)]
#[command(name = "ks")]
#[command(about = "Personal document catalog")]
#[command(disable_help_subcommand = true)]
#[command(after_help = "see ks(1) for detailed usage of each command")]
struct Cli {
    /// Database file (default: $HOME/.ksdb).
    #[arg(short = 'd', long, env = "KS_DATABASE", global = true)]
    database: Option<PathBuf>,
    /// Settings file (default: $HOME/.config/ks/config.yaml).
    #[arg(long, env = "KS_CONFIG", global = true)]
    config: Option<PathBuf>,
    /// Log statements and catalog operations to stderr.
    #[arg(short, long, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Create a new document database.
    Init,
    /// Add a new document to the database.
    Add(AddArgs),
    /// Modify an existing document's metadata.
    Mod(ModArgs),
    /// Remove a document from the database.
    Rm(IdArgs),
    /// Read the file contents of a document in the database.
    Cat(IdArgs),
    /// List all categories in the database.
    Categories,
    /// Print document metadata from the database.
    Show(ShowArgs),
    /// Print the cli tool's version.
    Version(VersionArgs),
    /// Print this usage message.
    Help,
}

#[derive(Debug, Args)]
struct AddArgs {
    /// Document title.
    #[arg(short, long)]
    title: Option<String>,
    /// Category the document is filed under.
    #[arg(short, long)]
    category: Option<String>,
    /// File whose contents are stored with the document.
    #[arg(short, long)]
    file: Option<PathBuf>,
    /// Tag to attach; may be repeated.
    #[arg(short = 'T', long = "tag")]
    tags: Vec<String>,
}

#[derive(Debug, Args)]
struct ModArgs {
    /// Document id.
    id: Option<i64>,
    /// New title.
    #[arg(short, long)]
    title: Option<String>,
    /// New category.
    #[arg(short, long)]
    category: Option<String>,
    /// File replacing the stored contents.
    #[arg(short, long)]
    file: Option<PathBuf>,
    /// Tag to append; may be repeated.
    #[arg(short = 'T', long = "tag")]
    tags: Vec<String>,
}

#[derive(Debug, Args)]
struct IdArgs {
    /// Document id.
    id: Option<i64>,
}

#[derive(Debug, Args)]
struct ShowArgs {
    /// Show a single document.
    id: Option<i64>,
    /// Only documents in this category.
    #[arg(short, long)]
    category: Option<String>,
    /// Only documents with this tag.
    #[arg(short = 'T', long = "tag")]
    tags: Vec<String>,
    /// Omit the header line.
    #[arg(short, long)]
    no_header: bool,
}

#[derive(Debug, Args)]
struct VersionArgs {
    /// Print the database schema version instead.
    #[arg(long)]
    db: bool,
}

impl Command {
    /// Lowers parsed arguments into the request the catalog validates.
    fn into_request(self) -> Request {
        match self {
            Command::Init => Request::new(CommandKind::Init),
            Command::Add(args) => Request {
                title: args.title,
                category: args.category,
                file: args.file,
                tags: args.tags,
                ..Request::new(CommandKind::Add)
            },
            Command::Mod(args) => Request {
                id: args.id,
                title: args.title,
                category: args.category,
                file: args.file,
                tags: args.tags,
                ..Request::new(CommandKind::Mod)
            },
            Command::Rm(args) => Request {
                id: args.id,
                ..Request::new(CommandKind::Rm)
            },
            Command::Cat(args) => Request {
                id: args.id,
                ..Request::new(CommandKind::Cat)
            },
            Command::Categories => Request::new(CommandKind::Categories),
            Command::Show(args) => Request {
                id: args.id,
                category: args.category,
                tags: args.tags,
                no_header: args.no_header,
                ..Request::new(CommandKind::Show)
            },
            Command::Version(args) => Request {
                db_version: args.db,
                ..Request::new(CommandKind::Version)
            },
            Command::Help => Request::new(CommandKind::Help),
        }
    }
}

/// Resolved settings and database location for one invocation.
struct Context {
    settings: Settings,
    database: PathBuf,
}

impl Context {
    fn load(database: Option<&Path>, config: Option<&Path>) -> Result<Self, String> {
        let settings = load_settings(config)?;
        let database =
            resolve_database(database, &settings, home_dir).map_err(|e| e.to_string())?;
        debug!(database = %database.display(), "resolved database");
        Ok(Self { settings, database })
    }

    fn open(&self) -> Result<Store, String> {
        Store::open(&self.database).map_err(|e| e.to_string())
    }

    fn render_options(&self, request: &Request) -> RenderOptions {
        RenderOptions {
            header: !(request.no_header || self.settings.no_header),
            underline: self.settings.underline_header,
        }
    }
}

/// An explicitly named settings file must exist; the default one may not.
fn load_settings(config: Option<&Path>) -> Result<Settings, String> {
    if let Some(path) = config {
        return Settings::load(path)
            .map_err(|e| format!("can't load settings '{}': {e}", path.display()));
    }
    match home_dir() {
        Ok(home) => {
            let path = default_settings_path(&home);
            Settings::load_or_default(&path)
                .map_err(|e| format!("can't load settings '{}': {e}", path.display()))
        }
        Err(_) => Ok(Settings::default()),
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_ansi(false)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Err(err) = run(cli) {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), String> {
    let Some(command) = cli.command else {
        return run_help();
    };
    let request = command.into_request();
    request.validate().map_err(|e| e.to_string())?;

    match request.kind {
        CommandKind::Help => return run_help(),
        CommandKind::Version if !request.db_version => return run_version(),
        _ => {}
    }

    let ctx = Context::load(cli.database.as_deref(), cli.config.as_deref())?;
    match request.kind {
        CommandKind::Init => run_init(&ctx),
        CommandKind::Add => run_add(&ctx, &request),
        CommandKind::Mod => run_mod(&ctx, &request),
        CommandKind::Rm => run_rm(&ctx, &request),
        CommandKind::Cat => run_cat(&ctx, &request),
        CommandKind::Categories => run_categories(&ctx),
        CommandKind::Show => run_show(&ctx, &request),
        CommandKind::Version => run_db_version(&ctx),
        CommandKind::Help => run_help(),
    }
}

// ---------------------------------------------------------------------------
// commands without a database
// ---------------------------------------------------------------------------

fn run_help() -> Result<(), String> {
    let mut cmd = Cli::command();
    cmd.print_help()
        .map_err(|e| format!("can't print help: {e}"))?;
    println!();
    Ok(())
}

fn run_version() -> Result<(), String> {
    println!("ks version {PACKAGE_VERSION}");
    Ok(())
}

// ---------------------------------------------------------------------------
// catalog commands
// ---------------------------------------------------------------------------

fn run_init(ctx: &Context) -> Result<(), String> {
    Store::create(&ctx.database).map_err(|e| e.to_string())?;
    Ok(())
}

fn run_add(ctx: &Context, request: &Request) -> Result<(), String> {
    let doc = request.new_document().map_err(|e| e.to_string())?;
    let payload = open_payload(request.file.as_deref())?;
    let store = ctx.open()?;
    store
        .catalog()
        .add(&doc, payload)
        .map_err(|e| e.to_string())?;
    Ok(())
}

fn run_mod(ctx: &Context, request: &Request) -> Result<(), String> {
    let id = require_id(request)?;
    let changes = request.changes().map_err(|e| e.to_string())?;
    let payload = open_payload(request.file.as_deref())?;
    let store = ctx.open()?;
    store
        .catalog()
        .modify(id, &changes, payload)
        .map_err(|e| e.to_string())
}

fn run_rm(ctx: &Context, request: &Request) -> Result<(), String> {
    let id = require_id(request)?;
    let store = ctx.open()?;
    store.catalog().remove(id).map_err(|e| e.to_string())
}

fn run_cat(ctx: &Context, request: &Request) -> Result<(), String> {
    let id = require_id(request)?;
    let store = ctx.open()?;
    let stdout = io::stdout();
    let mut out = BufWriter::new(stdout.lock());
    store
        .catalog()
        .write_payload(id, &mut out)
        .map_err(|e| e.to_string())?;
    out.flush().map_err(|e| format!("can't write output: {e}"))
}

fn run_categories(ctx: &Context) -> Result<(), String> {
    let store = ctx.open()?;
    let arena = Arena::new();
    let categories = store
        .catalog()
        .categories(&arena)
        .map_err(|e| e.to_string())?;

    let stdout = io::stdout();
    let mut out = BufWriter::new(stdout.lock());
    for name in categories {
        writeln!(out, "{name}").map_err(|e| format!("can't write output: {e}"))?;
    }
    out.flush().map_err(|e| format!("can't write output: {e}"))
}

fn run_show(ctx: &Context, request: &Request) -> Result<(), String> {
    let filter = request.list_filter().map_err(|e| e.to_string())?;
    let store = ctx.open()?;
    let arena = Arena::new();
    let table = store
        .catalog()
        .list(&filter, &arena)
        .map_err(|e| e.to_string())?;

    let stdout = io::stdout();
    let mut out = BufWriter::new(stdout.lock());
    table
        .render(&mut out, ctx.render_options(request))
        .map_err(|e| format!("can't write output: {e}"))?;
    out.flush().map_err(|e| format!("can't write output: {e}"))
}

fn run_db_version(ctx: &Context) -> Result<(), String> {
    let store = ctx.open()?;
    let version = store
        .catalog()
        .schema_version()
        .map_err(|e| e.to_string())?;
    println!("ks database version {version}");
    Ok(())
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn require_id(request: &Request) -> Result<i64, String> {
    request
        .id
        .ok_or_else(|| ks_core::CoreError::MissingId(request.kind).to_string())
}

/// Opens the attachment before the store so a bad path leaves the database untouched.
fn open_payload(file: Option<&Path>) -> Result<Option<Payload<'static>>, String> {
    file.map(|path| {
        Payload::open(path).map_err(|e| format!("can't open '{}': {e}", path.display()))
    })
    .transpose()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("ks").chain(args.iter().copied())).unwrap()
    }

    fn request(args: &[&str]) -> Request {
        parse(args).command.unwrap().into_request()
    }

    #[test]
    fn test_cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_add_collects_repeated_tags() {
        let req = request(&["add", "-t", "lease", "-c", "flat", "-T", "2024", "--tag", "signed"]);
        assert_eq!(req.kind, CommandKind::Add);
        assert_eq!(req.title.as_deref(), Some("lease"));
        assert_eq!(req.category.as_deref(), Some("flat"));
        assert_eq!(req.tags, vec!["2024", "signed"]);
        assert!(req.validate().is_ok());
    }

    #[test]
    fn test_add_without_title_fails_validation() {
        let req = request(&["add", "-c", "flat"]);
        assert!(matches!(req.validate(), Err(ks_core::CoreError::MissingTitle)));
    }

    #[test]
    fn test_cat_without_id_fails_validation() {
        let req = request(&["cat"]);
        assert_eq!(req.validate().unwrap_err().to_string(), "cat command requires an id");
    }

    #[test]
    fn test_show_two_tags_fails_validation() {
        let req = request(&["show", "-T", "a", "-T", "b"]);
        assert!(matches!(
            req.validate(),
            Err(ks_core::CoreError::MultipleTagFilter)
        ));
    }

    #[test]
    fn test_show_by_id_flags() {
        let req = request(&["show", "42", "--no-header"]);
        assert_eq!(req.id, Some(42));
        assert!(req.no_header);
    }

    #[test]
    fn test_global_database_after_subcommand() {
        let cli = parse(&["show", "-d", "/tmp/other.ksdb"]);
        assert_eq!(cli.database, Some(PathBuf::from("/tmp/other.ksdb")));
    }

    #[test]
    fn test_version_db_flag() {
        assert!(request(&["version", "--db"]).db_version);
        assert!(!request(&["version"]).db_version);
    }

    #[test]
    fn test_no_subcommand_is_accepted() {
        assert!(parse(&[]).command.is_none());
    }

    #[test]
    fn test_render_options_merge_flag_and_settings() {
        let ctx = Context {
            settings: Settings {
                no_header: false,
                underline_header: false,
                ..Settings::default()
            },
            database: PathBuf::from("unused"),
        };
        let opts = ctx.render_options(&Request::new(CommandKind::Show));
        assert!(opts.header);
        assert!(!opts.underline);

        let quiet = Request {
            no_header: true,
            ..Request::new(CommandKind::Show)
        };
        assert!(!ctx.render_options(&quiet).header);
    }

    #[test]
    fn test_load_settings_explicit_missing_file_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("absent.yaml");
        assert!(load_settings(Some(&missing)).is_err());
    }

    #[test]
    fn test_open_payload_missing_file_names_path() {
        let err = open_payload(Some(Path::new("/nonexistent/ks/scan.pdf"))).unwrap_err();
        assert!(err.contains("/nonexistent/ks/scan.pdf"));
    }
}
