use clap::{Parser, Subcommand};
use simple_edit::command::{self, Outcome};
use simple_edit::config::{self, EditorConfig};
use simple_edit::engine::EditSession;
use simple_edit::history::HistoryStore;
use simple_edit::output;
use std::io::{BufRead, IsTerminal, Write};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "simple-edit")]
#[command(about = "Load, transform, undo and save images with an audit log")]
#[command(long_about = "\
Load, transform, undo and save images with an audit log

Supported formats: PNG, JPEG, BMP, GIF, TIFF.

Operations (for `apply`):

  resize=WxH         exact resize, aspect ratio is not kept
  grayscale          luminance only, fully opaque
  blur=R             Gaussian blur with radius R (default 1)
  brightness=F       scale colors by F (0 = black, 1 = unchanged)
  contrast=F         blend toward mean gray by F (0 = flat gray, 1 = unchanged)
  undo               revert the previous step (one level only)

Every successful load, save and operation is appended to the history log
(configs/history.json by default).

Run 'simple-edit gen-config' to generate a documented simple-edit.toml.")]
#[command(version)]
struct Cli {
    /// Config file (default: ./simple-edit.toml if present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// History log path, overriding the config file
    #[arg(long, global = true)]
    history: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print dimensions and color mode of an image file
    Info {
        path: PathBuf,
        /// Print the metadata as a JSON object
        #[arg(long)]
        json: bool,
    },
    /// Load an image, run operations on it, and optionally save the result
    Apply {
        input: PathBuf,
        /// Steps in order, e.g. resize=640x480 grayscale undo
        steps: Vec<String>,
        /// Where to save the result
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Output format, overriding the output extension
        #[arg(long, requires = "output")]
        format: Option<String>,
    },
    /// Read commands from stdin, one per line, against one session
    Shell,
    /// Print the history log
    History {
        /// Only show the last N records
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Print a stock simple-edit.toml with all options documented
    GenConfig,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();
    let cli = Cli::parse();

    match cli.command {
        Command::Info { path, json } => {
            let config = resolve_config(cli.config.as_deref())?;
            let session = open_session(&config, cli.history)?.with_source(path);
            let info = session.info()?;
            if json {
                println!("{}", output::info_json(info.as_ref())?);
            } else {
                output::print_info(info.as_ref());
            }
        }
        Command::Apply {
            input,
            steps,
            output: out,
            format,
        } => {
            let config = resolve_config(cli.config.as_deref())?;
            let format = format.as_deref().map(command::parse_format).transpose()?;
            let mut session = open_session(&config, cli.history)?;

            // Parse everything up front so a typo fails before any work is logged.
            let steps = steps
                .iter()
                .map(|step| command::Command::parse_step(step))
                .collect::<Result<Vec<_>, _>>()?;

            command::Command::Load(input).execute(&mut session)?;
            for step in steps {
                if let Outcome::Undo {
                    restored: false, ..
                } = step.execute(&mut session)?
                {
                    tracing::warn!("Nothing to undo");
                }
            }

            match out {
                Some(path) => {
                    let save = command::Command::Save { path, format };
                    output::print_outcome(&save.execute(&mut session)?);
                }
                None => output::print_info(session.current_state().as_ref()),
            }
        }
        Command::Shell => {
            let config = resolve_config(cli.config.as_deref())?;
            let mut session = open_session(&config, cli.history)?;
            run_shell(&mut session)?;
        }
        Command::History { limit } => {
            let config = resolve_config(cli.config.as_deref())?;
            let path = cli.history.unwrap_or(config.history.path);
            let store = HistoryStore::open(path, config.history.on_corruption)?;
            output::print_history(&store.records()?, limit);
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

/// Route `tracing` events to stderr, filtered by `RUST_LOG`.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("simple_edit=warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// An explicit `--config` must exist; the default file is optional.
fn resolve_config(explicit: Option<&Path>) -> Result<EditorConfig, Box<dyn std::error::Error>> {
    let config = match explicit {
        Some(path) if !path.exists() => {
            return Err(format!("Config file not found: {}", path.display()).into());
        }
        Some(path) => config::load_config(path)?,
        None => config::load_config(Path::new(config::CONFIG_FILENAME))?,
    };
    Ok(config)
}

fn open_session(
    config: &EditorConfig,
    history_override: Option<PathBuf>,
) -> Result<EditSession<simple_edit::codec::RustCodec>, Box<dyn std::error::Error>> {
    let path = history_override.unwrap_or_else(|| config.history.path.clone());
    let history = HistoryStore::open(path, config.history.on_corruption)?;
    Ok(EditSession::new(config.processing.codec(), history))
}

/// Run stdin commands until `quit` or end of input. Command errors are
/// reported and the shell keeps going.
fn run_shell(
    session: &mut EditSession<simple_edit::codec::RustCodec>,
) -> Result<(), Box<dyn std::error::Error>> {
    let stdin = std::io::stdin();
    let interactive = stdin.is_terminal();
    let mut lines = stdin.lock().lines();

    loop {
        if interactive {
            print!("> ");
            std::io::stdout().flush()?;
        }
        let Some(line) = lines.next() else {
            break;
        };
        let line = line?;

        let result = command::Command::parse_line(&line)
            .and_then(|parsed| parsed.map(|cmd| cmd.execute(session)).transpose());
        match result {
            Ok(Some(Outcome::Quit)) => break,
            Ok(Some(outcome)) => output::print_outcome(&outcome),
            Ok(None) => {}
            Err(err) => eprintln!("{}", output::format_error(&err)),
        }
    }
    Ok(())
}
