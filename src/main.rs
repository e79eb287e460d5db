use std::env;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use scriptdbg_config::{load_config, Config};
use scriptdbg_dap::{Session, SessionConfig};
use scriptdbg_script::Interpreter;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Install the global subscriber. `RUST_LOG` wins over the configured level.
fn init_logging(config: &Config) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.log.level.as_str()));

    match &config.log.file {
        Some(path) => {
            let log_file = std::fs::File::create(path)
                .with_context(|| format!("failed to open log file {}", path.display()))?;
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(std::sync::Mutex::new(log_file))
                .with_ansi(false)
                .init();
        }
        None => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
    Ok(())
}

fn session_config(config: &Config) -> SessionConfig {
    SessionConfig {
        address: config.debugger.address.clone(),
        peek_interval: config.debugger.peek_interval,
        ..SessionConfig::default()
    }
}

fn run(script: &Path, config_path: Option<&Path>) -> Result<()> {
    let config = load_config(config_path).context("failed to load configuration")?;
    init_logging(&config)?;

    // Breakpoints arrive keyed by absolute path.
    let script = std::fs::canonicalize(script)
        .with_context(|| format!("failed to resolve {}", script.display()))?;
    let mut interpreter = Interpreter::load(&script)?;

    let session = Session::new(session_config(&config));
    match &config.debugger.address {
        Some(address) => info!(%address, "debugger enabled"),
        None => info!("no debugger address configured"),
    }

    interpreter.run(&session);
    session.detach();

    let globals = serde_json::to_string_pretty(&interpreter.globals().to_json())
        .context("failed to render globals")?;
    println!("{globals}");
    Ok(())
}

fn main() {
    let args: Vec<String> = env::args().collect();
    let result = match args.get(1) {
        Some(script) => run(
            Path::new(script),
            args.get(2).map(PathBuf::from).as_deref(),
        ),
        None => Err(anyhow::anyhow!("usage: scriptdbg <script> [config.toml]")),
    };

    if let Err(e) = result {
        eprintln!("scriptdbg: {:#}", e);
        std::process::exit(1);
    }
}
