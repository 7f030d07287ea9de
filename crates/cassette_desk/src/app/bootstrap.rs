use std::io::Read;

use deck_engine::{CommandRegistry, RegistryError};
use thiserror::Error;
use tracing::info;
use tracing_subscriber::EnvFilter;

use super::config::{ConfigError, DeskConfig};
use super::desk::{desk_command_registry, DeskCommand};
use super::script::{parse_script, ScriptError, ScriptStep};

#[derive(Debug, Error)]
pub(crate) enum StartupError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Script(#[from] ScriptError),
    #[error("command registry setup failed: {0}")]
    Registry(#[from] RegistryError),
}

pub(crate) struct AppWiring {
    pub(crate) config: DeskConfig,
    pub(crate) registry: CommandRegistry<DeskCommand>,
    pub(crate) script: Vec<ScriptStep>,
}

/// Reads configuration and the session script named by the first argument,
/// or standard input when no argument is given.
pub(crate) fn build_app() -> Result<AppWiring, StartupError> {
    init_tracing();
    info!("=== Cassette Desk Startup ===");

    let config = DeskConfig::load_from_env()?;
    let registry = desk_command_registry()?;
    let (source_name, raw) = read_script_source()?;
    let script = parse_script(&raw, &registry)?;
    info!(
        script = %source_name,
        steps = script.len(),
        tapes = config.tapes.len(),
        "script_loaded"
    );

    Ok(AppWiring {
        config,
        registry,
        script,
    })
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_names(true)
        .compact()
        .init();
}

fn read_script_source() -> Result<(String, String), ScriptError> {
    match std::env::args_os().nth(1) {
        Some(path) => {
            let source_name = path.to_string_lossy().into_owned();
            let raw = std::fs::read_to_string(&path).map_err(|source| ScriptError::Read {
                source_name: source_name.clone(),
                source,
            })?;
            Ok((source_name, raw))
        }
        None => {
            let mut raw = String::new();
            std::io::stdin()
                .read_to_string(&mut raw)
                .map_err(|source| ScriptError::Read {
                    source_name: "<stdin>".to_string(),
                    source,
                })?;
            Ok(("<stdin>".to_string(), raw))
        }
    }
}
