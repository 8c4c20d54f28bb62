//! Reactor server - serves component messages over HTTP.

use std::net::SocketAddr;
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::Parser;
use reactor::io::config::{load_config, write_config};
use reactor::io::render::TemplateRenderer;
use reactor::message::Engine;
use reactor_server::cache::InstanceCache;
use reactor_server::components::Registry;
use reactor_server::routes;
use reactor_server::state::AppState;
use tracing::{info, warn};

#[derive(Parser)]
#[command(name = "reactor-server")]
#[command(about = "Process component messages and return re-rendered markup")]
struct Args {
    /// Path to the TOML config file
    #[arg(long, default_value = "reactor.toml")]
    config: PathBuf,

    /// Address to bind the server to (overrides config)
    #[arg(long)]
    bind: Option<String>,

    /// Port to listen on (overrides config)
    #[arg(long)]
    port: Option<u16>,

    /// Checksum secret (overrides config)
    #[arg(long, env = "REACTOR_SECRET_KEY", hide_env_values = true)]
    secret_key: Option<String>,

    /// Directory of component templates (overrides config)
    #[arg(long)]
    templates_dir: Option<PathBuf>,

    /// Fail on unresolved paths and methods
    #[arg(long)]
    strict: bool,

    /// Write the resolved config to --config and exit
    #[arg(long)]
    write_config: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    reactor::logging::init("reactor=info,reactor_server=info,tower_http=info");

    let args = Args::parse();

    let mut config = load_config(&args.config)?;
    if let Some(bind) = args.bind {
        config.server.bind = bind;
    }
    if let Some(port) = args.port {
        config.server.port = port;
    }
    if let Some(secret_key) = args.secret_key {
        config.secret_key = secret_key;
    }
    if let Some(dir) = args.templates_dir {
        config.templates_dir = dir.display().to_string();
    }
    config.strict |= args.strict;

    if args.write_config {
        write_config(&args.config, &config)?;
        info!(path = %args.config.display(), "wrote config");
        return Ok(());
    }

    config
        .validate()
        .with_context(|| format!("invalid config {}", args.config.display()))?;

    let templates_dir = Path::new(&config.templates_dir);
    if !templates_dir.is_dir() {
        warn!(templates_dir = %templates_dir.display(), "templates directory not found");
    }

    let engine = Engine::from_config(&config);
    let renderer = TemplateRenderer::from_dir(templates_dir, config.validator());
    let registry = Registry::with_defaults();
    info!(
        components = ?registry.names().collect::<Vec<_>>(),
        strict = config.strict,
        "starting reactor-server"
    );

    let capacity = NonZeroUsize::new(config.server.cache_capacity)
        .context("server.cache_capacity must be > 0")?;
    let state =
        AppState::new(engine, registry, renderer).with_cache(InstanceCache::with_capacity(capacity));
    let app = routes::app(state);

    let addr: SocketAddr = format!("{}:{}", config.server.bind, config.server.port)
        .parse()
        .context("parse bind address")?;
    info!(addr = %addr, "listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
