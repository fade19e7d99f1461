//! CryptoMind: Whop membership sync server.

use std::path::PathBuf;
use std::sync::Arc;

use cryptomind_core::CryptoMindConfig;
use cryptomind_store::SqliteStore;
use tracing::info;
use tracing_subscriber::EnvFilter;

mod routes;
mod state;

use state::AppState;

fn resolve_data_dir() -> PathBuf {
    std::env::var("CRYPTOMIND_DATA_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            let exe_dir = std::env::current_exe()
                .ok()
                .and_then(|p| p.parent().map(|p| p.to_path_buf()));
            if let Some(dir) = exe_dir {
                let parent_data = dir.join("../data");
                if parent_data.exists() {
                    return parent_data;
                }
            }
            PathBuf::from("data")
        })
}

fn load_config() -> anyhow::Result<CryptoMindConfig> {
    let data_dir = resolve_data_dir();
    info!("Data directory: {}", data_dir.display());
    Ok(CryptoMindConfig::from_env(&data_dir)?)
}

fn open_store(config: &CryptoMindConfig) -> anyhow::Result<Arc<SqliteStore>> {
    let store = SqliteStore::open(&config.data_paths.db)
        .map_err(|e| anyhow::anyhow!("Failed to open store: {}", e))?;
    Ok(Arc::new(store))
}

fn build_state(config: CryptoMindConfig) -> anyhow::Result<Arc<AppState>> {
    let store = open_store(&config)?;
    let source = state::whop_source(&config.whop)?;
    Ok(Arc::new(AppState::new(&config, store, source)))
}

fn print_help() {
    println!("CryptoMind: Whop membership sync server");
    println!();
    println!("Usage: cryptomind [command]");
    println!();
    println!("Commands:");
    println!("  (none)                          Start the server");
    println!("  sync-once                       Run one sync pass over all admins and print the results");
    println!("  add-admin <user-id> [company]   Register an admin (and its company id)");
    println!("  help                            Show this help message");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args: Vec<String> = std::env::args().collect();

    if args.len() > 1 {
        match args[1].as_str() {
            "sync-once" => {
                let state = build_state(load_config()?)?;
                let results = state.fleet.sync_all().await;
                println!("{}", serde_json::to_string_pretty(&results)?);
                let failed = results.values().any(|r| !r.errors.is_empty());
                std::process::exit(if failed { 1 } else { 0 });
            }
            "add-admin" => {
                if args.len() < 3 {
                    eprintln!("Usage: cryptomind add-admin <user-id> [company-id]");
                    std::process::exit(1);
                }
                let config = load_config()?;
                let store = open_store(&config)?;
                let admin = store
                    .upsert_admin(&args[2], args.get(3).map(String::as_str))
                    .map_err(|e| anyhow::anyhow!("Failed to save admin: {}", e))?;
                println!("{}", serde_json::to_string_pretty(&admin)?);
                return Ok(());
            }
            "--help" | "-h" | "help" => {
                print_help();
                return Ok(());
            }
            _ => {
                eprintln!("Unknown command: {}. Use 'cryptomind help' for usage.", args[1]);
                std::process::exit(1);
            }
        }
    }

    let config = load_config()?;
    let port = config.port;
    let autostart = config.sync.autostart;
    let state = build_state(config)?;

    if autostart {
        state.poller.start();
    } else {
        info!("Membership sync polling not started (MEMBERSHIP_SYNC_AUTOSTART is off)");
    }

    let app = routes::build_router(state.clone());

    let addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("CryptoMind server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
