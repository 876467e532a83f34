//! AI Blame Viewer - per-document AI attribution service for one repository
//!
//! # Usage
//! ```bash
//! ai-blame-viewer /path/to/repository   # Start the service
//! ai-blame-viewer status                # Check if running
//! ai-blame-viewer kill                  # Stop running instance
//! ```

mod blame;
mod error;
mod models;
mod routes;

use std::fs;
use std::io::{Read, Write};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use clap::{Parser, Subcommand};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use blame::{BlameProvider, BlameStore, GitAiProvider};

/// AI Blame Viewer - serve per-line AI attribution to editor frontends
#[derive(Parser)]
#[command(name = "ai-blame-viewer")]
#[command(about = "Per-document AI attribution cache over a git repository", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Path to the git repository to serve attribution for
    #[arg(value_name = "REPO_PATH")]
    repo_path: Option<String>,

    /// Port to run the server on
    #[arg(short, long, default_value = "4817")]
    port: u16,

    /// Attribution provider program to shell out to
    #[arg(long, default_value = "git-ai")]
    provider: String,

    /// Quiet window between the last edit and a refetch, in milliseconds
    #[arg(long, default_value = "300")]
    debounce_ms: u64,
}

#[derive(Subcommand)]
enum Commands {
    /// Check if ai-blame-viewer is currently running
    Status,
    /// Stop the running ai-blame-viewer instance
    Kill,
}

/// PID file info stored as JSON
#[derive(serde::Serialize, serde::Deserialize)]
struct PidInfo {
    pid: u32,
    repo_path: String,
    port: u16,
}

fn get_pid_file_path() -> PathBuf {
    let mut path = std::env::temp_dir();
    path.push("ai-blame-viewer.pid");
    path
}

fn read_pid_info() -> Option<PidInfo> {
    let path = get_pid_file_path();
    let mut file = fs::File::open(&path).ok()?;
    let mut contents = String::new();
    file.read_to_string(&mut contents).ok()?;
    serde_json::from_str(&contents).ok()
}

fn write_pid_info(info: &PidInfo) -> anyhow::Result<()> {
    let path = get_pid_file_path();
    let mut file = fs::File::create(&path)?;
    file.write_all(serde_json::to_string(info)?.as_bytes())?;
    Ok(())
}

fn remove_pid_file() {
    let _ = fs::remove_file(get_pid_file_path());
}

#[cfg(unix)]
fn is_process_running(pid: u32) -> bool {
    // On Unix, sending signal 0 checks if process exists
    unsafe { libc::kill(pid as i32, 0) == 0 }
}

#[cfg(windows)]
fn is_process_running(pid: u32) -> bool {
    use std::process::Command;
    // On Windows, check if process exists using tasklist
    Command::new("tasklist")
        .args(&["/FI", &format!("PID eq {}", pid), "/NH"])
        .output()
        .map(|output| {
            let output_str = String::from_utf8_lossy(&output.stdout);
            output_str.contains(&pid.to_string())
        })
        .unwrap_or(false)
}

#[cfg(unix)]
fn kill_process(pid: u32) -> bool {
    unsafe { libc::kill(pid as i32, libc::SIGTERM) == 0 }
}

#[cfg(windows)]
fn kill_process(pid: u32) -> bool {
    use std::process::Command;
    // On Windows, use taskkill
    Command::new("taskkill")
        .args(&["/PID", &pid.to_string(), "/F"])
        .status()
        .map(|status| status.success())
        .unwrap_or(false)
}

fn handle_status() {
    match read_pid_info() {
        Some(info) => {
            if is_process_running(info.pid) {
                println!("✓ ai-blame-viewer is running");
                println!("  PID:  {}", info.pid);
                println!("  Repo: {}", info.repo_path);
                println!("  URL:  http://127.0.0.1:{}", info.port);
            } else {
                println!("✗ ai-blame-viewer is not running (stale PID file)");
                remove_pid_file();
            }
        }
        None => {
            println!("✗ ai-blame-viewer is not running");
        }
    }
}

fn handle_kill() {
    match read_pid_info() {
        Some(info) => {
            if is_process_running(info.pid) {
                if kill_process(info.pid) {
                    println!("✓ Stopped ai-blame-viewer (PID {})", info.pid);
                    remove_pid_file();
                } else {
                    println!("✗ Failed to stop ai-blame-viewer (PID {})", info.pid);
                }
            } else {
                println!("✗ ai-blame-viewer is not running (stale PID file)");
                remove_pid_file();
            }
        }
        None => {
            println!("✗ ai-blame-viewer is not running");
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Handle subcommands
    match cli.command {
        Some(Commands::Status) => {
            handle_status();
            return Ok(());
        }
        Some(Commands::Kill) => {
            handle_kill();
            return Ok(());
        }
        None => {}
    }

    // Need a repo path to start the server
    let repo_path = cli.repo_path.unwrap_or_else(|| {
        eprintln!("Usage: ai-blame-viewer <REPO_PATH>");
        eprintln!("       ai-blame-viewer status");
        eprintln!("       ai-blame-viewer kill");
        eprintln!();
        eprintln!("Examples:");
        eprintln!("  ai-blame-viewer .                    # Serve the current repository");
        eprintln!("  ai-blame-viewer ~/myproject -p 4820  # Serve on another port");
        std::process::exit(1);
    });

    // Check if already running
    if let Some(info) = read_pid_info() {
        if is_process_running(info.pid) {
            eprintln!("✗ ai-blame-viewer is already running (PID {})", info.pid);
            eprintln!("  Repo: {}", info.repo_path);
            eprintln!("  URL:  http://127.0.0.1:{}", info.port);
            eprintln!();
            eprintln!("Run 'ai-blame-viewer kill' to stop it first.");
            std::process::exit(1);
        } else {
            remove_pid_file();
        }
    }

    // Initialize tracing (quieter for production)
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "warn".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Discover the repository and prepare the attribution provider
    let provider = match GitAiProvider::open(&repo_path, &cli.provider) {
        Ok(p) => Arc::new(p),
        Err(e) => {
            eprintln!("✗ Failed to open repository: {}", e);
            eprintln!("  Path: {}", repo_path);
            std::process::exit(1);
        }
    };
    let workdir = provider.workdir().to_string_lossy().to_string();

    let store = BlameStore::new(
        provider.clone(),
        Duration::from_millis(cli.debounce_ms),
    );
    let shutdown_store = store.clone();

    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Build the router
    let app = Router::new()
        .merge(routes::create_router(
            store,
            workdir.clone(),
            cli.provider.clone(),
        ))
        .layer(cors)
        .layer(TraceLayer::new_for_http());

    // Bind to the port
    let addr = format!("127.0.0.1:{}", cli.port);
    let listener = match tokio::net::TcpListener::bind(&addr).await {
        Ok(l) => l,
        Err(e) => {
            eprintln!("✗ Failed to bind to port {}: {}", cli.port, e);
            eprintln!("  Try a different port with --port <PORT>");
            std::process::exit(1);
        }
    };

    // Write PID file
    let pid_info = PidInfo {
        pid: std::process::id(),
        repo_path: workdir.clone(),
        port: cli.port,
    };
    write_pid_info(&pid_info)?;

    // Print startup message
    let url = format!("http://127.0.0.1:{}", cli.port);
    println!();
    println!("  ┌─────────────────────────────────────────────┐");
    println!("  │               AI Blame Viewer               │");
    println!("  └─────────────────────────────────────────────┘");
    println!();
    println!("  Repository: {}", workdir);
    println!("  Provider:   {}", cli.provider);
    println!("  Server:     {}", url);
    println!();
    println!("  Commands:");
    println!("    ai-blame-viewer status  - Check if running");
    println!("    ai-blame-viewer kill    - Stop the server");
    println!();
    println!("  Press Ctrl+C to stop");
    println!();

    // Set up graceful shutdown
    let shutdown = async move {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to listen for Ctrl+C");
        println!("\n  Shutting down...");
        shutdown_store.cancel_all_fetches();
        remove_pid_file();
    };

    // Start the server with graceful shutdown
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await?;

    provider.dispose();

    Ok(())
}
