/// Warden - identity and session service CLI
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use warden_core::UserId;
use warden_server::{
    config::ServerConfig,
    services::{LoginRequest, RegisterRequest, UpdateUserRequest},
    state::AppState,
};

#[derive(Parser)]
#[command(name = "warden")]
#[command(about = "Warden identity and session service", long_about = None)]
struct Cli {
    /// Configuration file path (defaults to ./warden.toml when present)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a new user
    Register {
        #[arg(short, long)]
        name: String,
        #[arg(short, long)]
        email: String,
        /// Password (or set WARDEN_PASSWORD)
        #[arg(short, long, env = "WARDEN_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Log in and print a session token
    Login {
        #[arg(short, long)]
        email: String,
        /// Password (or set WARDEN_PASSWORD)
        #[arg(short, long, env = "WARDEN_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Show the user a session token belongs to
    Whoami {
        token: String,
    },
    /// Show a user by id
    Show {
        id: UserId,
    },
    /// Change a user's name and/or password
    Update {
        id: UserId,
        #[arg(short, long)]
        name: Option<String>,
        #[arg(short, long)]
        password: Option<String>,
    },
    /// Delete a user
    Delete {
        id: UserId,
    },
    /// List users page by page
    List {
        #[arg(long, default_value_t = 1)]
        page: u32,
        #[arg(long, default_value_t = 20)]
        limit: u32,
    },
    /// Print recent audit events, newest first
    Audit {
        #[arg(long, default_value_t = 50)]
        limit: usize,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warden_server=info,warden_cache=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let config = ServerConfig::load(cli.config.as_deref())?;
    config.validate()?;

    let state = AppState::from_config(&config).await?;
    let identity = &state.identity;

    match cli.command {
        Commands::Register {
            name,
            email,
            password,
        } => {
            let user = identity
                .register(RegisterRequest {
                    name,
                    email,
                    password,
                })
                .await?;
            print_json(&user)?;
        }
        Commands::Login { email, password } => {
            let session = identity.login(LoginRequest { email, password }).await?;
            println!("{}", session.token);
            eprintln!(
                "Logged in as {} <{}>; token expires {}",
                session.user.name,
                session.user.email,
                session.expires_at.to_rfc3339()
            );
        }
        Commands::Whoami { token } => {
            let user = identity.authenticate(&token).await?;
            print_json(&user)?;
        }
        Commands::Show { id } => {
            let user = identity.get_by_id(id).await?;
            print_json(&user)?;
        }
        Commands::Update { id, name, password } => {
            let user = identity
                .update_user(id, UpdateUserRequest { name, password })
                .await?;
            print_json(&user)?;
        }
        Commands::Delete { id } => {
            identity.delete_user(id).await?;
            println!("Deleted user {}", id);
        }
        Commands::List { page, limit } => {
            let page_data = identity.list_users(page, limit).await?;
            println!("Users ({} total):", page_data.total);
            for user in page_data.items {
                println!("  {} - {} <{}>", user.id, user.name, user.email);
            }
        }
        Commands::Audit { limit } => {
            for event in identity.recent_audit(limit).await? {
                println!("{}", serde_json::to_string(&event)?);
            }
        }
    }

    Ok(())
}

fn print_json<T: serde::Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
