//! Librarium CLI (`lbr`)
//!
//! 인증 게이트웨이를 통해 백엔드에 접근하는 운영 도구입니다.
//! 토큰은 `~/.lbr/token.json`에 저장되고, 만료되면 다음 요청에서 자동으로 갱신됩니다.

use clap::{Parser, Subcommand};
use lbr_client::api::RegisterRequest;
use lbr_core::auth::Role;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;
mod config;

use config::CliConfig;

#[derive(Parser)]
#[command(name = "lbr")]
#[command(author, version, about = "Librarium CLI - authenticated access to the Librarium API", long_about = None)]
struct Cli {
    /// API base URL (overrides config and LBR_API_BASE_URL)
    #[arg(long, global = true)]
    api: Option<String>,

    /// Output format
    #[arg(long, global = true, default_value = "text")]
    format: OutputFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, Default, clap::ValueEnum)]
pub(crate) enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    // ─────────────────────────────────────────────────────────────────────────
    // Auth
    // ─────────────────────────────────────────────────────────────────────────
    /// Login with username and password
    Login {
        #[arg(long)]
        username: String,
        #[arg(long)]
        password: String,
    },

    /// Register a new account and login
    Register {
        #[arg(long, default_value = "READER")]
        role: Role,
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        username: String,
        #[arg(long)]
        password: String,
    },

    /// Logout (clears the stored token)
    Logout,

    /// Show current user
    Whoami,

    /// Check route access for the current session
    Guard {
        /// Required role
        #[arg(long)]
        role: Option<Role>,

        /// `libraryId` route parameter
        #[arg(long)]
        library_id: Option<String>,

        /// Require the librarian to own the library
        #[arg(long)]
        ownership: bool,
    },

    // ─────────────────────────────────────────────────────────────────────────
    // Requests
    // ─────────────────────────────────────────────────────────────────────────
    /// Send a request through the gateway
    Request {
        /// HTTP method
        method: String,

        /// Path relative to the API base URL
        path: String,

        /// JSON body
        #[arg(long)]
        data: Option<String>,
    },

    /// Show whether an endpoint is public or private
    Classify {
        method: String,
        path: String,
    },

    /// Check whether an email is already in use
    CheckEmail {
        email: String,

        /// The user's current email
        #[arg(long)]
        current: Option<String>,
    },

    /// Check whether a username is already in use
    CheckUsername {
        username: String,

        /// The user's current username
        #[arg(long)]
        current: Option<String>,
    },

    // ─────────────────────────────────────────────────────────────────────────
    // Config
    // ─────────────────────────────────────────────────────────────────────────
    /// Manage CLI config
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Set config values
    Set {
        #[arg(long)]
        api: Option<String>,
    },
    /// Show current config
    Show,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            "lbr=info,lbr_client=info,lbr_core=info".into()
        }))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    // 설정 로드
    let config = CliConfig::load()?;

    // 게이트웨이는 필요한 명령에서만 생성
    let gateway = || commands::http::gateway(&config, cli.api.as_deref());

    // 명령 실행
    match cli.command {
        Commands::Login { username, password } => {
            commands::auth::login(&gateway()?, &username, &password).await
        }
        Commands::Register {
            role,
            name,
            email,
            username,
            password,
        } => {
            commands::auth::register(
                &gateway()?,
                RegisterRequest {
                    role,
                    name,
                    email,
                    username,
                    password,
                },
            )
            .await
        }
        Commands::Logout => commands::auth::logout(&gateway()?),
        Commands::Whoami => commands::auth::whoami(&gateway()?, cli.format),
        Commands::Guard {
            role,
            library_id,
            ownership,
        } => commands::auth::guard(&gateway()?, role, library_id.as_deref(), ownership),

        Commands::Request { method, path, data } => {
            commands::http::request(&gateway()?, &method, &path, data.as_deref(), cli.format).await
        }
        Commands::Classify { method, path } => {
            commands::endpoint::classify(&gateway()?, &method, &path, cli.format)
        }
        Commands::CheckEmail { email, current } => {
            commands::profile::check_email(&gateway()?, &email, current.as_deref(), cli.format).await
        }
        Commands::CheckUsername { username, current } => {
            commands::profile::check_username(&gateway()?, &username, current.as_deref(), cli.format)
                .await
        }

        Commands::Config { action } => match action {
            ConfigAction::Set { api } => commands::config::set(api),
            ConfigAction::Show => commands::config::show(),
        },
    }
}
