use clap::{Parser, Subcommand};
use courier::config::{self, ClientConfig, ConfigError};
use courier::dispatch::ApiClient;
use courier::imaging::{self, CompressParams, ImageAsset, RustCodec};
use courier::navigate::Navigator;
use courier::notify::{Level, Notification, Notifier};
use courier::output;
use courier::services::{AdminService, UserService};
use courier::types::{LoginRequest, ResponseEnvelope};
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::{Arc, Mutex};
use tracing_subscriber::EnvFilter;

/// Account used to open a session before running a command.
#[derive(clap::Args, Clone)]
struct Credentials {
    /// Account email
    #[arg(long, env = "COURIER_EMAIL", global = true)]
    email: Option<String>,

    /// Account password
    #[arg(long, env = "COURIER_PASSWORD", hide_env_values = true, global = true)]
    password: Option<String>,

    /// Sign in through the admin endpoint
    #[arg(long, global = true)]
    admin: bool,
}

impl Credentials {
    fn login_request(&self) -> Option<LoginRequest> {
        Some(LoginRequest {
            email: self.email.clone()?,
            password: self.password.clone()?,
        })
    }
}

#[derive(Parser)]
#[command(name = "courier")]
#[command(about = "Client for the weekly-count backend")]
#[command(long_about = "\
Client for the weekly-count backend

Every request goes through one dispatcher: failures become a single message
on stderr, an expired access token is refreshed once and the request replayed,
and an ended session clears the cookies and names the login page to return to.

The session lives in memory for one invocation. Pass --email and --password
(or set COURIER_EMAIL and COURIER_PASSWORD) to sign in before the command runs.

Configuration layers (later wins):
  stock defaults → courier.toml → $COURIER_API_BASE_URL / $COURIER_REFRESH_TOKEN_URL → --base-url

Images are checked (JPEG, PNG, GIF, WebP, at most 5 MB) and shrunk to fit
the configured bounds before upload.

Run 'courier gen-config' to generate a documented courier.toml.")]
#[command(version)]
struct Cli {
    /// Config file
    #[arg(long, default_value = "courier.toml", global = true)]
    config: PathBuf,

    /// Override the API base address
    #[arg(long, global = true)]
    base_url: Option<String>,

    /// Route the user is on, used to pick the login page after a session ends
    #[arg(long, default_value = "/", global = true)]
    route: String,

    #[command(flatten)]
    credentials: Credentials,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Sign in and print the session payload
    Login,
    /// Sign in, then sign out again
    Logout,
    /// Show the signed-in user's profile
    Profile,
    /// GET any path and print the envelope
    Get {
        /// Path relative to the base address
        path: String,
    },
    /// Set this week's count
    UpdateCount {
        #[arg(allow_negative_numbers = true)]
        count: i64,
    },
    /// List all users (admin)
    Users,
    /// Show one user (admin)
    User {
        id: String,
    },
    /// Check whether a file would be accepted for upload
    CheckImage {
        file: PathBuf,
    },
    /// Compress an image the way an upload would, without sending it
    Compress {
        file: PathBuf,
        /// Where to write the compressed image
        #[arg(long)]
        out: PathBuf,
    },
    /// Upload an image for this week
    Upload {
        file: PathBuf,
    },
    /// Print a stock courier.toml with all options documented
    GenConfig,
}

/// Prints notifications to stderr.
struct ConsoleNotifier;

impl Notifier for ConsoleNotifier {
    fn notify(&self, notification: Notification) {
        let tag = match notification.level {
            Level::Success => "ok",
            Level::Error => "error",
        };
        eprintln!("[{}] {}", tag, notification.message);
    }
}

/// Tracks the route given on the command line and reports redirects.
struct ConsoleNavigator {
    current: Mutex<String>,
}

impl Navigator for ConsoleNavigator {
    fn current_path(&self) -> String {
        self.current
            .lock()
            .map(|c| c.clone())
            .unwrap_or_default()
    }

    fn go_to(&self, path: &str) {
        eprintln!("→ sign in again at {}", path);
        if let Ok(mut current) = self.current.lock() {
            *current = path.to_string();
        }
    }
}

#[tokio::main]
async fn main() -> Result<ExitCode, Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("courier=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    // Offline commands
    match &cli.command {
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
            return Ok(ExitCode::SUCCESS);
        }
        Command::CheckImage { file } => {
            let asset = ImageAsset::from_path(file)?;
            let validation = imaging::check(&asset);
            output::print_validation(&asset.file_name, &validation);
            return Ok(exit_code(validation.valid));
        }
        Command::Compress { file, out } => {
            let config = load(&cli)?;
            return compress_to(file, out, &CompressParams::from_upload_config(&config.upload));
        }
        _ => {}
    }

    let config = load(&cli)?;
    let navigator = Arc::new(ConsoleNavigator {
        current: Mutex::new(cli.route.clone()),
    });
    let client = ApiClient::connect(config, Arc::new(ConsoleNotifier), navigator)?;

    let signed_in = match cli.credentials.login_request() {
        Some(request) => sign_in(&client, &request, cli.credentials.admin).await,
        None if matches!(cli.command, Command::Login | Command::Logout) => {
            return Err("--email and --password are required".into());
        }
        None => None,
    };

    let ok = match cli.command {
        Command::Login => match &signed_in {
            Some(envelope) => {
                output::print_envelope(envelope);
                true
            }
            None => false,
        },
        Command::Logout => signed_in.is_some() && UserService::new(&client).logout().await.is_some(),
        Command::Profile => match UserService::new(&client).profile().await {
            Some(ResponseEnvelope { data: Some(user), .. }) => {
                output::print_profile(&user);
                true
            }
            _ => false,
        },
        Command::Get { path } => match client.get::<Value>(&path).await {
            Some(envelope) => {
                output::print_envelope(&envelope);
                true
            }
            None => false,
        },
        Command::UpdateCount { count } => match UserService::new(&client).update_count(count).await {
            Some(ResponseEnvelope { data: Some(user), .. }) => {
                output::print_profile(&user);
                true
            }
            Some(_) => true,
            None => false,
        },
        Command::Users => match AdminService::new(&client).users().await {
            Some(envelope) => {
                output::print_users(&envelope.data.unwrap_or_default());
                true
            }
            None => false,
        },
        Command::User { id } => match AdminService::new(&client).user(&id).await {
            Some(envelope) => {
                output::print_envelope(&envelope);
                true
            }
            None => false,
        },
        Command::Upload { file } => {
            let asset = ImageAsset::from_path(&file)?;
            let outcome = UserService::new(&client).upload_image(asset).await;
            output::print_upload(&outcome);
            outcome.reference().is_some()
        }
        Command::GenConfig | Command::CheckImage { .. } | Command::Compress { .. } => true,
    };

    Ok(exit_code(ok))
}

fn load(cli: &Cli) -> Result<ClientConfig, ConfigError> {
    config::load_config(&cli.config, cli.base_url.as_deref())
}

async fn sign_in(
    client: &ApiClient,
    request: &LoginRequest,
    admin: bool,
) -> Option<ResponseEnvelope> {
    if admin {
        AdminService::new(client).login(request).await
    } else {
        UserService::new(client).login(request).await
    }
}

fn compress_to(
    file: &Path,
    out: &Path,
    params: &CompressParams,
) -> Result<ExitCode, Box<dyn std::error::Error>> {
    let asset = ImageAsset::from_path(file)?;
    let validated = match imaging::validate(asset) {
        Ok(validated) => validated,
        Err(e) => {
            eprintln!("[error] {}", e);
            return Ok(ExitCode::FAILURE);
        }
    };
    let encoded = imaging::compress(&RustCodec::new(), &validated, params);
    std::fs::write(out, &encoded.bytes)?;
    output::print_compression(&encoded);
    Ok(ExitCode::SUCCESS)
}

fn exit_code(ok: bool) -> ExitCode {
    if ok {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}
