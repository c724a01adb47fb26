use std::net::SocketAddr;
use std::path::PathBuf;

use clap::Parser;

/// Command-line and environment arguments for the storefront server.
///
/// Every option can also come from the environment (and `.env` via
/// `dotenvy`), flags winning over variables.
#[derive(Parser, Debug, Clone)]
#[command(name = "minikart-server", about = "REST API for the MiniKart storefront")]
pub struct CliArgs {
    /// Address the HTTP listener binds to.
    #[arg(long, env = "MINIKART_ADDR", default_value = "0.0.0.0:5000")]
    pub addr: String,

    /// Path of the embedded document store.
    #[arg(long, env = "MINIKART_DB", default_value = "minikart.redb")]
    pub db_path: PathBuf,

    /// Directory of static frontend assets; omit to serve the API only.
    #[arg(long, env = "MINIKART_STATIC_DIR")]
    pub static_dir: Option<PathBuf>,

    /// Secret used to sign session tokens.
    #[arg(long, env = "MINIKART_TOKEN_SECRET")]
    pub token_secret: String,

    /// Session token lifetime in seconds.
    #[arg(long, env = "MINIKART_TOKEN_TTL", default_value_t = 86_400)]
    pub token_ttl_secs: u64,

    /// Email of the bootstrap admin account created by --seed.
    #[arg(long, env = "MINIKART_ADMIN_EMAIL", default_value = "admin@minikart.test")]
    pub admin_email: String,

    /// Password of the bootstrap admin account created by --seed.
    #[arg(long, env = "MINIKART_ADMIN_PASSWORD", default_value = "admin123")]
    pub admin_password: String,

    /// Assign member IDs to accounts that predate allocation, then exit.
    #[arg(long)]
    pub backfill: bool,

    /// Backfill, bootstrap the admin account and reset the catalog, then
    /// exit.
    #[arg(long)]
    pub seed: bool,
}

/// Validated runtime configuration derived from [`CliArgs`].
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub addr: SocketAddr,
    pub db_path: PathBuf,
    pub static_dir: Option<PathBuf>,
    pub token_secret: String,
    pub token_ttl_millis: u64,
    pub admin_email: String,
    pub admin_password: String,
    pub backfill: bool,
    pub seed: bool,
}

impl TryFrom<CliArgs> for ServerConfig {
    type Error = anyhow::Error;

    fn try_from(args: CliArgs) -> Result<Self, Self::Error> {
        let addr: SocketAddr = args
            .addr
            .parse()
            .map_err(|e| anyhow::anyhow!("invalid listen address {:?}: {e}", args.addr))?;

        if args.token_secret.is_empty() {
            anyhow::bail!("token secret must not be empty");
        }
        if args.token_ttl_secs == 0 {
            anyhow::bail!("token TTL must be positive");
        }

        Ok(Self {
            addr,
            db_path: args.db_path,
            static_dir: args.static_dir,
            token_secret: args.token_secret,
            token_ttl_millis: args.token_ttl_secs * 1_000,
            admin_email: args.admin_email,
            admin_password: args.admin_password,
            backfill: args.backfill,
            seed: args.seed,
        })
    }
}
