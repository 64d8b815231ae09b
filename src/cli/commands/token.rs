use clap::Args;
use serde_json::json;

use crate::auth::{generate_jwt, Claims};
use crate::cli::utils::output_success;
use crate::cli::OutputFormat;
use crate::config;

#[derive(Args)]
pub struct TokenArgs {
    #[arg(long, help = "Tenant id")]
    pub tenant: String,
    #[arg(long, default_value = "cli", help = "Caller id (token subject)")]
    pub sub: String,
    #[arg(long = "role", default_value = "trader", help = "Role; repeat for several")]
    pub roles: Vec<String>,
    #[arg(long, help = "Lifetime in hours (defaults to SECURITY_JWT_EXPIRY_HOURS)")]
    pub expiry_hours: Option<u64>,
}

/// Signs with the server's own secret, so only useful next to a server config
pub fn handle(args: TokenArgs, output_format: OutputFormat) -> anyhow::Result<()> {
    let security = &config::config().security;
    if !crate::is_development!() {
        tracing::warn!("Minting a session token outside development");
    }

    let claims = Claims::new(
        args.sub,
        args.tenant,
        args.roles,
        args.expiry_hours.unwrap_or(security.jwt_expiry_hours),
    );
    let token = generate_jwt(&claims, &security.jwt_secret)?;

    match output_format {
        OutputFormat::Json => output_success(
            output_format,
            "Token created",
            Some(json!({ "token": token, "claims": claims })),
        ),
        OutputFormat::Text => {
            println!("{}", token);
            Ok(())
        }
    }
}
