use clap::Args;
use serde_json::json;
use uuid::Uuid;

use crate::auth::JwtIdentity;
use crate::cli::OutputFormat;
use crate::config;

#[derive(Args)]
pub struct TokenArgs {
    #[arg(long, help = "User id the token is issued for")]
    pub user: Uuid,

    #[arg(long, help = "Email claim")]
    pub email: Option<String>,
}

pub async fn handle(args: TokenArgs, output_format: OutputFormat) -> anyhow::Result<()> {
    if config::config().security.jwt_secret.is_empty() {
        anyhow::bail!("JWT_SECRET is not set");
    }

    let token = JwtIdentity::from_config().issue(args.user, args.email.clone())?;

    match output_format {
        OutputFormat::Json => {
            let body = json!({
                "token": token,
                "user_id": args.user,
                "email": args.email,
                "expires_in_hours": config::config().security.jwt_expiry_hours,
            });
            println!("{}", serde_json::to_string_pretty(&body)?);
        }
        OutputFormat::Text => println!("{}", token),
    }
    Ok(())
}
