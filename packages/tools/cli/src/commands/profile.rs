//! 이메일/사용자명 중복 확인

use lbr_client::AuthGateway;

use crate::commands::http::print_json;
use crate::OutputFormat;

fn report(kind: &str, value: &str, exist: bool, format: OutputFormat) -> anyhow::Result<()> {
    match format {
        OutputFormat::Json => print_json(&serde_json::json!({ "exist": exist })),
        OutputFormat::Text => {
            if exist {
                println!("{} '{}' is already in use.", kind, value);
            } else {
                println!("{} '{}' is available.", kind, value);
            }
            Ok(())
        }
    }
}

pub async fn check_email(
    gateway: &AuthGateway,
    email: &str,
    current: Option<&str>,
    format: OutputFormat,
) -> anyhow::Result<()> {
    let exist = gateway.email_exists(email, current).await?;
    report("Email", email, exist, format)
}

pub async fn check_username(
    gateway: &AuthGateway,
    username: &str,
    current: Option<&str>,
    format: OutputFormat,
) -> anyhow::Result<()> {
    let exist = gateway.username_exists(username, current).await?;
    report("Username", username, exist, format)
}
