//! 인증 명령어

use lbr_client::api::RegisterRequest;
use lbr_client::AuthGateway;
use lbr_core::auth::{AccessDecision, Role, RouteRequirement};

use crate::commands::http::print_json;
use crate::OutputFormat;

pub async fn login(gateway: &AuthGateway, username: &str, password: &str) -> anyhow::Result<()> {
    gateway.login(username, password).await?;
    println!("Logged in as {}.", username);
    Ok(())
}

pub async fn register(gateway: &AuthGateway, req: RegisterRequest) -> anyhow::Result<()> {
    gateway.register(&req).await?;
    println!("Registered {} as {}.", req.username, req.role);
    Ok(())
}

pub fn logout(gateway: &AuthGateway) -> anyhow::Result<()> {
    gateway.logout()?;
    println!("Logged out.");
    Ok(())
}

pub fn whoami(gateway: &AuthGateway, format: OutputFormat) -> anyhow::Result<()> {
    let session = gateway.session();
    let claim = match session.current_claim() {
        Some(claim) => claim,
        None => {
            println!("Not logged in");
            return Ok(());
        }
    };

    match format {
        OutputFormat::Json => print_json(&serde_json::json!({
            "claim": claim,
            "loggedIn": session.is_logged_in(),
        })),
        OutputFormat::Text => {
            println!("{} ({})", claim.display_name(), claim.role);
            println!("  sub:     {}", claim.sub);
            if let Some(library_id) = &claim.library_id {
                println!("  library: {}", library_id);
            }
            if !session.is_logged_in() {
                println!("  access token expired (refreshed on next request)");
            }
            Ok(())
        }
    }
}

/// 라우트 접근 판정
///
/// 로그인이 필요하다는 판정이면 남아있는 세션도 정리됩니다.
pub fn guard(
    gateway: &AuthGateway,
    role: Option<Role>,
    library_id: Option<&str>,
    ownership: bool,
) -> anyhow::Result<()> {
    let mut requirement = match role {
        Some(role) => RouteRequirement::role(role),
        None => RouteRequirement::logged_in(),
    };
    if ownership {
        requirement = requirement.with_ownership();
    }

    match gateway.session().authorize(&requirement, library_id) {
        AccessDecision::Allow => {
            println!("allow");
            Ok(())
        }
        AccessDecision::RedirectToLogin => anyhow::bail!("login required"),
        AccessDecision::Forbidden => anyhow::bail!("forbidden"),
    }
}
