//! 게이트웨이 생성과 임의 요청

use anyhow::Context as _;
use lbr_client::{ApiRequest, ApiResponse, AuthGateway};
use reqwest::Method;

use crate::config::CliConfig;
use crate::OutputFormat;

pub fn gateway(config: &CliConfig, api: Option<&str>) -> anyhow::Result<AuthGateway> {
    let client_config = config.client_config(api)?;
    tracing::debug!(api = client_config.base_url(), "building gateway");
    AuthGateway::from_config(client_config).context("failed to build gateway")
}

pub fn print_json(value: &impl serde::Serialize) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn print_response(resp: &ApiResponse, format: OutputFormat) -> anyhow::Result<()> {
    let body = resp
        .json::<serde_json::Value>()
        .unwrap_or_else(|_| serde_json::Value::String(resp.text()));

    match format {
        OutputFormat::Json => print_json(&serde_json::json!({
            "status": resp.status().as_u16(),
            "body": body,
        })),
        OutputFormat::Text => {
            println!("{}", resp.status());
            match body {
                serde_json::Value::String(text) if !text.is_empty() => println!("{}", text),
                serde_json::Value::String(_) => {}
                other => println!("{}", serde_json::to_string_pretty(&other)?),
            }
            Ok(())
        }
    }
}

/// 게이트웨이를 거쳐 요청 전송
///
/// 실패 상태 코드도 출력 후 에러로 종료합니다.
pub async fn request(
    gateway: &AuthGateway,
    method: &str,
    path: &str,
    data: Option<&str>,
    format: OutputFormat,
) -> anyhow::Result<()> {
    let method = Method::from_bytes(method.to_ascii_uppercase().as_bytes())
        .with_context(|| format!("invalid HTTP method: {}", method))?;

    let mut req = ApiRequest::new(method, gateway.url(path));
    if let Some(data) = data {
        let body: serde_json::Value =
            serde_json::from_str(data).context("--data must be valid JSON")?;
        req = req.json(&body)?;
    }

    let resp = gateway.send(req).await?;
    print_response(&resp, format)?;

    if !resp.status().is_success() {
        anyhow::bail!("request failed ({})", resp.status());
    }
    Ok(())
}
