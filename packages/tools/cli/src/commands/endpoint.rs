//! 엔드포인트 분류 확인

use lbr_client::AuthGateway;

use crate::commands::http::print_json;
use crate::OutputFormat;

pub fn classify(
    gateway: &AuthGateway,
    method: &str,
    path: &str,
    format: OutputFormat,
) -> anyhow::Result<()> {
    let method = method.to_ascii_uppercase();
    let visibility = gateway.policy().classify(path, &method);

    match format {
        OutputFormat::Json => print_json(&serde_json::json!({
            "method": method,
            "path": path,
            "visibility": visibility.as_str(),
        })),
        OutputFormat::Text => {
            println!("{} {} → {}", method, path, visibility.as_str());
            Ok(())
        }
    }
}
