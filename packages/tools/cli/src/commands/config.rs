//! 설정 명령어

use crate::config::CliConfig;

pub fn set(api: Option<String>) -> anyhow::Result<()> {
    let mut config = CliConfig::load()?;

    if let Some(url) = api {
        config.api_base_url = Some(url);
    }

    config.save()?;
    println!("Config updated.");
    show()
}

pub fn show() -> anyhow::Result<()> {
    let config = CliConfig::load()?;
    let effective = config.client_config(None)?;

    println!("Current config ({}):", CliConfig::config_path()?.display());
    println!("  api:             {}", config.api_base_url.as_deref().unwrap_or("(not set)"));
    println!("  effective api:   {}", effective.base_url());
    match effective.refresh_timeout {
        Some(timeout) => println!("  refresh timeout: {}s", timeout.as_secs()),
        None => println!("  refresh timeout: (unbounded)"),
    }

    Ok(())
}
