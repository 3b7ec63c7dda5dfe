use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use chrono::NaiveDate;

use veps_client::{HttpFractureArchive, HttpTransport, TokenCache};
use veps_fracture::FractureArchive;
use veps_server::{ServerConfig, ServerRole, VepsServer};

use crate::cli::{Cli, Command};

pub async fn run_command(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Command::Serve { role, bind } => serve(role, bind).await,
        Command::Submit { file, url } => submit(file, url).await,
        Command::Fractures { date, url } => fractures(date, url).await,
    }
}

async fn serve(role: String, bind: Option<String>) -> anyhow::Result<()> {
    let mut config = ServerConfig::from_env();
    if let Some(bind) = bind {
        config.bind_addr = bind.parse().context("invalid bind address")?;
    }
    let role: ServerRole = role.parse().map_err(|err: String| anyhow::anyhow!(err))?;
    VepsServer::new(config, role).serve().await?;
    Ok(())
}

async fn submit(file: PathBuf, url: String) -> anyhow::Result<()> {
    let body = std::fs::read_to_string(&file)
        .with_context(|| format!("failed to read {}", file.display()))?;
    let submission: serde_json::Value =
        serde_json::from_str(&body).context("submission is not valid JSON")?;

    let transport = HttpTransport::with_defaults()?;
    let response = transport
        .client()
        .post(format!("{url}/ingest"))
        .json(&submission)
        .send()
        .await
        .context("ingest request failed")?;

    let status = response.status();
    let envelope: serde_json::Value = response.json().await.context("invalid response body")?;
    println!("{}", serde_json::to_string_pretty(&envelope)?);

    // 412 is a veto verdict, already printed with its reasons.
    if !status.is_success() && status.as_u16() != 412 {
        anyhow::bail!("ingest failed with status {status}");
    }
    Ok(())
}

async fn fractures(date: String, url: String) -> anyhow::Result<()> {
    let date = NaiveDate::parse_from_str(&date, "%Y-%m-%d")
        .context("invalid date (expected YYYY-MM-DD)")?;

    let transport = HttpTransport::with_defaults()?;
    let archive = HttpFractureArchive::new(url, transport, Arc::new(TokenCache::unauthenticated()));
    let records = archive.read_date(date).await?;

    println!("{} fracture(s) on {date}", records.len());
    for record in &records {
        println!("{}", serde_json::to_string(record)?);
    }
    Ok(())
}
