use anyhow::{Context, Result};
use batchpredict::{
    assistant,
    config::WorkspaceConfig,
    predict::HttpPredictionService,
    session::{AuthClient, FileSession, SessionStore},
    RunOutcome, Workspace, WorkspaceError,
};
use reqwest::Client;
use std::{env, path::PathBuf};
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, EnvFilter};

const USAGE: &str = "Usage: batchpredict <CSV_FILE>";

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // ─── 1) config + logging ─────────────────────────────────────────
    let config = WorkspaceConfig::load()?;
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.log_filter));
    fmt::Subscriber::builder().with_env_filter(filter).init();
    info!("startup");

    let csv_path = PathBuf::from(env::args().nth(1).context(USAGE)?);

    // ─── 2) service ──────────────────────────────────────────────────
    let client = Client::new();
    let service = HttpPredictionService::new(client.clone(), &config.predict_url)?;
    info!(endpoint = %service.endpoint(), "prediction service");
    match service.health().await {
        Ok(health) if health.is_ready() => info!("prediction service ready"),
        Ok(health) => warn!(status = %health.status, "prediction service not ready"),
        Err(e) => warn!("health probe failed: {}", e),
    }

    // ─── 3) session ──────────────────────────────────────────────────
    let session = FileSession::new(&config.session_file);
    if session.load()?.is_none() {
        if let (Ok(email), Ok(password)) =
            (env::var("BATCHPREDICT_EMAIL"), env::var("BATCHPREDICT_PASSWORD"))
        {
            AuthClient::new(client.clone(), &config.predict_url)?
                .login(&session, &email, &password)
                .await
                .context("signing in")?;
        }
    }
    let workspace = match Workspace::for_session(service, &session) {
        Ok(ws) => ws,
        Err(WorkspaceError::NotSignedIn) => {
            error!("not signed in; set BATCHPREDICT_EMAIL and BATCHPREDICT_PASSWORD");
            return Err(WorkspaceError::NotSignedIn.into());
        }
        Err(e) => return Err(e.into()),
    };
    info!(user = %workspace.user().name, "signed in");

    // ─── 4) ingest + predict ─────────────────────────────────────────
    let rows = workspace
        .ingest_file(&csv_path)
        .await
        .with_context(|| format!("loading {}", csv_path.display()))?;
    info!(rows, "loaded {}", csv_path.display());

    match workspace.run_prediction().await {
        RunOutcome::Completed { source, count } => info!(count, ?source, "run complete"),
        other => warn!(?other, "nothing predicted"),
    }
    if let Some(alert) = workspace.take_alert() {
        eprintln!("warning: {}", alert);
    }

    if let (Some(current), Some(status)) = (workspace.current(), workspace.current_status()) {
        println!(
            "{}  defect {:.1}% ({})  particle {:.2} nm ({})  conductivity {:.1} S/m ({})  risk {}",
            current.batch_id,
            current.defect_rate,
            status.defect_rate,
            current.avg_particle_size,
            status.particle_size,
            current.conductivity,
            status.conductivity,
            status.risk
        );
    }
    for point in workspace.trend() {
        println!("  {}  {:.1}%", point.time, point.defect_probability);
    }
    println!("{}", assistant::GREETING);
    println!("  {}", workspace.ask("how does this batch look?"));

    // ─── 5) export ───────────────────────────────────────────────────
    for export in [workspace.export_rows(), workspace.export_history()]
        .into_iter()
        .flatten()
    {
        let path = export.save_in(&config.export_dir).await?;
        info!("wrote {}", path.display());
    }

    info!("all done");
    Ok(())
}
