use ai_service::TipClient;
use anyhow::Result;
use database::{InMemoryTargetStore, TargetStore};
use hunt::logging::{self, LogFormat};
use hunt::{scripted_walk, seed_documents};
use proximity::HuntSettings;
use shared::config::{Config, UnlockFlow};

#[tokio::main]
async fn main() -> Result<()> {
    let args: Vec<String> = std::env::args().skip(1).collect();

    logging::init_logging(LogFormat::from_args(&args))?;

    tracing::info!("Starting CampusLens hunt");

    // Load configuration
    let config = Config::from_env()?;
    tracing::info!("Configuration loaded successfully");

    let flow = if args.iter().any(|arg| arg == "ar") {
        UnlockFlow::ArUnlock
    } else {
        UnlockFlow::GatedReveal
    };
    let settings = HuntSettings::from_config(&config, flow)?;
    tracing::info!("Unlock flow {:?}, threshold {} m", flow, settings.threshold_m);

    // Drops live in Postgres when configured, otherwise in memory for this run
    let migrate = std::env::var("SKIP_MIGRATIONS").unwrap_or_default() != "true";
    let store: Box<dyn TargetStore> = match database::connect(&config.database, migrate).await? {
        Some(store) => {
            tracing::info!("Drops stored in Postgres");
            Box::new(store)
        }
        None => {
            tracing::info!("DATABASE_URL not set, using in-memory drops");
            Box::new(InMemoryTargetStore::with_documents(seed_documents()))
        }
    };

    let tips = TipClient::from_config(&config.gemini);
    if !tips.is_configured() {
        tracing::info!("GEMINI_API_KEY not set, tips will use the fallback text");
    }

    let report = scripted_walk(store.as_ref(), &tips, settings).await?;
    tracing::info!(
        targets = report.targets_loaded,
        target = ?report.target_id,
        revealed_at_m = ?report.revealed_at_m,
        new_drop = ?report.new_drop_id,
        "Walk finished"
    );

    Ok(())
}
