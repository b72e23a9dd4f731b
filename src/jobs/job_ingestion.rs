// ═══════════════════════════════════════════════════════════════════
// JOB INGESTION — Background job que importa vagas da JSearch
// ═══════════════════════════════════════════════════════════════════
//
// - Spawna tokio::spawn em background
// - Aguarda o servidor subir, roda um ciclo e depois a cada intervalo
// - Cada ciclo: remove vagas antigas, busca as queries, faz upsert
// - Ciclos sobrepostos (timer x disparo manual) são pulados
//
// Configuração via env:
//   JOB_FETCHER_ENABLED       — "false" para desativar (default: true)
//   JOB_FETCH_INTERVAL_SECS   — intervalo do loop (default: 21600 = 6h)
//   RAPIDAPI_KEY              — sem chave o poller não inicia
//

use crate::{
    database::MongoDB,
    services::job_fetcher_service::{self, CycleOutcome, FetcherConfig},
};
use tokio::time::{interval, Duration, MissedTickBehavior};

/// Delay inicial para o servidor terminar de subir
const WARMUP_SECS: u64 = 10;

/// Inicia o poller de vagas em background
pub async fn start_job_ingestion(db: MongoDB) {
    let config = FetcherConfig::from_env();

    if !config.enabled {
        log::info!("⏸️  Job ingestion DISABLED (JOB_FETCHER_ENABLED=false)");
        return;
    }

    if config.api_key.is_none() {
        log::warn!("⚠️  Job ingestion DISABLED: RAPIDAPI_KEY not set");
        return;
    }

    log::info!(
        "📥 Starting job ingestion (interval: {}s, limit: {}, retention: {} days)",
        config.interval_secs,
        config.fetch_limit,
        config.retention_days
    );

    tokio::spawn(async move {
        log::info!("📥 Job ingestion: waiting {}s for server warmup...", WARMUP_SECS);
        tokio::time::sleep(Duration::from_secs(WARMUP_SECS)).await;

        let mut tick_interval = interval(Duration::from_secs(config.interval_secs));
        tick_interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut cycle_count: u64 = 0;

        // O primeiro tick completa imediatamente
        loop {
            tick_interval.tick().await;
            cycle_count += 1;
            run_ingestion_cycle(&db, &config, cycle_count).await;
        }
    });

    log::info!("✅ Job ingestion started successfully");
}

async fn run_ingestion_cycle(db: &MongoDB, config: &FetcherConfig, cycle: u64) {
    log::info!("📥 Job ingestion cycle #{} starting...", cycle);

    match job_fetcher_service::run_cycle(db, config).await {
        Ok(CycleOutcome::Completed(summary)) => {
            log::info!(
                "📥 Ingestion cycle #{}: {} new, {} updated, {} pruned ({}ms)",
                cycle,
                summary.inserted,
                summary.updated,
                summary.pruned,
                summary.duration_ms
            );
        }
        Ok(CycleOutcome::Skipped) => {
            log::info!("⏭️  Ingestion cycle #{} skipped: previous cycle still running", cycle);
        }
        Err(e) => {
            log::error!("❌ Ingestion cycle #{} failed: {}", cycle, e);
        }
    }
}
