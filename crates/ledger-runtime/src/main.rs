//! # Provenance Ledger Node
//!
//! Replays a JSON command script against a fresh in-memory ledger.
//!
//! ## Startup Sequence
//!
//! 1. Load configuration from the environment
//! 2. Initialize telemetry
//! 3. Validate the admin address
//! 4. Create the store at genesis
//! 5. Replay the script, printing one JSON outcome per step to stdout
//! 6. Verify the purchase log and print final statistics
//!
//! The script path comes from the first argument or `AP_SCRIPT`. With
//! `AP_GENESIS_TIME` set, the clock starts there and advances one second per
//! step so repeated runs produce identical output.

use anyhow::{bail, Context, Result};
use ledger_runtime::{
    execute, parse_script, InMemoryLedgerStore, LedgerConfig, ManualClock, ProvenanceLedger,
    SystemTimeSource, TimeSource, TracingEventPublisher,
};
use ledger_telemetry::init_telemetry;
use std::sync::Arc;
use tracing::{info, warn};

/// Clock used by the replay: fixed and stepped, or the wall clock.
enum ReplayClock {
    Manual(Arc<ManualClock>),
    System(SystemTimeSource),
}

impl TimeSource for ReplayClock {
    fn now(&self) -> u64 {
        match self {
            Self::Manual(clock) => clock.now(),
            Self::System(clock) => clock.now(),
        }
    }
}

fn main() -> Result<()> {
    let mut config = LedgerConfig::from_env().context("Failed to load configuration")?;
    if let Some(path) = std::env::args().nth(1) {
        config.script = Some(path.into());
    }

    init_telemetry(config.telemetry.clone()).context("Failed to initialize telemetry")?;

    info!("===========================================");
    info!("  Provenance Ledger Node");
    info!("  Version: {}", env!("CARGO_PKG_VERSION"));
    info!("===========================================");

    config
        .validate_for_production()
        .context("Refusing to start")?;

    let Some(script_path) = config.script.clone() else {
        bail!("No command script given. Pass a path or set AP_SCRIPT.");
    };
    let script = std::fs::read_to_string(&script_path)
        .with_context(|| format!("Failed to read script {}", script_path.display()))?;
    let commands = parse_script(&script)
        .with_context(|| format!("Failed to parse script {}", script_path.display()))?;

    let manual = config.genesis_time.map(|t| Arc::new(ManualClock::new(t)));
    let clock = match &manual {
        Some(clock) => ReplayClock::Manual(Arc::clone(clock)),
        None => ReplayClock::System(SystemTimeSource),
    };
    let ledger = ProvenanceLedger::new(
        InMemoryLedgerStore::new(config.admin),
        TracingEventPublisher,
        clock,
    );

    info!(admin = %config.admin, steps = commands.len(), "Replaying script");
    let mut rejected = 0usize;
    for (step, command) in commands.into_iter().enumerate() {
        let outcome = execute(&ledger, step, command)
            .with_context(|| format!("Failed to encode the result of step {}", step))?;
        if !outcome.ok {
            rejected += 1;
        }
        println!(
            "{}",
            serde_json::to_string(&outcome).context("Failed to encode outcome")?
        );
        if let Some(clock) = &manual {
            clock.advance(1);
        }
    }

    if let Err(error) = ledger.verify_purchase_log() {
        bail!("Purchase log failed verification: {}", error);
    }
    let stats = ledger.stats();
    if rejected > 0 {
        warn!(rejected, "Some steps were rejected");
    }
    info!(
        version = stats.version,
        purchases = stats.purchases,
        pending_requests = stats.pending_requests,
        "Replay complete"
    );
    println!(
        "{}",
        serde_json::to_string(&stats).context("Failed to encode statistics")?
    );
    Ok(())
}
