//! Mode-selected bundle of capabilities the server is wired with.

use std::sync::Arc;
use std::time::Duration;

use worm_ledger::HttpLedgerClient;
use worm_settings::{LedgerSettings, ToolSettings};

use crate::aggregator::EpochAggregator;
use crate::errors::SnapshotError;
use crate::ops::{CoinOps, LedgerParticipation, ParticipationOps, ToolCoinOps, ToolParticipation};
use crate::source::{SnapshotSource, ToolSnapshotSource};
use crate::tool::ScriptRunner;

/// Everything mode-dependent, assembled once at boot.
///
/// `coins` is `None` in the ledger deployment; the server reports coin
/// operations as unsupported there.
pub struct Deployment {
    /// Network name reported in snapshots.
    pub network: String,
    /// Snapshot production.
    pub source: Arc<dyn SnapshotSource>,
    /// Participation and claiming.
    pub participation: Arc<dyn ParticipationOps>,
    /// Coin operations, when the deployment supports them.
    pub coins: Option<Arc<dyn CoinOps>>,
}

impl Deployment {
    /// Wire up the ledger deployment.
    pub fn ledger(settings: &LedgerSettings) -> Result<Self, SnapshotError> {
        let client = Arc::new(HttpLedgerClient::new(
            settings.rpc_url.clone(),
            Duration::from_millis(settings.request_timeout_ms),
        )?);
        let source = Arc::new(EpochAggregator::new(
            client.clone(),
            settings.network.clone(),
            settings.epoch_window,
        ));
        let participation = Arc::new(LedgerParticipation::new(client, settings.account.clone()));
        Ok(Self {
            network: settings.network.clone(),
            source,
            participation,
            coins: None,
        })
    }

    /// Wire up the tool deployment.
    pub fn tool(settings: &ToolSettings) -> Self {
        let runner = Arc::new(ScriptRunner::new(
            settings.scripts_dir.clone(),
            Duration::from_millis(settings.timeout_ms),
        ));
        Self {
            network: settings.network.clone(),
            source: Arc::new(ToolSnapshotSource::new(
                runner.clone(),
                settings.network.clone(),
            )),
            participation: Arc::new(ToolParticipation::new(runner.clone())),
            coins: Some(Arc::new(ToolCoinOps::new(runner))),
        }
    }
}
