//! The snapshot capability trait and the tool-backed implementation.

use std::sync::Arc;

use async_trait::async_trait;

use worm_core::AccountSnapshot;

use crate::errors::SnapshotError;
use crate::parser::SnapshotParser;
use crate::tool::ToolRunner;

/// Script the tool-backed source invokes for a full account dump.
const INFO_SCRIPT: &str = "info.sh";

/// Produces a point-in-time account snapshot.
///
/// The deployment configuration selects one implementation at boot;
/// nothing downstream knows which one it got.
#[async_trait]
pub trait SnapshotSource: Send + Sync {
    /// Build a fresh snapshot for `address`.
    async fn snapshot(&self, address: &str) -> Result<AccountSnapshot, SnapshotError>;
}

/// Snapshot source that shells out to the external tool and parses its
/// text output.
///
/// The tool reports the account it is configured with; the requested
/// address is ignored.
pub struct ToolSnapshotSource {
    runner: Arc<dyn ToolRunner>,
    parser: SnapshotParser,
}

impl ToolSnapshotSource {
    /// Build a source over `runner`, labeling snapshots with `network`.
    pub fn new(runner: Arc<dyn ToolRunner>, network: impl Into<String>) -> Self {
        Self {
            runner,
            parser: SnapshotParser::new(network),
        }
    }
}

#[async_trait]
impl SnapshotSource for ToolSnapshotSource {
    async fn snapshot(&self, _address: &str) -> Result<AccountSnapshot, SnapshotError> {
        let raw = self.runner.run(INFO_SCRIPT, &[]).await?;
        Ok(self.parser.parse(&raw))
    }
}
