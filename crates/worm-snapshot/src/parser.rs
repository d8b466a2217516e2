//! Tolerant parser for the external tool's human-readable account dump.
//!
//! The parser is total: any input, including empty or garbage text,
//! yields a snapshot. Unrecognized lines are skipped and missing fields
//! keep their documented defaults (epoch 0, `"0"` balances, empty lists).
//! Once a `Current epoch:` line has been seen, epoch entries at or beyond
//! that head carry a pending reward; only completed epochs keep the
//! tool's printed estimate.

use std::sync::LazyLock;

use regex::Regex;

use worm_core::{AccountSnapshot, Coin, EpochEntry, EpochStatus, Reward};

static EPOCH_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"Epoch #(\d+) => ([\d.]+) / ([\d.]+) \(Expecting ([\d.]+) WORM\)")
        .expect("epoch regex")
});

static COIN_ID_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#""id": "(\d+)""#).expect("coin id regex"));

/// Parses the tool's text output into an [`AccountSnapshot`].
pub struct SnapshotParser {
    network: String,
}

impl SnapshotParser {
    /// Build a parser that labels snapshots with `network`.
    pub fn new(network: impl Into<String>) -> Self {
        Self {
            network: network.into(),
        }
    }

    /// Parse `output` line by line, first match wins per line.
    pub fn parse(&self, output: &str) -> AccountSnapshot {
        let mut info = AccountSnapshot::empty(self.network.clone(), "");
        let mut in_coins_section = false;
        let mut head_known = false;

        for line in output.lines() {
            if let Some(rest) = split_label(line, "Address:") {
                info.address = rest.to_string();
            } else if let Some(rest) = split_label(line, "Current epoch:") {
                info.current_epoch = leading_u64(rest).unwrap_or(0);
                head_known = true;
            } else if let Some(rest) = split_label(line, "BETH balance:") {
                info.beth_balance = rest.to_string();
            } else if let Some(rest) = split_label(line, "WORM balance:") {
                info.worm_balance = rest.to_string();
            } else if line.contains("Claimable WORM") {
                if let Some((_, rest)) = line.split_once(':') {
                    info.claimable_worm = rest.trim().to_string();
                }
            } else if line.contains("Epoch #") {
                if let Some(entry) = parse_epoch_line(line) {
                    info.epochs.push(entry);
                }
            } else if line.contains("Found") && line.contains("entries for network") {
                in_coins_section = true;
            } else if in_coins_section && line.contains("\"id\":") {
                if let Some(caps) = COIN_ID_RE.captures(line) {
                    info.coins.push(Coin {
                        id: caps[1].to_string(),
                        // The tool does not print per-coin amounts.
                        amount: "0".to_string(),
                    });
                }
            }
        }

        // The head line may appear after epoch lines, so classify at the
        // end: the in-progress epoch has no completed-epoch estimate yet.
        if head_known {
            for entry in &mut info.epochs {
                if entry.epoch < info.current_epoch {
                    continue;
                }
                if let EpochStatus::Ok { expected, .. } = &mut entry.status {
                    *expected = Reward::Pending;
                }
            }
        }

        info
    }
}

fn split_label<'a>(line: &'a str, label: &str) -> Option<&'a str> {
    line.find(label)
        .map(|at| line[at + label.len()..].trim())
}

/// Leading decimal digits of `s`, if any.
fn leading_u64(s: &str) -> Option<u64> {
    let digits: &str = s
        .split_once(|c: char| !c.is_ascii_digit())
        .map_or(s, |(head, _)| head);
    digits.parse().ok()
}

fn parse_epoch_line(line: &str) -> Option<EpochEntry> {
    let caps = EPOCH_RE.captures(line)?;
    let epoch = caps[1].parse().ok()?;
    Some(EpochEntry {
        epoch,
        status: EpochStatus::Ok {
            committed: caps[2].to_string(),
            total: caps[3].to_string(),
            expected: Reward::Computed {
                amount: caps[4].to_string(),
            },
        },
    })
}
