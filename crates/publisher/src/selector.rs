//! Latency-ranked relay selection.
//!
//! Probed relays are ranked by ascending round-trip time (stable order for
//! ties). The adaptive loop walks the ranking in trailing windows: attempt
//! `k` covers the last `batch_size` of the first `batch_size * k` ranked
//! relays, so each escalation moves one window deeper into the ranking.

use crate::probe::ProbeResult;

/// Reachable relays ranked by ascending probe latency.
#[derive(Debug, Clone, Default)]
pub struct RankedRelays {
    ranked: Vec<ProbeResult>,
}

impl RankedRelays {
    /// Rank the reachable subset of a probe sweep.
    pub fn from_probes(probes: Vec<ProbeResult>) -> Self {
        let mut ranked: Vec<ProbeResult> = probes.into_iter().filter(|p| p.reachable).collect();
        ranked.sort_by_key(|p| p.latency);
        Self { ranked }
    }

    /// The `n` lowest-latency relays, in order. Fewer reachable relays than
    /// requested returns all of them.
    pub fn best(&self, n: usize) -> Vec<String> {
        self.ranked.iter().take(n).map(|p| p.url.clone()).collect()
    }

    /// The batch for a given dispatch attempt (1-based): the trailing
    /// `batch_size` of the first `batch_size * attempt` ranked relays.
    pub fn batch_for_attempt(&self, attempt: u32, batch_size: usize) -> Vec<String> {
        let end = (batch_size * attempt as usize).min(self.ranked.len());
        let start = end.saturating_sub(batch_size);
        self.ranked[start..end]
            .iter()
            .map(|p| p.url.clone())
            .collect()
    }

    /// All reachable relay URLs in rank order.
    pub fn urls(&self) -> Vec<String> {
        self.ranked.iter().map(|p| p.url.clone()).collect()
    }

    /// Number of reachable relays.
    pub fn len(&self) -> usize {
        self.ranked.len()
    }

    /// Whether no relay was reachable.
    pub fn is_empty(&self) -> bool {
        self.ranked.is_empty()
    }
}
