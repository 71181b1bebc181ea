use crate::model::DecisionEvent;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::mpsc;

/// A bounded, drop-oldest-on-full dashboard event channel. Monitoring is
/// lossy by design (§5): under sustained backpressure the operator misses
/// stale decision events rather than the orchestrator stalling.
pub struct EventChannel {
    sender: mpsc::Sender<DecisionEvent>,
    receiver: mpsc::Receiver<DecisionEvent>,
    dropped: AtomicU64,
}

impl EventChannel {
    pub fn new(capacity: usize) -> Self {
        let (sender, receiver) = mpsc::channel(capacity.max(1));
        Self { sender, receiver, dropped: AtomicU64::new(0) }
    }

    pub fn send(&mut self, event: DecisionEvent) {
        if self.sender.try_send(event.clone()).is_ok() {
            return;
        }
        let _ = self.receiver.try_recv();
        self.dropped.fetch_add(1, Ordering::Relaxed);
        let _ = self.sender.try_send(event);
    }

    pub async fn recv(&mut self) -> Option<DecisionEvent> { self.receiver.recv().await }

    pub fn dropped_count(&self) -> u64 { self.dropped.load(Ordering::Relaxed) }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{CycleMetrics, PhaseTimingsMs, Strategy};
    use std::collections::BTreeMap;

    fn sample_event(cycle: u64) -> DecisionEvent {
        DecisionEvent {
            cycle,
            strategy: Strategy::NoOp,
            rationale: String::new(),
            phase_timings_ms: PhaseTimingsMs::default(),
            metrics: CycleMetrics {
                recovery_rate: 0.0,
                tasks_recovered: 0,
                tasks_lost: 0,
                unallocated_count: 0,
                coverage_loss: 0.0,
                battery_spare: 0.0,
                payload_spare: 0.0,
                operational_uavs: 0,
                failed_uavs: 0,
                temporal_margin_secs: 0.0,
                affected_zones: 0,
                objective_score: 0.0,
                optimization_time_ms: 0,
                optimization_iterations: 0,
                optimality_gap_estimate: 0.0,
            },
            assignments: BTreeMap::new(),
            escalated: Vec::new(),
        }
    }

    #[tokio::test]
    async fn full_channel_drops_oldest_event_and_counts_it() {
        let mut channel = EventChannel::new(1);
        channel.send(sample_event(1));
        channel.send(sample_event(2));
        assert_eq!(channel.dropped_count(), 1);
        let received = channel.recv().await.unwrap();
        assert_eq!(received.cycle, 2);
    }
}
