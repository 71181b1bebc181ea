use crate::model::{TaskId, VehicleId};
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::mpsc;

/// One waypoint-kind pairing inside an outbound command, mirroring the
/// wire shape's `tasks[].kind` field without committing to a wire format
/// here — the transport adapter outside this core does the actual
/// serialization.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct CommandTask {
    pub task_id: TaskId,
    pub waypoints: Vec<[f64; 3]>,
    pub kind: String,
}

/// A typed stand-in for the outbound "set_task_list" wire message. The core
/// never serializes this itself.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct VehicleCommand {
    pub vehicle_id: VehicleId,
    pub tasks: Vec<CommandTask>,
}

/// A bounded, drop-oldest-on-full outbound command channel. Receipt is
/// never acknowledged by the core (per §6); a full channel means the
/// consumer is falling behind, so the oldest pending command is discarded
/// rather than blocking the Act phase.
pub struct CommandChannel {
    sender: mpsc::Sender<VehicleCommand>,
    receiver: mpsc::Receiver<VehicleCommand>,
    dropped: AtomicU64,
}

impl CommandChannel {
    pub fn new(capacity: usize) -> Self {
        let (sender, receiver) = mpsc::channel(capacity.max(1));
        Self { sender, receiver, dropped: AtomicU64::new(0) }
    }

    /// Non-blocking enqueue. If the channel is full, the newest item sent
    /// before this one in the queue is not retrievable for eviction through
    /// `mpsc` directly, so this implementation evicts by draining one slot
    /// off the receiving end before trying again — the net effect is
    /// drop-oldest, matching the channel-full policy in §5.
    pub fn send(&mut self, command: VehicleCommand) {
        if self.sender.try_send(command.clone()).is_ok() {
            return;
        }
        let _ = self.receiver.try_recv();
        self.dropped.fetch_add(1, Ordering::Relaxed);
        let _ = self.sender.try_send(command);
    }

    pub async fn recv(&mut self) -> Option<VehicleCommand> { self.receiver.recv().await }

    pub fn dropped_count(&self) -> u64 { self.dropped.load(Ordering::Relaxed) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn full_channel_drops_oldest_and_counts_it() {
        let mut channel = CommandChannel::new(1);
        channel.send(VehicleCommand { vehicle_id: 1, tasks: vec![] });
        channel.send(VehicleCommand { vehicle_id: 2, tasks: vec![] });
        assert_eq!(channel.dropped_count(), 1);
        let received = channel.recv().await.unwrap();
        assert_eq!(received.vehicle_id, 2);
    }
}
