//! Point publication for the pan-tilt unit
//!
//! Published points are already expressed in the pan-tilt frame. Like a
//! latest-wins topic, a full queue drops the new point rather than blocking
//! the dialogue.

use crate::geometry::point::StampedPoint;
use crate::{Result, SoundboardError};
use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};
use std::thread::{self, JoinHandle};
use tracing::{info, warn};

/// Queue depth of the pan-tilt point channel
pub const DEFAULT_QUEUE_SIZE: usize = 10;

pub trait PointPublisher: Send {
    fn publish(&self, point: StampedPoint) -> Result<()>;
}

/// Publishes points on an in-process channel
#[derive(Debug, Clone)]
pub struct ChannelPublisher {
    topic: String,
    tx: Sender<StampedPoint>,
}

impl ChannelPublisher {
    pub fn new(topic: impl Into<String>, queue_size: usize) -> (Self, Receiver<StampedPoint>) {
        let (tx, rx) = bounded(queue_size.max(1));
        let publisher = Self {
            topic: topic.into(),
            tx,
        };
        (publisher, rx)
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }
}

impl PointPublisher for ChannelPublisher {
    fn publish(&self, point: StampedPoint) -> Result<()> {
        match self.tx.try_send(point) {
            Ok(()) => Ok(()),
            Err(TrySendError::Full(point)) => {
                warn!(
                    "{} queue full, dropping point in {}",
                    self.topic, point.frame_id
                );
                Ok(())
            }
            Err(TrySendError::Disconnected(_)) => Err(SoundboardError::ChannelError(format!(
                "no subscriber on {}",
                self.topic
            ))),
        }
    }
}

/// Log every point arriving on `rx` until all publishers are gone
pub fn spawn_point_monitor(
    topic: impl Into<String>,
    rx: Receiver<StampedPoint>,
) -> Result<JoinHandle<()>> {
    let topic = topic.into();

    thread::Builder::new()
        .name("point-monitor".into())
        .spawn(move || {
            for point in rx.iter() {
                info!(
                    "[{}] {} ({:.3}, {:.3}, {:.3})",
                    topic, point.frame_id, point.point.x, point.point.y, point.point.z
                );
            }
        })
        .map_err(|e| SoundboardError::ChannelError(format!("failed to start monitor: {}", e)))
}
