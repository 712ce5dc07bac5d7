//! Orientation publishing for the status display.

use std::fmt;

use crate::transform::OrientationSample;

type Subscriber = Box<dyn FnMut(&OrientationSample)>;

/// Identifies a subscription for [`OrientationFeed::unsubscribe`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubscriptionId(u64);

/// Observable orientation of the tracked mesh.
///
/// The draw loop is the only writer; subscribers are read-only observers and
/// are invoked synchronously on every publish.
#[derive(Default)]
pub struct OrientationFeed {
    latest: Option<OrientationSample>,
    published: u64,
    next_id: u64,
    subscribers: Vec<(SubscriptionId, Subscriber)>,
}

impl OrientationFeed {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&mut self, subscriber: impl FnMut(&OrientationSample) + 'static) -> SubscriptionId {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        self.subscribers.push((id, Box::new(subscriber)));
        id
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.subscribers.len();
        self.subscribers.retain(|(sid, _)| *sid != id);
        self.subscribers.len() != before
    }

    pub fn publish(&mut self, sample: OrientationSample) {
        self.latest = Some(sample);
        self.published += 1;
        for (_, subscriber) in &mut self.subscribers {
            subscriber(&sample);
        }
    }

    pub fn latest(&self) -> Option<OrientationSample> {
        self.latest
    }

    /// Number of samples published so far
    pub fn published(&self) -> u64 {
        self.published
    }
}

impl fmt::Debug for OrientationFeed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OrientationFeed")
            .field("latest", &self.latest)
            .field("published", &self.published)
            .field("subscribers", &self.subscribers.len())
            .finish()
    }
}

/// Round to the two displayed decimals; 359.996 shows as 0.00, not 360.00
fn display_degrees(angle: f32) -> f64 {
    let rounded = (angle as f64 * 100.0).round() / 100.0;
    if rounded >= 360.0 {
        0.0
    } else {
        // Angles are never negative; this also turns -0.0 into 0.0
        rounded.abs()
    }
}

impl fmt::Display for OrientationSample {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "(x:{:.2}, y:{:.2}, z:{:.2})",
            display_degrees(self.x),
            display_degrees(self.y),
            display_degrees(self.z)
        )
    }
}

/// Status bar text for a sample
pub fn status_line(sample: &OrientationSample) -> String {
    format!("Rotation {sample}")
}

/// Status bar text once a frame error has stopped the draw loop
pub fn stopped_line(error: impl fmt::Display) -> String {
    format!("Rendering stopped: {error}")
}

/// Status bar text while the scene cannot start
pub fn not_ready_line(reason: &str) -> String {
    format!("Scene not ready: {reason}")
}
