use std::sync::atomic::{AtomicUsize, Ordering};

use chrono::Utc;
use tracing::warn;

use stockroom_events::{Event, EventBus};
use stockroom_inventory::RemovalEvent;

/// Publish an event, logging (and otherwise ignoring) bus failures.
pub(crate) fn publish_event<B>(bus: &B, event: RemovalEvent)
where
    B: EventBus<RemovalEvent>,
{
    let event_type = event.event_type();
    if let Err(e) = bus.publish(event) {
        warn!(event_type, error = ?e, "failed to publish removal event");
    }
}

/// Marks the service busy for as long as it is alive.
///
/// Guards nest: `LoadingStateChanged { loading: true }` goes out when the
/// depth leaves zero and `{ loading: false }` when the last guard drops,
/// including on early return and unwinding.
#[must_use = "the service is only marked busy while the guard is held"]
pub struct LoadingGuard<'a, B>
where
    B: EventBus<RemovalEvent>,
{
    depth: &'a AtomicUsize,
    bus: &'a B,
}

impl<'a, B> LoadingGuard<'a, B>
where
    B: EventBus<RemovalEvent>,
{
    pub fn enter(depth: &'a AtomicUsize, bus: &'a B) -> Self {
        if depth.fetch_add(1, Ordering::SeqCst) == 0 {
            publish_event(
                bus,
                RemovalEvent::LoadingStateChanged {
                    loading: true,
                    changed_at: Utc::now(),
                },
            );
        }
        Self { depth, bus }
    }
}

impl<B> Drop for LoadingGuard<'_, B>
where
    B: EventBus<RemovalEvent>,
{
    fn drop(&mut self) {
        if self.depth.fetch_sub(1, Ordering::SeqCst) == 1 {
            publish_event(
                self.bus,
                RemovalEvent::LoadingStateChanged {
                    loading: false,
                    changed_at: Utc::now(),
                },
            );
        }
    }
}
