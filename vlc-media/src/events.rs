//! Native event queue and consumer notifications
//!
//! The native event thread pushes plain [`EngineEvent`] values into a
//! channel; the player drains it on the consumer thread during `tick`.
//! Consumers learn about state changes through [`MediaEvent`] subscriptions.

use crate::native::{EngineEvent, EventHandler};
use crate::vlc_bindings::libvlc_event_t;
use crossbeam_channel::{Receiver, Sender};
use std::os::raw::c_void;
use std::panic;

/// Notifications delivered to consumers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaEvent {
    MediaOpened,
    MediaClosed,
    TracksChanged,
    PlaybackResumed,
    PlaybackSuspended,
    PlaybackEndReached,
    MetadataChanged,
}

/// Channel between the native event thread and the player
pub struct EventQueue {
    // boxed so the address handed to the native engine is stable
    sender: Box<Sender<EngineEvent>>,
    receiver: Receiver<EngineEvent>,
}

impl EventQueue {
    pub fn new() -> Self {
        let (sender, receiver) = crossbeam_channel::unbounded();
        Self {
            sender: Box::new(sender),
            receiver,
        }
    }

    /// Registration for the native event managers.
    ///
    /// Valid while the queue is alive; detach before dropping it.
    pub fn handler(&self) -> EventHandler {
        EventHandler {
            callback: handle_native_event,
            user_data: &*self.sender as *const Sender<EngineEvent> as *mut c_void,
        }
    }

    /// Pushes an event as if the native engine had sent it
    pub fn enqueue(&self, event: EngineEvent) {
        let _ = self.sender.send(event);
    }

    pub fn dequeue(&self) -> Option<EngineEvent> {
        self.receiver.try_recv().ok()
    }

    /// Drops pending events
    pub fn clear(&self) {
        while self.receiver.try_recv().is_ok() {}
    }
}

impl Default for EventQueue {
    fn default() -> Self {
        Self::new()
    }
}

unsafe extern "C" fn handle_native_event(event: *const libvlc_event_t, user_data: *mut c_void) {
    let _ = panic::catch_unwind(|| {
        if event.is_null() || user_data.is_null() {
            return;
        }

        let raw = unsafe { (*event).type_ };
        let Some(event) = EngineEvent::from_raw(raw) else {
            tracing::trace!(raw, "ignoring native event");
            return;
        };

        let sender = unsafe { &*(user_data as *const Sender<EngineEvent>) };
        let _ = sender.send(event);
    });
}

/// Fan-out of [`MediaEvent`]s to subscribers
#[derive(Default)]
pub struct EventBroadcaster {
    subscribers: Vec<Sender<MediaEvent>>,
}

impl EventBroadcaster {
    pub fn subscribe(&mut self) -> Receiver<MediaEvent> {
        let (sender, receiver) = crossbeam_channel::unbounded();
        self.subscribers.push(sender);
        receiver
    }

    /// Sends `event` to every live subscriber, forgetting dropped ones
    pub fn send(&mut self, event: MediaEvent) {
        tracing::debug!(?event, "media event");
        self.subscribers
            .retain(|subscriber| subscriber.send(event).is_ok());
    }
}
