//! Progress notifications
//!
//! Callers that want to observe retries, polls and partial failures pass an
//! [`EventSink`] into each invocation. Nothing is looked up globally.

use crate::error::ErrorCategory;
use crate::models::OperationKind;
use std::time::Duration;
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};

#[derive(Debug, Clone, PartialEq)]
pub enum GenerationEvent {
    Started {
        kind: OperationKind,
        model_id: String,
    },
    RetryScheduled {
        attempt: usize,
        delay: Duration,
    },
    Completed {
        kind: OperationKind,
    },
    Failed {
        category: ErrorCategory,
    },
    JobSubmitted {
        handle: String,
    },
    JobPolled {
        handle: String,
        poll: u32,
        done: bool,
    },
    InstanceFailed {
        index: usize,
        category: ErrorCategory,
    },
}

/// Optional sender half of an event channel.
#[derive(Debug, Clone, Default)]
pub struct EventSink {
    sender: Option<UnboundedSender<GenerationEvent>>,
}

impl EventSink {
    /// A sink that drops every event.
    pub fn none() -> Self {
        Self::default()
    }

    pub fn channel() -> (Self, UnboundedReceiver<GenerationEvent>) {
        let (sender, receiver) = unbounded_channel();
        (Self::from_sender(sender), receiver)
    }

    pub fn from_sender(sender: UnboundedSender<GenerationEvent>) -> Self {
        Self {
            sender: Some(sender),
        }
    }

    pub fn emit(&self, event: GenerationEvent) {
        if let Some(sender) = &self.sender {
            // A dropped receiver just means nobody is listening any more.
            let _ = sender.send(event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_channel_delivers_events() {
        let (sink, mut rx) = EventSink::channel();
        sink.emit(GenerationEvent::Completed {
            kind: OperationKind::Text,
        });
        assert_eq!(
            rx.try_recv().unwrap(),
            GenerationEvent::Completed {
                kind: OperationKind::Text
            }
        );
    }

    #[test]
    fn test_none_sink_and_closed_receiver_are_silent() {
        EventSink::none().emit(GenerationEvent::Failed {
            category: ErrorCategory::Unknown,
        });

        let (sink, rx) = EventSink::channel();
        drop(rx);
        sink.emit(GenerationEvent::Failed {
            category: ErrorCategory::Unknown,
        });
    }
}
