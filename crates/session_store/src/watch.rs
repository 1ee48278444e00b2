use std::sync::mpsc::{channel, Receiver, Sender};

/// Category of store mutation broadcast to subscribers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreChange {
    /// Authentication/onboarding fields or the session identifier changed.
    Session,
    /// The chat history changed.
    History,
}

#[derive(Debug, Default)]
pub(crate) struct Watchers {
    senders: Vec<Sender<StoreChange>>,
}

impl Watchers {
    pub(crate) fn subscribe(&mut self) -> Receiver<StoreChange> {
        let (sender, receiver) = channel();
        self.senders.push(sender);
        receiver
    }

    /// Delivers `change` to every live subscriber, pruning dropped receivers.
    pub(crate) fn broadcast(&mut self, change: StoreChange) {
        self.senders.retain(|sender| sender.send(change).is_ok());
    }
}
