use std::collections::{HashSet, VecDeque};

use super::traits::Notification;

/// Pending after-notifications of one listener.
#[derive(Debug, Default)]
pub struct NotificationQueue {
    items: VecDeque<Notification>,
    seen: Option<HashSet<Notification>>,
}

impl NotificationQueue {
    pub(crate) fn new(unique: bool) -> Self {
        Self {
            items: VecDeque::new(),
            seen: unique.then(HashSet::new),
        }
    }

    pub(crate) fn push(&mut self, notification: Notification) {
        if let Some(seen) = &mut self.seen {
            if !seen.insert(notification) {
                return;
            }
        }
        self.items.push_back(notification);
    }

    pub(crate) fn pop(&mut self) -> Option<Notification> {
        let notification = self.items.pop_front()?;
        if let Some(seen) = &mut self.seen {
            seen.remove(&notification);
        }
        Some(notification)
    }

    pub(crate) fn clear(&mut self) {
        self.items.clear();
        if let Some(seen) = &mut self.seen {
            seen.clear();
        }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
