// Shared dashboard view model with change notifications
use crate::domain::dashboard::DashboardView;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use tokio::sync::broadcast;

const CHANGE_CHANNEL_CAPACITY: usize = 32;

/// Holds the view model. Every update is a short critical section that never
/// awaits, so a poll continuation applies its fields all at once.
pub struct ViewStore {
    view: RwLock<DashboardView>,
    changes: broadcast::Sender<DashboardView>,
}

impl ViewStore {
    pub fn new(view: DashboardView) -> Self {
        let (changes, _) = broadcast::channel(CHANGE_CHANNEL_CAPACITY);
        Self {
            view: RwLock::new(view),
            changes,
        }
    }

    pub fn snapshot(&self) -> DashboardView {
        self.read().clone()
    }

    /// Applies `f`, bumps the revision and notifies subscribers.
    pub fn update<R>(&self, f: impl FnOnce(&mut DashboardView) -> R) -> R {
        let (result, snapshot) = {
            let mut view = self.write();
            let result = f(&mut view);
            view.revision += 1;
            (result, view.clone())
        };
        // No subscribers is fine.
        let _ = self.changes.send(snapshot);
        result
    }

    pub fn subscribe(&self) -> broadcast::Receiver<DashboardView> {
        self.changes.subscribe()
    }

    fn read(&self) -> RwLockReadGuard<'_, DashboardView> {
        self.view.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, DashboardView> {
        self.view.write().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
