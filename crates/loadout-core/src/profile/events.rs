//! Profile change notifications
//!
//! Listeners are registered per event kind and run synchronously after the
//! triggering write. A listener that fails or panics is logged and skipped.

use std::collections::BTreeMap;
use std::error::Error;
use std::panic::{catch_unwind, AssertUnwindSafe};

use uuid::Uuid;

use super::Profile;

/// Event emitted by the profile manager
#[derive(Debug, Clone, PartialEq)]
pub enum ProfileEvent {
    Created { profile: Profile },
    Updated { profile: Profile },
    Deleted { profile_id: Uuid },
    Switched {
        profile: Profile,
        previous_profile_id: Option<Uuid>,
    },
    Reloaded { profiles: Vec<Profile> },
}

/// Discriminant of [`ProfileEvent`], used to subscribe
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ProfileEventKind {
    Created,
    Updated,
    Deleted,
    Switched,
    Reloaded,
}

impl ProfileEventKind {
    /// Wire name (`profile.created`, ...)
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Created => "profile.created",
            Self::Updated => "profile.updated",
            Self::Deleted => "profile.deleted",
            Self::Switched => "profile.switched",
            Self::Reloaded => "profiles.reloaded",
        }
    }
}

impl std::fmt::Display for ProfileEventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl ProfileEvent {
    #[must_use]
    pub fn kind(&self) -> ProfileEventKind {
        match self {
            Self::Created { .. } => ProfileEventKind::Created,
            Self::Updated { .. } => ProfileEventKind::Updated,
            Self::Deleted { .. } => ProfileEventKind::Deleted,
            Self::Switched { .. } => ProfileEventKind::Switched,
            Self::Reloaded { .. } => ProfileEventKind::Reloaded,
        }
    }
}

/// Error a listener may return
pub type ListenerError = Box<dyn Error + Send + Sync>;

type Listener = Box<dyn Fn(&ProfileEvent) -> Result<(), ListenerError>>;

/// Handle returned by [`EventBus::subscribe`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SubscriptionId(u64);

/// Listener registry owned by a profile manager
#[derive(Default)]
pub struct EventBus {
    next_id: u64,
    listeners: BTreeMap<ProfileEventKind, Vec<(SubscriptionId, Listener)>>,
}

impl EventBus {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a listener for one event kind
    pub fn subscribe<F>(&mut self, kind: ProfileEventKind, listener: F) -> SubscriptionId
    where
        F: Fn(&ProfileEvent) -> Result<(), ListenerError> + 'static,
    {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        self.listeners
            .entry(kind)
            .or_default()
            .push((id, Box::new(listener)));
        id
    }

    /// Remove a listener; returns whether it was registered
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let mut removed = false;
        for listeners in self.listeners.values_mut() {
            let before = listeners.len();
            listeners.retain(|(sub, _)| *sub != id);
            removed |= listeners.len() != before;
        }
        removed
    }

    /// Number of listeners for a kind
    #[must_use]
    pub fn listener_count(&self, kind: ProfileEventKind) -> usize {
        self.listeners.get(&kind).map_or(0, Vec::len)
    }

    /// Deliver an event to every listener of its kind
    pub fn emit(&self, event: &ProfileEvent) {
        let kind = event.kind();
        let Some(listeners) = self.listeners.get(&kind) else {
            return;
        };

        for (id, listener) in listeners {
            match catch_unwind(AssertUnwindSafe(|| listener(event))) {
                Ok(Ok(())) => {}
                Ok(Err(e)) => {
                    tracing::error!(event = %kind, subscription = id.0, error = %e, "profile event handler failed");
                }
                Err(_) => {
                    tracing::error!(event = %kind, subscription = id.0, "profile event handler panicked");
                }
            }
        }
    }
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let counts: BTreeMap<_, _> = self
            .listeners
            .iter()
            .map(|(kind, l)| (kind.as_str(), l.len()))
            .collect();
        f.debug_struct("EventBus").field("listeners", &counts).finish()
    }
}
