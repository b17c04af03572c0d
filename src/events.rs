//! Lifecycle events published after a change has been committed

use crate::core::{Comment, Status, Ticket, TicketId, User, UserId};
use tokio::sync::broadcast;

const DEFAULT_CAPACITY: usize = 100;

/// The user who performed an action, as captured at the time
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Actor {
    pub id: UserId,
    pub name: String,
}

impl From<&User> for Actor {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            name: user.full_name(),
        }
    }
}

/// A committed lifecycle transition
#[derive(Debug, Clone)]
pub enum LifecycleEvent {
    TicketCreated {
        ticket: Ticket,
        actor: Actor,
    },
    TicketAssigned {
        ticket: Ticket,
        assignee: UserId,
        actor: Actor,
    },
    TicketStatusChanged {
        ticket: Ticket,
        old_status: Status,
        new_status: Status,
        actor: Actor,
    },
    TicketCommented {
        ticket: Ticket,
        comment: Comment,
        actor: Actor,
    },
}

impl LifecycleEvent {
    /// The ticket as it was committed
    #[must_use]
    pub const fn ticket(&self) -> &Ticket {
        match self {
            Self::TicketCreated { ticket, .. }
            | Self::TicketAssigned { ticket, .. }
            | Self::TicketStatusChanged { ticket, .. }
            | Self::TicketCommented { ticket, .. } => ticket,
        }
    }

    #[must_use]
    pub const fn actor(&self) -> &Actor {
        match self {
            Self::TicketCreated { actor, .. }
            | Self::TicketAssigned { actor, .. }
            | Self::TicketStatusChanged { actor, .. }
            | Self::TicketCommented { actor, .. } => actor,
        }
    }

    #[must_use]
    pub const fn ticket_id(&self) -> TicketId {
        self.ticket().id
    }

    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::TicketCreated { .. } => "ticket_created",
            Self::TicketAssigned { .. } => "ticket_assigned",
            Self::TicketStatusChanged { .. } => "ticket_status_changed",
            Self::TicketCommented { .. } => "ticket_commented",
        }
    }
}

/// In-process fan-out of lifecycle events to any number of subscribers
pub struct EventBus {
    sender: broadcast::Sender<LifecycleEvent>,
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("sender", &"broadcast::Sender<LifecycleEvent>")
            .field("subscribers", &self.sender.receiver_count())
            .finish()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl EventBus {
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<LifecycleEvent> {
        self.sender.subscribe()
    }

    /// Publish an event; having no subscribers is not an error
    pub fn publish(&self, event: &LifecycleEvent) {
        let delivered = self.sender.send(event.clone()).unwrap_or(0);
        tracing::info!(
            event = event.name(),
            ticket = %event.ticket().number,
            actor = %event.actor().name,
            subscribers = delivered,
            "lifecycle event"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{TicketBuilder, UserBuilder};

    #[tokio::test]
    async fn test_subscribers_receive_published_events() {
        let bus = EventBus::default();
        let mut receiver = bus.subscribe();

        let user = UserBuilder::new().username("testuser").first_name("Test").last_name("User").build();
        let ticket = TicketBuilder::new().title("Printer not working").creator(&user).build();
        bus.publish(&LifecycleEvent::TicketCreated {
            ticket: ticket.clone(),
            actor: Actor::from(&user),
        });

        let received = receiver.recv().await.unwrap();
        assert_eq!(received.ticket_id(), ticket.id);
        assert_eq!(received.actor().name, "Test User");
        assert_eq!(received.name(), "ticket_created");
    }

    #[test]
    fn test_publish_without_subscribers() {
        let bus = EventBus::new(4);
        let ticket = TicketBuilder::new().build();
        let actor = Actor {
            id: UserId::new(),
            name: "Nobody".into(),
        };
        bus.publish(&LifecycleEvent::TicketCreated { ticket, actor });
    }
}
