use std::collections::VecDeque;

use serde::{Deserialize, Serialize};
use strum::{EnumDiscriminants, EnumIter};

use super::cards::CardUid;
use super::entities::CombatantId;
use super::status::StatusKind;

/// Everything the combat core announces. Subscribers key on [`EventKind`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, EnumDiscriminants)]
#[strum_discriminants(name(EventKind), derive(Hash, PartialOrd, Ord, Serialize, Deserialize, EnumIter))]
#[serde(tag = "type")]
pub enum CombatEvent {
    CombatStart {
        enemy_count: usize,
    },
    CombatEnd {
        victory: bool,
    },
    TurnStart {
        turn: u32,
    },
    TurnEnd {
        turn: u32,
    },
    EnemyTurnStart {
        turn: u32,
    },
    EnemyTurnEnd {
        turn: u32,
    },
    CardDrawn {
        card: CardUid,
        card_id: String,
    },
    CardPlayed {
        card: CardUid,
        card_id: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        target: Option<usize>,
    },
    CardExhausted {
        card: CardUid,
        card_id: String,
    },
    CardDiscarded {
        card: CardUid,
        card_id: String,
    },
    DamageDealt {
        source: CombatantId,
        target: CombatantId,
        amount: i32,
    },
    DamageTaken {
        target: CombatantId,
        amount: i32,
    },
    BlockGained {
        target: CombatantId,
        amount: i32,
    },
    BlockLost {
        target: CombatantId,
        amount: i32,
    },
    HpLost {
        target: CombatantId,
        amount: i32,
    },
    HpGained {
        target: CombatantId,
        amount: i32,
    },
    EnemyDied {
        enemy: usize,
        enemy_id: String,
    },
    StatusApplied {
        target: CombatantId,
        status: StatusKind,
        amount: i32,
    },
    StatusRemoved {
        target: CombatantId,
        status: StatusKind,
    },
    EnergyGained {
        amount: i32,
    },
    EnergySpent {
        amount: i32,
    },
    Shuffle {
        cards: usize,
    },
    RoomEntered {
        room: String,
    },
    RestSiteUsed {
        healed: i32,
    },
    RelicObtained {
        relic_id: String,
    },
    GoldGained {
        amount: i32,
    },
    GoldSpent {
        amount: i32,
    },
}

impl CombatEvent {
    pub fn kind(&self) -> EventKind {
        EventKind::from(self)
    }
}

/// Events raised during a resolution step. Each event is logged once and
/// waits in `pending` until the owner of the bus dispatches it.
#[derive(Debug, Clone, Default, Serialize)]
pub struct EventQueue {
    pending: VecDeque<CombatEvent>,
    log: Vec<CombatEvent>,
}

impl EventQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, event: CombatEvent) {
        tracing::trace!(?event, "event queued");
        self.log.push(event.clone());
        self.pending.push_back(event);
    }

    pub fn pop(&mut self) -> Option<CombatEvent> {
        self.pending.pop_front()
    }

    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// Drops undispatched events. They stay in the log.
    pub fn discard_pending(&mut self) -> usize {
        let dropped = self.pending.len();
        self.pending.clear();
        dropped
    }

    pub fn log(&self) -> &[CombatEvent] {
        &self.log
    }

    pub fn count(&self, kind: EventKind) -> usize {
        self.log.iter().filter(|event| event.kind() == kind).count()
    }
}

/// 订阅句柄。
pub type SubscriptionId = u64;

pub type EventHandler<C> = Box<dyn FnMut(&CombatEvent, &mut C)>;

struct Subscription<C> {
    id: SubscriptionId,
    kind: EventKind,
    priority: i32,
    handler: EventHandler<C>,
}

/// Priority-ordered publish/subscribe. Handlers receive the event and a
/// mutable context; they cannot reach the bus itself, so anything they raise
/// must go through the context's queue.
pub struct EventBus<C> {
    subscriptions: Vec<Subscription<C>>,
    next_id: SubscriptionId,
}

impl<C> Default for EventBus<C> {
    fn default() -> Self {
        Self {
            subscriptions: Vec::new(),
            next_id: 1,
        }
    }
}

impl<C> std::fmt::Debug for EventBus<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("subscriptions", &self.subscriptions.len())
            .field("next_id", &self.next_id)
            .finish()
    }
}

impl<C> EventBus<C> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Higher priority runs first. Equal priorities run in subscription order.
    pub fn subscribe<F>(&mut self, kind: EventKind, priority: i32, handler: F) -> SubscriptionId
    where
        F: FnMut(&CombatEvent, &mut C) + 'static,
    {
        let id = self.next_id;
        self.next_id += 1;
        let position = self
            .subscriptions
            .iter()
            .position(|sub| sub.priority < priority)
            .unwrap_or(self.subscriptions.len());
        self.subscriptions.insert(
            position,
            Subscription {
                id,
                kind,
                priority,
                handler: Box::new(handler),
            },
        );
        id
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.subscriptions.len();
        self.subscriptions.retain(|sub| sub.id != id);
        self.subscriptions.len() != before
    }

    /// Runs every handler registered for the event's kind. Returns how many
    /// handlers ran.
    pub fn emit(&mut self, event: &CombatEvent, context: &mut C) -> usize {
        let kind = event.kind();
        let mut invoked = 0;
        for sub in self.subscriptions.iter_mut().filter(|sub| sub.kind == kind) {
            (sub.handler)(event, context);
            invoked += 1;
        }
        invoked
    }

    pub fn clear(&mut self) {
        self.subscriptions.clear();
        self.next_id = 1;
    }

    pub fn len(&self) -> usize {
        self.subscriptions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.subscriptions.is_empty()
    }

    pub fn subscriber_count(&self, kind: EventKind) -> usize {
        self.subscriptions
            .iter()
            .filter(|sub| sub.kind == kind)
            .count()
    }
}
