use rand::rngs::SmallRng;
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::cards::{CardInstance, CardUid};
use super::events::{CombatEvent, EventQueue};

pub const DEFAULT_MAX_HAND_SIZE: usize = 10;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum PileKind {
    Draw,
    Hand,
    Discard,
    Exhaust,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum InsertPosition {
    Top,
    Bottom,
    Random,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct PileCounts {
    pub draw: usize,
    pub hand: usize,
    pub discard: usize,
    pub exhaust: usize,
}

impl PileCounts {
    pub fn total(&self) -> usize {
        self.draw + self.hand + self.discard + self.exhaust
    }
}

/// The four combat piles. The top of the draw pile is the end of `draw`.
/// A card instance lives in at most one pile; exhaust is terminal.
#[derive(Debug, Clone, Serialize)]
pub struct DeckPiles {
    pub draw: Vec<CardInstance>,
    pub hand: Vec<CardInstance>,
    pub discard: Vec<CardInstance>,
    pub exhaust: Vec<CardInstance>,
    pub max_hand_size: usize,
}

impl Default for DeckPiles {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_HAND_SIZE)
    }
}

fn drawn(card: &CardInstance) -> CombatEvent {
    CombatEvent::CardDrawn {
        card: card.uid,
        card_id: card.id().to_string(),
    }
}

fn exhausted(card: &CardInstance) -> CombatEvent {
    CombatEvent::CardExhausted {
        card: card.uid,
        card_id: card.id().to_string(),
    }
}

fn discarded(card: &CardInstance) -> CombatEvent {
    CombatEvent::CardDiscarded {
        card: card.uid,
        card_id: card.id().to_string(),
    }
}

fn take_by_uid(pile: &mut Vec<CardInstance>, uid: CardUid) -> Option<CardInstance> {
    let index = pile.iter().position(|card| card.uid == uid)?;
    Some(pile.remove(index))
}

impl DeckPiles {
    pub fn new(max_hand_size: usize) -> Self {
        Self {
            draw: Vec::new(),
            hand: Vec::new(),
            discard: Vec::new(),
            exhaust: Vec::new(),
            max_hand_size,
        }
    }

    /// Copies the master deck into a shuffled draw pile. Innate cards end up
    /// on top so the opening draw picks them first.
    pub fn initialize_from_deck(
        &mut self,
        deck: &[CardInstance],
        rng: &mut SmallRng,
        events: &mut EventQueue,
    ) {
        self.hand.clear();
        self.discard.clear();
        self.exhaust.clear();
        self.draw = deck.iter().map(CardInstance::copy).collect();
        self.draw.shuffle(rng);
        // Stable partition keeps the shuffled order inside each group.
        self.draw.sort_by_key(|card| card.flags().innate);
        events.push(CombatEvent::Shuffle {
            cards: self.draw.len(),
        });
    }

    pub fn hand_is_full(&self) -> bool {
        self.hand.len() >= self.max_hand_size
    }

    /// Draws up to `count` cards, reshuffling the discard pile when the draw
    /// pile runs dry. Stops early on a full hand or when both piles are empty.
    pub fn draw(
        &mut self,
        count: usize,
        rng: &mut SmallRng,
        events: &mut EventQueue,
    ) -> Vec<CardUid> {
        let mut uids = Vec::with_capacity(count);
        for _ in 0..count {
            if self.hand_is_full() {
                tracing::debug!(hand = self.hand.len(), "hand full, draw stopped");
                break;
            }
            if self.draw.is_empty() && self.reshuffle(rng, events) == 0 {
                break;
            }
            let Some(card) = self.draw.pop() else {
                break;
            };
            events.push(drawn(&card));
            uids.push(card.uid);
            self.hand.push(card);
        }
        uids
    }

    /// Moves the discard pile into the draw pile and shuffles. Returns the
    /// number of cards moved.
    pub fn reshuffle(&mut self, rng: &mut SmallRng, events: &mut EventQueue) -> usize {
        if self.discard.is_empty() {
            return 0;
        }
        let moved = self.discard.len();
        self.draw.append(&mut self.discard);
        self.draw.shuffle(rng);
        events.push(CombatEvent::Shuffle { cards: moved });
        moved
    }

    /// Ethereal cards exhaust, retained cards stay, everything else is
    /// discarded. Turn cost overrides are cleared on every pile afterwards.
    pub fn end_turn(&mut self, events: &mut EventQueue) -> Vec<CardUid> {
        let mut discarded_uids = Vec::new();
        let mut kept = Vec::new();
        for card in std::mem::take(&mut self.hand) {
            let flags = card.flags();
            if flags.ethereal {
                events.push(exhausted(&card));
                self.exhaust.push(card);
            } else if flags.retain {
                kept.push(card);
            } else {
                events.push(discarded(&card));
                discarded_uids.push(card.uid);
                self.discard.push(card);
            }
        }
        self.hand = kept;

        for card in self
            .draw
            .iter_mut()
            .chain(self.hand.iter_mut())
            .chain(self.discard.iter_mut())
            .chain(self.exhaust.iter_mut())
        {
            card.clear_turn_modifiers();
        }
        discarded_uids
    }

    fn exhaust_from(
        pile: &mut Vec<CardInstance>,
        exhaust: &mut Vec<CardInstance>,
        uid: CardUid,
        events: &mut EventQueue,
    ) -> bool {
        match take_by_uid(pile, uid) {
            Some(card) => {
                events.push(exhausted(&card));
                exhaust.push(card);
                true
            }
            None => false,
        }
    }

    pub fn exhaust_card(&mut self, uid: CardUid, events: &mut EventQueue) -> bool {
        Self::exhaust_from(&mut self.hand, &mut self.exhaust, uid, events)
    }

    pub fn exhaust_from_discard(&mut self, uid: CardUid, events: &mut EventQueue) -> bool {
        Self::exhaust_from(&mut self.discard, &mut self.exhaust, uid, events)
    }

    pub fn exhaust_from_draw(&mut self, uid: CardUid, events: &mut EventQueue) -> bool {
        Self::exhaust_from(&mut self.draw, &mut self.exhaust, uid, events)
    }

    pub fn discard_card(&mut self, uid: CardUid, events: &mut EventQueue) -> bool {
        match take_by_uid(&mut self.hand, uid) {
            Some(card) => {
                events.push(discarded(&card));
                self.discard.push(card);
                true
            }
            None => false,
        }
    }

    /// Adds a generated card. Overflow lands in the discard pile.
    pub fn add_card_to_hand(&mut self, card: CardInstance) -> PileKind {
        if self.hand_is_full() {
            self.discard.push(card);
            PileKind::Discard
        } else {
            self.hand.push(card);
            PileKind::Hand
        }
    }

    pub fn add_card_to_draw_pile(
        &mut self,
        card: CardInstance,
        position: InsertPosition,
        rng: &mut SmallRng,
    ) {
        match position {
            InsertPosition::Top => self.draw.push(card),
            InsertPosition::Bottom => self.draw.insert(0, card),
            InsertPosition::Random => {
                let index = rng.gen_range(0..=self.draw.len());
                self.draw.insert(index, card);
            }
        }
    }

    /// Pulls a specific card from the draw or discard pile into hand.
    pub fn move_card_to_hand(&mut self, uid: CardUid, events: &mut EventQueue) -> bool {
        if self.hand_is_full() {
            return false;
        }
        let card = match take_by_uid(&mut self.draw, uid) {
            Some(card) => card,
            None => match take_by_uid(&mut self.discard, uid) {
                Some(card) => card,
                None => return false,
            },
        };
        events.push(drawn(&card));
        self.hand.push(card);
        true
    }

    pub fn take_from_hand(&mut self, uid: CardUid) -> Option<CardInstance> {
        take_by_uid(&mut self.hand, uid)
    }

    pub fn find_in_hand(&self, uid: CardUid) -> Option<&CardInstance> {
        self.hand.iter().find(|card| card.uid == uid)
    }

    pub fn counts(&self) -> PileCounts {
        PileCounts {
            draw: self.draw.len(),
            hand: self.hand.len(),
            discard: self.discard.len(),
            exhaust: self.exhaust.len(),
        }
    }

    pub fn clear_combat_modifiers(&mut self) {
        for card in self
            .draw
            .iter_mut()
            .chain(self.hand.iter_mut())
            .chain(self.discard.iter_mut())
            .chain(self.exhaust.iter_mut())
        {
            card.clear_combat_modifiers();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::cards::{CardTemplate, CardType};
    use crate::game::events::EventKind;
    use rand::SeedableRng;
    use std::sync::Arc;

    fn template(id: &str) -> Arc<CardTemplate> {
        CardTemplate::builder(id, id)
            .card_type(CardType::Skill)
            .cost(1)
            .build()
    }

    fn deck(size: usize) -> Vec<CardInstance> {
        let strike = template("strike");
        (0..size).map(|_| strike.instantiate()).collect()
    }

    fn setup(size: usize) -> (DeckPiles, SmallRng, EventQueue) {
        let mut piles = DeckPiles::default();
        let mut rng = SmallRng::seed_from_u64(42);
        let mut events = EventQueue::new();
        piles.initialize_from_deck(&deck(size), &mut rng, &mut events);
        (piles, rng, events)
    }

    #[test]
    fn initialize_copies_instead_of_moving() {
        let master = deck(5);
        let mut piles = DeckPiles::default();
        let mut rng = SmallRng::seed_from_u64(1);
        let mut events = EventQueue::new();

        piles.initialize_from_deck(&master, &mut rng, &mut events);

        assert_eq!(piles.draw.len(), 5);
        assert!(piles
            .draw
            .iter()
            .all(|card| master.iter().all(|original| original.uid != card.uid)));
        assert_eq!(events.count(EventKind::Shuffle), 1);
    }

    #[test]
    fn innate_cards_are_drawn_first() {
        let innate = CardTemplate::builder("opener", "Opener").innate().build();
        let mut master = deck(9);
        master.push(innate.instantiate());
        let mut piles = DeckPiles::default();
        let mut rng = SmallRng::seed_from_u64(9);
        let mut events = EventQueue::new();

        piles.initialize_from_deck(&master, &mut rng, &mut events);
        piles.draw(1, &mut rng, &mut events);

        assert_eq!(piles.hand[0].id(), "opener");
    }

    #[test]
    fn draw_reshuffles_discard_when_empty() {
        let (mut piles, mut rng, mut events) = setup(5);
        piles.draw(5, &mut rng, &mut events);
        piles.end_turn(&mut events);
        assert_eq!(piles.discard.len(), 5);
        assert!(piles.draw.is_empty());

        let drawn = piles.draw(2, &mut rng, &mut events);

        assert_eq!(drawn.len(), 2);
        assert!(piles.discard.is_empty());
        assert_eq!(piles.draw.len(), 3);
        assert_eq!(piles.counts().total(), 5);
    }

    #[test]
    fn draw_stops_early_when_everything_is_empty() {
        let (mut piles, mut rng, mut events) = setup(3);
        let drawn = piles.draw(5, &mut rng, &mut events);
        assert_eq!(drawn.len(), 3);
        assert_eq!(events.count(EventKind::CardDrawn), 3);
    }

    #[test]
    fn draw_stops_at_hand_limit_without_discarding() {
        let (mut piles, mut rng, mut events) = setup(15);
        let drawn = piles.draw(12, &mut rng, &mut events);

        assert_eq!(drawn.len(), DEFAULT_MAX_HAND_SIZE);
        assert_eq!(piles.draw.len(), 5);
        assert!(piles.discard.is_empty());
    }

    #[test]
    fn end_turn_routes_ethereal_and_retain() {
        let ghost = CardTemplate::builder("ghost", "Ghost").ethereal().build();
        let keeper = CardTemplate::builder("keeper", "Keeper").retain().build();
        let (mut piles, mut rng, mut events) = setup(2);
        piles.draw(2, &mut rng, &mut events);
        piles.add_card_to_hand(ghost.instantiate());
        piles.add_card_to_hand(keeper.instantiate());
        for card in piles.hand.iter_mut() {
            card.set_cost_this_turn(0);
        }

        let discarded = piles.end_turn(&mut events);

        assert_eq!(discarded.len(), 2);
        assert_eq!(piles.exhaust.len(), 1);
        assert_eq!(piles.hand.len(), 1);
        assert_eq!(piles.hand[0].id(), "keeper");
        assert_eq!(piles.hand[0].cost_this_turn, None);
        assert!(piles.discard.iter().all(|card| card.cost_this_turn.is_none()));
    }

    #[test]
    fn exhaust_is_a_noop_for_missing_cards() {
        let (mut piles, mut rng, mut events) = setup(4);
        let drawn = piles.draw(2, &mut rng, &mut events);

        assert!(piles.exhaust_card(drawn[0], &mut events));
        assert!(!piles.exhaust_card(drawn[0], &mut events));
        assert!(!piles.exhaust_from_discard(drawn[1], &mut events));

        let top = piles.draw.last().map(|card| card.uid).expect("draw pile has cards");
        assert!(piles.exhaust_from_draw(top, &mut events));
        assert_eq!(piles.counts(), PileCounts { draw: 1, hand: 1, discard: 0, exhaust: 2 });
    }

    #[test]
    fn overflowing_hand_sends_new_cards_to_discard() {
        let (mut piles, mut rng, mut events) = setup(10);
        piles.draw(10, &mut rng, &mut events);

        let placed = piles.add_card_to_hand(template("extra").instantiate());

        assert_eq!(placed, PileKind::Discard);
        assert_eq!(piles.discard.len(), 1);
    }

    #[test]
    fn draw_pile_insert_positions() {
        let (mut piles, mut rng, _) = setup(3);
        let top = template("top").instantiate();
        let bottom = template("bottom").instantiate();
        let random = template("random").instantiate();
        let random_uid = random.uid;

        piles.add_card_to_draw_pile(random, InsertPosition::Random, &mut rng);
        piles.add_card_to_draw_pile(top, InsertPosition::Top, &mut rng);
        piles.add_card_to_draw_pile(bottom, InsertPosition::Bottom, &mut rng);

        assert_eq!(piles.draw.len(), 6);
        assert_eq!(piles.draw[0].id(), "bottom");
        assert_eq!(piles.draw.last().map(|card| card.id()), Some("top"));
        assert!(piles.draw.iter().any(|card| card.uid == random_uid));
    }

    #[test]
    fn move_card_to_hand_pulls_from_draw_or_discard() {
        let (mut piles, _, mut events) = setup(4);
        let target = piles.draw[0].uid;
        assert!(piles.move_card_to_hand(target, &mut events));
        assert!(piles.find_in_hand(target).is_some());

        assert!(piles.discard_card(target, &mut events));
        assert!(piles.move_card_to_hand(target, &mut events));
        assert!(!piles.move_card_to_hand(9_999_999, &mut events));
        assert_eq!(piles.counts().total(), 4);
    }
}
