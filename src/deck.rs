//! The build queue: a shuffled, refillable supply of tile draws.

use std::collections::VecDeque;

use rand::seq::SliceRandom;
use rand::RngCore;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::events::{Outbox, SimEvent};
use crate::runtime::TemplateHandle;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TileType {
    #[default]
    Field,
    Bushes,
    Forest,
    Rocks,
    Water,
}

impl TileType {
    pub fn label(self) -> &'static str {
        match self {
            TileType::Field => "Field",
            TileType::Bushes => "Bushes",
            TileType::Forest => "Forest",
            TileType::Rocks => "Rocks",
            TileType::Water => "Water",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TileDraw {
    pub tile_type: TileType,
    pub template: TemplateHandle,
    pub label: String,
}

/// Templates that share a tile type. Each template adds one draw to the pool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TileGroup {
    pub tile_type: TileType,
    #[serde(default)]
    pub templates: Vec<TemplateHandle>,
    #[serde(default)]
    pub display_name: Option<String>,
}

impl TileGroup {
    fn label(&self) -> String {
        match self.display_name.as_deref().map(str::trim) {
            Some(name) if !name.is_empty() => name.to_string(),
            _ => self.tile_type.label().to_string(),
        }
    }
}

#[derive(Debug, Default)]
pub struct TileDeck {
    groups: Vec<TileGroup>,
    target_size: usize,
    queue: VecDeque<TileDraw>,
    emptied_signalled: bool,
    outbox: Outbox<SimEvent>,
}

impl TileDeck {
    pub fn new(groups: Vec<TileGroup>) -> Self {
        Self {
            groups,
            ..Self::default()
        }
    }

    /// Refills the queue to `target_size`, shuffling a fresh copy of the pool on
    /// every pass so each pass is independent of the previous one.
    pub fn rebuild(&mut self, target_size: usize, rng: &mut dyn RngCore) {
        self.target_size = target_size;
        self.queue.clear();
        self.emptied_signalled = false;

        let pool = self.pool();
        if !pool.is_empty() {
            let mut buffer = Vec::with_capacity(pool.len());
            while self.queue.len() < target_size {
                buffer.clear();
                buffer.extend(pool.iter().cloned());
                buffer.shuffle(rng);
                let missing = target_size - self.queue.len();
                self.queue.extend(buffer.drain(..).take(missing));
            }
        }

        debug!(
            size = self.queue.len(),
            pool = pool.len(),
            "deck.rebuild"
        );
        self.outbox.push(SimEvent::DeckChanged {
            remaining: self.queue.len(),
        });
    }

    /// Takes the front draw. The emptied signal fires once per drain: after the
    /// draw that empties the queue, or on the first draw from a deck that was
    /// rebuilt empty.
    pub fn draw_tile(&mut self) -> Option<TileDraw> {
        let Some(draw) = self.queue.pop_front() else {
            self.signal_emptied();
            return None;
        };

        self.outbox.push(SimEvent::DeckChanged {
            remaining: self.queue.len(),
        });
        if self.queue.is_empty() {
            self.signal_emptied();
        }
        Some(draw)
    }

    pub fn current(&self) -> Option<&TileDraw> {
        self.queue.front()
    }

    pub fn queued(&self) -> impl ExactSizeIterator<Item = &TileDraw> {
        self.queue.iter()
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    pub fn target_size(&self) -> usize {
        self.target_size
    }

    pub fn groups(&self) -> &[TileGroup] {
        &self.groups
    }

    pub fn set_groups(&mut self, groups: Vec<TileGroup>) {
        self.groups = groups;
    }

    pub fn outbox(&mut self) -> &mut Outbox<SimEvent> {
        &mut self.outbox
    }

    fn pool(&self) -> Vec<TileDraw> {
        self.groups
            .iter()
            .flat_map(|group| {
                let label = group.label();
                group.templates.iter().map(move |template| TileDraw {
                    tile_type: group.tile_type,
                    template: *template,
                    label: label.clone(),
                })
            })
            .collect()
    }

    fn signal_emptied(&mut self) {
        if !self.emptied_signalled {
            self.emptied_signalled = true;
            self.outbox.push(SimEvent::DeckEmptied);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn groups() -> Vec<TileGroup> {
        vec![
            TileGroup {
                tile_type: TileType::Field,
                templates: vec![TemplateHandle(1), TemplateHandle(2)],
                display_name: None,
            },
            TileGroup {
                tile_type: TileType::Water,
                templates: vec![TemplateHandle(3)],
                display_name: Some("Pond".into()),
            },
            TileGroup {
                tile_type: TileType::Rocks,
                templates: Vec::new(),
                display_name: None,
            },
        ]
    }

    fn emptied_count(deck: &mut TileDeck) -> usize {
        deck.outbox()
            .drain()
            .filter(|e| matches!(e, SimEvent::DeckEmptied))
            .count()
    }

    #[test]
    fn rebuild_fills_to_target_with_whole_pool_passes() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let mut deck = TileDeck::new(groups());
        deck.rebuild(7, &mut rng);
        assert_eq!(deck.len(), 7);

        // Two full passes of the 3-item pool, then one from the third.
        let draws: Vec<_> = deck.queued().cloned().collect();
        for pass in draws.chunks(3).take(2) {
            let mut templates: Vec<_> = pass.iter().map(|d| d.template.0).collect();
            templates.sort_unstable();
            assert_eq!(templates, vec![1, 2, 3]);
        }
        assert!(draws.iter().all(|d| d.tile_type != TileType::Rocks));
    }

    #[test]
    fn group_labels_fall_back_to_type() {
        let mut rng = ChaCha8Rng::seed_from_u64(2);
        let mut deck = TileDeck::new(groups());
        deck.rebuild(3, &mut rng);
        for draw in deck.queued() {
            match draw.tile_type {
                TileType::Field => assert_eq!(draw.label, "Field"),
                TileType::Water => assert_eq!(draw.label, "Pond"),
                other => panic!("unexpected type {other:?}"),
            }
        }
    }

    #[test]
    fn draws_exhaust_then_signal_emptied_once() {
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let mut deck = TileDeck::new(groups());
        deck.rebuild(5, &mut rng);
        deck.outbox().clear();

        for _ in 0..4 {
            assert!(deck.draw_tile().is_some());
            assert_eq!(emptied_count(&mut deck), 0);
        }
        assert!(deck.draw_tile().is_some());
        assert_eq!(emptied_count(&mut deck), 1);

        assert!(deck.draw_tile().is_none());
        assert!(deck.draw_tile().is_none());
        assert_eq!(emptied_count(&mut deck), 0);
    }

    #[test]
    fn preview_does_not_consume() {
        let mut rng = ChaCha8Rng::seed_from_u64(4);
        let mut deck = TileDeck::new(groups());
        deck.rebuild(2, &mut rng);
        let preview = deck.current().cloned();
        assert_eq!(deck.len(), 2);
        assert_eq!(deck.draw_tile(), preview);
    }

    #[test]
    fn empty_pool_yields_empty_deck() {
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        let mut deck = TileDeck::new(Vec::new());
        deck.rebuild(10, &mut rng);
        assert!(deck.is_empty());
        assert!(deck.current().is_none());
        deck.outbox().clear();
        assert!(deck.draw_tile().is_none());
        assert_eq!(emptied_count(&mut deck), 1);
    }

    #[test]
    fn same_seed_same_order() {
        let mut a = TileDeck::new(groups());
        let mut b = TileDeck::new(groups());
        a.rebuild(12, &mut ChaCha8Rng::seed_from_u64(9));
        b.rebuild(12, &mut ChaCha8Rng::seed_from_u64(9));
        assert!(a.queued().eq(b.queued()));
    }

    #[test]
    fn rebuild_rearms_emptied_signal() {
        let mut rng = ChaCha8Rng::seed_from_u64(6);
        let mut deck = TileDeck::new(groups());
        deck.rebuild(1, &mut rng);
        deck.draw_tile();
        assert_eq!(emptied_count(&mut deck), 1);
        deck.rebuild(1, &mut rng);
        deck.draw_tile();
        assert_eq!(emptied_count(&mut deck), 1);
    }
}
