//! Change notifications.
//!
//! Every emitting component owns an [`Outbox`]. The simulation root drains the
//! outboxes after each committed command, in component order, and hands the
//! merged list to subscribers. Components only push on real transitions.

use serde::Serialize;

use crate::build::BuildAction;
use crate::deck::TileDraw;
use crate::grid::TileId;
use crate::runtime::{OccupantHandle, TemplateHandle};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum SimEvent {
    GridRebuilt {
        generation: u32,
        tiles: usize,
    },
    TileOccupied {
        tile: TileId,
        occupant: Option<OccupantHandle>,
        template: Option<TemplateHandle>,
    },
    TileFreed {
        tile: TileId,
    },
    CompositionChanged {
        tile: TileId,
        action: BuildAction,
        level: i32,
    },
    CurrencyChanged {
        balance: f64,
    },
    IncomeTicked {
        per_tick: f64,
        ticks: u64,
    },
    DeckChanged {
        remaining: usize,
    },
    DeckEmptied,
    TileDrawn {
        draw: TileDraw,
    },
    SelectionChanged {
        tile: Option<TileId>,
    },
}

#[derive(Debug, Clone)]
pub struct Outbox<E> {
    pending: Vec<E>,
}

impl<E> Default for Outbox<E> {
    fn default() -> Self {
        Self {
            pending: Vec::new(),
        }
    }
}

impl<E> Outbox<E> {
    pub fn push(&mut self, event: E) {
        self.pending.push(event);
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn peek(&self) -> &[E] {
        &self.pending
    }

    pub fn drain(&mut self) -> std::vec::Drain<'_, E> {
        self.pending.drain(..)
    }

    pub fn clear(&mut self) {
        self.pending.clear();
    }
}

/// Receives every event the simulation commits.
pub trait Subscriber {
    fn on_event(&mut self, event: &SimEvent);
}

impl<F> Subscriber for F
where
    F: FnMut(&SimEvent),
{
    fn on_event(&mut self, event: &SimEvent) {
        self(event)
    }
}
