use crate::events::{Outbox, SimEvent};
use crate::grid::TileId;

/// The tile the input layer currently points at.
#[derive(Debug, Default)]
pub struct SelectionModel {
    selected: Option<TileId>,
    outbox: Outbox<SimEvent>,
}

impl SelectionModel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn selected(&self) -> Option<TileId> {
        self.selected
    }

    pub fn set(&mut self, tile: TileId) {
        self.replace(Some(tile));
    }

    pub fn clear(&mut self) {
        self.replace(None);
    }

    pub fn outbox(&mut self) -> &mut Outbox<SimEvent> {
        &mut self.outbox
    }

    fn replace(&mut self, tile: Option<TileId>) {
        if self.selected == tile {
            return;
        }
        self.selected = tile;
        self.outbox.push(SimEvent::SelectionChanged { tile });
    }
}
