use thiserror::Error;

/// Why a command was turned down. These are ordinary game outcomes, not faults:
/// the state is untouched and the caller decides whether to try again.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Rejection {
    #[error("no tile selected")]
    NoTile,
    #[error("grass is already at max level")]
    GrassMaxed,
    #[error("plant grass first")]
    NeedsGrass,
    #[error("bush is already at max level")]
    BushMaxed,
    #[error("dense grass is required")]
    NeedsDenseGrass,
    #[error("tree is already at max level")]
    TreeMaxed,
    #[error("tile is already occupied")]
    TileOccupied,
    #[error("tile is not on the frontier")]
    NotAvailable,
    #[error("not enough currency: need {cost:.2}, have {balance:.2}")]
    InsufficientFunds { cost: f64, balance: f64 },
    #[error("the deck is empty")]
    DeckEmpty,
    #[error("no tile in range")]
    NoTileInRange,
    #[error("no tile at ({q}, {r})")]
    UnknownTile { q: i32, r: i32 },
}

pub type Outcome<T> = Result<T, Rejection>;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("config parse error: {0}")]
    Parse(#[from] serde_yaml::Error),
    #[error("config validation error: {0}")]
    Validation(String),
}
