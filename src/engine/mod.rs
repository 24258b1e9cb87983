pub mod bowl;
pub mod catalog;
pub mod identity;
pub mod picks;
pub mod resolver;
pub mod standings;

pub use bowl::{BowlPickLedger, BowlSelection, BowlSubmitReport};
pub use catalog::{
    GameCatalog, LockState, ResultEntry, ResultEntryReport, SlateEntry, SlateSyncReport,
};
pub use identity::IdentityResolver;
pub use picks::{PickLedger, PickSelection, PickSubmitReport, SubmitMode};
pub use resolver::{resolve_outright, resolve_spread, Side, SpreadOutcome};
pub use standings::{
    BowlStanding, LeaderboardAggregator, PickLine, SeasonStanding, WeekHistory, WeeklyStanding,
};

use crate::normalize::{AliasNormalizer, TeamNormalizer};
use crate::store::Store;
use std::sync::Arc;

/// The engine components wired over one shared store
pub struct Engine {
    pub catalog: GameCatalog,
    pub picks: PickLedger,
    pub bowl_picks: BowlPickLedger,
    pub standings: LeaderboardAggregator,
    pub identity: IdentityResolver,
}

impl Engine {
    pub fn new(store: Arc<Store>, normalizer: Arc<dyn TeamNormalizer>) -> Self {
        Self {
            catalog: GameCatalog::new(store.clone(), normalizer.clone()),
            picks: PickLedger::new(store.clone(), normalizer.clone()),
            bowl_picks: BowlPickLedger::new(store.clone(), normalizer),
            standings: LeaderboardAggregator::new(store.clone()),
            identity: IdentityResolver::new(store),
        }
    }

    /// A fresh engine over an empty in-memory store with a pass-through
    /// normalizer; handy for the binaries and for tests
    pub fn in_memory() -> Self {
        Engine::new(Arc::new(Store::new()), Arc::new(AliasNormalizer::empty()))
    }
}
