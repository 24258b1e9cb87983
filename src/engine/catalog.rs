//! Game catalog: one slate of games per (season, week) plus the
//! once-per-season bowl slate. Slates are populated by an external ingestion
//! step feeding [`GameCatalog::sync_slate`]; results are stamped by the
//! admin-facing entry operations.

use crate::engine::resolver::{resolve_outright, resolve_spread, Side};
use crate::error::EngineError;
use crate::models::{BowlGame, BowlGameId, Game, GameId, MatchupKey, UserId};
use crate::normalize::TeamNormalizer;
use crate::store::Store;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{info, warn};

/// One entry of an ingested slate. Weekly entries leave `game_number` and
/// `bowl_name` empty; bowl entries may carry both.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SlateEntry {
    pub favorite: String,
    pub underdog: String,
    pub line: f64,
    pub kickoff: DateTime<Utc>,
    pub game_number: Option<u32>,
    pub bowl_name: Option<String>,
}

/// What one sync call did
#[derive(Debug, Clone, Serialize)]
pub struct SlateSyncReport {
    pub synced: usize,
    pub skipped: Vec<String>,
}

/// Three-valued lock lookup
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LockState {
    Open,
    Locked,
    NotFound,
}

/// Per-entry input for bulk result entry
#[derive(Debug, Clone, Deserialize)]
pub struct ResultEntry {
    pub game_id: GameId,
    pub favorite_score: i32,
    pub underdog_score: i32,
}

/// Outcome of a bulk result entry: failures are named and skipped,
/// successes are committed regardless
#[derive(Debug, Clone, Serialize)]
pub struct ResultEntryReport {
    pub entered: usize,
    pub failed: usize,
    pub failures: Vec<String>,
}

pub struct GameCatalog {
    store: Arc<Store>,
    normalizer: Arc<dyn TeamNormalizer>,
}

impl GameCatalog {
    pub fn new(store: Arc<Store>, normalizer: Arc<dyn TeamNormalizer>) -> Self {
        Self { store, normalizer }
    }

    /// Idempotent upsert of a weekly slate. Existing rows are matched by the
    /// order-independent matchup key, so re-ingesting the same slate updates
    /// lines and kickoffs in place. Entries duplicating a matchup already
    /// processed in this call are skipped and logged, not errors.
    pub fn sync_slate(
        &self,
        season: i32,
        week: u32,
        entries: &[SlateEntry],
    ) -> Result<SlateSyncReport, EngineError> {
        let existing = self.store.games_for_week(season, week);
        let mut seen: HashSet<MatchupKey> = HashSet::new();
        let mut synced = 0;
        let mut skipped = Vec::new();

        for entry in entries {
            let favorite = self.normalizer.normalize(&entry.favorite);
            let underdog = self.normalizer.normalize(&entry.underdog);
            let key = MatchupKey::new(&favorite, &underdog);

            if !seen.insert(key.clone()) {
                warn!(
                    favorite = %favorite,
                    underdog = %underdog,
                    "duplicate matchup in slate batch, skipping"
                );
                skipped.push(format!("duplicate matchup {} vs {}", favorite, underdog));
                continue;
            }

            let matched = existing
                .iter()
                .find(|g| MatchupKey::new(&g.favorite, &g.underdog) == key);

            match matched {
                Some(row) => {
                    let mut game = row.clone();
                    // Re-ingestion may flip which side is favored
                    game.favorite = favorite;
                    game.underdog = underdog;
                    game.line = entry.line;
                    game.kickoff = entry.kickoff;
                    self.store.update_game(game)?;
                }
                None => {
                    self.store.insert_game(Game {
                        id: 0,
                        season,
                        week,
                        favorite,
                        underdog,
                        line: entry.line,
                        kickoff: entry.kickoff,
                        favorite_score: None,
                        underdog_score: None,
                        spread_winner: None,
                        push: None,
                        result_entered_at: None,
                        result_entered_by: None,
                    });
                }
            }
            synced += 1;
        }

        info!(season, week, synced, "slate synced");
        Ok(SlateSyncReport { synced, skipped })
    }

    /// Bowl-slate variant of [`sync_slate`](Self::sync_slate). Rows are
    /// matched by explicit game number when the entry carries one, falling
    /// back to the matchup key; new rows without a number get the lowest
    /// free slot so the confidence range stays 1..N. Game numbers are unique
    /// across the slate: an entry whose explicit number is already taken by
    /// a different matchup is skipped and logged.
    pub fn sync_bowl_slate(
        &self,
        season: i32,
        entries: &[SlateEntry],
    ) -> Result<SlateSyncReport, EngineError> {
        let existing = self.store.bowl_games_for_season(season);
        // Numbers already on a row, plus numbers assigned during this call
        let mut taken: HashSet<u32> = existing.iter().map(|g| g.game_number).collect();
        // Explicit numbers anywhere in the batch; auto-assignment must leave
        // these slots alone even before their entry is processed
        let reserved: HashSet<u32> = entries.iter().filter_map(|e| e.game_number).collect();
        let mut seen: HashSet<MatchupKey> = HashSet::new();
        let mut synced = 0;
        let mut skipped = Vec::new();

        for entry in entries {
            let favorite = self.normalizer.normalize(&entry.favorite);
            let underdog = self.normalizer.normalize(&entry.underdog);
            let key = MatchupKey::new(&favorite, &underdog);

            if !seen.insert(key.clone()) {
                warn!(
                    favorite = %favorite,
                    underdog = %underdog,
                    "duplicate matchup in bowl slate batch, skipping"
                );
                skipped.push(format!("duplicate matchup {} vs {}", favorite, underdog));
                continue;
            }

            let matched = existing.iter().find(|g| {
                entry.game_number == Some(g.game_number)
                    || MatchupKey::new(&g.favorite, &g.underdog) == key
            });

            match matched {
                Some(row) => {
                    let mut game = row.clone();
                    game.favorite = favorite;
                    game.underdog = underdog;
                    game.line = entry.line;
                    game.kickoff = entry.kickoff;
                    if let Some(name) = &entry.bowl_name {
                        game.name = name.clone();
                    }
                    self.store.update_bowl_game(game)?;
                }
                None => {
                    let game_number = match entry.game_number {
                        Some(number) => {
                            if taken.contains(&number) {
                                warn!(
                                    game_number = number,
                                    favorite = %favorite,
                                    underdog = %underdog,
                                    "game number already taken in bowl slate, skipping"
                                );
                                skipped.push(format!(
                                    "game number {} already taken ({} vs {})",
                                    number, favorite, underdog
                                ));
                                continue;
                            }
                            number
                        }
                        None => {
                            let mut number = 1;
                            while taken.contains(&number) || reserved.contains(&number) {
                                number += 1;
                            }
                            number
                        }
                    };
                    taken.insert(game_number);
                    self.store.insert_bowl_game(BowlGame {
                        id: 0,
                        season,
                        game_number,
                        name: entry.bowl_name.clone().unwrap_or_default(),
                        favorite,
                        underdog,
                        line: entry.line,
                        kickoff: entry.kickoff,
                        favorite_score: None,
                        underdog_score: None,
                        spread_winner: None,
                        push: None,
                        outright_winner: None,
                        result_entered_at: None,
                        result_entered_by: None,
                    });
                }
            }
            synced += 1;
        }

        info!(season, synced, "bowl slate synced");
        Ok(SlateSyncReport { synced, skipped })
    }

    /// All games for a week, ordered by kickoff
    pub fn get_slate(&self, season: i32, week: u32) -> Vec<Game> {
        self.store.games_for_week(season, week)
    }

    /// The bowl slate for a season, ordered by game number
    pub fn get_bowl_slate(&self, season: i32) -> Vec<BowlGame> {
        self.store.bowl_games_for_season(season)
    }

    pub fn lock_state(&self, game_id: GameId) -> LockState {
        match self.store.get_game(game_id) {
            Some(game) if game.is_locked(Utc::now()) => LockState::Locked,
            Some(_) => LockState::Open,
            None => LockState::NotFound,
        }
    }

    pub fn bowl_lock_state(&self, bowl_game_id: BowlGameId) -> LockState {
        match self.store.get_bowl_game(bowl_game_id) {
            Some(game) if game.is_locked(Utc::now()) => LockState::Locked,
            Some(_) => LockState::Open,
            None => LockState::NotFound,
        }
    }

    /// Stamp a final score onto a game. Re-entry simply overwrites the prior
    /// result; the last write wins.
    pub fn enter_result(
        &self,
        game_id: GameId,
        favorite_score: i32,
        underdog_score: i32,
        entered_by: UserId,
    ) -> Result<Game, EngineError> {
        let mut game = self
            .store
            .get_game(game_id)
            .ok_or(EngineError::GameNotFound(game_id))?;

        let outcome = resolve_spread(favorite_score, underdog_score, game.line);
        let winner = outcome.winner.map(|side| match side {
            Side::Favorite => game.favorite.clone(),
            Side::Underdog => game.underdog.clone(),
        });

        game.favorite_score = Some(favorite_score);
        game.underdog_score = Some(underdog_score);
        game.spread_winner = winner;
        game.push = Some(outcome.push);
        game.result_entered_at = Some(Utc::now());
        game.result_entered_by = Some(entered_by);
        self.store.update_game(game.clone())?;

        info!(
            game_id,
            favorite_score, underdog_score, "result entered"
        );
        Ok(game)
    }

    /// Bowl variant of [`enter_result`](Self::enter_result); also stamps the
    /// outright winner (absent on a tie).
    pub fn enter_bowl_result(
        &self,
        bowl_game_id: BowlGameId,
        favorite_score: i32,
        underdog_score: i32,
        entered_by: UserId,
    ) -> Result<BowlGame, EngineError> {
        let mut game = self
            .store
            .get_bowl_game(bowl_game_id)
            .ok_or(EngineError::BowlGameNotFound(bowl_game_id))?;

        let spread = resolve_spread(favorite_score, underdog_score, game.line);
        let spread_winner = spread.winner.map(|side| match side {
            Side::Favorite => game.favorite.clone(),
            Side::Underdog => game.underdog.clone(),
        });
        let outright_winner = resolve_outright(favorite_score, underdog_score).map(|side| {
            match side {
                Side::Favorite => game.favorite.clone(),
                Side::Underdog => game.underdog.clone(),
            }
        });

        game.favorite_score = Some(favorite_score);
        game.underdog_score = Some(underdog_score);
        game.spread_winner = spread_winner;
        game.push = Some(spread.push);
        game.outright_winner = outright_winner;
        game.result_entered_at = Some(Utc::now());
        game.result_entered_by = Some(entered_by);
        self.store.update_bowl_game(game.clone())?;

        info!(
            bowl_game_id,
            favorite_score, underdog_score, "bowl result entered"
        );
        Ok(game)
    }

    /// Enter a batch of results. A missing game is recorded as a named
    /// failure and skipped; the rest of the batch still commits.
    pub fn bulk_enter_results(
        &self,
        entries: &[ResultEntry],
        entered_by: UserId,
    ) -> ResultEntryReport {
        let mut entered = 0;
        let mut failures = Vec::new();

        for entry in entries {
            match self.enter_result(
                entry.game_id,
                entry.favorite_score,
                entry.underdog_score,
                entered_by,
            ) {
                Ok(_) => entered += 1,
                Err(err) => {
                    warn!(game_id = entry.game_id, error = %err, "result entry failed");
                    failures.push(err.to_string());
                }
            }
        }

        ResultEntryReport {
            entered,
            failed: failures.len(),
            failures,
        }
    }

    /// Bowl variant of [`bulk_enter_results`](Self::bulk_enter_results)
    pub fn bulk_enter_bowl_results(
        &self,
        entries: &[ResultEntry],
        entered_by: UserId,
    ) -> ResultEntryReport {
        let mut entered = 0;
        let mut failures = Vec::new();

        for entry in entries {
            match self.enter_bowl_result(
                entry.game_id,
                entry.favorite_score,
                entry.underdog_score,
                entered_by,
            ) {
                Ok(_) => entered += 1,
                Err(err) => {
                    warn!(bowl_game_id = entry.game_id, error = %err, "bowl result entry failed");
                    failures.push(err.to_string());
                }
            }
        }

        ResultEntryReport {
            entered,
            failed: failures.len(),
            failures,
        }
    }
}
