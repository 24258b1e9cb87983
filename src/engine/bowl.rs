//! Bowl pick ledger: the once-per-season slate where every selection also
//! carries a confidence weight and an outright-winner call.
//!
//! Weight validation is all-or-nothing, unlike the per-selection validation
//! everywhere else: a duplicate or out-of-range weight rejects the whole
//! batch before any write. Validation covers the stored picks the batch will
//! not overwrite, so neither a partial resubmission nor a rejected selection
//! can sneak a duplicate in against history. Omitted games are left
//! untouched (merge semantics).

use crate::error::{EngineError, Rejection};
use crate::models::{BowlGame, BowlGameId, BowlPick, UserId};
use crate::normalize::TeamNormalizer;
use crate::store::Store;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::info;

/// One selection in a bowl submission
#[derive(Debug, Clone, Deserialize)]
pub struct BowlSelection {
    pub bowl_game_id: BowlGameId,
    pub spread_pick: String,
    pub confidence: u32,
    pub outright_pick: String,
}

/// What a bowl submission did
#[derive(Debug, Clone, Serialize)]
pub struct BowlSubmitReport {
    pub submitted: usize,
    pub rejected: Vec<Rejection>,
}

pub struct BowlPickLedger {
    store: Arc<Store>,
    normalizer: Arc<dyn TeamNormalizer>,
}

impl BowlPickLedger {
    pub fn new(store: Arc<Store>, normalizer: Arc<dyn TeamNormalizer>) -> Self {
        Self { store, normalizer }
    }

    /// Submit a batch of bowl selections for one season.
    ///
    /// Confidence weights must each fall in 1..=N for a slate of N games and
    /// be unique across the batch plus any stored picks the batch will not
    /// overwrite; a violation returns [`EngineError::Validation`] with
    /// nothing written. Past that precondition, selections are validated one
    /// by one like the weekly ledger.
    pub fn submit(
        &self,
        user_id: UserId,
        season: i32,
        selections: &[BowlSelection],
    ) -> Result<BowlSubmitReport, EngineError> {
        let slate_size = self.store.bowl_games_for_season(season).len() as u32;

        let mut weights: HashSet<u32> = HashSet::new();
        for selection in selections {
            if selection.confidence < 1 || selection.confidence > slate_size {
                return Err(EngineError::Validation(format!(
                    "confidence weight {} out of range 1..={}",
                    selection.confidence, slate_size
                )));
            }
            if !weights.insert(selection.confidence) {
                return Err(EngineError::Validation(format!(
                    "duplicate confidence weight {}",
                    selection.confidence
                )));
            }
        }

        // Validate every selection before writing anything. A selection that
        // fails here keeps its stored pick, so the stored-weight check below
        // may only exempt picks a passing selection will overwrite.
        let now = Utc::now();
        let mut outcomes: Vec<Result<(&BowlSelection, BowlGame, String, String), Rejection>> =
            Vec::new();
        for selection in selections {
            let game = match self.store.get_bowl_game(selection.bowl_game_id) {
                Some(game) if game.season == season => game,
                _ => {
                    outcomes.push(Err(Rejection::GameNotFound {
                        game_id: selection.bowl_game_id,
                    }));
                    continue;
                }
            };

            if game.is_locked(now) {
                outcomes.push(Err(Rejection::Locked {
                    game_id: game.id,
                    kickoff: game.kickoff,
                }));
                continue;
            }

            let spread_pick = self.normalizer.normalize(&selection.spread_pick);
            if !game.has_side(&spread_pick) {
                outcomes.push(Err(Rejection::InvalidTeam {
                    game_id: game.id,
                    team: spread_pick,
                }));
                continue;
            }

            let outright_pick = self.normalizer.normalize(&selection.outright_pick);
            if !game.has_side(&outright_pick) {
                outcomes.push(Err(Rejection::InvalidOutrightTeam {
                    game_id: game.id,
                    team: outright_pick,
                }));
                continue;
            }

            outcomes.push(Ok((selection, game, spread_pick, outright_pick)));
        }

        let will_write: HashSet<BowlGameId> = outcomes
            .iter()
            .filter_map(|outcome| outcome.as_ref().ok())
            .map(|(selection, ..)| selection.bowl_game_id)
            .collect();
        let written_weights: HashSet<u32> = outcomes
            .iter()
            .filter_map(|outcome| outcome.as_ref().ok())
            .map(|(selection, ..)| selection.confidence)
            .collect();
        for pick in self.store.user_bowl_picks(user_id, season) {
            if will_write.contains(&pick.bowl_game_id) {
                continue;
            }
            if written_weights.contains(&pick.confidence) {
                return Err(EngineError::Validation(format!(
                    "confidence weight {} already used by a stored pick",
                    pick.confidence
                )));
            }
        }

        let mut submitted = 0;
        let mut rejected = Vec::new();

        for outcome in outcomes {
            let (selection, game, spread_pick, outright_pick) = match outcome {
                Ok(valid) => valid,
                Err(rejection) => {
                    rejected.push(rejection);
                    continue;
                }
            };

            match self.store.find_bowl_pick(user_id, game.id) {
                Some(mut pick) => {
                    pick.spread_pick = spread_pick;
                    pick.confidence = selection.confidence;
                    pick.outright_pick = outright_pick;
                    pick.updated_at = Some(now);
                    self.store.update_bowl_pick(pick)?;
                }
                None => {
                    self.store.insert_bowl_pick(BowlPick {
                        id: 0,
                        user_id,
                        bowl_game_id: game.id,
                        spread_pick,
                        confidence: selection.confidence,
                        outright_pick,
                        season,
                        submitted_at: now,
                        updated_at: None,
                    });
                }
            }
            submitted += 1;
        }

        info!(
            user_id,
            season,
            submitted,
            rejected = rejected.len(),
            "bowl picks submitted"
        );
        Ok(BowlSubmitReport {
            submitted,
            rejected,
        })
    }

    /// A user's bowl picks joined with game state, ordered by game number
    pub fn get_for_year(&self, user_id: UserId, season: i32) -> Vec<(BowlPick, BowlGame)> {
        let mut rows: Vec<(BowlPick, BowlGame)> = self
            .store
            .user_bowl_picks(user_id, season)
            .into_iter()
            .filter_map(|pick| {
                self.store
                    .get_bowl_game(pick.bowl_game_id)
                    .map(|game| (pick, game))
            })
            .collect();
        rows.sort_by_key(|(_, game)| game.game_number);
        rows
    }
}
