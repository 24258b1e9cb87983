//! Weekly pick ledger: validates and stores a participant's per-game
//! selections against the catalog, enforcing one pick per (user, game) and
//! the kickoff lock.

use crate::error::{EngineError, Rejection};
use crate::models::{GameId, Pick, UserId};
use crate::normalize::TeamNormalizer;
use crate::store::Store;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::info;

/// How a submission treats previously stored picks its batch does not name.
///
/// The weekly contest contract is `Replace`: a resubmission is the full
/// statement of the user's unlocked picks, and omitting a game unpicks it.
/// `Merge` touches only the games named in the batch (the bowl ledger's
/// behavior). Both are explicit because the difference is easy to miss.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubmitMode {
    Replace,
    Merge,
}

/// One selection in a weekly submission
#[derive(Debug, Clone, Deserialize)]
pub struct PickSelection {
    pub game_id: GameId,
    pub team: String,
}

/// What a submission did: upserts, unpicks, and per-selection rejections
#[derive(Debug, Clone, Serialize)]
pub struct PickSubmitReport {
    pub submitted: usize,
    pub removed: usize,
    pub rejected: Vec<Rejection>,
}

pub struct PickLedger {
    store: Arc<Store>,
    normalizer: Arc<dyn TeamNormalizer>,
}

impl PickLedger {
    pub fn new(store: Arc<Store>, normalizer: Arc<dyn TeamNormalizer>) -> Self {
        Self { store, normalizer }
    }

    /// Submit a batch of selections for one week. Selections are validated
    /// individually; a rejection never aborts the rest of the batch.
    ///
    /// In [`SubmitMode::Replace`], stored picks for games the batch does not
    /// name are deleted if their game is still unlocked. Picks on locked
    /// games are always left alone, named or not.
    pub fn submit(
        &self,
        user_id: UserId,
        season: i32,
        week: u32,
        selections: &[PickSelection],
        mode: SubmitMode,
    ) -> Result<PickSubmitReport, EngineError> {
        let now = Utc::now();
        let mut submitted = 0;
        let mut rejected = Vec::new();
        // Games the batch names at all, valid or not. Omission-deletion is
        // keyed on this set, so a rejected selection still shields its old
        // pick from removal.
        let mut named: HashSet<GameId> = HashSet::new();

        for selection in selections {
            named.insert(selection.game_id);

            let game = match self.store.get_game(selection.game_id) {
                Some(game) if game.season == season && game.week == week => game,
                _ => {
                    rejected.push(Rejection::GameNotFound {
                        game_id: selection.game_id,
                    });
                    continue;
                }
            };

            if game.is_locked(now) {
                rejected.push(Rejection::Locked {
                    game_id: game.id,
                    kickoff: game.kickoff,
                });
                continue;
            }

            let team = self.normalizer.normalize(&selection.team);
            if !game.has_side(&team) {
                rejected.push(Rejection::InvalidTeam {
                    game_id: game.id,
                    team,
                });
                continue;
            }

            match self.store.find_pick(user_id, game.id) {
                Some(mut pick) => {
                    pick.selected_team = team;
                    pick.updated_at = Some(now);
                    self.store.update_pick(pick)?;
                }
                None => {
                    self.store.insert_pick(Pick {
                        id: 0,
                        user_id,
                        game_id: game.id,
                        selected_team: team,
                        season,
                        week,
                        submitted_at: now,
                        updated_at: None,
                    });
                }
            }
            submitted += 1;
        }

        let mut removed = 0;
        if mode == SubmitMode::Replace {
            for pick in self.store.user_picks_for_week(user_id, season, week) {
                if named.contains(&pick.game_id) {
                    continue;
                }
                let still_open = self
                    .store
                    .get_game(pick.game_id)
                    .map(|g| !g.is_locked(now))
                    .unwrap_or(false);
                if still_open {
                    self.store.delete_pick(pick.id)?;
                    removed += 1;
                }
            }
        }

        info!(
            user_id,
            season,
            week,
            submitted,
            removed,
            rejected = rejected.len(),
            "picks submitted"
        );
        Ok(PickSubmitReport {
            submitted,
            removed,
            rejected,
        })
    }

    /// A user's picks for one week, ordered by kickoff
    pub fn get_for_week(&self, user_id: UserId, season: i32, week: u32) -> Vec<Pick> {
        let mut picks = self.store.user_picks_for_week(user_id, season, week);
        picks.sort_by_key(|p| self.store.get_game(p.game_id).map(|g| g.kickoff));
        picks
    }

    /// A user's picks for the whole season, ordered by week then kickoff
    pub fn get_for_season(&self, user_id: UserId, season: i32) -> Vec<Pick> {
        let mut picks = self.store.user_picks_for_season(user_id, season);
        picks.sort_by_key(|p| (p.week, self.store.get_game(p.game_id).map(|g| g.kickoff)));
        picks
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::catalog::{GameCatalog, SlateEntry};
    use crate::normalize::AliasNormalizer;
    use chrono::Duration;

    struct Fixture {
        store: Arc<Store>,
        ledger: PickLedger,
        game_ids: Vec<GameId>,
    }

    /// Three-game week-1 slate; `hours[i]` offsets each kickoff from now
    fn fixture(hours: [i64; 3]) -> Fixture {
        let store = Arc::new(Store::new());
        let normalizer: Arc<dyn TeamNormalizer> = Arc::new(AliasNormalizer::empty());
        let catalog = GameCatalog::new(store.clone(), normalizer.clone());

        let teams = [
            ("Ohio State", "Purdue", -7.5),
            ("Iowa", "Nebraska", -3.0),
            ("Oregon", "Washington", -6.5),
        ];
        let entries: Vec<SlateEntry> = teams
            .iter()
            .zip(hours)
            .map(|((favorite, underdog, line), h)| SlateEntry {
                favorite: favorite.to_string(),
                underdog: underdog.to_string(),
                line: *line,
                kickoff: Utc::now() + Duration::hours(h),
                game_number: None,
                bowl_name: None,
            })
            .collect();
        catalog.sync_slate(2025, 1, &entries).unwrap();

        let mut game_ids = vec![0; 3];
        for game in store.games_for_week(2025, 1) {
            let idx = teams
                .iter()
                .position(|(favorite, _, _)| *favorite == game.favorite)
                .unwrap();
            game_ids[idx] = game.id;
        }

        let ledger = PickLedger::new(store.clone(), normalizer);
        Fixture {
            store,
            ledger,
            game_ids,
        }
    }

    fn selection(game_id: GameId, team: &str) -> PickSelection {
        PickSelection {
            game_id,
            team: team.to_string(),
        }
    }

    #[test]
    fn test_valid_selections_upsert_one_pick_per_game() {
        let f = fixture([5, 5, 5]);
        let report = f
            .ledger
            .submit(
                1,
                2025,
                1,
                &[selection(f.game_ids[0], "Purdue")],
                SubmitMode::Merge,
            )
            .unwrap();
        assert_eq!(report.submitted, 1);

        // Resubmitting the same game flips the side instead of adding a row
        f.ledger
            .submit(
                1,
                2025,
                1,
                &[selection(f.game_ids[0], "Ohio State")],
                SubmitMode::Merge,
            )
            .unwrap();

        let picks = f.store.user_picks_for_week(1, 2025, 1);
        assert_eq!(picks.len(), 1);
        assert_eq!(picks[0].selected_team, "Ohio State");
        assert!(picks[0].updated_at.is_some());
    }

    #[test]
    fn test_rejections_are_per_selection_not_abort_all() {
        let f = fixture([5, -2, 5]);
        let report = f
            .ledger
            .submit(
                1,
                2025,
                1,
                &[
                    selection(f.game_ids[0], "Purdue"),
                    selection(f.game_ids[1], "Iowa"), // locked
                    selection(f.game_ids[2], "Slippery Rock"), // not a side
                    selection(9999, "Oregon"), // no such game
                ],
                SubmitMode::Replace,
            )
            .unwrap();

        assert_eq!(report.submitted, 1);
        assert_eq!(report.rejected.len(), 3);
        assert!(report
            .rejected
            .iter()
            .any(|r| matches!(r, Rejection::Locked { game_id, .. } if *game_id == f.game_ids[1])));
        assert!(report
            .rejected
            .iter()
            .any(|r| matches!(r, Rejection::InvalidTeam { team, .. } if team == "Slippery Rock")));
        assert!(report
            .rejected
            .iter()
            .any(|r| matches!(r, Rejection::GameNotFound { game_id } if *game_id == 9999)));
        assert_eq!(f.store.user_picks_for_week(1, 2025, 1).len(), 1);
    }

    #[test]
    fn test_replace_unpicks_omitted_unlocked_games() {
        let f = fixture([5, 5, 5]);
        f.ledger
            .submit(
                1,
                2025,
                1,
                &[
                    selection(f.game_ids[0], "Purdue"),
                    selection(f.game_ids[1], "Iowa"),
                ],
                SubmitMode::Replace,
            )
            .unwrap();

        // Resubmission omits game 1: that pick is an unpick
        let report = f
            .ledger
            .submit(
                1,
                2025,
                1,
                &[selection(f.game_ids[0], "Purdue")],
                SubmitMode::Replace,
            )
            .unwrap();

        assert_eq!(report.removed, 1);
        let picks = f.store.user_picks_for_week(1, 2025, 1);
        assert_eq!(picks.len(), 1);
        assert_eq!(picks[0].game_id, f.game_ids[0]);
    }

    #[test]
    fn test_replace_spares_picks_on_locked_games() {
        let f = fixture([5, 5, 5]);
        f.ledger
            .submit(
                1,
                2025,
                1,
                &[
                    selection(f.game_ids[0], "Purdue"),
                    selection(f.game_ids[1], "Iowa"),
                ],
                SubmitMode::Replace,
            )
            .unwrap();

        // Game 1 kicks off before the resubmission
        let mut game = f.store.get_game(f.game_ids[1]).unwrap();
        game.kickoff = Utc::now() - Duration::hours(1);
        f.store.update_game(game).unwrap();

        let report = f
            .ledger
            .submit(
                1,
                2025,
                1,
                &[selection(f.game_ids[0], "Ohio State")],
                SubmitMode::Replace,
            )
            .unwrap();

        // Stored picks after resubmission = locked old picks + new valid picks
        assert_eq!(report.removed, 0);
        let picks = f.store.user_picks_for_week(1, 2025, 1);
        assert_eq!(picks.len(), 2);
    }

    #[test]
    fn test_rejected_selection_still_shields_its_old_pick() {
        let f = fixture([5, 5, 5]);
        f.ledger
            .submit(
                1,
                2025,
                1,
                &[selection(f.game_ids[0], "Purdue")],
                SubmitMode::Replace,
            )
            .unwrap();

        // The game is named in the batch but the new side is invalid; the
        // stored pick must survive the Replace sweep
        let report = f
            .ledger
            .submit(
                1,
                2025,
                1,
                &[selection(f.game_ids[0], "Slippery Rock")],
                SubmitMode::Replace,
            )
            .unwrap();

        assert_eq!(report.submitted, 0);
        assert_eq!(report.removed, 0);
        let picks = f.store.user_picks_for_week(1, 2025, 1);
        assert_eq!(picks.len(), 1);
        assert_eq!(picks[0].selected_team, "Purdue");
    }

    #[test]
    fn test_merge_leaves_omitted_picks_untouched() {
        let f = fixture([5, 5, 5]);
        f.ledger
            .submit(
                1,
                2025,
                1,
                &[
                    selection(f.game_ids[0], "Purdue"),
                    selection(f.game_ids[1], "Iowa"),
                ],
                SubmitMode::Replace,
            )
            .unwrap();

        let report = f
            .ledger
            .submit(
                1,
                2025,
                1,
                &[selection(f.game_ids[2], "Oregon")],
                SubmitMode::Merge,
            )
            .unwrap();

        assert_eq!(report.removed, 0);
        assert_eq!(f.store.user_picks_for_week(1, 2025, 1).len(), 3);
    }

    #[test]
    fn test_week_projection_is_ordered_by_kickoff() {
        let f = fixture([9, 2, 5]);
        f.ledger
            .submit(
                1,
                2025,
                1,
                &[
                    selection(f.game_ids[0], "Purdue"),
                    selection(f.game_ids[1], "Iowa"),
                    selection(f.game_ids[2], "Oregon"),
                ],
                SubmitMode::Replace,
            )
            .unwrap();

        let picks = f.ledger.get_for_week(1, 2025, 1);
        assert_eq!(
            picks.iter().map(|p| p.game_id).collect::<Vec<_>>(),
            vec![f.game_ids[1], f.game_ids[2], f.game_ids[0]]
        );
    }
}
