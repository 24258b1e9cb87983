//! Standings are computed views: every read folds the stored picks against
//! the catalog from scratch. Nothing here is persisted.
//!
//! Scoring rule, applied per graded pick: a push is worth half a win and is
//! counted separately; a cover match is a win; anything else is a loss.
//! Games without a result are excluded from every total.

use crate::models::{BowlGame, Game, GameId, Pick, PickResult, UserId};
use crate::store::Store;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

/// One row of the weekly leaderboard
#[derive(Debug, Clone, Serialize)]
pub struct WeeklyStanding {
    pub user_id: UserId,
    pub display_name: String,
    /// Cover wins plus half a point per push
    pub wins: f64,
    pub losses: u32,
    pub pushes: u32,
    /// wins / (wins + losses) as a percentage, one decimal
    pub win_pct: f64,
}

/// One row of the season leaderboard
#[derive(Debug, Clone, Serialize)]
pub struct SeasonStanding {
    pub user_id: UserId,
    pub display_name: String,
    pub wins: f64,
    pub losses: u32,
    pub pushes: u32,
    pub win_pct: f64,
    /// Weeks where every graded pick covered
    pub perfect_weeks: u32,
}

/// One row of the bowl leaderboard
#[derive(Debug, Clone, Serialize)]
pub struct BowlStanding {
    pub user_id: UserId,
    pub display_name: String,
    /// Sum of confidence weights on correct spread picks
    pub points: u32,
    /// Sum of every weight the user assigned, correct or not
    pub max_points: u32,
    pub spread_wins: u32,
    pub pushes: u32,
    /// Outright calls that hit, independent of the spread outcome
    pub outright_wins: u32,
    /// points / max_points as a percentage, one decimal
    pub points_pct: f64,
}

/// One pick in a user's history view, joined with its game
#[derive(Debug, Clone, Serialize)]
pub struct PickLine {
    pub game_id: GameId,
    pub favorite: String,
    pub underdog: String,
    pub line: f64,
    pub kickoff: DateTime<Utc>,
    pub selected_team: String,
    /// None until the game has a result
    pub result: Option<PickResult>,
}

/// A user's picks for one week of the history view
#[derive(Debug, Clone, Serialize)]
pub struct WeekHistory {
    pub week: u32,
    pub picks: Vec<PickLine>,
}

#[derive(Debug, Default, Clone, Copy)]
struct Tally {
    wins: f64,
    losses: u32,
    pushes: u32,
    graded: u32,
}

impl Tally {
    fn apply(&mut self, result: PickResult) {
        self.graded += 1;
        match result {
            PickResult::Win => self.wins += 1.0,
            PickResult::Loss => self.losses += 1,
            PickResult::Push => {
                self.wins += 0.5;
                self.pushes += 1;
            }
        }
    }

    fn win_pct(&self) -> f64 {
        let denominator = self.wins + self.losses as f64;
        if denominator == 0.0 {
            return 0.0;
        }
        round_one_decimal(self.wins / denominator * 100.0)
    }
}

fn round_one_decimal(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Grade one pick against its game. None while the game has no result.
fn grade_pick(game: &Game, selected_team: &str) -> Option<PickResult> {
    if !game.has_result() {
        return None;
    }
    if game.push == Some(true) {
        return Some(PickResult::Push);
    }
    match game.spread_winner.as_deref() {
        Some(winner) if winner == selected_team => Some(PickResult::Win),
        Some(_) => Some(PickResult::Loss),
        None => None,
    }
}

/// A week is perfect when the user graded at least one pick, lost none, and
/// every graded pick covered. The threshold is the week's actual graded pick
/// count, so it scales with whatever slate size a week really has. Pushes
/// break perfection because they only earn half a point.
fn is_perfect_week(tally: &Tally) -> bool {
    tally.graded > 0 && tally.losses == 0 && tally.wins >= tally.graded as f64
}

pub struct LeaderboardAggregator {
    store: Arc<Store>,
}

impl LeaderboardAggregator {
    pub fn new(store: Arc<Store>) -> Self {
        Self { store }
    }

    fn display_name(&self, user_id: UserId) -> String {
        self.store
            .get_user(user_id)
            .map(|u| u.display_name)
            .unwrap_or_else(|| format!("user {}", user_id))
    }

    /// Weekly leaderboard: wins desc, losses asc, name asc
    pub fn weekly(&self, season: i32, week: u32) -> Vec<WeeklyStanding> {
        let games: HashMap<GameId, Game> = self
            .store
            .games_for_week(season, week)
            .into_iter()
            .map(|g| (g.id, g))
            .collect();

        let mut tallies: BTreeMap<UserId, Tally> = BTreeMap::new();
        for pick in self.store.all_picks_for_week(season, week) {
            let Some(game) = games.get(&pick.game_id) else {
                continue;
            };
            if let Some(result) = grade_pick(game, &pick.selected_team) {
                tallies.entry(pick.user_id).or_default().apply(result);
            }
        }

        let mut rows: Vec<WeeklyStanding> = tallies
            .into_iter()
            .map(|(user_id, tally)| WeeklyStanding {
                user_id,
                display_name: self.display_name(user_id),
                wins: tally.wins,
                losses: tally.losses,
                pushes: tally.pushes,
                win_pct: tally.win_pct(),
            })
            .collect();
        rows.sort_by(|a, b| {
            b.wins
                .partial_cmp(&a.wins)
                .unwrap_or(Ordering::Equal)
                .then(a.losses.cmp(&b.losses))
                .then(a.display_name.cmp(&b.display_name))
        });
        rows
    }

    /// Season leaderboard: the weekly fold applied across all weeks, plus
    /// the perfect-week count
    pub fn season(&self, season: i32) -> Vec<SeasonStanding> {
        let games: HashMap<GameId, Game> = self
            .store
            .games_for_season(season)
            .into_iter()
            .map(|g| (g.id, g))
            .collect();

        // Per (user, week) first so perfect weeks fall out of the same pass
        let mut week_tallies: BTreeMap<(UserId, u32), Tally> = BTreeMap::new();
        for pick in self.store.all_picks_for_season(season) {
            let Some(game) = games.get(&pick.game_id) else {
                continue;
            };
            if let Some(result) = grade_pick(game, &pick.selected_team) {
                week_tallies
                    .entry((pick.user_id, pick.week))
                    .or_default()
                    .apply(result);
            }
        }

        let mut totals: BTreeMap<UserId, (Tally, u32)> = BTreeMap::new();
        for ((user_id, _week), tally) in &week_tallies {
            let entry = totals.entry(*user_id).or_default();
            entry.0.wins += tally.wins;
            entry.0.losses += tally.losses;
            entry.0.pushes += tally.pushes;
            entry.0.graded += tally.graded;
            if is_perfect_week(tally) {
                entry.1 += 1;
            }
        }

        let mut rows: Vec<SeasonStanding> = totals
            .into_iter()
            .map(|(user_id, (tally, perfect_weeks))| SeasonStanding {
                user_id,
                display_name: self.display_name(user_id),
                wins: tally.wins,
                losses: tally.losses,
                pushes: tally.pushes,
                win_pct: tally.win_pct(),
                perfect_weeks,
            })
            .collect();
        rows.sort_by(|a, b| {
            b.wins
                .partial_cmp(&a.wins)
                .unwrap_or(Ordering::Equal)
                .then(a.losses.cmp(&b.losses))
                .then(a.display_name.cmp(&b.display_name))
        });
        rows
    }

    /// Bowl leaderboard: points desc, spread wins desc, outright wins desc,
    /// name asc
    pub fn bowl(&self, season: i32) -> Vec<BowlStanding> {
        let games: HashMap<i64, BowlGame> = self
            .store
            .bowl_games_for_season(season)
            .into_iter()
            .map(|g| (g.id, g))
            .collect();

        #[derive(Default)]
        struct BowlTally {
            points: u32,
            max_points: u32,
            spread_wins: u32,
            pushes: u32,
            outright_wins: u32,
        }

        let mut tallies: BTreeMap<UserId, BowlTally> = BTreeMap::new();
        for pick in self.store.all_bowl_picks(season) {
            let Some(game) = games.get(&pick.bowl_game_id) else {
                continue;
            };
            let tally = tallies.entry(pick.user_id).or_default();
            // Every assigned weight counts toward the ceiling, resolved or not
            tally.max_points += pick.confidence;

            if game.has_result() {
                if game.push == Some(true) {
                    // Pushes earn nothing but are visible in the row
                    tally.pushes += 1;
                } else if game.spread_winner.as_deref() == Some(pick.spread_pick.as_str()) {
                    tally.points += pick.confidence;
                    tally.spread_wins += 1;
                }
            }
            if let Some(outright) = game.outright_winner.as_deref() {
                if outright == pick.outright_pick {
                    tally.outright_wins += 1;
                }
            }
        }

        let mut rows: Vec<BowlStanding> = tallies
            .into_iter()
            .map(|(user_id, tally)| {
                let points_pct = if tally.max_points == 0 {
                    0.0
                } else {
                    round_one_decimal(tally.points as f64 / tally.max_points as f64 * 100.0)
                };
                BowlStanding {
                    user_id,
                    display_name: self.display_name(user_id),
                    points: tally.points,
                    max_points: tally.max_points,
                    spread_wins: tally.spread_wins,
                    pushes: tally.pushes,
                    outright_wins: tally.outright_wins,
                    points_pct,
                }
            })
            .collect();
        rows.sort_by(|a, b| {
            b.points
                .cmp(&a.points)
                .then(b.spread_wins.cmp(&a.spread_wins))
                .then(b.outright_wins.cmp(&a.outright_wins))
                .then(a.display_name.cmp(&b.display_name))
        });
        rows
    }

    /// Per-week, per-game breakdown of one user's season, for standings
    /// detail pages
    pub fn user_history(&self, user_id: UserId, season: i32) -> Vec<WeekHistory> {
        let games: HashMap<GameId, Game> = self
            .store
            .games_for_season(season)
            .into_iter()
            .map(|g| (g.id, g))
            .collect();

        let mut weeks: BTreeMap<u32, Vec<(Pick, &Game)>> = BTreeMap::new();
        for pick in self.store.user_picks_for_season(user_id, season) {
            let Some(game) = games.get(&pick.game_id) else {
                continue;
            };
            weeks.entry(pick.week).or_default().push((pick, game));
        }

        weeks
            .into_iter()
            .map(|(week, mut picks)| {
                picks.sort_by_key(|(_, game)| game.kickoff);
                WeekHistory {
                    week,
                    picks: picks
                        .into_iter()
                        .map(|(pick, game)| PickLine {
                            game_id: game.id,
                            favorite: game.favorite.clone(),
                            underdog: game.underdog.clone(),
                            line: game.line,
                            kickoff: game.kickoff,
                            result: grade_pick(game, &pick.selected_team),
                            selected_team: pick.selected_team,
                        })
                        .collect(),
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::bowl::{BowlPickLedger, BowlSelection};
    use crate::engine::catalog::{GameCatalog, SlateEntry};
    use crate::engine::picks::{PickLedger, PickSelection, SubmitMode};
    use crate::normalize::{AliasNormalizer, TeamNormalizer};
    use chrono::Duration;

    struct Fixture {
        store: Arc<Store>,
        catalog: GameCatalog,
        picks: PickLedger,
        bowls: BowlPickLedger,
        standings: LeaderboardAggregator,
    }

    fn fixture() -> Fixture {
        let store = Arc::new(Store::new());
        let normalizer: Arc<dyn TeamNormalizer> = Arc::new(AliasNormalizer::empty());
        Fixture {
            catalog: GameCatalog::new(store.clone(), normalizer.clone()),
            picks: PickLedger::new(store.clone(), normalizer.clone()),
            bowls: BowlPickLedger::new(store.clone(), normalizer),
            standings: LeaderboardAggregator::new(store.clone()),
            store,
        }
    }

    fn entry(favorite: &str, underdog: &str, line: f64, number: Option<u32>) -> SlateEntry {
        SlateEntry {
            favorite: favorite.to_string(),
            underdog: underdog.to_string(),
            line,
            kickoff: Utc::now() + Duration::hours(5),
            game_number: number,
            bowl_name: None,
        }
    }

    fn selection(game_id: GameId, team: &str) -> PickSelection {
        PickSelection {
            game_id,
            team: team.to_string(),
        }
    }

    /// Week-1 slate of three games with users Alice (id) and Bob (id) picking
    fn seed_week(f: &Fixture) -> (Vec<GameId>, UserId, UserId) {
        let alice = f.store.insert_user("a", "a@example.com", "Alice").unwrap().id;
        let bob = f.store.insert_user("b", "b@example.com", "Bob").unwrap().id;

        f.catalog
            .sync_slate(
                2025,
                1,
                &[
                    entry("Ohio State", "Purdue", -7.5, None),
                    entry("Iowa", "Nebraska", -3.0, None),
                    entry("Oregon", "Washington", -7.0, None),
                ],
            )
            .unwrap();
        let ids: Vec<GameId> = {
            let mut ids = vec![0; 3];
            for game in f.store.games_for_week(2025, 1) {
                let idx = ["Ohio State", "Iowa", "Oregon"]
                    .iter()
                    .position(|t| *t == game.favorite)
                    .unwrap();
                ids[idx] = game.id;
            }
            ids
        };

        f.picks
            .submit(
                alice,
                2025,
                1,
                &[
                    selection(ids[0], "Purdue"),
                    selection(ids[1], "Iowa"),
                    selection(ids[2], "Oregon"),
                ],
                SubmitMode::Replace,
            )
            .unwrap();
        f.picks
            .submit(
                bob,
                2025,
                1,
                &[
                    selection(ids[0], "Ohio State"),
                    selection(ids[1], "Iowa"),
                ],
                SubmitMode::Replace,
            )
            .unwrap();

        // Favorite wins 10-3 on -7.5 (underdog covers), favorite covers
        // 30-0 on -3, push at 21-14 on -7
        f.catalog.enter_result(ids[0], 10, 3, 99).unwrap();
        f.catalog.enter_result(ids[1], 30, 0, 99).unwrap();
        f.catalog.enter_result(ids[2], 21, 14, 99).unwrap();

        (ids, alice, bob)
    }

    #[test]
    fn test_weekly_standings_score_pushes_as_half_wins() {
        let f = fixture();
        let (_, alice, bob) = seed_week(&f);

        let rows = f.standings.weekly(2025, 1);
        assert_eq!(rows.len(), 2);

        // Alice: win (Purdue covers), win (Iowa covers), push = 2.5 wins
        assert_eq!(rows[0].user_id, alice);
        assert_eq!(rows[0].wins, 2.5);
        assert_eq!(rows[0].losses, 0);
        assert_eq!(rows[0].pushes, 1);
        assert_eq!(rows[0].win_pct, 100.0);

        // Bob: loss (laid the points), win = 1 win 1 loss
        assert_eq!(rows[1].user_id, bob);
        assert_eq!(rows[1].wins, 1.0);
        assert_eq!(rows[1].losses, 1);
        assert_eq!(rows[1].win_pct, 50.0);
    }

    #[test]
    fn test_unresolved_games_are_excluded_entirely() {
        let f = fixture();
        let alice = f.store.insert_user("a", "a@example.com", "Alice").unwrap().id;
        f.catalog
            .sync_slate(2025, 1, &[entry("Ohio State", "Purdue", -7.5, None)])
            .unwrap();
        let game_id = f.store.games_for_week(2025, 1)[0].id;
        f.picks
            .submit(
                alice,
                2025,
                1,
                &[selection(game_id, "Purdue")],
                SubmitMode::Replace,
            )
            .unwrap();

        // No result entered: no standings row at all
        assert!(f.standings.weekly(2025, 1).is_empty());
    }

    #[test]
    fn test_season_totals_equal_the_sum_of_weekly_totals() {
        let f = fixture();
        let (_, alice, _) = seed_week(&f);

        // Week 2: Alice goes 2-0 against the spread
        f.catalog
            .sync_slate(
                2025,
                2,
                &[
                    entry("Indiana", "Rutgers", -10.5, None),
                    entry("USC", "UCLA", -4.5, None),
                ],
            )
            .unwrap();
        let week2: Vec<GameId> = f
            .store
            .games_for_week(2025, 2)
            .iter()
            .map(|g| g.id)
            .collect();
        f.picks
            .submit(
                alice,
                2025,
                2,
                &week2
                    .iter()
                    .zip(["Indiana", "USC"])
                    .map(|(id, t)| selection(*id, t))
                    .collect::<Vec<_>>(),
                SubmitMode::Replace,
            )
            .unwrap();
        for id in &week2 {
            f.catalog.enter_result(*id, 28, 10, 99).unwrap();
        }

        let weekly_sum: f64 = (1..=2)
            .flat_map(|week| f.standings.weekly(2025, week))
            .filter(|row| row.user_id == alice)
            .map(|row| row.wins)
            .sum();
        let season = f.standings.season(2025);
        let alice_row = season.iter().find(|r| r.user_id == alice).unwrap();
        assert_eq!(alice_row.wins, weekly_sum);
        assert_eq!(alice_row.wins, 4.5);
    }

    #[test]
    fn test_perfect_weeks_use_the_actual_graded_count() {
        let f = fixture();
        let (_, alice, bob) = seed_week(&f);

        // Week 2 is a two-game slate Alice sweeps; smaller than week 1 but
        // still counts as perfect
        f.catalog
            .sync_slate(
                2025,
                2,
                &[
                    entry("Indiana", "Rutgers", -10.5, None),
                    entry("USC", "UCLA", -4.5, None),
                ],
            )
            .unwrap();
        let week2: Vec<GameId> = f
            .store
            .games_for_week(2025, 2)
            .iter()
            .map(|g| g.id)
            .collect();
        f.picks
            .submit(
                alice,
                2025,
                2,
                &week2
                    .iter()
                    .zip(["Indiana", "USC"])
                    .map(|(id, t)| selection(*id, t))
                    .collect::<Vec<_>>(),
                SubmitMode::Replace,
            )
            .unwrap();
        for id in &week2 {
            f.catalog.enter_result(*id, 28, 10, 99).unwrap();
        }

        let season = f.standings.season(2025);
        let alice_row = season.iter().find(|r| r.user_id == alice).unwrap();
        // Week 1 had a push (not perfect), week 2 was a sweep
        assert_eq!(alice_row.perfect_weeks, 1);

        let bob_row = season.iter().find(|r| r.user_id == bob).unwrap();
        assert_eq!(bob_row.perfect_weeks, 0);
    }

    #[test]
    fn test_bowl_points_and_ceiling() {
        let f = fixture();
        let alice = f.store.insert_user("a", "a@example.com", "Alice").unwrap().id;

        f.catalog
            .sync_bowl_slate(
                2025,
                &[
                    entry("Georgia", "Texas", -3.0, Some(1)),
                    entry("Oregon", "Clemson", -6.0, Some(2)),
                    entry("Michigan", "Alabama", -1.5, Some(3)),
                    entry("Penn State", "Notre Dame", -2.5, Some(4)),
                ],
            )
            .unwrap();
        let slate = f.store.bowl_games_for_season(2025);

        f.bowls
            .submit(
                alice,
                2025,
                &[
                    BowlSelection {
                        bowl_game_id: slate[0].id,
                        spread_pick: "Georgia".to_string(),
                        confidence: 3,
                        outright_pick: "Georgia".to_string(),
                    },
                    BowlSelection {
                        bowl_game_id: slate[1].id,
                        spread_pick: "Clemson".to_string(),
                        confidence: 1,
                        outright_pick: "Oregon".to_string(),
                    },
                    BowlSelection {
                        bowl_game_id: slate[2].id,
                        spread_pick: "Michigan".to_string(),
                        confidence: 2,
                        outright_pick: "Michigan".to_string(),
                    },
                    BowlSelection {
                        bowl_game_id: slate[3].id,
                        spread_pick: "Penn State".to_string(),
                        confidence: 4,
                        outright_pick: "Penn State".to_string(),
                    },
                ],
            )
            .unwrap();

        // Weight-3 pick hits (Georgia covers and wins), weight-1 pick hits
        // on the spread while the outright call also hits; the weight-2 pick
        // misses; the weight-4 game stays unplayed
        f.catalog.enter_bowl_result(slate[0].id, 27, 17, 99).unwrap();
        f.catalog.enter_bowl_result(slate[1].id, 28, 24, 99).unwrap();
        f.catalog.enter_bowl_result(slate[2].id, 21, 24, 99).unwrap();

        let rows = f.standings.bowl(2025);
        assert_eq!(rows.len(), 1);
        let row = &rows[0];
        assert_eq!(row.points, 4);
        assert_eq!(row.max_points, 10);
        assert_eq!(row.spread_wins, 2);
        // Georgia and Oregon won outright; Alabama beat Michigan
        assert_eq!(row.outright_wins, 2);
        assert_eq!(row.points_pct, 40.0);
    }

    #[test]
    fn test_bowl_push_earns_zero_points_but_is_counted() {
        let f = fixture();
        let alice = f.store.insert_user("a", "a@example.com", "Alice").unwrap().id;
        f.catalog
            .sync_bowl_slate(2025, &[entry("Georgia", "Texas", -3.0, Some(1))])
            .unwrap();
        let game_id = f.store.bowl_games_for_season(2025)[0].id;
        f.bowls
            .submit(
                alice,
                2025,
                &[BowlSelection {
                    bowl_game_id: game_id,
                    spread_pick: "Georgia".to_string(),
                    confidence: 1,
                    outright_pick: "Georgia".to_string(),
                }],
            )
            .unwrap();
        f.catalog.enter_bowl_result(game_id, 24, 21, 99).unwrap();

        let row = &f.standings.bowl(2025)[0];
        assert_eq!(row.points, 0);
        assert_eq!(row.pushes, 1);
        // The outright call still hit
        assert_eq!(row.outright_wins, 1);
        assert_eq!(row.max_points, 1);
    }

    #[test]
    fn test_user_history_grades_three_valued() {
        let f = fixture();
        let (ids, alice, _) = seed_week(&f);

        let history = f.standings.user_history(alice, 2025);
        assert_eq!(history.len(), 1);
        let week = &history[0];
        assert_eq!(week.week, 1);
        assert_eq!(week.picks.len(), 3);

        let by_game: HashMap<GameId, &PickLine> =
            week.picks.iter().map(|p| (p.game_id, p)).collect();
        assert_eq!(by_game[&ids[0]].result, Some(PickResult::Win));
        assert_eq!(by_game[&ids[1]].result, Some(PickResult::Win));
        assert_eq!(by_game[&ids[2]].result, Some(PickResult::Push));
    }
}
