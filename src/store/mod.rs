//! In-memory relational store backing the engine.
//!
//! Tables are plain maps behind one `RwLock`; the write lock is the
//! transaction-isolation boundary, so each store call is one logical
//! transaction. Ids are auto-incremented. The one unique index the engine
//! relies on is `users.external_id`, which surfaces
//! [`StoreError::UniqueViolation`] on conflicting inserts.

use crate::error::StoreError;
use crate::models::{
    BowlGame, BowlGameId, BowlPick, BowlPickId, Game, GameId, Pick, PickId, User, UserId,
};
use chrono::Utc;
use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

#[derive(Debug, Default)]
struct Tables {
    games: HashMap<GameId, Game>,
    bowl_games: HashMap<BowlGameId, BowlGame>,
    picks: HashMap<PickId, Pick>,
    bowl_picks: HashMap<BowlPickId, BowlPick>,
    users: HashMap<UserId, User>,
    next_id: i64,
}

impl Tables {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }
}

/// Shared store handle. Cheap to share behind an `Arc`; all methods take
/// `&self` and return owned rows.
#[derive(Debug, Default)]
pub struct Store {
    tables: RwLock<Tables>,
}

impl Store {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RwLockReadGuard<'_, Tables> {
        self.tables.read().expect("store lock poisoned")
    }

    fn write(&self) -> RwLockWriteGuard<'_, Tables> {
        self.tables.write().expect("store lock poisoned")
    }

    // --- games ---

    /// Insert a game, assigning its id
    pub fn insert_game(&self, mut game: Game) -> Game {
        let mut t = self.write();
        game.id = t.next_id();
        t.games.insert(game.id, game.clone());
        game
    }

    pub fn update_game(&self, game: Game) -> Result<(), StoreError> {
        let mut t = self.write();
        if !t.games.contains_key(&game.id) {
            return Err(StoreError::RowNotFound);
        }
        t.games.insert(game.id, game);
        Ok(())
    }

    pub fn get_game(&self, id: GameId) -> Option<Game> {
        self.read().games.get(&id).cloned()
    }

    /// All games for one weekly slate, ordered by kickoff
    pub fn games_for_week(&self, season: i32, week: u32) -> Vec<Game> {
        let mut games: Vec<Game> = self
            .read()
            .games
            .values()
            .filter(|g| g.season == season && g.week == week)
            .cloned()
            .collect();
        games.sort_by_key(|g| g.kickoff);
        games
    }

    pub fn games_for_season(&self, season: i32) -> Vec<Game> {
        let mut games: Vec<Game> = self
            .read()
            .games
            .values()
            .filter(|g| g.season == season)
            .cloned()
            .collect();
        games.sort_by_key(|g| (g.week, g.kickoff));
        games
    }

    // --- bowl games ---

    pub fn insert_bowl_game(&self, mut game: BowlGame) -> BowlGame {
        let mut t = self.write();
        game.id = t.next_id();
        t.bowl_games.insert(game.id, game.clone());
        game
    }

    pub fn update_bowl_game(&self, game: BowlGame) -> Result<(), StoreError> {
        let mut t = self.write();
        if !t.bowl_games.contains_key(&game.id) {
            return Err(StoreError::RowNotFound);
        }
        t.bowl_games.insert(game.id, game);
        Ok(())
    }

    pub fn get_bowl_game(&self, id: BowlGameId) -> Option<BowlGame> {
        self.read().bowl_games.get(&id).cloned()
    }

    /// The bowl slate for one season, ordered by game number
    pub fn bowl_games_for_season(&self, season: i32) -> Vec<BowlGame> {
        let mut games: Vec<BowlGame> = self
            .read()
            .bowl_games
            .values()
            .filter(|g| g.season == season)
            .cloned()
            .collect();
        games.sort_by_key(|g| g.game_number);
        games
    }

    // --- picks ---

    pub fn insert_pick(&self, mut pick: Pick) -> Pick {
        let mut t = self.write();
        pick.id = t.next_id();
        t.picks.insert(pick.id, pick.clone());
        pick
    }

    pub fn update_pick(&self, pick: Pick) -> Result<(), StoreError> {
        let mut t = self.write();
        if !t.picks.contains_key(&pick.id) {
            return Err(StoreError::RowNotFound);
        }
        t.picks.insert(pick.id, pick);
        Ok(())
    }

    pub fn delete_pick(&self, id: PickId) -> Result<(), StoreError> {
        let mut t = self.write();
        t.picks.remove(&id).map(|_| ()).ok_or(StoreError::RowNotFound)
    }

    /// The at-most-one pick a user holds on a game
    pub fn find_pick(&self, user_id: UserId, game_id: GameId) -> Option<Pick> {
        self.read()
            .picks
            .values()
            .find(|p| p.user_id == user_id && p.game_id == game_id)
            .cloned()
    }

    pub fn user_picks_for_week(&self, user_id: UserId, season: i32, week: u32) -> Vec<Pick> {
        self.read()
            .picks
            .values()
            .filter(|p| p.user_id == user_id && p.season == season && p.week == week)
            .cloned()
            .collect()
    }

    pub fn user_picks_for_season(&self, user_id: UserId, season: i32) -> Vec<Pick> {
        self.read()
            .picks
            .values()
            .filter(|p| p.user_id == user_id && p.season == season)
            .cloned()
            .collect()
    }

    pub fn all_picks_for_week(&self, season: i32, week: u32) -> Vec<Pick> {
        self.read()
            .picks
            .values()
            .filter(|p| p.season == season && p.week == week)
            .cloned()
            .collect()
    }

    pub fn all_picks_for_season(&self, season: i32) -> Vec<Pick> {
        self.read()
            .picks
            .values()
            .filter(|p| p.season == season)
            .cloned()
            .collect()
    }

    // --- bowl picks ---

    pub fn insert_bowl_pick(&self, mut pick: BowlPick) -> BowlPick {
        let mut t = self.write();
        pick.id = t.next_id();
        t.bowl_picks.insert(pick.id, pick.clone());
        pick
    }

    pub fn update_bowl_pick(&self, pick: BowlPick) -> Result<(), StoreError> {
        let mut t = self.write();
        if !t.bowl_picks.contains_key(&pick.id) {
            return Err(StoreError::RowNotFound);
        }
        t.bowl_picks.insert(pick.id, pick);
        Ok(())
    }

    pub fn find_bowl_pick(&self, user_id: UserId, bowl_game_id: BowlGameId) -> Option<BowlPick> {
        self.read()
            .bowl_picks
            .values()
            .find(|p| p.user_id == user_id && p.bowl_game_id == bowl_game_id)
            .cloned()
    }

    pub fn user_bowl_picks(&self, user_id: UserId, season: i32) -> Vec<BowlPick> {
        self.read()
            .bowl_picks
            .values()
            .filter(|p| p.user_id == user_id && p.season == season)
            .cloned()
            .collect()
    }

    pub fn all_bowl_picks(&self, season: i32) -> Vec<BowlPick> {
        self.read()
            .bowl_picks
            .values()
            .filter(|p| p.season == season)
            .cloned()
            .collect()
    }

    // --- users ---

    /// Insert a user. Fails with [`StoreError::UniqueViolation`] when the
    /// external id is already taken, which callers are expected to recover
    /// from by re-reading (see `IdentityResolver`).
    pub fn insert_user(
        &self,
        external_id: &str,
        email: &str,
        display_name: &str,
    ) -> Result<User, StoreError> {
        let mut t = self.write();
        if t.users.values().any(|u| u.external_id == external_id) {
            return Err(StoreError::UniqueViolation(format!(
                "users.external_id = {}",
                external_id
            )));
        }
        let user = User {
            id: t.next_id(),
            external_id: external_id.to_string(),
            email: email.to_string(),
            display_name: display_name.to_string(),
            created_at: Utc::now(),
        };
        t.users.insert(user.id, user.clone());
        Ok(user)
    }

    pub fn get_user(&self, id: UserId) -> Option<User> {
        self.read().users.get(&id).cloned()
    }

    pub fn find_user_by_external_id(&self, external_id: &str) -> Option<User> {
        self.read()
            .users
            .values()
            .find(|u| u.external_id == external_id)
            .cloned()
    }

    pub fn all_users(&self) -> Vec<User> {
        let mut users: Vec<User> = self.read().users.values().cloned().collect();
        users.sort_by_key(|u| u.id);
        users
    }
}
