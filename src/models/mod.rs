use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub type GameId = i64;
pub type BowlGameId = i64;
pub type PickId = i64;
pub type BowlPickId = i64;
pub type UserId = i64;

/// A registered contest participant
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub external_id: String,
    pub email: String,
    pub display_name: String,
    pub created_at: DateTime<Utc>,
}

/// One scheduled game in a weekly slate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Game {
    pub id: GameId,
    pub season: i32,
    pub week: u32,
    pub favorite: String,
    pub underdog: String,
    /// Signed spread, negative when the favorite is favored (e.g. -7.5)
    pub line: f64,
    pub kickoff: DateTime<Utc>,
    pub favorite_score: Option<i32>,
    pub underdog_score: Option<i32>,
    pub spread_winner: Option<String>,
    pub push: Option<bool>,
    pub result_entered_at: Option<DateTime<Utc>>,
    pub result_entered_by: Option<UserId>,
}

impl Game {
    /// Locked games no longer accept picks. Derived from kickoff, never stored.
    pub fn is_locked(&self, now: DateTime<Utc>) -> bool {
        now >= self.kickoff
    }

    pub fn has_result(&self) -> bool {
        self.spread_winner.is_some() || self.push == Some(true)
    }

    /// Whether `team` is one of the two sides of this game
    pub fn has_side(&self, team: &str) -> bool {
        self.favorite == team || self.underdog == team
    }
}

/// One game of the once-per-season bowl slate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BowlGame {
    pub id: BowlGameId,
    pub season: i32,
    /// Fixed position in the slate, 1..N; defines the confidence-weight range
    pub game_number: u32,
    pub name: String,
    pub favorite: String,
    pub underdog: String,
    pub line: f64,
    pub kickoff: DateTime<Utc>,
    pub favorite_score: Option<i32>,
    pub underdog_score: Option<i32>,
    pub spread_winner: Option<String>,
    pub push: Option<bool>,
    pub outright_winner: Option<String>,
    pub result_entered_at: Option<DateTime<Utc>>,
    pub result_entered_by: Option<UserId>,
}

impl BowlGame {
    pub fn is_locked(&self, now: DateTime<Utc>) -> bool {
        now >= self.kickoff
    }

    pub fn has_result(&self) -> bool {
        self.spread_winner.is_some() || self.push == Some(true)
    }

    pub fn has_side(&self, team: &str) -> bool {
        self.favorite == team || self.underdog == team
    }
}

/// A participant's spread selection for one weekly game
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pick {
    pub id: PickId,
    pub user_id: UserId,
    pub game_id: GameId,
    pub selected_team: String,
    // Denormalized from the game for query efficiency
    pub season: i32,
    pub week: u32,
    pub submitted_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// A participant's selection for one bowl game: a spread side, a confidence
/// weight, and an outright winner
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BowlPick {
    pub id: BowlPickId,
    pub user_id: UserId,
    pub bowl_game_id: BowlGameId,
    pub spread_pick: String,
    pub confidence: u32,
    pub outright_pick: String,
    pub season: i32,
    pub submitted_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// How a single pick graded out against its game's result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PickResult {
    Win,
    Loss,
    Push,
}

/// Order-independent identity for a pairing of two teams. Used to match
/// ingested slate entries against stored games regardless of which side
/// was listed first.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MatchupKey(String);

impl MatchupKey {
    pub fn new(team_a: &str, team_b: &str) -> Self {
        let a = team_a.trim().to_lowercase();
        let b = team_b.trim().to_lowercase();
        if a <= b {
            MatchupKey(format!("{}|{}", a, b))
        } else {
            MatchupKey(format!("{}|{}", b, a))
        }
    }
}
