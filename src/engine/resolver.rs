//! Pure result resolution: final score + line in, spread and outright
//! outcomes out. No storage access, no clock.

/// Which side of a game a computation refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Favorite,
    Underdog,
}

/// Outcome of applying the spread to a final score. Exactly one of
/// `winner == Some(..)` or `push` holds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpreadOutcome {
    pub winner: Option<Side>,
    pub push: bool,
}

/// Apply the line to a final score.
///
/// The line carries the sign: negative when the favorite is favored, so a
/// -7.5 favorite must win by 8 or more to cover. `adjusted = margin + line`;
/// positive means the favorite covered, negative the underdog, zero a push
/// (only possible on whole-number lines).
pub fn resolve_spread(favorite_score: i32, underdog_score: i32, line: f64) -> SpreadOutcome {
    let margin = (favorite_score - underdog_score) as f64;
    let adjusted = margin + line;
    if adjusted > 0.0 {
        SpreadOutcome {
            winner: Some(Side::Favorite),
            push: false,
        }
    } else if adjusted < 0.0 {
        SpreadOutcome {
            winner: Some(Side::Underdog),
            push: false,
        }
    } else {
        SpreadOutcome {
            winner: None,
            push: true,
        }
    }
}

/// Outright winner from the raw scores. A tie yields no winner rather than
/// an error; ties are rare but real.
pub fn resolve_outright(favorite_score: i32, underdog_score: i32) -> Option<Side> {
    if favorite_score > underdog_score {
        Some(Side::Favorite)
    } else if underdog_score > favorite_score {
        Some(Side::Underdog)
    } else {
        None
    }
}
