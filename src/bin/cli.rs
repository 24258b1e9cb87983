use anyhow::Result;
use cfb_pickem::{
    resolve_outright, resolve_spread, Engine, PickSelection, ResultEntry, Side, SlateEntry,
    SubmitMode,
};
use chrono::{Duration, Utc};
use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(about = "Pick'em contest engine utilities")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Grade a final score against a line
    Grade {
        /// Favorite's final score
        favorite_score: i32,
        /// Underdog's final score
        underdog_score: i32,
        /// Signed line, negative when the favorite is favored (e.g. -7.5)
        line: f64,
    },
    /// Run a small end-to-end contest and print the weekly standings
    Demo,
}

fn main() -> Result<()> {
    // Load environment variables
    dotenv::dotenv().ok();

    // Initialize logging
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    match cli.command {
        Command::Grade {
            favorite_score,
            underdog_score,
            line,
        } => grade(favorite_score, underdog_score, line),
        Command::Demo => demo(),
    }
}

fn grade(favorite_score: i32, underdog_score: i32, line: f64) -> Result<()> {
    let spread = resolve_spread(favorite_score, underdog_score, line);
    let side = |s: Side| match s {
        Side::Favorite => "favorite",
        Side::Underdog => "underdog",
    };

    println!(
        "Final {}-{} at {:+.1}:",
        favorite_score, underdog_score, line
    );
    match spread.winner {
        Some(winner) => println!("  Spread: {} covers", side(winner)),
        None => println!("  Spread: push"),
    }
    match resolve_outright(favorite_score, underdog_score) {
        Some(winner) => println!("  Outright: {} wins", side(winner)),
        None => println!("  Outright: tie"),
    }
    Ok(())
}

fn demo() -> Result<()> {
    let engine = Engine::in_memory();

    let alice = engine
        .identity
        .get_or_create("demo-alice", "alice@example.com", "Alice")?;
    let bob = engine
        .identity
        .get_or_create("demo-bob", "bob@example.com", "Bob")?;
    let admin = engine
        .identity
        .get_or_create("demo-admin", "admin@example.com", "Admin")?;

    let kickoff = Utc::now() + Duration::hours(1);
    let slate = [
        ("Ohio State", "Purdue", -7.5),
        ("Iowa", "Nebraska", -3.0),
        ("Oregon", "Washington", -7.0),
    ];
    let entries: Vec<SlateEntry> = slate
        .iter()
        .map(|(favorite, underdog, line)| SlateEntry {
            favorite: favorite.to_string(),
            underdog: underdog.to_string(),
            line: *line,
            kickoff,
            game_number: None,
            bowl_name: None,
        })
        .collect();
    let report = engine.catalog.sync_slate(2025, 1, &entries)?;
    println!("Synced {} games for week 1\n", report.synced);

    let games = engine.catalog.get_slate(2025, 1);
    let pick = |team: &str| -> PickSelection {
        let game = games.iter().find(|g| g.has_side(team)).unwrap();
        PickSelection {
            game_id: game.id,
            team: team.to_string(),
        }
    };

    engine.picks.submit(
        alice.id,
        2025,
        1,
        &[pick("Purdue"), pick("Iowa"), pick("Oregon")],
        SubmitMode::Replace,
    )?;
    engine.picks.submit(
        bob.id,
        2025,
        1,
        &[pick("Ohio State"), pick("Iowa")],
        SubmitMode::Replace,
    )?;

    // Favorite wins 10-3 but misses the 7.5, favorite rolls, push on -7
    let scores = [(10, 3), (30, 0), (21, 14)];
    let entries: Vec<ResultEntry> = games
        .iter()
        .zip(scores)
        .map(|(game, (favorite_score, underdog_score))| ResultEntry {
            game_id: game.id,
            favorite_score,
            underdog_score,
        })
        .collect();
    let report = engine.catalog.bulk_enter_results(&entries, admin.id);
    println!("Entered {} results\n", report.entered);

    println!("WEEK 1 STANDINGS\n");
    for (i, row) in engine.standings.weekly(2025, 1).iter().enumerate() {
        println!(
            "{}. {} | {}-{}-{} | {:.1}%",
            i + 1,
            row.display_name,
            row.wins,
            row.losses,
            row.pushes,
            row.win_pct
        );
    }

    Ok(())
}
