use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use sweeper_core::{
    self as game, FileStore, FlagOutcome, GameConfig, GameError, GameSession, persist,
};

mod render;

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// What log level to use
    #[command(flatten)]
    verbose: clap_verbosity_flag::Verbosity,

    /// File holding the game in progress
    #[arg(long, default_value = FileStore::DEFAULT_FILE_NAME)]
    save: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start a new game, discarding any saved one
    New {
        #[arg(short, long, value_enum, default_value_t = Difficulty::Easy)]
        difficulty: Difficulty,

        /// Custom board height, overrides the difficulty
        #[arg(long, requires_all = ["cols", "mines"])]
        rows: Option<game::Coord>,

        /// Custom board width
        #[arg(long, requires_all = ["rows", "mines"])]
        cols: Option<game::Coord>,

        /// Custom mine count
        #[arg(long, requires_all = ["rows", "cols"])]
        mines: Option<game::CellCount>,

        /// Force a seed instead of random
        #[arg(short, long)]
        seed: Option<u64>,
    },
    /// Reveal a cell
    Reveal { row: game::Coord, col: game::Coord },
    /// Place or remove a flag
    Flag { row: game::Coord, col: game::Coord },
    /// Print the board
    Show,
    /// Print counters only
    Status,
}

#[derive(Copy, Clone, Debug, PartialEq, ValueEnum)]
enum Difficulty {
    Easy,
    Normal,
    Hard,
    Beginner,
    Intermediate,
    Expert,
}

impl Difficulty {
    const fn config(self) -> GameConfig {
        use Difficulty::*;
        match self {
            Easy => GameConfig::easy(),
            Normal => GameConfig::normal(),
            Hard => GameConfig::hard(),
            Beginner => GameConfig::beginner(),
            Intermediate => GameConfig::intermediate(),
            Expert => GameConfig::expert(),
        }
    }
}

fn load_existing(store: &FileStore) -> Result<GameSession> {
    match persist::load(store) {
        Some(session) => Ok(session),
        None => bail!(
            "no game in progress in {}, start one with `new`",
            store.path().display()
        ),
    }
}

/// Out-of-bounds input is ignored rather than treated as a failure.
fn ignore_out_of_bounds<T>(result: game::Result<T>, coords: game::Coord2) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(GameError::OutOfBounds) => {
            log::warn!("Ignoring move outside the board at {:?}", coords);
            None
        }
        Err(err) => {
            log::error!("Move at {:?} failed: {}", coords, err);
            None
        }
    }
}

fn run(args: Args) -> Result<()> {
    let mut store = FileStore::new(args.save);

    let (session, changed) = match args.command {
        Command::New {
            difficulty,
            rows,
            cols,
            mines,
            seed,
        } => {
            let config = match (rows, cols, mines) {
                (Some(rows), Some(cols), Some(mines)) => GameConfig::new((rows, cols), mines)
                    .with_context(|| format!("cannot play {rows}x{cols} with {mines} mines"))?,
                _ => difficulty.config(),
            };
            if let Some(started_at) = persist::saved_at(&store) {
                log::info!(
                    "Discarding saved game from {}",
                    started_at.format("%m-%d-%y %I:%M%p")
                );
            }
            let seed = seed.unwrap_or_else(rand::random);
            log::debug!("seed: {}", seed);
            (GameSession::new(config, seed)?, true)
        }
        Command::Reveal { row, col } => {
            let mut session = load_existing(&store)?;
            let result = ignore_out_of_bounds(session.reveal((row, col)), (row, col));
            if let Some(result) = &result {
                log::debug!("{:?}, {} cells changed", result.outcome, result.changed.len());
            }
            let changed = result.is_some_and(|result| result.outcome.has_update());
            (session, changed)
        }
        Command::Flag { row, col } => {
            let mut session = load_existing(&store)?;
            let outcome = ignore_out_of_bounds(session.toggle_flag((row, col)), (row, col));
            let changed = outcome.is_some_and(FlagOutcome::has_update);
            (session, changed)
        }
        Command::Show => (load_existing(&store)?, false),
        Command::Status => {
            let session = load_existing(&store)?;
            println!("{}", render::status_line(&session));
            return Ok(());
        }
    };

    print!("{}", render::board(&session));
    println!("{}", render::status_line(&session));

    if !changed {
        log::debug!("Nothing changed, keeping saved game");
    } else if persist::save(&mut store, &session).is_err() {
        log::warn!("Continuing without a saved game");
    }
    Ok(())
}

fn main() -> Result<()> {
    let args = Args::parse();
    env_logger::Builder::new()
        .filter_level(args.verbose.log_level_filter())
        .init();

    run(args)
}
