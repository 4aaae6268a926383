//! Property tests for board generation and the reveal state machine.
//!
//! Properties tested:
//! - Adjacency equals the number of mined Moore neighbours
//! - The first reveal never lands on a mine
//! - Revealed count never exceeds the number of safe cells
//! - Revealing a flagged or already revealed cell changes nothing
//! - Zero cells only ever border revealed cells after a flag-free cascade
//! - Save followed by load reproduces the session

use chrono::prelude::*;
use proptest::prelude::*;

use crate::*;

#[derive(Copy, Clone, Debug)]
enum Action {
    Reveal(Coord2),
    Flag(Coord2),
}

fn t0() -> DateTime<Utc> {
    DateTime::<Utc>::from_timestamp_millis(0).unwrap()
}

/// Valid configuration plus a seed and a cell on the board.
fn config_seed_cell() -> impl Strategy<Value = (GameConfig, u64, Coord2)> {
    (2u8..12, 2u8..12).prop_flat_map(|(rows, cols)| {
        let total = mult(rows, cols);
        (1..total, any::<u64>(), 0..rows, 0..cols).prop_map(move |(mines, seed, row, col)| {
            (GameConfig::new_unchecked((rows, cols), mines), seed, (row, col))
        })
    })
}

fn actions(size: Coord2) -> impl Strategy<Value = Vec<Action>> {
    let (rows, cols) = size;
    let coords = (0..rows, 0..cols);
    prop::collection::vec(
        prop_oneof![
            3 => coords.clone().prop_map(Action::Reveal),
            1 => coords.prop_map(Action::Flag),
        ],
        0..24,
    )
}

fn session_with_actions() -> impl Strategy<Value = (GameSession, Vec<Action>)> {
    config_seed_cell().prop_flat_map(|(config, seed, _)| {
        let session = GameSession::new_at(config, seed, t0()).unwrap();
        (Just(session), actions(config.size))
    })
}

fn apply(session: &mut GameSession, action: Action) {
    match action {
        Action::Reveal(coords) => {
            session.reveal_at(coords, t0()).unwrap();
        }
        Action::Flag(coords) => {
            session.toggle_flag(coords).unwrap();
        }
    }
}

fn all_coords(size: Coord2) -> impl Iterator<Item = Coord2> {
    let (rows, cols) = size;
    (0..rows).flat_map(move |row| (0..cols).map(move |col| (row, col)))
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    /// Property: adjacency is derived from the mine set
    #[test]
    fn prop_adjacency_counts_mined_neighbors((config, seed, excluded) in config_seed_cell()) {
        let board = Board::generate(config, Some(excluded), seed).unwrap();

        prop_assert_eq!(board.mine_count(), config.mines);
        prop_assert_eq!(board.mine_coords().len(), usize::from(config.mines));
        prop_assert!(!board.contains_mine(excluded));

        let (rows, cols) = config.size;
        for (row, col) in all_coords(config.size) {
            if board.contains_mine((row, col)) {
                prop_assert_eq!(board.adjacent_mines((row, col)), None);
                continue;
            }
            let mut expected = 0u8;
            for d_row in -1i16..=1 {
                for d_col in -1i16..=1 {
                    let (r, c) = (i16::from(row) + d_row, i16::from(col) + d_col);
                    if (d_row, d_col) == (0, 0)
                        || r < 0
                        || c < 0
                        || r >= i16::from(rows)
                        || c >= i16::from(cols)
                    {
                        continue;
                    }
                    if board.contains_mine((r as Coord, c as Coord)) {
                        expected += 1;
                    }
                }
            }
            prop_assert_eq!(board.adjacent_mines((row, col)), Some(expected));
        }
    }

    /// Property: first click is never a mine
    #[test]
    fn prop_first_reveal_is_safe((config, seed, first) in config_seed_cell()) {
        let mut session = GameSession::new_at(config, seed, t0()).unwrap();

        let result = session.reveal_at(first, t0()).unwrap();

        prop_assert_ne!(result.outcome, RevealOutcome::HitMine);
        prop_assert_eq!(session.cell_at(first), Some(CellState::Revealed));
        prop_assert!(!session.has_mine_at(first));
        prop_assert_eq!(session.turn_count(), 1);
    }

    /// Property: counters stay within bounds and agree with the grid
    #[test]
    fn prop_revealed_count_is_bounded((mut session, actions) in session_with_actions()) {
        for action in actions {
            apply(&mut session, action);

            let cells: Vec<_> = all_coords(session.size())
                .filter_map(|coords| session.cell_at(coords).map(|cell| (coords, cell)))
                .collect();
            let revealed_safe = cells
                .iter()
                .filter(|&&(coords, cell)| cell == CellState::Revealed && !session.has_mine_at(coords))
                .count();
            let flagged = cells.iter().filter(|&&(_, cell)| cell == CellState::Flagged).count();

            prop_assert!(session.revealed_count() <= session.config().safe_cell_count());
            prop_assert_eq!(usize::from(session.revealed_count()), revealed_safe);
            prop_assert_eq!(usize::from(session.flags_placed()), flagged);
            prop_assert_eq!(session.check_win(), session.status() == GameStatus::Won);
        }
    }

    /// Property: reveal is idempotent and blocked by flags
    #[test]
    fn prop_repeat_reveal_is_noop(
        (mut session, actions) in session_with_actions(),
        flag_first in any::<bool>(),
    ) {
        for action in actions {
            apply(&mut session, action);
        }

        for coords in all_coords(session.size()) {
            let state = session.cell_at(coords);
            if state == Some(CellState::Hidden) && !flag_first {
                continue;
            }
            if state == Some(CellState::Hidden) {
                session.toggle_flag(coords).unwrap();
            }

            let before = session.clone();
            let result = session.reveal_at(coords, t0()).unwrap();

            prop_assert_eq!(result.outcome, RevealOutcome::NoChange);
            prop_assert!(result.changed.is_empty());
            prop_assert_eq!(&session, &before);
        }
    }

    /// Property: a flag-free cascade leaves no hidden cell next to a revealed zero
    #[test]
    fn prop_cascade_closes_zero_regions((config, seed, first) in config_seed_cell()) {
        let mut session = GameSession::new_at(config, seed, t0()).unwrap();

        let result = session.reveal_at(first, t0()).unwrap();
        let board = session.board().unwrap().clone();

        for &coords in &result.changed {
            prop_assert!(!board.contains_mine(coords));
            prop_assert_eq!(session.cell_at(coords), Some(CellState::Revealed));
        }
        for coords in all_coords(config.size) {
            if session.cell_at(coords) != Some(CellState::Revealed) {
                continue;
            }
            if board.adjacent_mines(coords) == Some(0) {
                for neighbor in board.iter_neighbors(coords) {
                    prop_assert_eq!(session.cell_at(neighbor), Some(CellState::Revealed));
                }
            }
        }
    }

    /// Property: save then load is lossless for unfinished games
    #[test]
    fn prop_save_load_round_trips((mut session, actions) in session_with_actions()) {
        for action in actions {
            apply(&mut session, action);
        }
        let mut store = MemoryStore::new();

        persist::save(&mut store, &session).unwrap();

        if session.is_finished() {
            prop_assert!(store.is_empty());
        } else {
            prop_assert_eq!(persist::load(&store), Some(session));
        }
    }
}
