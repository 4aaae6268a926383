use sweeper_core::{CellState, Coord2, GameSession, GameStatus};

fn glyph(session: &GameSession, coords: Coord2) -> char {
    match session.cell_at(coords) {
        Some(CellState::Hidden) | None => '#',
        Some(CellState::Flagged) if session.is_misflagged(coords) => 'x',
        Some(CellState::Flagged) => 'F',
        Some(CellState::Exploded) => 'X',
        Some(CellState::Revealed) => match session.adjacent_mines(coords) {
            None => '*',
            Some(0) => '.',
            Some(count) => char::from(b'0' + count),
        },
    }
}

/// Text grid with row and column indices along the edges.
pub(crate) fn board(session: &GameSession) -> String {
    let (rows, cols) = session.size();
    let mut out = String::new();

    out.push_str("    ");
    for col in 0..cols {
        out.push_str(&format!("{:>3}", col));
    }
    out.push('\n');

    for row in 0..rows {
        out.push_str(&format!("{:>3} ", row));
        for col in 0..cols {
            out.push_str(&format!("{:>3}", glyph(session, (row, col))));
        }
        out.push('\n');
    }
    out
}

pub(crate) fn status_line(session: &GameSession) -> String {
    let status = match session.status() {
        GameStatus::Playing => "playing",
        GameStatus::Won => "you win",
        GameStatus::Lost => "game over",
    };
    format!(
        "{} | mines left: {} | time: {}s | turns: {}",
        status,
        session.mines_left(),
        session.elapsed_secs(),
        session.turn_count()
    )
}
