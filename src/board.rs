use std::fmt;

use crate::state::{GameState, Side};

/// A square on the board as `(row, col)`, row 0 at the top.
pub type Point = (usize, usize);

/// A diagonal-advance race on the dark squares of an N x N checkerboard.
///
/// Side one starts on the top rows and moves down, side two starts on the
/// bottom rows and moves up. A pawn steps one square diagonally forward onto an
/// empty dark square. There are no captures and no promotion; a pawn that
/// reaches the far row stays there. The game ends when the side to move is
/// blocked or every pawn of one side has arrived.
///
/// This is the concrete collaborator the driver and tests search over; it keeps
/// the [`GameState`] contract (clone is a full copy, positive score favours side
/// one) without pulling in draughts rules.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Board {
    pub size: usize,
    num_of_pawns: usize,
    cells: Vec<Option<Side>>,
    p1_pawns: Vec<Point>,
    p2_pawns: Vec<Point>,
    start_progress: [usize; 2],
    total_moves: u32,
}

impl Board {
    /// Set up a board with `num_of_pawns` per side, filling dark squares row by
    /// row from each side's home edge. The two middle rows always stay empty;
    /// pawns that do not fit are dropped.
    pub fn new(size: usize, num_of_pawns: usize) -> Self {
        let mut board = Self {
            size,
            num_of_pawns: 0,
            cells: vec![None; size * size],
            p1_pawns: Vec::with_capacity(num_of_pawns),
            p2_pawns: Vec::with_capacity(num_of_pawns),
            start_progress: [0, 0],
            total_moves: 0,
        };

        let half = size.saturating_sub(2) / 2;
        let dark = |&(r, c): &Point| (r + c) % 2 == 1;

        let top: Vec<Point> = (0..half)
            .flat_map(|r| (0..size).map(move |c| (r, c)))
            .filter(dark)
            .take(num_of_pawns)
            .collect();
        let bottom: Vec<Point> = (size - half..size)
            .rev()
            .flat_map(|r| (0..size).map(move |c| (r, c)))
            .filter(dark)
            .take(num_of_pawns)
            .collect();

        let placed = top.len().min(bottom.len());
        for &pt in &top[..placed] {
            board.place(pt, Side::One);
        }
        for &pt in &bottom[..placed] {
            board.place(pt, Side::Two);
        }
        board.num_of_pawns = placed;
        board.start_progress = [board.total_progress(Side::One), board.total_progress(Side::Two)];
        board
    }

    fn idx(&self, (row, col): Point) -> usize {
        row * self.size + col
    }

    fn place(&mut self, pt: Point, side: Side) {
        let i = self.idx(pt);
        self.cells[i] = Some(side);
        match side {
            Side::One => self.p1_pawns.push(pt),
            Side::Two => self.p2_pawns.push(pt),
        }
    }

    pub fn get(&self, row: usize, col: usize) -> Option<Side> {
        if row >= self.size || col >= self.size {
            return None;
        }
        self.cells[self.idx((row, col))]
    }

    pub fn pawns(&self, side: Side) -> &[Point] {
        match side {
            Side::One => &self.p1_pawns,
            Side::Two => &self.p2_pawns,
        }
    }

    /// Row a pawn of `side` is trying to reach.
    fn goal_row(&self, side: Side) -> usize {
        match side {
            Side::One => self.size - 1,
            Side::Two => 0,
        }
    }

    /// Rows travelled from the home edge.
    fn progress(&self, side: Side, (row, _): Point) -> usize {
        match side {
            Side::One => row,
            Side::Two => self.size - 1 - row,
        }
    }

    fn total_progress(&self, side: Side) -> usize {
        self.pawns(side).iter().map(|&p| self.progress(side, p)).sum()
    }

    /// Number of `side`'s pawns on the far row.
    pub fn arrived(&self, side: Side) -> usize {
        let goal = self.goal_row(side);
        self.pawns(side).iter().filter(|p| p.0 == goal).count()
    }

    fn forward(&self, side: Side, (row, col): Point) -> Vec<Point> {
        let next_row = match side {
            Side::One if row + 1 < self.size => row + 1,
            Side::Two if row > 0 => row - 1,
            _ => return Vec::new(),
        };
        let mut out = Vec::with_capacity(2);
        if col > 0 {
            out.push((next_row, col - 1));
        }
        if col + 1 < self.size {
            out.push((next_row, col + 1));
        }
        out
    }
}

impl GameState for Board {
    type Move = Point;

    fn movable_pawns(&self, side: Side) -> Vec<usize> {
        (0..self.pawns(side).len())
            .filter(|&i| !self.legal_moves(side, i).is_empty())
            .collect()
    }

    fn legal_moves(&self, side: Side, pawn: usize) -> Vec<Point> {
        let Some(&from) = self.pawns(side).get(pawn) else {
            return Vec::new();
        };
        self.forward(side, from)
            .into_iter()
            .filter(|&(r, c)| self.get(r, c).is_none())
            .collect()
    }

    fn apply_move(&mut self, side: Side, pawn: usize, mv: &Point) {
        let from = self.pawns(side)[pawn];
        let from_idx = self.idx(from);
        let to_idx = self.idx(*mv);
        self.cells[from_idx] = None;
        self.cells[to_idx] = Some(side);
        match side {
            Side::One => self.p1_pawns[pawn] = *mv,
            Side::Two => self.p2_pawns[pawn] = *mv,
        }
        self.total_moves += 1;
    }

    fn is_terminal(&self) -> bool {
        if self.num_of_pawns == 0 {
            return true;
        }
        if self.arrived(Side::One) == self.p1_pawns.len()
            || self.arrived(Side::Two) == self.p2_pawns.len()
        {
            return true;
        }
        self.movable_pawns(Side::to_move(self.total_moves)).is_empty()
    }

    /// Advancement difference normalised to `[-1, 1]`.
    fn score(&self) -> f64 {
        if self.num_of_pawns == 0 || self.size < 2 {
            return 0.0;
        }
        let gained_one = self.total_progress(Side::One) - self.start_progress[0];
        let gained_two = self.total_progress(Side::Two) - self.start_progress[1];
        let span = (self.num_of_pawns * (self.size - 1)) as f64;
        (gained_one as f64 - gained_two as f64) / span
    }

    fn total_moves(&self) -> u32 {
        self.total_moves
    }

    fn board_size(&self) -> usize {
        self.size
    }

    fn pawn_count(&self) -> usize {
        self.num_of_pawns
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in 0..self.size {
            for col in 0..self.size {
                let ch = match self.get(row, col) {
                    Some(Side::One) => 'X',
                    Some(Side::Two) => 'O',
                    None => '.',
                };
                write!(f, "{ch} ")?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initial_layout() {
        let board = Board::new(8, 12);
        assert_eq!(board.pawn_count(), 12);
        assert_eq!(board.pawns(Side::One).len(), 12);
        assert_eq!(board.pawns(Side::Two).len(), 12);
        // Pawns sit on dark squares only.
        for &(r, c) in board.pawns(Side::One).iter().chain(board.pawns(Side::Two)) {
            assert_eq!((r + c) % 2, 1);
        }
        assert_eq!(board.total_moves(), 0);
        assert!(!board.is_terminal());
    }

    #[test]
    fn test_pawns_capped_by_half_board() {
        let board = Board::new(6, 50);
        // Two rows of three dark squares per side.
        assert_eq!(board.pawn_count(), 6);
        assert!(!board.is_terminal());
    }

    #[test]
    fn test_side_one_moves_down() {
        let board = Board::new(6, 6);
        let movable = board.movable_pawns(Side::One);
        assert!(!movable.is_empty());
        for pawn in movable {
            let (row, _) = board.pawns(Side::One)[pawn];
            for (r, _) in board.legal_moves(Side::One, pawn) {
                assert_eq!(r, row + 1);
            }
        }
    }

    #[test]
    fn test_apply_move_updates_counter_and_cells() {
        let mut board = Board::new(6, 6);
        let pawn = board.movable_pawns(Side::One)[0];
        let from = board.pawns(Side::One)[pawn];
        let to = board.legal_moves(Side::One, pawn)[0];

        board.apply_move(Side::One, pawn, &to);

        assert_eq!(board.total_moves(), 1);
        assert_eq!(board.get(from.0, from.1), None);
        assert_eq!(board.get(to.0, to.1), Some(Side::One));
        assert!(board.score() > 0.0);
    }

    #[test]
    fn test_clone_is_independent() {
        let board = Board::new(6, 6);
        let mut copy = board.clone();
        let pawn = copy.movable_pawns(Side::One)[0];
        let to = copy.legal_moves(Side::One, pawn)[0];
        copy.apply_move(Side::One, pawn, &to);
        assert_eq!(board.total_moves(), 0);
        assert_ne!(board, copy);
    }

    #[test]
    fn test_empty_board_is_terminal() {
        let board = Board::new(8, 0);
        assert!(board.is_terminal());
        assert_eq!(board.score(), 0.0);
    }

    #[test]
    fn test_display() {
        let board = Board::new(6, 6);
        let text = board.to_string();
        assert_eq!(text.lines().count(), 6);
        assert_eq!(text.matches('X').count(), 6);
        assert_eq!(text.matches('O').count(), 6);
    }
}
