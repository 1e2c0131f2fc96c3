use crate::engine::Move;
use crate::logic::generator;
use crate::logic::piece_specs;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const BOARD_SIZE: usize = 8;
pub const NUM_PIECE_KINDS: usize = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Color {
    White,
    Black,
}

impl Color {
    #[must_use]
    pub const fn opposite(self) -> Self {
        match self {
            Self::White => Self::Black,
            Self::Black => Self::White,
        }
    }

    pub const fn index(self) -> usize {
        match self {
            Self::White => 0,
            Self::Black => 1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PieceKind {
    King = 0,
    Queen = 1,
    Bishop = 2,
    Knight = 3,
    Rook = 4,
    Pawn = 5,
    Amazon = 6,
    Grasshopper = 7,
    Knightrider = 8,
    Archbishop = 9,
    Dababba = 10,
    Alfil = 11,
    Ferz = 12,
    Centaur = 13,
    Camel = 14,
    TempestRook = 15,
}

impl PieceKind {
    pub const ALL: [Self; NUM_PIECE_KINDS] = [
        Self::King,
        Self::Queen,
        Self::Bishop,
        Self::Knight,
        Self::Rook,
        Self::Pawn,
        Self::Amazon,
        Self::Grasshopper,
        Self::Knightrider,
        Self::Archbishop,
        Self::Dababba,
        Self::Alfil,
        Self::Ferz,
        Self::Centaur,
        Self::Camel,
        Self::TempestRook,
    ];

    pub const fn index(self) -> usize {
        self as usize
    }
}

/// How a move chunk interacts with the squares it reaches.
///
/// `Catch` captures without moving, `Take` captures and moves, `Move` never
/// captures, `TakeMove` is the orthodox sliding behaviour, `TakeJump` hops
/// the first piece on the line and lands one square beyond it, `Shift`
/// swaps places with the first piece on the line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ThreatMode {
    Catch,
    Take,
    Move,
    TakeMove,
    TakeJump,
    Shift,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Square {
    pub file: usize,
    pub rank: usize,
}

impl Square {
    pub fn new(file: usize, rank: usize) -> Option<Self> {
        if file < BOARD_SIZE && rank < BOARD_SIZE {
            Some(Self { file, rank })
        } else {
            None
        }
    }

    /// Builds a square from signed offsets, `None` when off the board.
    pub fn from_offsets(file: i32, rank: i32) -> Option<Self> {
        let file = usize::try_from(file).ok()?;
        let rank = usize::try_from(rank).ok()?;
        Self::new(file, rank)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Piece {
    pub color: Color,
    pub kind: PieceKind,
    pub stun_stack: i32,
    pub move_stack: i32,
    pub is_royal: bool,
}

impl Piece {
    /// A freshly created piece: registry stun value, no move stack, and
    /// royal only for kings.
    #[must_use]
    pub fn new(color: Color, kind: PieceKind) -> Self {
        Self {
            color,
            kind,
            stun_stack: piece_specs::initial_stun(kind),
            move_stack: 0,
            is_royal: kind == PieceKind::King,
        }
    }

    #[must_use]
    pub fn with_stacks(color: Color, kind: PieceKind, stun_stack: i32, move_stack: i32) -> Self {
        let mut piece = Self::new(color, kind);
        piece.set_stun(stun_stack);
        piece.set_move(move_stack);
        piece
    }

    pub fn set_stun(&mut self, stun: i32) {
        if stun >= 0 {
            self.stun_stack = stun;
        }
    }

    pub fn set_move(&mut self, moves: i32) {
        if moves >= 0 {
            self.move_stack = moves;
        }
    }

    /// Adjusts the stun stack, refusing changes that would go negative.
    pub fn add_stun(&mut self, delta: i32) {
        if self.stun_stack + delta >= 0 {
            self.stun_stack += delta;
        }
    }

    /// Adjusts the move stack, refusing changes that would go negative.
    pub fn add_move(&mut self, delta: i32) {
        if self.move_stack + delta >= 0 {
            self.move_stack += delta;
        }
    }
}

/// A self-contained game position: the unit of snapshot and restore.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Position {
    /// Indexed `[file][rank]`.
    pub board: [[Option<Piece>; BOARD_SIZE]; BOARD_SIZE],
    pub white_pocket: [i32; NUM_PIECE_KINDS],
    pub black_pocket: [i32; NUM_PIECE_KINDS],
    pub side_to_move: Color,
    /// Hand-built positions skip the opening drop restriction.
    #[serde(default)]
    pub is_custom: bool,
}

impl Position {
    /// The standard opening position: an empty board with the orthodox army
    /// waiting in each pocket.
    #[must_use]
    pub fn start() -> Self {
        let mut pocket = [0; NUM_PIECE_KINDS];
        pocket[PieceKind::King.index()] = 1;
        pocket[PieceKind::Queen.index()] = 1;
        pocket[PieceKind::Bishop.index()] = 2;
        pocket[PieceKind::Knight.index()] = 2;
        pocket[PieceKind::Rook.index()] = 2;
        pocket[PieceKind::Pawn.index()] = 8;
        Self {
            board: [[None; BOARD_SIZE]; BOARD_SIZE],
            white_pocket: pocket,
            black_pocket: pocket,
            side_to_move: Color::White,
            is_custom: false,
        }
    }

    /// An empty custom position: no pieces on board or in pocket.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            board: [[None; BOARD_SIZE]; BOARD_SIZE],
            white_pocket: [0; NUM_PIECE_KINDS],
            black_pocket: [0; NUM_PIECE_KINDS],
            side_to_move: Color::White,
            is_custom: true,
        }
    }

    #[must_use]
    pub fn pocket(&self, color: Color) -> &[i32; NUM_PIECE_KINDS] {
        match color {
            Color::White => &self.white_pocket,
            Color::Black => &self.black_pocket,
        }
    }

    pub fn pocket_mut(&mut self, color: Color) -> &mut [i32; NUM_PIECE_KINDS] {
        match color {
            Color::White => &mut self.white_pocket,
            Color::Black => &mut self.black_pocket,
        }
    }

    #[must_use]
    pub fn at(&self, file: usize, rank: usize) -> Option<&Piece> {
        self.board.get(file)?.get(rank)?.as_ref()
    }
}

impl Default for Position {
    fn default() -> Self {
        Self::start()
    }
}

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlacementError {
    #[error("square is off the board")]
    OutOfBounds,
    #[error("square is already occupied")]
    SquareOccupied,
    #[error("no such piece left in the pocket")]
    NotInPocket,
    #[error("a promotable piece cannot be dropped on a promotion square")]
    PromotableSquare,
}

/// The working board: a position plus the move log and the snapshot stack
/// that backs `undo`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Board {
    position: Position,
    log: Vec<Move>,
    snapshots: Vec<Position>,
}

impl Default for Board {
    fn default() -> Self {
        Self::new()
    }
}

impl Board {
    #[must_use]
    pub fn new() -> Self {
        Self::from_position(&Position::start())
    }

    #[must_use]
    pub fn from_position(position: &Position) -> Self {
        Self {
            position: position.clone(),
            log: Vec::new(),
            snapshots: Vec::new(),
        }
    }

    #[must_use]
    pub fn position(&self) -> &Position {
        &self.position
    }

    #[must_use]
    pub const fn side_to_move(&self) -> Color {
        self.position.side_to_move
    }

    #[must_use]
    pub fn is_custom(&self) -> bool {
        self.position.is_custom
    }

    #[must_use]
    pub fn log_len(&self) -> usize {
        self.log.len()
    }

    #[must_use]
    pub fn snapshot_count(&self) -> usize {
        self.snapshots.len()
    }

    /// Cell accessor; out-of-range coordinates read as empty.
    #[must_use]
    pub fn at(&self, file: usize, rank: usize) -> Option<&Piece> {
        self.position.at(file, rank)
    }

    #[must_use]
    pub fn pocket(&self, color: Color) -> &[i32; NUM_PIECE_KINDS] {
        self.position.pocket(color)
    }

    /// Seeds one of each fairy kind into both pockets.
    pub fn add_variant_pool(&mut self) {
        for kind in [
            PieceKind::Amazon,
            PieceKind::Grasshopper,
            PieceKind::Knightrider,
            PieceKind::Archbishop,
            PieceKind::Dababba,
            PieceKind::Alfil,
            PieceKind::Ferz,
            PieceKind::Centaur,
            PieceKind::Camel,
            PieceKind::TempestRook,
        ] {
            self.position.white_pocket[kind.index()] += 1;
            self.position.black_pocket[kind.index()] += 1;
        }
    }

    /// Takes a piece from `color`'s pocket and places it on an empty square.
    /// Promotable pieces may not be placed directly on a promotion square.
    pub fn place_piece(
        &mut self,
        color: Color,
        kind: PieceKind,
        file: usize,
        rank: usize,
    ) -> Result<(), PlacementError> {
        let at = Square::new(file, rank).ok_or(PlacementError::OutOfBounds)?;
        if self.position.at(file, rank).is_some() {
            return Err(PlacementError::SquareOccupied);
        }
        if self.position.pocket(color)[kind.index()] <= 0 {
            return Err(PlacementError::NotInPocket);
        }
        let spec = piece_specs::get(kind, color);
        if spec.is_promotable && spec.promotable_squares.contains(&at) {
            return Err(PlacementError::PromotableSquare);
        }

        self.position.pocket_mut(color)[kind.index()] -= 1;
        let mut piece = Piece::new(color, kind);
        piece.set_stun(piece_specs::placement_stun(kind, color, rank));
        self.position.board[file][rank] = Some(piece);
        Ok(())
    }

    /// Bulk stack adjustment over every piece of one color.
    pub fn stack_control(&mut self, color: Color, d_stun: i32, d_move: i32) {
        for file in self.position.board.iter_mut() {
            for cell in file.iter_mut() {
                if let Some(piece) = cell {
                    if piece.color == color {
                        piece.add_stun(d_stun);
                        piece.add_move(d_move);
                    }
                }
            }
        }
    }

    /// Applies a move for the side to move. The move must come from the
    /// generator's output for that side; anything else is a silent no-op.
    pub fn apply(&mut self, mv: &Move) {
        let side = self.position.side_to_move;
        let legal = match mv {
            Move::Board { from, .. } | Move::Promotion { from, .. } => {
                generator::moves_of(self, side, from.file, from.rank, false)
            }
            Move::Drop { .. } => generator::drops(self, side),
            Move::Succession { .. } => generator::successions(self, side),
            Move::Disguise { .. } => generator::disguises(self, side),
        };
        if !legal.contains(mv) {
            return;
        }

        self.snapshots.push(self.position.clone());

        match *mv {
            Move::Board {
                color,
                threat,
                from,
                to,
            } => self.apply_board_move(color, threat, from, to),
            Move::Promotion {
                color,
                threat,
                from,
                to,
                promoted,
            } => {
                self.apply_board_move(color, threat, from, to);
                if threat != ThreatMode::Catch {
                    self.position.board[to.file][to.rank] = Some(Piece::new(color, promoted));
                }
            }
            Move::Drop { color, at, kind } => {
                let _ = self.place_piece(color, kind, at.file, at.rank);
            }
            Move::Succession { at, .. } => {
                if let Some(piece) = self.position.board[at.file][at.rank].as_mut() {
                    piece.is_royal = true;
                }
            }
            // The disguise family is an external collaborator; its generator
            // is empty here, so this arm is unreachable through `apply`.
            Move::Disguise { .. } => {}
        }

        self.log.push(*mv);
        self.position.side_to_move = side.opposite();
    }

    fn apply_board_move(&mut self, color: Color, threat: ThreatMode, from: Square, to: Square) {
        match threat {
            ThreatMode::Catch => self.capture_to_pocket(color, to),
            ThreatMode::Shift => {
                let a = self.position.board[from.file][from.rank].take();
                let b = self.position.board[to.file][to.rank].take();
                self.position.board[from.file][from.rank] = b;
                self.position.board[to.file][to.rank] = a;
            }
            ThreatMode::Move | ThreatMode::Take | ThreatMode::TakeMove | ThreatMode::TakeJump => {
                self.capture_to_pocket(color, to);
                let piece = self.position.board[from.file][from.rank].take();
                self.position.board[to.file][to.rank] = piece;
            }
        }
    }

    /// Removes the piece on `at` (if any) and credits its kind to the
    /// capturer's pocket. The incremental hash performs the matching pocket
    /// update, so the two stay in sync.
    fn capture_to_pocket(&mut self, capturer: Color, at: Square) {
        if let Some(victim) = self.position.board[at.file][at.rank].take() {
            self.position.pocket_mut(capturer)[victim.kind.index()] += 1;
        }
    }

    /// Restores the most recent snapshot. With no snapshot available, pops
    /// the log entry and still flips the side to move.
    pub fn undo(&mut self) {
        match self.snapshots.pop() {
            Some(previous) => {
                self.position = previous;
                self.log.pop();
            }
            None => {
                self.log.pop();
                self.position.side_to_move = self.position.side_to_move.opposite();
            }
        }
    }

    fn has_royal(&self, color: Color) -> bool {
        self.position
            .board
            .iter()
            .flatten()
            .any(|cell| matches!(cell, Some(p) if p.color == color && p.is_royal))
    }

    /// Royal oracle: a side has lost once it has no royal on the board and
    /// no king left in its pocket to crown.
    #[must_use]
    pub fn victory(&self) -> Option<Color> {
        let king = PieceKind::King.index();
        let white_alive = self.has_royal(Color::White) || self.position.white_pocket[king] > 0;
        let black_alive = self.has_royal(Color::Black) || self.position.black_pocket[king] > 0;
        match (white_alive, black_alive) {
            (true, false) => Some(Color::White),
            (false, true) => Some(Color::Black),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn armed(color: Color, kind: PieceKind) -> Piece {
        Piece::with_stacks(color, kind, 0, 10)
    }

    #[test]
    fn test_start_pockets() {
        let pos = Position::start();
        assert_eq!(pos.white_pocket[PieceKind::King.index()], 1);
        assert_eq!(pos.white_pocket[PieceKind::Pawn.index()], 8);
        assert_eq!(pos.white_pocket[PieceKind::Amazon.index()], 0);
        assert_eq!(pos.white_pocket, pos.black_pocket);
        assert!(pos.board.iter().flatten().all(Option::is_none));
    }

    #[test]
    fn test_fresh_piece_defaults() {
        let king = Piece::new(Color::White, PieceKind::King);
        assert!(king.is_royal);
        assert_eq!(king.stun_stack, 4);
        assert_eq!(king.move_stack, 0);

        let queen = Piece::new(Color::Black, PieceKind::Queen);
        assert!(!queen.is_royal);
        assert_eq!(queen.stun_stack, 9);
    }

    #[test]
    fn test_stack_guards() {
        let mut piece = Piece::new(Color::White, PieceKind::Ferz);
        piece.add_stun(-5);
        assert_eq!(piece.stun_stack, 1);
        piece.add_stun(-1);
        assert_eq!(piece.stun_stack, 0);
        piece.set_move(-3);
        assert_eq!(piece.move_stack, 0);
        piece.add_move(2);
        assert_eq!(piece.move_stack, 2);
    }

    #[test]
    fn test_apply_undo_roundtrip() {
        let mut pos = Position::empty();
        pos.board[4][0] = Some(armed(Color::White, PieceKind::King));
        pos.board[4][7] = Some(armed(Color::Black, PieceKind::King));
        let mut board = Board::from_position(&pos);
        let saved = board.position().clone();

        let moves = generator::moves_of(&board, Color::White, 4, 0, false);
        assert!(!moves.is_empty());
        board.apply(&moves[0]);
        assert_eq!(board.side_to_move(), Color::Black);
        assert_eq!(board.log_len(), 1);
        assert_eq!(board.snapshot_count(), 1);

        board.undo();
        assert_eq!(board.position(), &saved);
        assert_eq!(board.log_len(), 0);
        assert_eq!(board.snapshot_count(), 0);
    }

    #[test]
    fn test_illegal_apply_is_noop() {
        let mut pos = Position::empty();
        pos.board[4][0] = Some(armed(Color::White, PieceKind::King));
        pos.board[4][7] = Some(armed(Color::Black, PieceKind::King));
        let mut board = Board::from_position(&pos);
        let saved = board.position().clone();

        // King cannot reach the far corner in one step.
        let mv = Move::Board {
            color: Color::White,
            threat: ThreatMode::TakeMove,
            from: Square { file: 4, rank: 0 },
            to: Square { file: 0, rank: 7 },
        };
        board.apply(&mv);
        assert_eq!(board.position(), &saved);
        assert_eq!(board.log_len(), 0);
    }

    #[test]
    fn test_capture_credits_pocket() {
        let mut pos = Position::empty();
        pos.board[0][0] = Some(armed(Color::White, PieceKind::Rook));
        pos.board[0][5] = Some(armed(Color::Black, PieceKind::Knight));
        pos.board[7][7] = Some(armed(Color::Black, PieceKind::King));
        pos.board[7][0] = Some(armed(Color::White, PieceKind::King));
        let mut board = Board::from_position(&pos);

        let mv = Move::Board {
            color: Color::White,
            threat: ThreatMode::TakeMove,
            from: Square { file: 0, rank: 0 },
            to: Square { file: 0, rank: 5 },
        };
        board.apply(&mv);
        assert_eq!(board.pocket(Color::White)[PieceKind::Knight.index()], 1);
        assert_eq!(
            board.at(0, 5).map(|p| (p.color, p.kind)),
            Some((Color::White, PieceKind::Rook))
        );
        assert!(board.at(0, 0).is_none());
    }

    #[test]
    fn test_succession_crowns_piece() {
        let mut pos = Position::empty();
        pos.board[3][3] = Some(armed(Color::White, PieceKind::Ferz));
        pos.board[7][7] = Some(armed(Color::Black, PieceKind::King));
        let mut board = Board::from_position(&pos);

        let mv = Move::Succession {
            color: Color::White,
            at: Square { file: 3, rank: 3 },
        };
        board.apply(&mv);
        assert!(board.at(3, 3).map(|p| p.is_royal).unwrap_or(false));
    }

    #[test]
    fn test_place_piece_validation() {
        let mut board = Board::new();
        assert_eq!(
            board.place_piece(Color::White, PieceKind::Amazon, 3, 3),
            Err(PlacementError::NotInPocket)
        );
        // Pawns promote on the last rank, so they may not start there.
        assert_eq!(
            board.place_piece(Color::White, PieceKind::Pawn, 3, 7),
            Err(PlacementError::PromotableSquare)
        );
        assert!(board.place_piece(Color::White, PieceKind::Pawn, 3, 3).is_ok());
        assert_eq!(
            board.place_piece(Color::White, PieceKind::Pawn, 3, 3),
            Err(PlacementError::SquareOccupied)
        );
        assert_eq!(board.pocket(Color::White)[PieceKind::Pawn.index()], 7);
    }

    #[test]
    fn test_pawn_placement_stun_by_rank() {
        let mut board = Board::new();
        board.place_piece(Color::White, PieceKind::Pawn, 0, 1).unwrap();
        board.place_piece(Color::White, PieceKind::Pawn, 1, 6).unwrap();
        board.place_piece(Color::Black, PieceKind::Pawn, 2, 6).unwrap();
        assert_eq!(board.at(0, 1).unwrap().stun_stack, 7);
        assert_eq!(board.at(1, 6).unwrap().stun_stack, 2);
        assert_eq!(board.at(2, 6).unwrap().stun_stack, 7);
    }

    #[test]
    fn test_victory_requires_no_royal_and_no_pocket_king() {
        // Start: both kings still in pocket, nobody has lost.
        let board = Board::new();
        assert_eq!(board.victory(), None);

        let mut pos = Position::empty();
        pos.board[4][7] = Some(armed(Color::Black, PieceKind::King));
        let board = Board::from_position(&pos);
        assert_eq!(board.victory(), Some(Color::Black));

        // A pocketed king keeps the side alive even with an empty board.
        let mut pos = Position::empty();
        pos.white_pocket[PieceKind::King.index()] = 1;
        pos.board[4][7] = Some(armed(Color::Black, PieceKind::King));
        let board = Board::from_position(&pos);
        assert_eq!(board.victory(), None);
    }

    #[test]
    fn test_stack_control_by_color() {
        let mut pos = Position::empty();
        pos.board[0][0] = Some(Piece::with_stacks(Color::White, PieceKind::Rook, 2, 0));
        pos.board[1][0] = Some(Piece::with_stacks(Color::Black, PieceKind::Rook, 2, 0));
        let mut board = Board::from_position(&pos);

        board.stack_control(Color::White, -1, 1);
        assert_eq!(board.at(0, 0).unwrap().stun_stack, 1);
        assert_eq!(board.at(0, 0).unwrap().move_stack, 1);
        assert_eq!(board.at(1, 0).unwrap().stun_stack, 2);
        assert_eq!(board.at(1, 0).unwrap().move_stack, 0);
    }

    #[test]
    fn test_undo_fallback_without_snapshot() {
        let mut board = Board::new();
        assert_eq!(board.side_to_move(), Color::White);
        board.undo();
        assert_eq!(board.side_to_move(), Color::Black);
        board.undo();
        assert_eq!(board.side_to_move(), Color::White);
    }
}
