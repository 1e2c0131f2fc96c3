//! Zobrist hashing of positions, with incremental per-move updates.
//!
//! The keys are generated from a fixed seed so hashes are deterministic
//! across runs, which is what the transposition-table determinism tests
//! rely on.

use crate::engine::Move;
use crate::logic::board::{Board, Color, PieceKind, Position, ThreatMode, BOARD_SIZE, NUM_PIECE_KINDS};
use std::sync::OnceLock;

/// Pocket counts at or above this value are not hashed.
pub const MAX_POCKET_COUNT: usize = 32;

pub struct ZobristKeys {
    /// Indexed `[kind][color][file * 8 + rank]`.
    piece: [[[u64; BOARD_SIZE * BOARD_SIZE]; 2]; NUM_PIECE_KINDS],
    /// Indexed `[side][kind][count]`, counts clamped below `MAX_POCKET_COUNT`.
    pocket: [[[u64; MAX_POCKET_COUNT]; NUM_PIECE_KINDS]; 2],
    side: [u64; 2],
}

#[inline]
fn next_random_u64(state: &mut u64) -> u64 {
    // splitmix64
    *state = state.wrapping_add(0x9E37_79B9_7F4A_7C15);
    let mut z = *state;
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

impl ZobristKeys {
    fn new() -> Self {
        let mut seed: u64 = 0x9E37_79B9_7F4A_7C15;

        let mut piece = [[[0u64; BOARD_SIZE * BOARD_SIZE]; 2]; NUM_PIECE_KINDS];
        for kind in &mut piece {
            for color in kind {
                for square in color {
                    *square = next_random_u64(&mut seed);
                }
            }
        }

        let mut pocket = [[[0u64; MAX_POCKET_COUNT]; NUM_PIECE_KINDS]; 2];
        for side in &mut pocket {
            for kind in side {
                for count in kind {
                    *count = next_random_u64(&mut seed);
                }
            }
        }

        let side = [next_random_u64(&mut seed), next_random_u64(&mut seed)];

        Self { piece, pocket, side }
    }

    pub fn get() -> &'static Self {
        static INSTANCE: OnceLock<ZobristKeys> = OnceLock::new();
        INSTANCE.get_or_init(ZobristKeys::new)
    }

    #[inline]
    pub fn piece_key(&self, kind: PieceKind, color: Color, file: usize, rank: usize) -> u64 {
        self.piece[kind.index()][color.index()][file * BOARD_SIZE + rank]
    }

    #[inline]
    pub const fn side_key(&self, color: Color) -> u64 {
        self.side[color.index()]
    }

    /// XORs the pocket term for `count` pieces of `kind`; counts outside the
    /// clamped range contribute nothing.
    #[inline]
    fn xor_pocket(&self, hash: &mut u64, side: Color, kind: PieceKind, count: i32) {
        if (0..MAX_POCKET_COUNT as i32).contains(&count) {
            *hash ^= self.pocket[side.index()][kind.index()][count as usize];
        }
    }

    /// Full hash of a position: every occupied cell, both pockets' current
    /// counts, and the side to move.
    #[must_use]
    pub fn hash(&self, position: &Position) -> u64 {
        let mut h = 0u64;
        for (file, column) in position.board.iter().enumerate() {
            for (rank, cell) in column.iter().enumerate() {
                if let Some(piece) = cell {
                    h ^= self.piece_key(piece.kind, piece.color, file, rank);
                }
            }
        }
        for side in [Color::White, Color::Black] {
            for kind in PieceKind::ALL {
                self.xor_pocket(&mut h, side, kind, position.pocket(side)[kind.index()]);
            }
        }
        h ^ self.side_key(position.side_to_move)
    }

    /// Shifts a pocket term from `old` to `new` pieces of `kind`.
    #[inline]
    fn move_pocket_count(&self, hash: &mut u64, side: Color, kind: PieceKind, old: i32, new: i32) {
        self.xor_pocket(hash, side, kind, old);
        self.xor_pocket(hash, side, kind, new);
    }

    /// Applies the incremental hash effect of `mv` to `hash`.
    ///
    /// Call this *before* `Board::apply` (it reads the pre-move board) and
    /// again, with identical arguments, *after* `Board::undo`; the XOR
    /// structure makes the second call restore the original hash.
    pub fn update_for_move(&self, hash: &mut u64, mv: &Move, board: &Board, player: Color) {
        *hash ^= self.side_key(player);
        *hash ^= self.side_key(player.opposite());

        match *mv {
            Move::Board { threat, from, to, .. } => match threat {
                ThreatMode::Shift => {
                    // Both pieces leave their squares and reappear swapped.
                    let a = board.at(from.file, from.rank).copied();
                    let b = board.at(to.file, to.rank).copied();
                    if let Some(a) = a {
                        *hash ^= self.piece_key(a.kind, a.color, from.file, from.rank);
                        *hash ^= self.piece_key(a.kind, a.color, to.file, to.rank);
                    }
                    if let Some(b) = b {
                        *hash ^= self.piece_key(b.kind, b.color, to.file, to.rank);
                        *hash ^= self.piece_key(b.kind, b.color, from.file, from.rank);
                    }
                }
                ThreatMode::Catch => {
                    // Capture without moving: the attacker's term is untouched.
                    self.remove_victim(hash, board, to.file, to.rank, player);
                }
                _ => {
                    if let Some(attacker) = board.at(from.file, from.rank) {
                        *hash ^= self.piece_key(attacker.kind, attacker.color, from.file, from.rank);
                        self.remove_victim(hash, board, to.file, to.rank, player);
                        *hash ^= self.piece_key(attacker.kind, attacker.color, to.file, to.rank);
                    }
                }
            },
            Move::Promotion {
                threat,
                from,
                to,
                promoted,
                ..
            } => match threat {
                ThreatMode::Catch => {
                    self.remove_victim(hash, board, to.file, to.rank, player);
                }
                _ => {
                    if let Some(attacker) = board.at(from.file, from.rank) {
                        *hash ^= self.piece_key(attacker.kind, attacker.color, from.file, from.rank);
                        self.remove_victim(hash, board, to.file, to.rank, player);
                        *hash ^= self.piece_key(promoted, attacker.color, to.file, to.rank);
                    }
                }
            },
            Move::Drop { color, at, kind } => {
                let old = board.pocket(color)[kind.index()];
                self.move_pocket_count(hash, color, kind, old, (old - 1).max(0));
                *hash ^= self.piece_key(kind, color, at.file, at.rank);
            }
            // Royalty is not hashed.
            Move::Succession { .. } => {}
            Move::Disguise { color, at, kind } => {
                if let Some(old) = board.at(at.file, at.rank) {
                    *hash ^= self.piece_key(old.kind, color, at.file, at.rank);
                    *hash ^= self.piece_key(kind, color, at.file, at.rank);
                }
            }
        }
    }

    /// Removes the victim's square term and credits the capturer's pocket.
    fn remove_victim(&self, hash: &mut u64, board: &Board, file: usize, rank: usize, capturer: Color) {
        if let Some(victim) = board.at(file, rank) {
            *hash ^= self.piece_key(victim.kind, victim.color, file, rank);
            let old = board.pocket(capturer)[victim.kind.index()];
            let new = (old + 1).min(MAX_POCKET_COUNT as i32 - 1);
            self.move_pocket_count(hash, capturer, victim.kind, old, new);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logic::board::{Piece, Square};
    use crate::logic::generator;

    fn armed(color: Color, kind: PieceKind) -> Piece {
        Piece::with_stacks(color, kind, 0, 10)
    }

    #[test]
    fn test_keys_are_deterministic() {
        let keys = ZobristKeys::get();
        let h1 = keys.hash(&Position::start());
        let h2 = keys.hash(&Position::start());
        assert_eq!(h1, h2);
        assert_ne!(h1, 0);
    }

    #[test]
    fn test_side_to_move_changes_hash() {
        let keys = ZobristKeys::get();
        let mut pos = Position::start();
        let white = keys.hash(&pos);
        pos.side_to_move = Color::Black;
        assert_ne!(white, keys.hash(&pos));
    }

    #[test]
    fn test_involution_over_every_family() {
        let keys = ZobristKeys::get();

        let mut pos = Position::empty();
        pos.board[4][0] = Some(armed(Color::White, PieceKind::King));
        pos.board[4][7] = Some(armed(Color::Black, PieceKind::King));
        pos.board[0][0] = Some(armed(Color::White, PieceKind::Rook));
        pos.board[0][6] = Some(armed(Color::Black, PieceKind::Pawn));
        pos.board[2][2] = Some(armed(Color::White, PieceKind::Grasshopper));
        pos.board[2][4] = Some(armed(Color::Black, PieceKind::Knight));
        pos.white_pocket[PieceKind::Ferz.index()] = 2;
        let mut board = Board::from_position(&pos);
        let mut hash = keys.hash(&pos);
        let initial = hash;

        let mut candidates = Vec::new();
        candidates.extend(generator::drops(&board, Color::White));
        candidates.extend(generator::moves_of(&board, Color::White, 0, 0, false));
        candidates.extend(generator::moves_of(&board, Color::White, 2, 2, false));
        candidates.extend(generator::successions(&board, Color::White));
        assert!(!candidates.is_empty());

        for mv in candidates {
            keys.update_for_move(&mut hash, &mv, &board, Color::White);
            board.apply(&mv);
            board.undo();
            keys.update_for_move(&mut hash, &mv, &board, Color::White);
            assert_eq!(hash, initial, "hash not restored after {mv:?}");
            assert_eq!(board.position(), &pos, "board not restored after {mv:?}");
        }
    }

    #[test]
    fn test_incremental_capture_matches_recompute() {
        let keys = ZobristKeys::get();
        let mut pos = Position::empty();
        pos.board[4][0] = Some(armed(Color::White, PieceKind::King));
        pos.board[4][7] = Some(armed(Color::Black, PieceKind::King));
        pos.board[0][0] = Some(armed(Color::White, PieceKind::Rook));
        pos.board[0][5] = Some(armed(Color::Black, PieceKind::Bishop));
        let mut board = Board::from_position(&pos);
        let mut hash = keys.hash(&pos);

        let capture = Move::Board {
            color: Color::White,
            threat: ThreatMode::TakeMove,
            from: Square { file: 0, rank: 0 },
            to: Square { file: 0, rank: 5 },
        };
        keys.update_for_move(&mut hash, &capture, &board, Color::White);
        board.apply(&capture);
        assert_eq!(hash, keys.hash(board.position()));
    }

    #[test]
    fn test_incremental_drop_matches_recompute() {
        let keys = ZobristKeys::get();
        let mut board = Board::new();
        let mut hash = keys.hash(board.position());

        let drop = Move::Drop {
            color: Color::White,
            at: Square { file: 4, rank: 0 },
            kind: PieceKind::King,
        };
        keys.update_for_move(&mut hash, &drop, &board, Color::White);
        board.apply(&drop);
        assert_eq!(hash, keys.hash(board.position()));
    }

    #[test]
    fn test_succession_does_not_touch_hash() {
        let keys = ZobristKeys::get();
        let mut pos = Position::empty();
        pos.board[3][3] = Some(armed(Color::White, PieceKind::Ferz));
        pos.board[4][7] = Some(armed(Color::Black, PieceKind::King));
        let board = Board::from_position(&pos);
        let before = keys.hash(&pos);

        let mv = Move::Succession {
            color: Color::White,
            at: Square { file: 3, rank: 3 },
        };
        let mut hash = before;
        keys.update_for_move(&mut hash, &mv, &board, Color::White);
        // Only the side key moved.
        assert_eq!(
            hash,
            before ^ keys.side_key(Color::White) ^ keys.side_key(Color::Black)
        );
    }

    #[test]
    fn test_pocket_counts_clamp() {
        let keys = ZobristKeys::get();
        let mut pos = Position::empty();
        pos.white_pocket[PieceKind::Pawn.index()] = MAX_POCKET_COUNT as i32 + 4;
        let clamped = keys.hash(&pos);
        pos.white_pocket[PieceKind::Pawn.index()] = MAX_POCKET_COUNT as i32 + 9;
        // Both counts are beyond the clamp: the hashes collide by design.
        assert_eq!(clamped, keys.hash(&pos));
    }
}
