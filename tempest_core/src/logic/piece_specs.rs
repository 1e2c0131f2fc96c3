//! Static movement rules, keyed by `(kind, color)`.
//!
//! Each entry lists the piece's move chunks plus its promotion data. Color
//! only matters for kinds with oriented geometry: pawns walk toward rank 7
//! as white and rank 0 as black, and promote on that rank.

use crate::logic::board::{Color, PieceKind, Square, ThreatMode, BOARD_SIZE, NUM_PIECE_KINDS};
use std::sync::OnceLock;

/// One fragment of a piece's movement rule. `origin` lets the chunk walk as
/// if the piece sat on a neighbouring square (the tempest rook's four corner
/// chunks). `max_distance == BOARD_SIZE` slides until blocked.
#[derive(Debug, Clone)]
pub struct MoveChunk {
    pub threat: ThreatMode,
    pub origin: (i32, i32),
    pub directions: Vec<(i32, i32)>,
    pub max_distance: i32,
}

impl MoveChunk {
    fn slider(threat: ThreatMode, origin: (i32, i32), directions: &[(i32, i32)]) -> Self {
        Self::stepper(threat, origin, directions, BOARD_SIZE as i32)
    }

    fn stepper(
        threat: ThreatMode,
        origin: (i32, i32),
        directions: &[(i32, i32)],
        max_distance: i32,
    ) -> Self {
        Self {
            threat,
            origin,
            directions: directions.to_vec(),
            max_distance,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct PieceSpec {
    pub chunks: Vec<MoveChunk>,
    pub is_promotable: bool,
    pub promote_pool: Vec<PieceKind>,
    pub promotable_squares: Vec<Square>,
}

const KNIGHT_DIRECTIONS: [(i32, i32); 8] = [
    (1, 2),
    (2, 1),
    (2, -1),
    (1, -2),
    (-1, -2),
    (-2, -1),
    (-2, 1),
    (-1, 2),
];

const BISHOP_DIRECTIONS: [(i32, i32); 4] = [(1, 1), (1, -1), (-1, -1), (-1, 1)];

const ROOK_DIRECTIONS: [(i32, i32); 4] = [(0, 1), (1, 0), (0, -1), (-1, 0)];

const EIGHT_WAY_DIRECTIONS: [(i32, i32); 8] = [
    (0, 1),
    (1, 1),
    (1, 0),
    (1, -1),
    (0, -1),
    (-1, -1),
    (-1, 0),
    (-1, 1),
];

const DABABBA_DIRECTIONS: [(i32, i32); 4] = [(0, 2), (2, 0), (0, -2), (-2, 0)];

const ALFIL_DIRECTIONS: [(i32, i32); 4] = [(2, 2), (2, -2), (-2, -2), (-2, 2)];

const CAMEL_DIRECTIONS: [(i32, i32); 8] = [
    (1, 3),
    (3, 1),
    (3, -1),
    (1, -3),
    (-1, -3),
    (-3, -1),
    (-3, 1),
    (-1, 3),
];

fn make_spec(kind: PieceKind, color: Color) -> PieceSpec {
    use ThreatMode::{Move, Take, TakeJump, TakeMove};

    let mut spec = PieceSpec::default();
    match kind {
        PieceKind::King => {
            spec.chunks
                .push(MoveChunk::stepper(TakeMove, (0, 0), &EIGHT_WAY_DIRECTIONS, 1));
        }
        PieceKind::Queen => {
            spec.chunks
                .push(MoveChunk::slider(TakeMove, (0, 0), &EIGHT_WAY_DIRECTIONS));
        }
        PieceKind::Bishop => {
            spec.chunks
                .push(MoveChunk::slider(TakeMove, (0, 0), &BISHOP_DIRECTIONS));
        }
        PieceKind::Knight => {
            spec.chunks
                .push(MoveChunk::stepper(TakeMove, (0, 0), &KNIGHT_DIRECTIONS, 1));
        }
        PieceKind::Rook => {
            spec.chunks
                .push(MoveChunk::slider(TakeMove, (0, 0), &ROOK_DIRECTIONS));
        }
        PieceKind::Pawn => {
            let forward = if color == Color::White { 1 } else { -1 };
            spec.chunks
                .push(MoveChunk::stepper(Move, (0, 0), &[(0, forward)], 1));
            spec.chunks.push(MoveChunk::stepper(
                Take,
                (0, 0),
                &[(-1, forward), (1, forward)],
                1,
            ));
            spec.is_promotable = true;
            spec.promote_pool = vec![
                PieceKind::Queen,
                PieceKind::Rook,
                PieceKind::Bishop,
                PieceKind::Knight,
                PieceKind::Amazon,
            ];
            let target_rank = if color == Color::White { 7 } else { 0 };
            for file in 0..BOARD_SIZE {
                spec.promotable_squares.push(Square {
                    file,
                    rank: target_rank,
                });
            }
        }
        PieceKind::Amazon => {
            spec.chunks
                .push(MoveChunk::stepper(TakeMove, (0, 0), &KNIGHT_DIRECTIONS, 1));
            spec.chunks
                .push(MoveChunk::slider(TakeMove, (0, 0), &EIGHT_WAY_DIRECTIONS));
        }
        PieceKind::Grasshopper => {
            spec.chunks
                .push(MoveChunk::slider(TakeJump, (0, 0), &EIGHT_WAY_DIRECTIONS));
        }
        PieceKind::Knightrider => {
            spec.chunks
                .push(MoveChunk::slider(TakeMove, (0, 0), &KNIGHT_DIRECTIONS));
        }
        PieceKind::Archbishop => {
            spec.chunks
                .push(MoveChunk::stepper(TakeMove, (0, 0), &KNIGHT_DIRECTIONS, 1));
            spec.chunks
                .push(MoveChunk::slider(TakeMove, (0, 0), &BISHOP_DIRECTIONS));
        }
        PieceKind::Dababba => {
            spec.chunks
                .push(MoveChunk::stepper(TakeMove, (0, 0), &DABABBA_DIRECTIONS, 1));
        }
        PieceKind::Alfil => {
            spec.chunks
                .push(MoveChunk::stepper(TakeMove, (0, 0), &ALFIL_DIRECTIONS, 1));
        }
        PieceKind::Ferz => {
            spec.chunks
                .push(MoveChunk::stepper(TakeMove, (0, 0), &BISHOP_DIRECTIONS, 1));
        }
        PieceKind::Centaur => {
            spec.chunks
                .push(MoveChunk::stepper(TakeMove, (0, 0), &EIGHT_WAY_DIRECTIONS, 1));
            spec.chunks
                .push(MoveChunk::stepper(TakeMove, (0, 0), &KNIGHT_DIRECTIONS, 1));
        }
        PieceKind::Camel => {
            spec.chunks
                .push(MoveChunk::stepper(TakeMove, (0, 0), &CAMEL_DIRECTIONS, 1));
        }
        PieceKind::TempestRook => {
            // Four corner-rook chunks, each anchored one diagonal step away.
            spec.chunks
                .push(MoveChunk::slider(TakeMove, (1, 1), &[(0, 1), (1, 0)]));
            spec.chunks
                .push(MoveChunk::slider(TakeMove, (1, -1), &[(1, 0), (0, -1)]));
            spec.chunks
                .push(MoveChunk::slider(TakeMove, (-1, 1), &[(0, 1), (-1, 0)]));
            spec.chunks
                .push(MoveChunk::slider(TakeMove, (-1, -1), &[(0, -1), (-1, 0)]));
        }
    }
    spec
}

/// Registry lookup. The table is built once on first use and is idempotent:
/// repeated lookups return the identical entry.
pub fn get(kind: PieceKind, color: Color) -> &'static PieceSpec {
    static CACHE: OnceLock<Vec<PieceSpec>> = OnceLock::new();
    let cache = CACHE.get_or_init(|| {
        let mut specs = Vec::with_capacity(2 * NUM_PIECE_KINDS);
        for color in [Color::White, Color::Black] {
            for kind in PieceKind::ALL {
                specs.push(make_spec(kind, color));
            }
        }
        specs
    });
    &cache[color.index() * NUM_PIECE_KINDS + kind.index()]
}

/// Stun stack a freshly created piece starts with.
pub fn initial_stun(kind: PieceKind) -> i32 {
    match kind {
        PieceKind::King | PieceKind::Grasshopper => 4,
        PieceKind::Queen => 9,
        PieceKind::Rook | PieceKind::Centaur => 5,
        PieceKind::Bishop | PieceKind::Knight | PieceKind::Camel => 3,
        PieceKind::Knightrider | PieceKind::TempestRook => 7,
        PieceKind::Archbishop => 6,
        PieceKind::Dababba | PieceKind::Alfil => 2,
        PieceKind::Amazon => 13,
        PieceKind::Ferz | PieceKind::Pawn => 1,
    }
}

/// Stun stack for a piece placed on `rank`. Pawns are specialised by rank,
/// charging more stun the further they start from their promotion rank;
/// every other kind uses its flat initial value.
pub fn placement_stun(kind: PieceKind, color: Color, rank: usize) -> i32 {
    match kind {
        PieceKind::Pawn => match color {
            Color::White => 8 - rank as i32,
            Color::Black => rank as i32 + 1,
        },
        _ => initial_stun(kind),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_idempotent() {
        let first = get(PieceKind::Queen, Color::White);
        let second = get(PieceKind::Queen, Color::White);
        assert!(std::ptr::eq(first, second));
        assert_eq!(first.chunks.len(), 1);
    }

    #[test]
    fn test_pawn_orientation() {
        let white = get(PieceKind::Pawn, Color::White);
        let black = get(PieceKind::Pawn, Color::Black);
        assert_eq!(white.chunks[0].directions, vec![(0, 1)]);
        assert_eq!(black.chunks[0].directions, vec![(0, -1)]);
        assert!(white
            .promotable_squares
            .iter()
            .all(|sq| sq.rank == 7));
        assert!(black
            .promotable_squares
            .iter()
            .all(|sq| sq.rank == 0));
    }

    #[test]
    fn test_pawn_promote_pool_has_orthodox_kinds() {
        let pool = &get(PieceKind::Pawn, Color::White).promote_pool;
        for kind in [
            PieceKind::Queen,
            PieceKind::Rook,
            PieceKind::Bishop,
            PieceKind::Knight,
        ] {
            assert!(pool.contains(&kind));
        }
    }

    #[test]
    fn test_tempest_rook_corner_chunks() {
        let spec = get(PieceKind::TempestRook, Color::Black);
        assert_eq!(spec.chunks.len(), 4);
        let origins: Vec<_> = spec.chunks.iter().map(|c| c.origin).collect();
        assert!(origins.contains(&(1, 1)));
        assert!(origins.contains(&(-1, -1)));
        assert!(spec.chunks.iter().all(|c| c.max_distance == 8));
    }

    #[test]
    fn test_initial_stun_table() {
        assert_eq!(initial_stun(PieceKind::King), 4);
        assert_eq!(initial_stun(PieceKind::Amazon), 13);
        assert_eq!(initial_stun(PieceKind::Ferz), 1);
        assert_eq!(initial_stun(PieceKind::Dababba), 2);
    }

    #[test]
    fn test_placement_stun_for_pawns() {
        assert_eq!(placement_stun(PieceKind::Pawn, Color::White, 0), 8);
        assert_eq!(placement_stun(PieceKind::Pawn, Color::White, 6), 2);
        assert_eq!(placement_stun(PieceKind::Pawn, Color::Black, 7), 8);
        assert_eq!(placement_stun(PieceKind::Pawn, Color::Black, 1), 2);
        assert_eq!(placement_stun(PieceKind::Rook, Color::White, 0), 5);
    }
}
