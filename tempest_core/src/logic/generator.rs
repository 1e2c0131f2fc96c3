//! Legal-move generation, one function per move family.
//!
//! Piece moves walk the mover's chunk list; the other families scan the
//! pockets and the board. Everything here is pseudo-legality-free: whatever
//! a function returns is legal to `Board::apply` as-is.

use crate::engine::Move;
use crate::logic::board::{Board, Color, PieceKind, Square, ThreatMode, BOARD_SIZE};
use crate::logic::piece_specs;

/// Moves (and promotions) of the piece on `(file, rank)`, empty when the
/// square is empty, hostile, or the piece is gated by its stacks.
///
/// `potential` ignores the stun/move-stack gates; it feeds the evaluators'
/// mobility and threat terms and must never feed search.
pub fn moves_of(
    board: &Board,
    color: Color,
    file: usize,
    rank: usize,
    potential: bool,
) -> Vec<Move> {
    let Some(piece) = board.at(file, rank) else {
        return Vec::new();
    };
    if piece.color != color {
        return Vec::new();
    }
    if !potential && (piece.stun_stack > 0 || piece.move_stack == 0) {
        return Vec::new();
    }

    let from = Square { file, rank };
    let spec = piece_specs::get(piece.kind, color);
    let mut result = Vec::new();

    for chunk in &spec.chunks {
        let origin_file = file as i32 + chunk.origin.0;
        let origin_rank = rank as i32 + chunk.origin.1;
        for &dir in &chunk.directions {
            walk_direction(
                board, color, chunk.threat, from, origin_file, origin_rank, dir,
                chunk.max_distance, &mut result,
            );
        }
    }

    if spec.is_promotable {
        let mut promotions = Vec::new();
        result.retain(|mv| {
            let &Move::Board { threat, to, .. } = mv else {
                return true;
            };
            if !spec.promotable_squares.contains(&to) {
                return true;
            }
            for &promoted in &spec.promote_pool {
                promotions.push(Move::Promotion {
                    color,
                    threat,
                    from,
                    to,
                    promoted,
                });
            }
            false
        });
        result.extend(promotions);
    }

    result
}

#[allow(clippy::too_many_arguments)]
fn walk_direction(
    board: &Board,
    color: Color,
    threat: ThreatMode,
    from: Square,
    origin_file: i32,
    origin_rank: i32,
    dir: (i32, i32),
    max_distance: i32,
    result: &mut Vec<Move>,
) {
    let emit = |result: &mut Vec<Move>, to: Square| {
        result.push(Move::Board {
            color,
            threat,
            from,
            to,
        });
    };

    for i in 1..=max_distance {
        let Some(to) = Square::from_offsets(origin_file + dir.0 * i, origin_rank + dir.1 * i)
        else {
            break;
        };
        let occupant = board.at(to.file, to.rank);

        match threat {
            ThreatMode::Catch => match occupant {
                None => continue,
                Some(p) if p.color == color => break,
                Some(_) => {
                    emit(result, to);
                    break;
                }
            },
            ThreatMode::TakeMove => match occupant {
                None => {
                    emit(result, to);
                    continue;
                }
                Some(p) if p.color == color => break,
                Some(_) => {
                    emit(result, to);
                    break;
                }
            },
            ThreatMode::Move => match occupant {
                None => {
                    emit(result, to);
                    continue;
                }
                Some(_) => break,
            },
            ThreatMode::Take => match occupant {
                None => continue,
                Some(p) if p.color == color => break,
                Some(_) => {
                    emit(result, to);
                    break;
                }
            },
            ThreatMode::Shift => match occupant {
                None => continue,
                Some(_) => {
                    emit(result, to);
                    break;
                }
            },
            ThreatMode::TakeJump => {
                if occupant.is_none() {
                    continue;
                }
                // Hurdle found: the landing square is one step further.
                let landing = Square::from_offsets(
                    origin_file + dir.0 * (i + 1),
                    origin_rank + dir.1 * (i + 1),
                );
                let Some(landing) = landing else {
                    break;
                };
                match board.at(landing.file, landing.rank) {
                    Some(p) if p.color == color => {}
                    _ => emit(result, landing),
                }
                break;
            }
        }
    }
}

/// Drop moves: every pocketed kind on every empty square, minus that kind's
/// promotion squares. On the first two plies of a non-custom initial
/// position only the king may be dropped (the opening bootstrap).
pub fn drops(board: &Board, color: Color) -> Vec<Move> {
    let mut result = Vec::new();
    let kings_only = !board.is_custom() && board.log_len() < 2;

    for kind in PieceKind::ALL {
        if board.pocket(color)[kind.index()] <= 0 {
            continue;
        }
        if kings_only && kind != PieceKind::King {
            continue;
        }
        let spec = piece_specs::get(kind, color);
        for file in 0..BOARD_SIZE {
            for rank in 0..BOARD_SIZE {
                if board.at(file, rank).is_some() {
                    continue;
                }
                let at = Square { file, rank };
                if spec.is_promotable && spec.promotable_squares.contains(&at) {
                    continue;
                }
                result.push(Move::Drop { color, at, kind });
            }
        }
    }
    result
}

/// One succession move per own non-royal piece.
pub fn successions(board: &Board, color: Color) -> Vec<Move> {
    let mut result = Vec::new();
    for file in 0..BOARD_SIZE {
        for rank in 0..BOARD_SIZE {
            let Some(piece) = board.at(file, rank) else {
                continue;
            };
            if piece.color != color || piece.is_royal {
                continue;
            }
            result.push(Move::Succession {
                color,
                at: Square { file, rank },
            });
        }
    }
    result
}

/// Disguise moves come from an external collaborator; this core treats the
/// family as opaque and generates none.
pub fn disguises(_board: &Board, _color: Color) -> Vec<Move> {
    Vec::new()
}
