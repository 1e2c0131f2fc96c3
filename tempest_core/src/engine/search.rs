//! Alpha-beta search with a transposition table, killer/history move
//! ordering, quiescence, and iterative deepening with aspiration windows.

use crate::engine::config::SearchConfig;
use crate::engine::eval::{piece_value, ClassicEvaluator, WeightedEvaluator};
use crate::engine::tt::{TTFlag, TranspositionTable};
use crate::engine::zobrist::ZobristKeys;
use crate::engine::{CalcInfo, Evaluator, Move};
use crate::logic::board::{Board, Color, PieceKind, Position, BOARD_SIZE};
use crate::logic::generator;
use std::collections::HashMap;

pub const MAX_PLY: usize = 64;
pub const MAX_Q_DEPTH: i32 = 32;
/// Large enough that `MATE_SCORE - ply` is unreachable by any evaluation.
pub const MATE_SCORE: i32 = 1_000_000;

/// The bot: owns its working board, ordering tables and transposition
/// table. The evaluator is the only difference between the classic and the
/// weighted variant.
pub struct MinimaxBot<E: Evaluator> {
    color: Color,
    config: SearchConfig,
    evaluator: E,
    board: Board,
    tt: TranspositionTable,
    killers: [[Option<Move>; 2]; MAX_PLY],
    history: HashMap<u32, i32>,
    root_pv: Vec<Move>,
    nodes_searched: u64,
    current_zobrist: u64,
}

pub type ClassicBot = MinimaxBot<ClassicEvaluator>;
pub type WeightedBot = MinimaxBot<WeightedEvaluator>;

impl MinimaxBot<ClassicEvaluator> {
    #[must_use]
    pub fn classic(color: Color) -> Self {
        Self::with_evaluator(color, ClassicEvaluator, SearchConfig::default())
    }
}

impl MinimaxBot<WeightedEvaluator> {
    #[must_use]
    pub fn weighted(color: Color) -> Self {
        Self::with_evaluator(color, WeightedEvaluator::default(), SearchConfig::default())
    }
}

impl<E: Evaluator> MinimaxBot<E> {
    #[must_use]
    pub fn with_evaluator(color: Color, evaluator: E, config: SearchConfig) -> Self {
        let tt = TranspositionTable::new(config.tt_size_pow);
        Self {
            color,
            config,
            evaluator,
            board: Board::new(),
            tt,
            killers: [[None; 2]; MAX_PLY],
            history: HashMap::new(),
            root_pv: Vec::new(),
            nodes_searched: 0,
            current_zobrist: 0,
        }
    }

    #[must_use]
    pub const fn color(&self) -> Color {
        self.color
    }

    /// The working board; read-only, mainly for inspection in tests.
    #[must_use]
    pub const fn board(&self) -> &Board {
        &self.board
    }

    pub fn set_follow_turn(&mut self, value: bool) {
        self.config.follow_turn = value;
    }

    pub fn set_placement_sample(&mut self, value: usize) {
        self.config.placement_sample = value;
    }

    pub fn set_iterative_deepening(&mut self, value: bool) {
        self.config.iterative_deepening = value;
    }

    pub fn set_use_aspiration(&mut self, value: bool) {
        self.config.use_aspiration = value;
    }

    pub fn set_aspiration_window_base(&mut self, value: i32) {
        self.config.aspiration_window_base = value;
    }

    pub fn set_nodes_searched(&mut self, value: u64) {
        self.nodes_searched = value;
    }

    #[must_use]
    pub const fn get_nodes_searched(&self) -> u64 {
        self.nodes_searched
    }

    /// Clears everything a search accumulates, including the transposition
    /// table. Idempotent.
    pub fn reset_search_data(&mut self) {
        self.killers = [[None; 2]; MAX_PLY];
        self.history.clear();
        self.root_pv.clear();
        self.nodes_searched = 0;
        self.board = Board::new();
        self.tt.clear();
        self.current_zobrist = 0;
    }

    /// Static evaluation of an arbitrary position, white-positive.
    #[must_use]
    pub fn eval_pos(&self, position: &Position) -> i32 {
        self.evaluator.eval(&Board::from_position(position))
    }

    pub fn best_move(&mut self, position: &Position, depth: i32) -> Option<Move> {
        let (_, pv) = self.run_root(position, depth)?;
        pv.first().copied()
    }

    pub fn best_line(&mut self, position: &Position, depth: i32) -> Vec<Move> {
        self.run_root(position, depth)
            .map(|(_, pv)| pv)
            .unwrap_or_default()
    }

    pub fn calc_info(&mut self, position: &Position, depth: i32) -> CalcInfo {
        match self.run_root(position, depth) {
            None => CalcInfo::default(),
            Some((score, pv)) => CalcInfo {
                eval_val: match self.color {
                    Color::White => score,
                    Color::Black => -score,
                },
                best_move: pv.first().copied(),
                line: pv,
            },
        }
    }

    /// Shared root driver: copies the position in, resolves the bot color,
    /// seeds the incremental hash, and runs either a single full-depth
    /// search or the iterative-deepening loop. Returns the bot-perspective
    /// score and the principal variation, or `None` on a side mismatch.
    fn run_root(&mut self, position: &Position, depth: i32) -> Option<(i32, Vec<Move>)> {
        if self.config.follow_turn {
            self.color = position.side_to_move;
        } else if position.side_to_move != self.color {
            return None;
        }

        self.board = Board::from_position(position);
        self.root_pv.clear();
        self.killers = [[None; 2]; MAX_PLY];
        self.history.clear();
        self.nodes_searched = 0;
        self.current_zobrist = ZobristKeys::get().hash(position);

        let mut pv = Vec::new();

        if !self.config.iterative_deepening {
            let score = self.search(depth, self.color, i32::MIN, i32::MAX, 0, &mut pv);
            if !pv.is_empty() {
                self.root_pv = pv.clone();
            }
            tracing::debug!(depth, score, nodes = self.nodes_searched, "search finished");
            return Some((score, pv));
        }

        let mut last_score: i32 = 0;
        for d in 1..=depth {
            pv.clear();
            let score = if !self.config.use_aspiration || d == 1 {
                self.search(d, self.color, i32::MIN, i32::MAX, 0, &mut pv)
            } else {
                let window = self.config.aspiration_window_base;
                let alpha = last_score.saturating_sub(window);
                let beta = last_score.saturating_add(window);
                let score = self.search(d, self.color, alpha, beta, 0, &mut pv);
                if score <= alpha || score >= beta {
                    tracing::debug!(depth = d, score, "aspiration window missed, re-searching");
                    pv.clear();
                    self.search(d, self.color, i32::MIN, i32::MAX, 0, &mut pv)
                } else {
                    score
                }
            };
            last_score = score;
            if !pv.is_empty() {
                self.root_pv = pv.clone();
            }
        }

        tracing::debug!(
            depth,
            score = last_score,
            nodes = self.nodes_searched,
            "iterative deepening finished"
        );
        Some((last_score, self.root_pv.clone()))
    }

    /// Current position's value from the bot's perspective.
    fn value_for_bot(&self) -> i32 {
        let value = self.evaluator.eval(&self.board);
        match self.color {
            Color::White => value,
            Color::Black => -value,
        }
    }

    /// Packs a move into 32 bits for the history table.
    fn move_key(mv: &Move) -> u32 {
        let (from, to) = mv.key_squares();
        (from.file as u32 & 0xF)
            | ((from.rank as u32 & 0xF) << 4)
            | ((to.file as u32 & 0xF) << 8)
            | ((to.rank as u32 & 0xF) << 12)
            | ((mv.kind() as u32 & 0xF) << 16)
            | ((mv.kind_bits() & 0x1F) << 20)
    }

    /// Cheap capture-quality estimate: victim minus attacker for captures,
    /// promotion gain for quiet promotions, zero otherwise.
    fn static_exchange_eval(&self, mv: &Move) -> i32 {
        let (from, to, promoted) = match *mv {
            Move::Board { from, to, .. } => (from, to, None),
            Move::Promotion {
                from, to, promoted, ..
            } => (from, to, Some(promoted)),
            _ => return 0,
        };
        match self.board.at(to.file, to.rank) {
            Some(victim) => {
                let attacker = self
                    .board
                    .at(from.file, from.rank)
                    .map_or(0, |p| piece_value(p.kind));
                piece_value(victim.kind) - attacker
            }
            None => match promoted {
                Some(kind) => piece_value(kind) - piece_value(PieceKind::Pawn),
                None => 0,
            },
        }
    }

    fn record_killer(&mut self, ply: usize, mv: Move) {
        if ply >= MAX_PLY {
            return;
        }
        let slot = &mut self.killers[ply];
        if slot[0] == Some(mv) || slot[1] == Some(mv) {
            return;
        }
        if slot[0].is_none() {
            slot[0] = Some(mv);
        } else {
            slot[1] = Some(mv);
        }
    }

    /// Reward grows with remaining depth so deep cutoffs dominate.
    fn record_history(&mut self, mv: &Move, depth: i32) {
        *self.history.entry(Self::move_key(mv)).or_insert(0) += depth * depth + 1;
    }

    /// All moves for `player`: sampled drops, then piece moves, then
    /// successions and disguises.
    fn gather_moves(&self, player: Color) -> Vec<Move> {
        let mut result = Vec::new();

        let placements = generator::drops(&self.board, player);
        if !placements.is_empty() {
            let mut scored: Vec<(f64, Move)> = placements
                .into_iter()
                .filter_map(|mv| match mv {
                    Move::Drop { kind, at, .. } => {
                        Some((self.evaluator.placement_score(kind, at), mv))
                    }
                    _ => None,
                })
                .collect();
            scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));
            result.extend(
                scored
                    .into_iter()
                    .take(self.config.placement_sample)
                    .map(|(_, mv)| mv),
            );
        }

        for file in 0..BOARD_SIZE {
            for rank in 0..BOARD_SIZE {
                if let Some(piece) = self.board.at(file, rank) {
                    if piece.color == player {
                        result.extend(generator::moves_of(&self.board, player, file, rank, false));
                    }
                }
            }
        }

        result.extend(generator::successions(&self.board, player));
        result.extend(generator::disguises(&self.board, player));
        result
    }

    /// Sorts candidates by PV first, then static exchange, killer flag and
    /// history score. The ordering keys are computed up front, and the sort
    /// is stable: equal keys keep their generator order.
    fn order_moves(&self, moves: &mut [Move], ply: usize) {
        let pv_move = if self.config.iterative_deepening {
            self.root_pv.get(ply).copied()
        } else {
            None
        };
        let killers = if ply < MAX_PLY {
            self.killers[ply]
        } else {
            [None; 2]
        };

        let mut wrapped: Vec<(Move, (bool, i32, bool, i32))> = moves
            .iter()
            .map(|&mv| {
                let see = self.static_exchange_eval(&mv);
                let hist = self.history.get(&Self::move_key(&mv)).copied().unwrap_or(0);
                let is_killer = killers.contains(&Some(mv));
                let is_pv = pv_move == Some(mv);
                (mv, (is_pv, see, is_killer, hist))
            })
            .collect();
        wrapped.sort_by(|a, b| b.1.cmp(&a.1));

        for (slot, (mv, _)) in moves.iter_mut().zip(wrapped) {
            *slot = mv;
        }
    }

    fn search(
        &mut self,
        depth: i32,
        player: Color,
        mut alpha: i32,
        mut beta: i32,
        ply: usize,
        pv_out: &mut Vec<Move>,
    ) -> i32 {
        self.nodes_searched += 1;
        if depth == 0 {
            return self.quiescence(alpha, beta, 0, player);
        }

        let hash = self.current_zobrist;
        let original_alpha = alpha;
        let original_beta = beta;

        if let Some(entry) = self.tt.probe(hash) {
            if entry.depth >= depth {
                match entry.flag {
                    TTFlag::Exact => {
                        pv_out.clear();
                        if let Some(best) = entry.best_move {
                            pv_out.push(best);
                        }
                        return entry.value;
                    }
                    TTFlag::LowerBound => alpha = alpha.max(entry.value),
                    TTFlag::UpperBound => beta = beta.min(entry.value),
                }
                if alpha >= beta {
                    return entry.value;
                }
            }
        }

        let mut moves = self.gather_moves(player);
        if moves.is_empty() {
            return self.value_for_bot();
        }
        self.order_moves(&mut moves, ply);

        let maximizing = player == self.color;
        let opponent = player.opposite();
        let keys = ZobristKeys::get();

        let mut best = 0;
        let mut has_best = false;
        let mut best_move = None;
        let mut best_child_pv = Vec::new();

        for mv in moves {
            let mut child_pv = Vec::new();
            keys.update_for_move(&mut self.current_zobrist, &mv, &self.board, player);
            self.board.apply(&mv);
            let score = match self.board.victory() {
                Some(winner) if winner == self.color => MATE_SCORE - ply as i32,
                Some(_) => -(MATE_SCORE - ply as i32),
                None => self.search(depth - 1, opponent, alpha, beta, ply + 1, &mut child_pv),
            };
            self.board.undo();
            keys.update_for_move(&mut self.current_zobrist, &mv, &self.board, player);

            let improved = if maximizing { score > best } else { score < best };
            if !has_best || improved {
                best = score;
                best_move = Some(mv);
                best_child_pv = child_pv;
                has_best = true;
            }
            if maximizing {
                alpha = alpha.max(best);
            } else {
                beta = beta.min(best);
            }
            if alpha >= beta {
                self.record_killer(ply, mv);
                self.record_history(&mv, depth);
                break;
            }
        }

        if !has_best {
            pv_out.clear();
            return self.value_for_bot();
        }

        let flag = if best <= original_alpha {
            TTFlag::UpperBound
        } else if best >= original_beta {
            TTFlag::LowerBound
        } else {
            TTFlag::Exact
        };
        self.tt.store(hash, best_move, best, depth, flag);

        pv_out.clear();
        if let Some(best_move) = best_move {
            pv_out.push(best_move);
            pv_out.append(&mut best_child_pv);
        }
        best
    }

    /// Captures (an enemy on the destination) and promotions only.
    fn captures_and_promotions(&self, player: Color) -> Vec<Move> {
        let mut result = Vec::new();
        for file in 0..BOARD_SIZE {
            for rank in 0..BOARD_SIZE {
                let Some(piece) = self.board.at(file, rank) else {
                    continue;
                };
                if piece.color != player {
                    continue;
                }
                for mv in generator::moves_of(&self.board, player, file, rank, false) {
                    let (_, to) = mv.key_squares();
                    let is_capture = matches!(
                        self.board.at(to.file, to.rank),
                        Some(dest) if dest.color != player
                    );
                    if is_capture || matches!(mv, Move::Promotion { .. }) {
                        result.push(mv);
                    }
                }
            }
        }
        result
    }

    fn quiescence(&mut self, mut alpha: i32, mut beta: i32, q_depth: i32, player: Color) -> i32 {
        self.nodes_searched += 1;
        if q_depth > MAX_Q_DEPTH {
            return self.value_for_bot();
        }

        let stand_pat = self.value_for_bot();
        let maximizing = player == self.color;
        if maximizing {
            if stand_pat >= beta {
                return stand_pat;
            }
            alpha = alpha.max(stand_pat);
        } else {
            if stand_pat <= alpha {
                return stand_pat;
            }
            beta = beta.min(stand_pat);
        }

        let moves = self.captures_and_promotions(player);
        if moves.is_empty() {
            return stand_pat;
        }

        let mut wrapped: Vec<(i32, Move)> = moves
            .into_iter()
            .map(|mv| (self.static_exchange_eval(&mv), mv))
            .collect();
        wrapped.sort_by(|a, b| b.0.cmp(&a.0));

        let keys = ZobristKeys::get();
        for (_, mv) in wrapped {
            keys.update_for_move(&mut self.current_zobrist, &mv, &self.board, player);
            self.board.apply(&mv);
            let score = match self.board.victory() {
                Some(winner) if winner == self.color => MATE_SCORE - q_depth,
                Some(_) => -(MATE_SCORE - q_depth),
                None => self.quiescence(alpha, beta, q_depth + 1, player.opposite()),
            };
            self.board.undo();
            keys.update_for_move(&mut self.current_zobrist, &mv, &self.board, player);

            if maximizing {
                alpha = alpha.max(score);
            } else {
                beta = beta.min(score);
            }
            if alpha >= beta {
                self.record_killer(q_depth as usize, mv);
                self.record_history(&mv, q_depth);
                return if maximizing { alpha } else { beta };
            }
        }

        if maximizing {
            alpha
        } else {
            beta
        }
    }
}
