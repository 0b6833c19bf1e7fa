use serde::{Deserialize, Serialize};

use crate::game::{Board, CellIndex, Symbol};

const WIN_SCORE: i32 = 1;
const LOSS_SCORE: i32 = -1;
const DRAW_SCORE: i32 = 0;

/// 一次搜索的结果。`cell` 为空表示棋盘已满。
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct EngineDecision {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cell: Option<CellIndex>,
    pub evaluation: i32,
    pub nodes: u64,
}

struct SearchStats {
    nodes: u64,
}

impl SearchStats {
    fn new() -> Self {
        Self { nodes: 0 }
    }
}

/// Minimax + alpha-beta 搜索。引擎一方为极大方，人类一方为极小方。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchEngine {
    engine_symbol: Symbol,
    human_symbol: Symbol,
}

impl SearchEngine {
    pub fn new(engine_symbol: Symbol, human_symbol: Symbol) -> Self {
        Self {
            engine_symbol,
            human_symbol,
        }
    }

    pub fn engine_symbol(&self) -> Symbol {
        self.engine_symbol
    }

    pub fn human_symbol(&self) -> Symbol {
        self.human_symbol
    }

    /// 在棋盘副本上搜索，调用方的棋盘不会被修改。
    pub fn decide(&self, board: &Board) -> EngineDecision {
        let mut stats = SearchStats::new();
        let mut scratch = *board;

        let mut best_cell = None;
        let mut best_score = i32::MIN;
        let mut alpha = i32::MIN;
        let beta = i32::MAX;

        for cell in board.empty_cells() {
            scratch.place(cell, self.engine_symbol);
            let score = self.minimax_rec(&mut scratch, false, alpha, beta, &mut stats);
            scratch.clear(cell);

            // 严格大于：分数相同的情况下保留下标最小的格子。
            if score > best_score {
                best_score = score;
                best_cell = Some(cell);
            }

            alpha = alpha.max(best_score);
            if beta <= alpha {
                break;
            }
        }

        let evaluation = if best_cell.is_some() {
            best_score
        } else {
            self.terminal_score(board).unwrap_or(DRAW_SCORE)
        };

        EngineDecision {
            cell: best_cell,
            evaluation,
            nodes: stats.nodes,
        }
    }

    pub fn best_move(&self, board: &Board) -> Option<CellIndex> {
        self.decide(board).cell
    }

    fn terminal_score(&self, board: &Board) -> Option<i32> {
        if board.is_winning_for(self.human_symbol) {
            return Some(LOSS_SCORE);
        }
        if board.is_winning_for(self.engine_symbol) {
            return Some(WIN_SCORE);
        }
        if board.is_full() {
            return Some(DRAW_SCORE);
        }
        None
    }

    fn minimax_rec(
        &self,
        board: &mut Board,
        maximizing: bool,
        mut alpha: i32,
        mut beta: i32,
        stats: &mut SearchStats,
    ) -> i32 {
        stats.nodes += 1;

        if let Some(score) = self.terminal_score(board) {
            return score;
        }

        if maximizing {
            let mut value = i32::MIN;
            for cell in 0..board.cells().len() {
                if !board.is_empty_at(cell) {
                    continue;
                }
                board.place(cell, self.engine_symbol);
                let score = self.minimax_rec(board, false, alpha, beta, stats);
                board.clear(cell);
                value = value.max(score);
                alpha = alpha.max(value);
                if beta <= alpha {
                    break;
                }
            }
            value
        } else {
            let mut value = i32::MAX;
            for cell in 0..board.cells().len() {
                if !board.is_empty_at(cell) {
                    continue;
                }
                board.place(cell, self.human_symbol);
                let score = self.minimax_rec(board, true, alpha, beta, stats);
                board.clear(cell);
                value = value.min(score);
                beta = beta.min(value);
                if beta <= alpha {
                    break;
                }
            }
            value
        }
    }
}

/// 返回对 `engine_symbol` 最优的空格子；棋盘已满时返回 `None`。
pub fn best_move(board: &Board, engine_symbol: Symbol, human_symbol: Symbol) -> Option<CellIndex> {
    SearchEngine::new(engine_symbol, human_symbol).best_move(board)
}
