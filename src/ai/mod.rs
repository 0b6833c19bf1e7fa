//! 对手引擎（minimax + alpha-beta 剪枝）。

pub mod minimax;

pub use minimax::{best_move, EngineDecision, SearchEngine};
