//! 棋盘、终局判定、对局流程与比分持久化。

pub mod board;
pub mod scores;
pub mod session;

pub use board::{
    is_draw,
    is_winning_for,
    Board,
    BoardError,
    BoardStatus,
    CellIndex,
    Symbol,
    CELL_COUNT,
    WINNING_LINES,
};
pub use scores::{LocalStorageScoreStore, MemoryScoreStore, ScoreStore, Tallies};
pub use session::{
    GameEvent,
    GamePhase,
    GameSession,
    MoveError,
    MoveResolution,
    Outcome,
    SessionConfig,
    SessionSnapshot,
    Side,
};
