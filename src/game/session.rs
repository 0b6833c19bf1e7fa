use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::board::{Board, CellIndex, Symbol, CELL_COUNT};
use super::scores::{ScoreStore, Tallies};
use crate::ai::{EngineDecision, SearchEngine};
use crate::utils::console_log;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Human,
    Engine,
}

impl Side {
    pub fn other(self) -> Side {
        match self {
            Side::Human => Side::Engine,
            Side::Engine => Side::Human,
        }
    }
}

impl FromStr for Side {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "human" | "player" | "user" => Ok(Side::Human),
            "engine" | "ai" | "computer" => Ok(Side::Engine),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum GamePhase {
    #[default]
    ChoosingSymbol,
    Playing,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct SessionConfig {
    pub first_turn: Side,
    pub think_delay_ms: u32,
}

impl SessionConfig {
    pub fn with_first_turn(mut self, side: Side) -> Self {
        self.first_turn = side;
        self
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            first_turn: Side::Human,
            think_delay_ms: 0,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type")]
pub enum Outcome {
    Win {
        winner: Side,
        symbol: Symbol,
        line: [CellIndex; 3],
    },
    Tie,
}

impl Outcome {
    pub fn winner(&self) -> Option<Side> {
        match self {
            Outcome::Win { winner, .. } => Some(*winner),
            Outcome::Tie => None,
        }
    }
}

/// 对局事件流，供前端渲染。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type")]
pub enum GameEvent {
    SymbolsChosen {
        human: Symbol,
        engine: Symbol,
        first_turn: Side,
    },
    CellClaimed {
        side: Side,
        symbol: Symbol,
        index: CellIndex,
    },
    GameWon {
        winner: Side,
        symbol: Symbol,
        line: [CellIndex; 3],
    },
    GameTied,
    ScoresReset,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type")]
pub enum MoveError {
    SymbolNotChosen,
    GameInProgress,
    NotHumanTurn,
    NotEngineTurn,
    CellOutOfRange { index: CellIndex },
    CellOccupied { index: CellIndex },
    NoMoveAvailable,
}

impl fmt::Display for MoveError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MoveError::SymbolNotChosen => f.write_str("no symbol chosen yet"),
            MoveError::GameInProgress => f.write_str("a game is already in progress"),
            MoveError::NotHumanTurn => f.write_str("it is not the human's turn"),
            MoveError::NotEngineTurn => f.write_str("it is not the engine's turn"),
            MoveError::CellOutOfRange { index } => write!(f, "cell {index} is off the board"),
            MoveError::CellOccupied { index } => write!(f, "cell {index} is already taken"),
            MoveError::NoMoveAvailable => f.write_str("no empty cell left"),
        }
    }
}

impl std::error::Error for MoveError {}

/// 一步落子的结果。`board` 是落子之后、重置之前的棋盘。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MoveResolution {
    pub board: Board,
    pub events: Vec<GameEvent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outcome: Option<Outcome>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub decision: Option<EngineDecision>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SessionSnapshot {
    pub phase: GamePhase,
    pub board: Board,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub human_symbol: Option<Symbol>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub engine_symbol: Option<Symbol>,
    pub turn: Side,
    pub tallies: Tallies,
}

/// 一个页面上的连续对局：棋盘、符号分配、轮次与比分。
pub struct GameSession {
    config: SessionConfig,
    board: Board,
    phase: GamePhase,
    human_symbol: Option<Symbol>,
    turn: Side,
    tallies: Tallies,
    store: Box<dyn ScoreStore>,
}

impl GameSession {
    pub fn new(config: SessionConfig, store: Box<dyn ScoreStore>) -> Self {
        let tallies = store.load();
        console_log!(
            "session ready: human {} / engine {} / ties {}",
            tallies.human_wins,
            tallies.engine_wins,
            tallies.ties
        );
        Self {
            config,
            board: Board::new(),
            phase: GamePhase::ChoosingSymbol,
            human_symbol: None,
            turn: config.first_turn,
            tallies,
            store,
        }
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn phase(&self) -> GamePhase {
        self.phase
    }

    pub fn turn(&self) -> Side {
        self.turn
    }

    pub fn tallies(&self) -> Tallies {
        self.tallies
    }

    pub fn has_scores(&self) -> bool {
        self.tallies.any()
    }

    pub fn human_symbol(&self) -> Option<Symbol> {
        self.human_symbol
    }

    pub fn engine_symbol(&self) -> Option<Symbol> {
        self.human_symbol.map(Symbol::opponent)
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            phase: self.phase,
            board: self.board,
            human_symbol: self.human_symbol,
            engine_symbol: self.engine_symbol(),
            turn: self.turn,
            tallies: self.tallies,
        }
    }

    pub fn search_engine(&self) -> Option<SearchEngine> {
        self.human_symbol
            .map(|human| SearchEngine::new(human.opponent(), human))
    }

    pub fn choose_symbol(&mut self, symbol: Symbol) -> Result<Vec<GameEvent>, MoveError> {
        if self.phase == GamePhase::Playing {
            return Err(MoveError::GameInProgress);
        }
        self.board = Board::new();
        self.human_symbol = Some(symbol);
        self.turn = self.config.first_turn;
        self.phase = GamePhase::Playing;
        Ok(vec![GameEvent::SymbolsChosen {
            human: symbol,
            engine: symbol.opponent(),
            first_turn: self.turn,
        }])
    }

    pub fn play_human(&mut self, index: CellIndex) -> Result<MoveResolution, MoveError> {
        let human = self.ensure_playing()?;
        if self.turn != Side::Human {
            return Err(MoveError::NotHumanTurn);
        }
        if index >= CELL_COUNT {
            return Err(MoveError::CellOutOfRange { index });
        }
        if !self.board.is_empty_at(index) {
            return Err(MoveError::CellOccupied { index });
        }
        Ok(self.apply(Side::Human, human, index, None))
    }

    pub fn play_engine(&mut self) -> Result<MoveResolution, MoveError> {
        let human = self.ensure_playing()?;
        if self.turn != Side::Engine {
            return Err(MoveError::NotEngineTurn);
        }
        let engine = SearchEngine::new(human.opponent(), human);
        let decision = engine.decide(&self.board);
        let cell = decision.cell.ok_or(MoveError::NoMoveAvailable)?;
        Ok(self.apply(Side::Engine, engine.engine_symbol(), cell, Some(decision)))
    }

    pub fn reset_scores(&mut self) -> Vec<GameEvent> {
        self.tallies = Tallies::default();
        self.store.save(&self.tallies);
        self.reset_board();
        console_log!("scores reset");
        vec![GameEvent::ScoresReset]
    }

    /// 返回人类一方的符号。
    fn ensure_playing(&self) -> Result<Symbol, MoveError> {
        match (self.phase, self.human_symbol) {
            (GamePhase::Playing, Some(symbol)) => Ok(symbol),
            _ => Err(MoveError::SymbolNotChosen),
        }
    }

    fn apply(
        &mut self,
        side: Side,
        symbol: Symbol,
        index: CellIndex,
        decision: Option<EngineDecision>,
    ) -> MoveResolution {
        self.board.place(index, symbol);
        let mut events = vec![GameEvent::CellClaimed {
            side,
            symbol,
            index,
        }];

        let outcome = if let Some(line) = self.board.winning_line(symbol) {
            Some(Outcome::Win {
                winner: side,
                symbol,
                line,
            })
        } else if self.board.is_full() {
            Some(Outcome::Tie)
        } else {
            None
        };

        let board = self.board;
        match outcome {
            Some(outcome) => self.finish(outcome, &mut events),
            None => self.turn = side.other(),
        }

        MoveResolution {
            board,
            events,
            outcome,
            decision,
        }
    }

    fn finish(&mut self, outcome: Outcome, events: &mut Vec<GameEvent>) {
        match outcome {
            Outcome::Win {
                winner,
                symbol,
                line,
            } => {
                console_log!("{winner:?} wins with {symbol} on {line:?}");
                events.push(GameEvent::GameWon {
                    winner,
                    symbol,
                    line,
                });
            }
            Outcome::Tie => {
                console_log!("game tied");
                events.push(GameEvent::GameTied);
            }
        }
        self.tallies.record(outcome.winner());
        self.store.save(&self.tallies);
        self.reset_board();
    }

    fn reset_board(&mut self) {
        self.board = Board::new();
        self.phase = GamePhase::ChoosingSymbol;
        self.human_symbol = None;
        self.turn = self.config.first_turn;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::MemoryScoreStore;
    use rand::rngs::SmallRng;
    use rand::seq::IteratorRandom;
    use rand::SeedableRng;

    fn session_with(config: SessionConfig) -> (GameSession, MemoryScoreStore) {
        let store = MemoryScoreStore::new();
        let session = GameSession::new(config, Box::new(store.clone()));
        (session, store)
    }

    fn started(config: SessionConfig) -> (GameSession, MemoryScoreStore) {
        let (mut session, store) = session_with(config);
        session
            .choose_symbol(Symbol::X)
            .expect("symbol choice should succeed");
        (session, store)
    }

    #[test]
    fn loads_tallies_from_store() {
        let saved = Tallies {
            human_wins: 1,
            engine_wins: 4,
            ties: 2,
        };
        let session = GameSession::new(
            SessionConfig::default(),
            Box::new(MemoryScoreStore::with_tallies(saved)),
        );
        assert_eq!(session.tallies(), saved);
        assert!(session.has_scores());
        assert_eq!(session.phase(), GamePhase::ChoosingSymbol);
    }

    #[test]
    fn moves_require_a_chosen_symbol() {
        let (mut session, _) = session_with(SessionConfig::default());
        assert_eq!(session.play_human(0), Err(MoveError::SymbolNotChosen));
        assert_eq!(session.play_engine(), Err(MoveError::SymbolNotChosen));
    }

    #[test]
    fn choosing_symbol_assigns_the_other_to_engine() {
        let (mut session, _) = session_with(SessionConfig::default());
        let events = session
            .choose_symbol(Symbol::O)
            .expect("symbol choice should succeed");
        assert_eq!(
            events,
            vec![GameEvent::SymbolsChosen {
                human: Symbol::O,
                engine: Symbol::X,
                first_turn: Side::Human,
            }]
        );
        assert_eq!(session.engine_symbol(), Some(Symbol::X));
        assert_eq!(session.choose_symbol(Symbol::X), Err(MoveError::GameInProgress));
    }

    #[test]
    fn rejects_invalid_human_moves() {
        let (mut session, _) = started(SessionConfig::default());
        assert_eq!(
            session.play_human(9),
            Err(MoveError::CellOutOfRange { index: 9 })
        );

        let resolution = session.play_human(4).expect("center should be free");
        assert!(resolution.outcome.is_none());
        assert_eq!(session.turn(), Side::Engine);
        assert_eq!(session.play_human(0), Err(MoveError::NotHumanTurn));

        let reply = session.play_engine().expect("engine should reply");
        let decision = reply.decision.expect("engine move carries its decision");
        assert_eq!(decision.cell, Some(0));
        assert_eq!(session.play_engine(), Err(MoveError::NotEngineTurn));
        assert_eq!(
            session.play_human(4),
            Err(MoveError::CellOccupied { index: 4 })
        );
    }

    #[test]
    fn engine_win_updates_tallies_and_resets_board() {
        let (mut session, store) = started(SessionConfig::default());
        let mut last = None;
        for cell in [1, 2, 4] {
            session.play_human(cell).expect("human move should succeed");
            last = Some(session.play_engine().expect("engine move should succeed"));
        }

        let resolution = last.expect("engine moved");
        assert_eq!(
            resolution.outcome,
            Some(Outcome::Win {
                winner: Side::Engine,
                symbol: Symbol::O,
                line: [0, 3, 6],
            })
        );
        assert!(resolution.board.is_winning_for(Symbol::O));
        assert!(resolution
            .events
            .iter()
            .any(|event| matches!(event, GameEvent::GameWon { winner: Side::Engine, .. })));

        assert_eq!(session.board(), &Board::new());
        assert_eq!(session.phase(), GamePhase::ChoosingSymbol);
        assert_eq!(session.human_symbol(), None);
        assert_eq!(store.snapshot().engine_wins, 1);
        assert_eq!(session.tallies(), store.snapshot());
    }

    #[test]
    fn perfect_human_play_ends_in_tie() {
        let (mut session, store) = started(SessionConfig::default());
        let mut outcome = None;
        for cell in [0, 1, 6, 5, 8] {
            let resolution = session.play_human(cell).expect("human move should succeed");
            if resolution.outcome.is_some() {
                outcome = resolution.outcome;
                break;
            }
            session.play_engine().expect("engine move should succeed");
        }
        assert_eq!(outcome, Some(Outcome::Tie));
        assert_eq!(
            store.snapshot(),
            Tallies {
                human_wins: 0,
                engine_wins: 0,
                ties: 1,
            }
        );
    }

    #[test]
    fn engine_can_open_the_game() {
        let (mut session, _) = started(SessionConfig::default().with_first_turn(Side::Engine));
        assert_eq!(session.play_human(4), Err(MoveError::NotHumanTurn));
        let resolution = session.play_engine().expect("engine should open");
        assert_eq!(resolution.board.get(0), Some(Symbol::O));
        assert_eq!(session.turn(), Side::Human);
    }

    #[test]
    fn reset_scores_clears_store() {
        let store = MemoryScoreStore::with_tallies(Tallies {
            human_wins: 2,
            engine_wins: 9,
            ties: 3,
        });
        let mut session = GameSession::new(SessionConfig::default(), Box::new(store.clone()));
        session
            .choose_symbol(Symbol::X)
            .expect("symbol choice should succeed");

        assert_eq!(session.reset_scores(), vec![GameEvent::ScoresReset]);
        assert_eq!(store.snapshot(), Tallies::default());
        assert!(!session.has_scores());
        assert_eq!(session.phase(), GamePhase::ChoosingSymbol);
    }

    #[test]
    fn random_human_never_beats_engine() {
        let (mut session, store) = session_with(SessionConfig::default());
        let mut rng = SmallRng::seed_from_u64(7);
        let games = 40;

        for game in 0..games {
            let symbol = if game % 2 == 0 { Symbol::X } else { Symbol::O };
            session
                .choose_symbol(symbol)
                .expect("symbol choice should succeed");
            loop {
                let resolution = match session.turn() {
                    Side::Human => {
                        let cell = session
                            .board()
                            .empty_cells()
                            .choose(&mut rng)
                            .expect("game in progress has empty cells");
                        session.play_human(cell)
                    }
                    Side::Engine => session.play_engine(),
                }
                .expect("move should succeed");

                if let Some(outcome) = resolution.outcome {
                    assert_ne!(outcome.winner(), Some(Side::Human));
                    break;
                }
            }
        }

        let tallies = store.snapshot();
        assert_eq!(tallies.human_wins, 0);
        assert_eq!(tallies.total(), games);
    }

    #[test]
    fn config_parses_with_defaults() {
        let config: SessionConfig =
            serde_json::from_str(r#"{"first_turn":"engine"}"#).expect("config should parse");
        assert_eq!(config.first_turn, Side::Engine);
        assert_eq!(config.think_delay_ms, 0);
        assert_eq!("AI".parse::<Side>(), Ok(Side::Engine));
        assert!("nobody".parse::<Side>().is_err());
    }
}
