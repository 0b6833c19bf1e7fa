pub mod ai;
pub mod game;
pub mod utils;

use gloo_timers::future::TimeoutFuture;
use serde::Serialize;
use serde_json;
use serde_wasm_bindgen::{from_value, to_value};
use std::fmt::Display;
use std::str::FromStr;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::future_to_promise;
use web_sys::js_sys::Promise;

pub use ai::{best_move, EngineDecision, SearchEngine};
pub use game::{
    is_draw, is_winning_for, Board, BoardError, BoardStatus, CellIndex, GameEvent, GamePhase,
    GameSession, LocalStorageScoreStore, MemoryScoreStore, MoveError, MoveResolution, Outcome,
    ScoreStore, SessionConfig, SessionSnapshot, Side, Symbol, Tallies, CELL_COUNT, WINNING_LINES,
};

use utils::console_log;

#[cfg(feature = "wee_alloc")]
#[global_allocator]
static ALLOC: wee_alloc::WeeAlloc = wee_alloc::WeeAlloc::INIT;

#[wasm_bindgen(start)]
pub fn start() {
    utils::set_panic_hook();
}

fn to_js_error<E: Serialize + Display>(error: E) -> JsValue {
    to_value(&error).unwrap_or_else(|_| JsValue::from_str(&error.to_string()))
}

fn serde_to_js_error<E: Display>(error: E) -> JsValue {
    JsValue::from_str(&error.to_string())
}

fn parse_symbol(value: &str) -> Result<Symbol, JsValue> {
    Symbol::from_str(value).map_err(|_| JsValue::from_str(&format!("unknown symbol {value:?}")))
}

fn parse_board(board: JsValue) -> Result<Board, JsValue> {
    from_value(board).map_err(JsValue::from)
}

#[derive(Serialize)]
struct MoveResponse {
    #[serde(flatten)]
    resolution: MoveResolution,
    session: SessionSnapshot,
}

#[derive(Serialize)]
struct EventsResponse {
    events: Vec<GameEvent>,
    session: SessionSnapshot,
}

/// 页面使用的对局对象，比分保存在 `localStorage`。
#[wasm_bindgen]
pub struct TicTacToeGame {
    session: GameSession,
}

#[wasm_bindgen]
impl TicTacToeGame {
    #[wasm_bindgen(constructor)]
    pub fn new(config_json: Option<String>) -> Result<TicTacToeGame, JsValue> {
        let config = if let Some(json) = config_json {
            serde_json::from_str(&json).map_err(serde_to_js_error)?
        } else {
            SessionConfig::default()
        };
        let session = GameSession::new(config, Box::new(LocalStorageScoreStore::new()));
        Ok(TicTacToeGame { session })
    }

    pub fn state_json(&self) -> Result<String, JsValue> {
        serde_json::to_string(&self.session.snapshot()).map_err(serde_to_js_error)
    }

    pub fn tallies_json(&self) -> Result<String, JsValue> {
        serde_json::to_string(&self.session.tallies()).map_err(serde_to_js_error)
    }

    pub fn has_scores(&self) -> bool {
        self.session.has_scores()
    }

    pub fn choose_symbol(&mut self, symbol: &str) -> Result<String, JsValue> {
        let symbol = parse_symbol(symbol)?;
        let events = self.session.choose_symbol(symbol).map_err(to_js_error)?;
        self.events_json(events)
    }

    pub fn play_human(&mut self, index: u32) -> Result<String, JsValue> {
        let resolution = self
            .session
            .play_human(index as usize)
            .map_err(to_js_error)?;
        self.move_json(resolution)
    }

    pub fn play_engine(&mut self) -> Result<String, JsValue> {
        let resolution = self.session.play_engine().map_err(to_js_error)?;
        if let Some(decision) = &resolution.decision {
            console_log!(
                "engine chose {:?} after {} nodes",
                decision.cell,
                decision.nodes
            );
        }
        self.move_json(resolution)
    }

    /// 延迟 `delay_ms` 后在棋盘快照上计算引擎的决策，不修改对局。
    pub fn think_engine(&self, delay_ms: Option<u32>) -> Promise {
        let board = *self.session.board();
        let engine = self.session.search_engine();
        let delay = delay_ms.unwrap_or(self.session.config().think_delay_ms);

        future_to_promise(async move {
            let engine = engine.ok_or_else(|| to_js_error(MoveError::SymbolNotChosen))?;
            if delay > 0 {
                TimeoutFuture::new(delay).await;
            }
            let decision = engine.decide(&board);
            let json = serde_json::to_string(&decision).map_err(serde_to_js_error)?;
            Ok(JsValue::from_str(&json))
        })
    }

    pub fn reset_scores(&mut self) -> Result<String, JsValue> {
        let events = self.session.reset_scores();
        self.events_json(events)
    }

    fn move_json(&self, resolution: MoveResolution) -> Result<String, JsValue> {
        let response = MoveResponse {
            resolution,
            session: self.session.snapshot(),
        };
        serde_json::to_string(&response).map_err(serde_to_js_error)
    }

    fn events_json(&self, events: Vec<GameEvent>) -> Result<String, JsValue> {
        let response = EventsResponse {
            events,
            session: self.session.snapshot(),
        };
        serde_json::to_string(&response).map_err(serde_to_js_error)
    }
}

/// `symbol` 在任一连线上占满三格时返回 true。
#[wasm_bindgen(js_name = "isWinningFor")]
pub fn is_winning_for_js(board: JsValue, symbol: &str) -> Result<bool, JsValue> {
    let board = parse_board(board)?;
    let symbol = parse_symbol(symbol)?;
    Ok(is_winning_for(&board, symbol))
}

#[wasm_bindgen(js_name = "isDraw")]
pub fn is_draw_js(board: JsValue) -> Result<bool, JsValue> {
    let board = parse_board(board)?;
    Ok(is_draw(&board))
}

#[wasm_bindgen(js_name = "boardStatus")]
pub fn board_status_js(board: JsValue) -> Result<JsValue, JsValue> {
    let board = parse_board(board)?;
    to_value(&board.status()).map_err(JsValue::from)
}

/// 返回引擎的最佳落子；棋盘已满时返回 `undefined`。
#[wasm_bindgen(js_name = "bestMove")]
pub fn best_move_js(board: JsValue, engine: &str, human: &str) -> Result<Option<u32>, JsValue> {
    let board = parse_board(board)?;
    let engine = parse_symbol(engine)?;
    let human = parse_symbol(human)?;
    Ok(best_move(&board, engine, human).map(|cell| cell as u32))
}

#[wasm_bindgen(js_name = "searchBestMove")]
pub fn search_best_move_js(board: JsValue, engine: &str, human: &str) -> Result<JsValue, JsValue> {
    let board = parse_board(board)?;
    let engine = parse_symbol(engine)?;
    let human = parse_symbol(human)?;
    let decision = SearchEngine::new(engine, human).decide(&board);
    to_value(&decision).map_err(JsValue::from)
}
