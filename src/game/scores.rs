use std::cell::RefCell;
use std::rc::Rc;

use serde::{Deserialize, Serialize};

use super::session::Side;
use crate::utils::console_warn;

/// localStorage 中使用的键。
pub const HUMAN_WINS_KEY: &str = "humanScore";
pub const ENGINE_WINS_KEY: &str = "engineScore";
pub const TIES_KEY: &str = "tieScore";

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Tallies {
    pub human_wins: u32,
    pub engine_wins: u32,
    pub ties: u32,
}

impl Tallies {
    /// `winner` 为空表示平局。
    pub fn record(&mut self, winner: Option<Side>) {
        match winner {
            Some(Side::Human) => self.human_wins = self.human_wins.saturating_add(1),
            Some(Side::Engine) => self.engine_wins = self.engine_wins.saturating_add(1),
            None => self.ties = self.ties.saturating_add(1),
        }
    }

    pub fn any(&self) -> bool {
        self.human_wins > 0 || self.engine_wins > 0 || self.ties > 0
    }

    pub fn total(&self) -> u32 {
        self.human_wins
            .saturating_add(self.engine_wins)
            .saturating_add(self.ties)
    }
}

/// 比分持久化接口，由宿主应用注入。
pub trait ScoreStore {
    fn load(&self) -> Tallies;
    fn save(&mut self, tallies: &Tallies);
}

/// 内存存储。克隆出的句柄共享同一份比分。
#[derive(Debug, Clone, Default)]
pub struct MemoryScoreStore {
    tallies: Rc<RefCell<Tallies>>,
}

impl MemoryScoreStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_tallies(tallies: Tallies) -> Self {
        Self {
            tallies: Rc::new(RefCell::new(tallies)),
        }
    }

    pub fn snapshot(&self) -> Tallies {
        *self.tallies.borrow()
    }
}

impl ScoreStore for MemoryScoreStore {
    fn load(&self) -> Tallies {
        self.snapshot()
    }

    fn save(&mut self, tallies: &Tallies) {
        *self.tallies.borrow_mut() = *tallies;
    }
}

/// 浏览器 `localStorage` 存储，键与页面原有的键保持一致。
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalStorageScoreStore;

impl LocalStorageScoreStore {
    pub fn new() -> Self {
        Self
    }

    fn storage() -> Option<web_sys::Storage> {
        web_sys::window()?.local_storage().ok().flatten()
    }

    fn read(storage: &web_sys::Storage, key: &str) -> u32 {
        storage
            .get_item(key)
            .ok()
            .flatten()
            .and_then(|value| parse_count(&value))
            .unwrap_or(0)
    }
}

impl ScoreStore for LocalStorageScoreStore {
    fn load(&self) -> Tallies {
        let Some(storage) = Self::storage() else {
            console_warn!("localStorage unavailable, starting scores at zero");
            return Tallies::default();
        };
        Tallies {
            human_wins: Self::read(&storage, HUMAN_WINS_KEY),
            engine_wins: Self::read(&storage, ENGINE_WINS_KEY),
            ties: Self::read(&storage, TIES_KEY),
        }
    }

    fn save(&mut self, tallies: &Tallies) {
        let Some(storage) = Self::storage() else {
            console_warn!("localStorage unavailable, scores not saved");
            return;
        };
        let entries = [
            (HUMAN_WINS_KEY, tallies.human_wins),
            (ENGINE_WINS_KEY, tallies.engine_wins),
            (TIES_KEY, tallies.ties),
        ];
        for (key, value) in entries {
            if storage.set_item(key, &value.to_string()).is_err() {
                console_warn!("failed to save {key}");
            }
        }
    }
}

/// 与页面的 `parseInt(value) || 0` 行为一致：取开头的数字部分。
fn parse_count(value: &str) -> Option<u32> {
    let digits: String = value
        .trim_start()
        .chars()
        .take_while(|c| c.is_ascii_digit())
        .collect();
    digits.parse().ok()
}
