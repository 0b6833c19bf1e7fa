use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// 棋盘格子数量（3x3，行优先）。
pub const CELL_COUNT: usize = 9;

/// 三行、三列、两条对角线。
pub const WINNING_LINES: [[usize; 3]; 8] = [
    [0, 1, 2],
    [3, 4, 5],
    [6, 7, 8],
    [0, 3, 6],
    [1, 4, 7],
    [2, 5, 8],
    [0, 4, 8],
    [2, 4, 6],
];

/// 格子下标（0..9）。
pub type CellIndex = usize;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Symbol {
    X,
    O,
}

impl Symbol {
    pub fn opponent(self) -> Symbol {
        match self {
            Symbol::X => Symbol::O,
            Symbol::O => Symbol::X,
        }
    }

    /// 棋盘格子中的标记只接受 `X`/`O`（不区分大小写）。
    pub fn from_marker(value: &str) -> Option<Symbol> {
        match value.trim() {
            "X" | "x" => Some(Symbol::X),
            "O" | "o" => Some(Symbol::O),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Symbol::X => "X",
            Symbol::O => "O",
        }
    }
}

impl FromStr for Symbol {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "x" | "cross" => Ok(Symbol::X),
            "o" | "nought" | "circle" => Ok(Symbol::O),
            _ => Err(()),
        }
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type")]
pub enum BoardError {
    WrongLength { len: usize },
    UnknownMarker { value: String },
}

impl fmt::Display for BoardError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BoardError::WrongLength { len } => {
                write!(f, "board must have {CELL_COUNT} cells, got {len}")
            }
            BoardError::UnknownMarker { value } => write!(f, "unknown cell marker {value:?}"),
        }
    }
}

impl std::error::Error for BoardError {}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type")]
pub enum BoardStatus {
    Ongoing,
    Won { symbol: Symbol, line: [CellIndex; 3] },
    Draw,
}

/// 棋盘。与前端交换时序列化为 9 个字符串的数组，空格子为 `""`。
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "Vec<String>", into = "Vec<String>")]
pub struct Board {
    cells: [Option<Symbol>; CELL_COUNT],
}

impl Board {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_cells(cells: [Option<Symbol>; CELL_COUNT]) -> Self {
        Self { cells }
    }

    pub fn cells(&self) -> &[Option<Symbol>; CELL_COUNT] {
        &self.cells
    }

    pub fn get(&self, index: CellIndex) -> Option<Symbol> {
        self.cells.get(index).copied().flatten()
    }

    pub fn is_empty_at(&self, index: CellIndex) -> bool {
        matches!(self.cells.get(index), Some(None))
    }

    /// 放置棋子，不检查格子是否已被占用。
    pub fn place(&mut self, index: CellIndex, symbol: Symbol) {
        self.cells[index] = Some(symbol);
    }

    pub fn clear(&mut self, index: CellIndex) {
        self.cells[index] = None;
    }

    pub fn empty_cells(&self) -> impl Iterator<Item = CellIndex> + '_ {
        self.cells
            .iter()
            .enumerate()
            .filter(|(_, cell)| cell.is_none())
            .map(|(index, _)| index)
    }

    pub fn is_full(&self) -> bool {
        self.cells.iter().all(Option::is_some)
    }

    pub fn count(&self, symbol: Symbol) -> usize {
        self.cells
            .iter()
            .filter(|cell| **cell == Some(symbol))
            .count()
    }

    pub fn winning_line(&self, symbol: Symbol) -> Option<[CellIndex; 3]> {
        WINNING_LINES
            .iter()
            .find(|line| line.iter().all(|&index| self.cells[index] == Some(symbol)))
            .copied()
    }

    pub fn is_winning_for(&self, symbol: Symbol) -> bool {
        self.winning_line(symbol).is_some()
    }

    /// 棋盘已满且双方都没有连线。
    pub fn is_draw(&self) -> bool {
        self.is_full() && !self.is_winning_for(Symbol::X) && !self.is_winning_for(Symbol::O)
    }

    pub fn status(&self) -> BoardStatus {
        for symbol in [Symbol::X, Symbol::O] {
            if let Some(line) = self.winning_line(symbol) {
                return BoardStatus::Won { symbol, line };
            }
        }
        if self.is_full() {
            BoardStatus::Draw
        } else {
            BoardStatus::Ongoing
        }
    }
}

pub fn is_winning_for(board: &Board, symbol: Symbol) -> bool {
    board.is_winning_for(symbol)
}

pub fn is_draw(board: &Board) -> bool {
    board.is_draw()
}

impl TryFrom<Vec<String>> for Board {
    type Error = BoardError;

    fn try_from(values: Vec<String>) -> Result<Self, Self::Error> {
        if values.len() != CELL_COUNT {
            return Err(BoardError::WrongLength { len: values.len() });
        }
        let mut board = Board::new();
        for (index, value) in values.iter().enumerate() {
            if value.trim().is_empty() {
                continue;
            }
            let symbol = Symbol::from_marker(value).ok_or_else(|| BoardError::UnknownMarker {
                value: value.clone(),
            })?;
            board.place(index, symbol);
        }
        Ok(board)
    }
}

impl From<Board> for Vec<String> {
    fn from(board: Board) -> Self {
        board
            .cells
            .iter()
            .map(|cell| cell.map(Symbol::as_str).unwrap_or("").to_string())
            .collect()
    }
}

impl FromStr for Board {
    type Err = BoardError;

    /// 紧凑写法：9 个字符，`X`/`O` 为棋子，`.`、`-`、`_` 或空格为空格子。
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let values: Vec<String> = s
            .chars()
            .filter(|c| !matches!(c, '\n' | '\r' | '|'))
            .map(|c| match c {
                '.' | '-' | '_' | ' ' => String::new(),
                other => other.to_string(),
            })
            .collect();
        Board::try_from(values)
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (row, chunk) in self.cells.chunks(3).enumerate() {
            if row > 0 {
                writeln!(f)?;
            }
            for cell in chunk {
                f.write_str(cell.map(Symbol::as_str).unwrap_or("."))?;
            }
        }
        Ok(())
    }
}
