//! Grid state: cells, card labels, and snapshot rendering.

use std::fmt;

/// Row/column pair addressing one cell. Cells are stored row-major.
pub type Coord = (usize, usize);

/// Identifies a player.
///
/// Any non-empty string names a player; front ends are expected to restrict
/// the alphabet at their own boundary. Records are created lazily on a
/// player's first flip, so merely constructing an id has no effect on any
/// board.
#[derive(Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct PlayerId(String);

impl PlayerId {
    /// Wraps a player name. Empty names are a programmer error.
    pub fn new(name: &str) -> Self {
        assert!(!name.is_empty(), "player id must be non-empty");
        Self(name.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<&str> for PlayerId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for PlayerId {
    fn from(value: String) -> Self {
        Self::new(&value)
    }
}

/// One board position.
///
/// A removed card leaves `label` absent; such a cell is always face down and
/// uncontrolled.
#[derive(Clone, Debug, Default)]
pub(crate) struct Cell {
    pub label: Option<String>,
    pub face_up: bool,
    pub controller: Option<PlayerId>,
}

impl Cell {
    /// Renders this cell for `viewer`, one snapshot line without the newline.
    fn render(&self, viewer: &PlayerId) -> String {
        match &self.label {
            None => "none".to_string(),
            Some(_) if !self.face_up => "down".to_string(),
            Some(label) if self.controller.as_ref() == Some(viewer) => format!("my {label}"),
            Some(label) => format!("up {label}"),
        }
    }
}

/// The rectangular card grid.
#[derive(Clone, Debug)]
pub(crate) struct Grid {
    rows: usize,
    cols: usize,
    cells: Vec<Cell>,
}

impl Grid {
    /// Builds a grid from exactly `rows * cols` labels in row-major order.
    ///
    /// Dimension and label well-formedness are construction preconditions;
    /// violating them is a programmer error.
    pub fn new(rows: usize, cols: usize, labels: Vec<String>) -> Self {
        assert!(rows > 0 && cols > 0, "board dimensions must be positive");
        assert_eq!(labels.len(), rows * cols, "label count must fill the grid");
        let cells = labels
            .into_iter()
            .map(|label| {
                assert!(
                    !label.is_empty() && !label.chars().any(char::is_whitespace),
                    "card labels must be non-empty and whitespace-free"
                );
                Cell {
                    label: Some(label),
                    ..Cell::default()
                }
            })
            .collect();
        Self { rows, cols, cells }
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn contains(&self, (row, col): Coord) -> bool {
        row < self.rows && col < self.cols
    }

    pub fn cell(&self, coord: Coord) -> &Cell {
        &self.cells[self.index(coord)]
    }

    pub fn cell_mut(&mut self, coord: Coord) -> &mut Cell {
        let idx = self.index(coord);
        &mut self.cells[idx]
    }

    /// All coordinates in row-major order.
    pub fn coords(&self) -> impl Iterator<Item = Coord> {
        let (rows, cols) = (self.rows, self.cols);
        (0..rows).flat_map(move |row| (0..cols).map(move |col| (row, col)))
    }

    fn index(&self, (row, col): Coord) -> usize {
        debug_assert!(self.contains((row, col)));
        row * self.cols + col
    }

    /// Renders the whole board from `viewer`'s perspective: a `<rows>x<cols>`
    /// header, one line per cell in row-major order, and a trailing newline.
    pub fn render(&self, viewer: &PlayerId) -> String {
        let mut out = format!("{}x{}\n", self.rows, self.cols);
        for cell in &self.cells {
            out.push_str(&cell.render(viewer));
            out.push('\n');
        }
        out
    }
}
