//! Grid cells and the 16-color console palette.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::{PageError, COLUMNS, ROWS};

/// One of the 16 console colors a cell can be painted with.
///
/// The discriminant is the palette index used by both the text format and
/// the wire format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum Color {
    /// Index 0
    Black = 0,
    /// Index 1
    DarkBlue = 1,
    /// Index 2
    DarkGreen = 2,
    /// Index 3
    DarkCyan = 3,
    /// Index 4
    DarkRed = 4,
    /// Index 5
    DarkMagenta = 5,
    /// Index 6
    DarkYellow = 6,
    /// Index 7
    Gray = 7,
    /// Index 8
    DarkGray = 8,
    /// Index 9
    Blue = 9,
    /// Index 10
    Green = 10,
    /// Index 11
    Cyan = 11,
    /// Index 12
    Red = 12,
    /// Index 13
    Magenta = 13,
    /// Index 14
    Yellow = 14,
    /// Index 15
    White = 15,
}

impl Color {
    /// The whole palette in index order.
    pub const ALL: [Color; 16] = [
        Color::Black,
        Color::DarkBlue,
        Color::DarkGreen,
        Color::DarkCyan,
        Color::DarkRed,
        Color::DarkMagenta,
        Color::DarkYellow,
        Color::Gray,
        Color::DarkGray,
        Color::Blue,
        Color::Green,
        Color::Cyan,
        Color::Red,
        Color::Magenta,
        Color::Yellow,
        Color::White,
    ];

    /// Palette index of this color.
    pub fn index(self) -> u8 {
        self as u8
    }

    /// Look up a color by palette index.
    pub fn from_index(index: i64) -> Result<Self, PageError> {
        usize::try_from(index)
            .ok()
            .and_then(|i| Self::ALL.get(i).copied())
            .ok_or(PageError::InvalidColor(index))
    }

    /// Human-readable name.
    pub fn name(self) -> &'static str {
        match self {
            Color::Black => "Black",
            Color::DarkBlue => "DarkBlue",
            Color::DarkGreen => "DarkGreen",
            Color::DarkCyan => "DarkCyan",
            Color::DarkRed => "DarkRed",
            Color::DarkMagenta => "DarkMagenta",
            Color::DarkYellow => "DarkYellow",
            Color::Gray => "Gray",
            Color::DarkGray => "DarkGray",
            Color::Blue => "Blue",
            Color::Green => "Green",
            Color::Cyan => "Cyan",
            Color::Red => "Red",
            Color::Magenta => "Magenta",
            Color::Yellow => "Yellow",
            Color::White => "White",
        }
    }
}

impl TryFrom<u8> for Color {
    type Error = PageError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::from_index(i64::from(value))
    }
}

impl FromStr for Color {
    type Err = PageError;

    /// Accepts a palette index or a case-insensitive color name.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if let Ok(index) = s.parse::<i64>() {
            return Self::from_index(index);
        }
        Self::ALL
            .iter()
            .copied()
            .find(|c| c.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| PageError::InvalidCell(format!("unknown color name {s:?}")))
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Encode a sign as its single UTF-16 code unit, if it has one.
pub fn sign_code_unit(sign: char) -> Option<u16> {
    let mut units = [0u16; 2];
    match sign.encode_utf16(&mut units) {
        [unit] => Some(*unit),
        _ => None,
    }
}

/// Whether `sign` can be stored in a cell: a single UTF-16 code unit that is
/// not a control character.
pub fn is_supported_sign(sign: char) -> bool {
    !sign.is_control() && sign_code_unit(sign).is_some()
}

/// Decode a single UTF-16 code unit back into a sign.
pub fn sign_from_code_unit(unit: u16) -> Result<char, PageError> {
    char::from_u32(u32::from(unit)).ok_or(PageError::InvalidSignCodeUnit(unit))
}

/// A single grid position: a sign plus a foreground/background color pair.
///
/// A cell starts out empty and becomes non-empty the first time its sign or
/// one of its colors is set. It never becomes empty again.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cell {
    x: u16,
    y: u16,
    sign: char,
    fore: Color,
    back: Color,
    is_empty: bool,
}

impl Cell {
    /// Sign of a blank cell.
    pub const BLANK_SIGN: char = ' ';
    /// Foreground of a blank cell.
    pub const BLANK_FORE: Color = Color::Gray;
    /// Background of a blank cell.
    pub const BLANK_BACK: Color = Color::Black;

    /// A blank placeholder at `(x, y)`. Coordinates are trusted.
    pub(crate) fn blank(x: u16, y: u16) -> Self {
        Self {
            x,
            y,
            sign: Self::BLANK_SIGN,
            fore: Self::BLANK_FORE,
            back: Self::BLANK_BACK,
            is_empty: true,
        }
    }

    /// A non-empty cell with validated coordinates and sign.
    pub fn new(x: i64, y: i64, sign: char, fore: Color, back: Color) -> Result<Self, PageError> {
        let (x, y) = checked_coordinates(x, y)?;
        if !is_supported_sign(sign) {
            return Err(PageError::UnsupportedSign(sign));
        }
        Ok(Self {
            x,
            y,
            sign,
            fore,
            back,
            is_empty: false,
        })
    }

    /// Column.
    pub fn x(&self) -> u16 {
        self.x
    }

    /// Row.
    pub fn y(&self) -> u16 {
        self.y
    }

    /// Displayed character.
    pub fn sign(&self) -> char {
        self.sign
    }

    /// Foreground color.
    pub fn fore(&self) -> Color {
        self.fore
    }

    /// Background color.
    pub fn back(&self) -> Color {
        self.back
    }

    /// Whether the cell was never set.
    pub fn is_empty(&self) -> bool {
        self.is_empty
    }

    /// Set the sign. Fails for control characters and for characters outside
    /// the Basic Multilingual Plane.
    pub fn set_sign(&mut self, sign: char) -> Result<(), PageError> {
        if !is_supported_sign(sign) {
            return Err(PageError::UnsupportedSign(sign));
        }
        self.sign = sign;
        self.is_empty = false;
        Ok(())
    }

    /// Set the foreground color.
    pub fn set_fore(&mut self, fore: Color) {
        self.fore = fore;
        self.is_empty = false;
    }

    /// Set the background color.
    pub fn set_back(&mut self, back: Color) {
        self.back = back;
        self.is_empty = false;
    }

    /// Copy sign and colors from `other`, marking this cell non-empty.
    ///
    /// Coordinates are kept; `other` was validated when it was built.
    pub(crate) fn overwrite_from(&mut self, other: &Cell) {
        self.sign = other.sign;
        self.fore = other.fore;
        self.back = other.back;
        self.is_empty = false;
    }
}

fn checked_coordinates(x: i64, y: i64) -> Result<(u16, u16), PageError> {
    let in_range = |v: i64, limit: usize| usize::try_from(v).map_or(false, |v| v < limit);
    if in_range(x, COLUMNS) && in_range(y, ROWS) {
        // Both fit in u16 because the grid is 80x25.
        Ok((x as u16, y as u16))
    } else {
        Err(PageError::CellOutOfBounds {
            x,
            y,
            columns: COLUMNS,
            rows: ROWS,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn palette_index_roundtrip() {
        for (i, color) in Color::ALL.iter().enumerate() {
            assert_eq!(color.index() as usize, i);
            assert_eq!(Color::try_from(i as u8).unwrap(), *color);
        }
    }

    #[test]
    fn out_of_range_color_fails() {
        assert_eq!(Color::try_from(16), Err(PageError::InvalidColor(16)));
        assert_eq!(Color::from_index(-1), Err(PageError::InvalidColor(-1)));
    }

    #[test]
    fn color_from_name_or_index() {
        assert_eq!("yellow".parse::<Color>().unwrap(), Color::Yellow);
        assert_eq!("DarkCyan".parse::<Color>().unwrap(), Color::DarkCyan);
        assert_eq!("12".parse::<Color>().unwrap(), Color::Red);
        assert!("mauve".parse::<Color>().is_err());
        assert!("16".parse::<Color>().is_err());
    }

    #[test]
    fn color_serializes_by_name() {
        let json = serde_json::to_string(&Color::DarkYellow).unwrap();
        assert_eq!(json, "\"DarkYellow\"");
        let back: Color = serde_json::from_str(&json).unwrap();
        assert_eq!(back, Color::DarkYellow);
    }

    #[test]
    fn blank_cell_defaults() {
        let cell = Cell::blank(3, 4);
        assert!(cell.is_empty());
        assert_eq!(cell.sign(), ' ');
        assert_eq!(cell.fore(), Color::Gray);
        assert_eq!(cell.back(), Color::Black);
        assert_eq!((cell.x(), cell.y()), (3, 4));
    }

    #[test]
    fn any_setter_marks_cell_non_empty() {
        let mut cell = Cell::blank(0, 0);
        cell.set_fore(Color::Gray);
        assert!(!cell.is_empty(), "setting the same color still counts");

        let mut cell = Cell::blank(0, 0);
        cell.set_back(Color::Blue);
        assert!(!cell.is_empty());

        let mut cell = Cell::blank(0, 0);
        cell.set_sign('A').unwrap();
        assert!(!cell.is_empty());
        assert_eq!(cell.sign(), 'A');
    }

    #[test]
    fn non_bmp_sign_is_rejected() {
        let mut cell = Cell::blank(0, 0);
        assert_eq!(cell.set_sign('😀'), Err(PageError::UnsupportedSign('😀')));
        assert!(cell.is_empty());
        assert!(Cell::new(0, 0, '😀', Color::White, Color::Black).is_err());
    }

    #[test]
    fn control_sign_is_rejected() {
        for sign in ['\r', '\n', '\t', '\u{0}', '\u{85}'] {
            let mut cell = Cell::blank(0, 0);
            assert_eq!(cell.set_sign(sign), Err(PageError::UnsupportedSign(sign)));
            assert!(cell.is_empty());
            assert!(Cell::new(0, 0, sign, Color::White, Color::Black).is_err());
        }
        assert!(is_supported_sign(' '));
        assert!(is_supported_sign('#'));
    }

    #[test]
    fn new_cell_checks_bounds() {
        assert!(Cell::new(79, 24, 'x', Color::White, Color::Black).is_ok());
        assert!(matches!(
            Cell::new(80, 0, 'x', Color::White, Color::Black),
            Err(PageError::CellOutOfBounds { x: 80, .. })
        ));
        assert!(Cell::new(0, 25, 'x', Color::White, Color::Black).is_err());
        assert!(Cell::new(-1, 0, 'x', Color::White, Color::Black).is_err());
    }

    #[test]
    fn sign_code_unit_roundtrip() {
        for c in ['A', ' ', 'é', '€', '#', ';', ','] {
            let unit = sign_code_unit(c).unwrap();
            assert_eq!(sign_from_code_unit(unit).unwrap(), c);
        }
        assert!(sign_code_unit('😀').is_none());
        assert_eq!(
            sign_from_code_unit(0xD800),
            Err(PageError::InvalidSignCodeUnit(0xD800))
        );
    }
}
