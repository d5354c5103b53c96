use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Axis a split divides. A horizontal split places its children side by side
/// (dividing width); a vertical split stacks them (dividing height).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Orientation {
    Horizontal,
    Vertical,
}

impl Orientation {
    pub fn perpendicular(self) -> Orientation {
        match self {
            Orientation::Horizontal => Orientation::Vertical,
            Orientation::Vertical => Orientation::Horizontal,
        }
    }
}

impl fmt::Display for Orientation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Orientation::Horizontal => "horizontal",
            Orientation::Vertical => "vertical",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Invalid {kind}: {value:?}")]
pub struct ParseDirectionError {
    kind: &'static str,
    value: String,
}

impl FromStr for Orientation {
    type Err = ParseDirectionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "h" | "horizontal" => Ok(Orientation::Horizontal),
            "v" | "vertical" => Ok(Orientation::Vertical),
            _ => Err(ParseDirectionError {
                kind: "orientation",
                value: s.to_string(),
            }),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Left,
    Right,
    Up,
    Down,
}

impl Direction {
    pub const ALL: [Direction; 4] =
        [Direction::Left, Direction::Right, Direction::Up, Direction::Down];

    pub fn orientation(self) -> Orientation {
        match self {
            Direction::Left | Direction::Right => Orientation::Horizontal,
            Direction::Up | Direction::Down => Orientation::Vertical,
        }
    }

    pub fn opposite(self) -> Direction {
        match self {
            Direction::Left => Direction::Right,
            Direction::Right => Direction::Left,
            Direction::Up => Direction::Down,
            Direction::Down => Direction::Up,
        }
    }

    /// Whether moving in this direction increases the coordinate along its axis.
    pub fn is_forward(self) -> bool { matches!(self, Direction::Right | Direction::Down) }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Direction::Left => "left",
            Direction::Right => "right",
            Direction::Up => "up",
            Direction::Down => "down",
        })
    }
}

impl FromStr for Direction {
    type Err = ParseDirectionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "left" | "l" => Ok(Direction::Left),
            "right" | "r" => Ok(Direction::Right),
            "up" | "u" => Ok(Direction::Up),
            "down" | "d" => Ok(Direction::Down),
            _ => Err(ParseDirectionError {
                kind: "direction",
                value: s.to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    mod direction_operations {
        use super::*;

        #[test]
        fn direction_orientation() {
            assert_eq!(Direction::Left.orientation(), Orientation::Horizontal);
            assert_eq!(Direction::Right.orientation(), Orientation::Horizontal);
            assert_eq!(Direction::Up.orientation(), Orientation::Vertical);
            assert_eq!(Direction::Down.orientation(), Orientation::Vertical);
        }

        #[test]
        fn direction_opposite() {
            for dir in Direction::ALL {
                assert_eq!(dir.opposite().opposite(), dir);
                assert_ne!(dir.opposite(), dir);
                assert_eq!(dir.opposite().orientation(), dir.orientation());
            }
        }

        #[test]
        fn direction_parsing() {
            assert_eq!("LEFT".parse::<Direction>().unwrap(), Direction::Left);
            assert_eq!(" down ".parse::<Direction>().unwrap(), Direction::Down);
            let err = "sideways".parse::<Direction>().unwrap_err();
            assert_eq!(err.to_string(), "Invalid direction: \"sideways\"");
        }
    }

    mod orientation_operations {
        use super::*;

        #[test]
        fn orientation_parsing() {
            assert_eq!("h".parse::<Orientation>().unwrap(), Orientation::Horizontal);
            assert_eq!("Vertical".parse::<Orientation>().unwrap(), Orientation::Vertical);
            assert!("x".parse::<Orientation>().is_err());
        }

        #[test]
        fn orientation_perpendicular() {
            assert_eq!(Orientation::Horizontal.perpendicular(), Orientation::Vertical);
            assert_eq!(Orientation::Vertical.perpendicular(), Orientation::Horizontal);
        }
    }
}
