//! Text map parsing
//!
//! A map is a list of equally long rows of single-character cell codes.
//! Row 0 is the top of the world, so it lands on the highest `y`.

use super::error::{SimError, SimResult};
use super::types::{Cell, Direction};

/// What a single map character asks the world to build
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    Obstacle,
    Destination,
    Street(Direction),
    /// A street with a traffic light on the same cell
    LightedStreet { direction: Direction, green: bool },
}

impl Placement {
    pub fn from_code(code: char) -> Option<Placement> {
        let placement = match code {
            '#' => Placement::Obstacle,
            'D' => Placement::Destination,
            '^' => Placement::Street(Direction::North),
            '>' => Placement::Street(Direction::East),
            'v' => Placement::Street(Direction::South),
            '<' => Placement::Street(Direction::West),
            'A' => Placement::LightedStreet {
                direction: Direction::North,
                green: true,
            },
            'B' => Placement::LightedStreet {
                direction: Direction::South,
                green: true,
            },
            'i' => Placement::LightedStreet {
                direction: Direction::West,
                green: false,
            },
            'd' => Placement::LightedStreet {
                direction: Direction::East,
                green: false,
            },
            _ => return None,
        };
        Some(placement)
    }
}

/// Check that `rows` describes a non-empty `width` x `height` rectangle
pub fn validate<S: AsRef<str>>(width: usize, height: usize, rows: &[S]) -> SimResult<()> {
    if width == 0 || height == 0 {
        return Err(SimError::MalformedMap("map is empty".to_string()));
    }
    if rows.len() != height {
        return Err(SimError::MalformedMap(format!(
            "expected {} rows, found {}",
            height,
            rows.len()
        )));
    }
    for (index, row) in rows.iter().enumerate() {
        let row_width = row.as_ref().chars().count();
        if row_width != width {
            return Err(SimError::MalformedMap(format!(
                "row {} has {} cells, expected {}",
                index, row_width, width
            )));
        }
    }
    Ok(())
}

/// Width and height of a map, taken from its first row
pub fn dimensions<S: AsRef<str>>(rows: &[S]) -> (usize, usize) {
    let width = rows.first().map_or(0, |row| row.as_ref().chars().count());
    (width, rows.len())
}

/// Every placement in the map with the cell it belongs to, scanning rows
/// top to bottom
pub fn placements<S: AsRef<str>>(rows: &[S]) -> Vec<(Cell, Placement)> {
    let height = rows.len() as i32;
    let mut placements = Vec::new();
    for (row_index, row) in rows.iter().enumerate() {
        let y = height - 1 - row_index as i32;
        for (x, code) in row.as_ref().chars().enumerate() {
            if let Some(placement) = Placement::from_code(code) {
                placements.push((Cell::new(x as i32, y), placement));
            }
        }
    }
    placements
}

/// The 30x30 city used when no map file is given
pub const DEFAULT_MAP: &[&str] = &[
    "v<<<<<<<<<<<<<<<<i<<<<<<<<<<<<",
    "vv<<<<<<<<<<<<<<<i<<<<<<<<<<<^",
    "vv##^###^###vv#AA#####D#####^^",
    "vv##^#D#^###vv#^^<<<<<<<<<<<^^",
    "vv>>>>>>>>>>vv#^^<<<<<<<<<<<^^",
    "vv#Dv#v#^#v#vv#^^###########^^",
    "vv##v#v#^Dv#vv#^^>>>>>>>>>>>^^",
    "vv<<<<<<<<v<vv#^^>>>>>>>>>>>^^",
    "vv#Dv#D###v#vv#^^####vv##D##^^",
    "vv>>>>>>>>v>vv#^^D###vv#####^^",
    "vv##B##D##v#vv#^^####BB#####^^",
    "vv<<<i<<<<<<<<<<<<<<<<<i<<<<^^",
    "vv<<<i<<<<<<<<<<<<<<<<<i<<<<^^",
    "vv#########vv###^^##########^^",
    "vv########Dvv###^^##########^^",
    "vv#########vv###^^###D######^^",
    "vv>>>d>>>>>>>>>>>>>>>>>>>>>d^^",
    "vv>>>d>>>>>>>>>>>>>>>>>>>>>d^^",
    "vv#vv#AA####vv#^^####vv#####AA",
    "vv#vv#^^D###vv#^^###Dvv#####^^",
    "vv#vv#^^####vv#^^####vv#####^^",
    "vv#vv#^^#D##vv#^^####vv#####^^",
    "vv#vv#^^<<<<vv<^^<<<<vv<<<<<^^",
    "vv#vv#^^<<<<vv<^^<<<<vv<<<<<^^",
    "vv#vv#^^####vv#^^#D##vv#####^^",
    "vv#vv#^^D###vv#^^####vv#####^^",
    "vv#vv#^^####vv#^^####vv#####^^",
    "vv#vv#^^####BB#^^####BB##D##^^",
    "v>>>>>>>>>>d>>>>>>>>d>>>>>>>^^",
    ">>>>>>>>>>>d>>>>>>>>d>>>>>>>>^",
];
