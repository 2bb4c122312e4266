//! Built-in field diagrams.
//!
//! Coordinates are normalized to each diagram image. The right-hand tables
//! apply when the scouted robot's side is drawn on the right; the left-hand
//! tables are authored separately and are close to, but not exactly, the
//! 180 degree rotation of the right-hand ones.

use super::{Diagram, EllipticalSector, Grid, Rect, Region, Shape};

/// The diagrams a match scout taps on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum DiagramKind {
    StartPosition,
    Load,
    Ferry,
    Shoot,
    Grid,
}

impl DiagramKind {
    pub const ALL: [DiagramKind; 5] = [
        DiagramKind::StartPosition,
        DiagramKind::Load,
        DiagramKind::Ferry,
        DiagramKind::Shoot,
        DiagramKind::Grid,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DiagramKind::StartPosition => "start",
            DiagramKind::Load => "load",
            DiagramKind::Ferry => "ferry",
            DiagramKind::Shoot => "shoot",
            DiagramKind::Grid => "grid",
        }
    }
}

impl std::fmt::Display for DiagramKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for DiagramKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "start" | "start_position" => Ok(DiagramKind::StartPosition),
            "load" => Ok(DiagramKind::Load),
            "ferry" => Ok(DiagramKind::Ferry),
            "shoot" => Ok(DiagramKind::Shoot),
            "grid" => Ok(DiagramKind::Grid),
            _ => Err(format!("unknown diagram: {}", s)),
        }
    }
}

/// The built-in diagram of a kind, with its authored left-hand table.
pub fn builtin(kind: DiagramKind) -> Diagram {
    match kind {
        DiagramKind::StartPosition => start_position(),
        DiagramKind::Load => load(),
        DiagramKind::Ferry => ferry(),
        DiagramKind::Shoot => shoot(),
        DiagramKind::Grid => grid(),
    }
}

fn start_position() -> Diagram {
    Diagram::new(
        DiagramKind::StartPosition.as_str(),
        vec![
            Region::rect("L1", 0.412, 0.811, 0.515, 0.941),
            Region::rect("L2", 0.412, 0.594, 0.515, 0.811),
            Region::rect("L3a", 0.412, 0.508, 0.515, 0.594),
            Region::rect("L3b", 0.412, 0.427, 0.515, 0.511),
            Region::rect("L3", 0.515, 0.427, 0.605, 0.594),
            Region::rect("L4", 0.412, 0.204, 0.515, 0.427),
            Region::rect("L5", 0.412, 0.068, 0.515, 0.204),
        ],
        vec![
            Region::rect("L1", 0.478, 0.068, 0.584, 0.198),
            Region::rect("L2", 0.478, 0.201, 0.584, 0.421),
            Region::rect("L3a", 0.481, 0.424, 0.584, 0.508),
            Region::rect("L3b", 0.481, 0.508, 0.584, 0.591),
            Region::rect("L3", 0.392, 0.424, 0.481, 0.594),
            Region::rect("L4", 0.481, 0.588, 0.584, 0.808),
            Region::rect("L5", 0.481, 0.808, 0.584, 0.938),
        ],
    )
}

// Depot and Outpost sit inside Alliance and must come first.
const RIGHT_DEPOT: Rect = Rect::new(0.887, 0.621, 0.952, 0.807);
const RIGHT_OUTPOST: Rect = Rect::new(0.908, 0.086, 0.995, 0.186);
const LEFT_DEPOT: Rect = Rect::new(0.048, 0.211, 0.115, 0.396);
const LEFT_OUTPOST: Rect = Rect::new(0.007, 0.821, 0.099, 0.939);
const NEAR_SIDE_RIGHT: Rect = Rect::new(0.734, 0.061, 0.952, 0.939);
const NEAR_SIDE_LEFT: Rect = Rect::new(0.048, 0.061, 0.269, 0.939);
const NEUTRAL: Rect = Rect::new(0.311, 0.061, 0.695, 0.939);

fn load() -> Diagram {
    Diagram::new(
        DiagramKind::Load.as_str(),
        vec![
            Region::new("Depot", Shape::Rect(RIGHT_DEPOT)),
            Region::new("Outpost", Shape::Rect(RIGHT_OUTPOST)),
            Region::new("Alliance", Shape::Rect(NEAR_SIDE_RIGHT)),
            Region::new("Neutral", Shape::Rect(NEUTRAL)),
            Region::new("Opponent", Shape::Rect(NEAR_SIDE_LEFT)),
        ],
        vec![
            Region::new("Depot", Shape::Rect(LEFT_DEPOT)),
            Region::new("Outpost", Shape::Rect(LEFT_OUTPOST)),
            Region::new("Alliance", Shape::Rect(NEAR_SIDE_LEFT)),
            Region::new("Neutral", Shape::Rect(NEUTRAL)),
            Region::new("Opponent", Shape::Rect(NEAR_SIDE_RIGHT)),
        ],
    )
}

fn ferry() -> Diagram {
    Diagram::new(
        DiagramKind::Ferry.as_str(),
        vec![
            Region::new("Outpost", Shape::Rect(RIGHT_OUTPOST)),
            Region::new("Alliance", Shape::Rect(NEAR_SIDE_RIGHT)),
            Region::new("Neutral", Shape::Rect(NEUTRAL)),
        ],
        vec![
            Region::new("Outpost", Shape::Rect(LEFT_OUTPOST)),
            Region::new("Alliance", Shape::Rect(NEAR_SIDE_LEFT)),
            Region::new("Neutral", Shape::Rect(NEUTRAL)),
        ],
    )
}

const CORNER_INNER_RX: f64 = 0.332;
const CORNER_INNER_RY: f64 = 0.201;
const CORNER_OUTER_RX: f64 = 0.612;
const CORNER_OUTER_RY: f64 = 0.370;
const PZ_RX: f64 = 0.112;
const PZ_RY: f64 = 0.068;

fn filled(cx: f64, cy: f64, rx: f64, ry: f64, start_deg: f64, sweep_deg: f64) -> EllipticalSector {
    EllipticalSector {
        cx,
        cy,
        inner_rx: 0.0,
        inner_ry: 0.0,
        outer_rx: rx,
        outer_ry: ry,
        start_deg,
        sweep_deg,
    }
}

fn far_band(cx: f64, cy: f64, start_deg: f64) -> EllipticalSector {
    EllipticalSector {
        cx,
        cy,
        inner_rx: CORNER_INNER_RX,
        inner_ry: CORNER_INNER_RY,
        outer_rx: CORNER_OUTER_RX,
        outer_ry: CORNER_OUTER_RY,
        start_deg,
        sweep_deg: 90.0,
    }
}

/// Sector regions followed by `MZ`, the rest of the bounding rectangle.
fn shoot_table(sectors: Vec<(&str, EllipticalSector)>, mz_bounds: Rect) -> Vec<Region> {
    let excluded = sectors
        .iter()
        .map(|(_, s)| Shape::EllipticalSector(*s))
        .collect();
    let mut regions: Vec<Region> = sectors
        .into_iter()
        .map(|(label, s)| Region::new(label, Shape::EllipticalSector(s)))
        .collect();
    regions.push(Region::new(
        "MZ",
        Shape::Remainder {
            bounds: mz_bounds,
            excluded,
        },
    ));
    regions
}

fn shoot() -> Diagram {
    let right = shoot_table(
        vec![
            ("PZ", filled(0.281, 0.497, PZ_RX, PZ_RY, -90.0, 180.0)),
            (
                "CRZ",
                filled(0.98, 0.043, CORNER_INNER_RX, CORNER_INNER_RY, 90.0, 90.0),
            ),
            ("FRZ", far_band(0.98, 0.043, 90.0)),
            (
                "CLZ",
                filled(0.98, 0.926, CORNER_INNER_RX, CORNER_INNER_RY, 180.0, 90.0),
            ),
            ("FLZ", far_band(0.98, 0.926, 180.0)),
        ],
        Rect::new(0.40, 0.043, 0.98, 0.926),
    );
    let left = shoot_table(
        vec![
            ("PZ", filled(0.719, 0.509, PZ_RX, PZ_RY, 90.0, 180.0)),
            (
                "CLZ",
                filled(0.026, 0.065, CORNER_INNER_RX, CORNER_INNER_RY, 0.0, 90.0),
            ),
            ("FLZ", far_band(0.026, 0.065, 0.0)),
            (
                "CRZ",
                filled(0.026, 0.951, CORNER_INNER_RX, CORNER_INNER_RY, 270.0, 90.0),
            ),
            ("FRZ", far_band(0.026, 0.951, 270.0)),
        ],
        Rect::new(0.026, 0.065, 0.607, 0.951),
    );
    Diagram::new(DiagramKind::Shoot.as_str(), right, left)
}

fn grid() -> Diagram {
    Diagram::symmetric(
        DiagramKind::Grid.as_str(),
        vec![Region::new("Field", Shape::Grid(Grid::default()))],
    )
}
