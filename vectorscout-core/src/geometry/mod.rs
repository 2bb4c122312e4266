//! Field diagram zone resolution.
//!
//! A tap on a diagram arrives as a point normalized to the diagram's unit
//! square (x to the right, y down). Each [`Diagram`] holds two ordered lists of
//! [`Region`]s, one for when the scouted robot is drawn on the right-hand side
//! of the field and one for the left. Resolution walks the active list in
//! declaration order and returns the first region containing the point, so a
//! small region declared before a larger one that encloses it wins.
//!
//! All containment tests are boundary-inclusive so that repeated taps on the
//! same pixel always resolve the same way.

pub mod custom;
pub mod diagrams;

pub use diagrams::{builtin, DiagramKind};

use crate::config::GeometryConfig;
use crate::error::Result;
use crate::types::Alliance;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

const EPSILON: f64 = 1e-9;

/// Default size of the field grid diagram.
pub const GRID_SIZE: u8 = 5;

// ============================================
// Primitives
// ============================================

/// A point in normalized diagram space.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }

    /// Reflection through the diagram center.
    pub fn mirrored(&self) -> Point {
        Point::new(1.0 - self.x, 1.0 - self.y)
    }
}

/// Axis-aligned rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub left: f64,
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
}

impl Rect {
    pub const fn new(left: f64, top: f64, right: f64, bottom: f64) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
        }
    }

    pub fn contains(&self, p: Point) -> bool {
        p.x >= self.left && p.x <= self.right && p.y >= self.top && p.y <= self.bottom
    }

    pub fn center(&self) -> Point {
        Point::new(
            (self.left + self.right) / 2.0,
            (self.top + self.bottom) / 2.0,
        )
    }

    pub fn mirrored(&self) -> Rect {
        Rect::new(
            1.0 - self.right,
            1.0 - self.bottom,
            1.0 - self.left,
            1.0 - self.top,
        )
    }
}

/// Uniform grid whose cells are labelled `letter(row) + (col + 1)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Grid {
    pub rows: u8,
    pub cols: u8,
}

impl Default for Grid {
    fn default() -> Self {
        Self {
            rows: GRID_SIZE,
            cols: GRID_SIZE,
        }
    }
}

impl Grid {
    /// Every finite point lands in some cell.
    pub fn contains(&self, p: Point) -> bool {
        p.is_finite() && self.rows > 0 && self.cols > 0
    }

    /// Cell label for a point.
    ///
    /// Row and column indices are clamped into the grid, so taps past an edge
    /// (or exactly on the far edge) land in the nearest border cell.
    pub fn label_at(&self, p: Point) -> Option<String> {
        if !self.contains(p) {
            return None;
        }
        let row = clamp_index(p.y, self.rows);
        let col = clamp_index(p.x, self.cols);
        Some(cell_label(row, col))
    }

    /// Center of a labelled cell, for highlighting a selection.
    pub fn cell_center(&self, label: &str) -> Option<Point> {
        let mut chars = label.chars();
        let letter = chars.next()?.to_ascii_uppercase();
        if !letter.is_ascii_uppercase() {
            return None;
        }
        let row = (letter as u8 - b'A') as usize;
        let col = chars.as_str().parse::<usize>().ok()?.checked_sub(1)?;
        if row >= self.rows as usize || col >= self.cols as usize {
            return None;
        }
        Some(Point::new(
            (col as f64 + 0.5) / self.cols as f64,
            (row as f64 + 0.5) / self.rows as f64,
        ))
    }

    /// Every cell label in row-major order.
    pub fn labels(&self) -> Vec<String> {
        (0..self.rows as usize)
            .flat_map(|row| (0..self.cols as usize).map(move |col| cell_label(row, col)))
            .collect()
    }
}

fn clamp_index(v: f64, n: u8) -> usize {
    (v * n as f64).floor().clamp(0.0, (n - 1) as f64) as usize
}

fn cell_label(row: usize, col: usize) -> String {
    format!("{}{}", (b'A' + row as u8) as char, col + 1)
}

/// Elliptical annular sector.
///
/// Angles are in degrees with 0 along +x and 90 along +y (screen down).
/// Zero inner radii make a filled sector.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EllipticalSector {
    pub cx: f64,
    pub cy: f64,
    #[serde(default)]
    pub inner_rx: f64,
    #[serde(default)]
    pub inner_ry: f64,
    pub outer_rx: f64,
    pub outer_ry: f64,
    pub start_deg: f64,
    pub sweep_deg: f64,
}

impl EllipticalSector {
    pub fn contains(&self, p: Point) -> bool {
        let dx = p.x - self.cx;
        let dy = p.y - self.cy;

        // A zero outer radius leaves the sector unbounded radially.
        if self.outer_rx > 0.0
            && self.outer_ry > 0.0
            && ellipse_distance(dx, dy, self.outer_rx, self.outer_ry) > 1.0
        {
            return false;
        }

        outside_inner(dx, dy, self.inner_rx, self.inner_ry)
            && angle_within(point_angle(dx, dy), self.start_deg, self.sweep_deg)
    }

    pub fn mirrored(&self) -> EllipticalSector {
        EllipticalSector {
            cx: 1.0 - self.cx,
            cy: 1.0 - self.cy,
            start_deg: (self.start_deg + 180.0).rem_euclid(360.0),
            ..*self
        }
    }

    /// A point halfway through the sweep, midway between the radii.
    pub fn representative_point(&self) -> Point {
        let angle = (self.start_deg + self.sweep_deg / 2.0).to_radians();
        let (rx, ry) = if self.inner_rx > 0.0 && self.inner_ry > 0.0 {
            (
                (self.inner_rx + self.outer_rx) / 2.0,
                (self.inner_ry + self.outer_ry) / 2.0,
            )
        } else {
            (self.outer_rx / 2.0, self.outer_ry / 2.0)
        };
        Point::new(self.cx + rx * angle.cos(), self.cy + ry * angle.sin())
    }
}

/// Quadrilateral with an elliptical hole around a center point.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClippedSector {
    pub corners: [Point; 4],
    pub cx: f64,
    pub cy: f64,
    pub inner_rx: f64,
    pub inner_ry: f64,
}

impl ClippedSector {
    pub fn contains(&self, p: Point) -> bool {
        point_in_polygon(p, &self.corners)
            && outside_inner(p.x - self.cx, p.y - self.cy, self.inner_rx, self.inner_ry)
    }

    pub fn mirrored(&self) -> ClippedSector {
        ClippedSector {
            corners: self.corners.map(|c| c.mirrored()),
            cx: 1.0 - self.cx,
            cy: 1.0 - self.cy,
            ..*self
        }
    }

    /// The corner centroid, or a point between it and a corner when the
    /// centroid falls inside the hole.
    pub fn representative_point(&self) -> Point {
        let centroid = Point::new(
            self.corners.iter().map(|c| c.x).sum::<f64>() / 4.0,
            self.corners.iter().map(|c| c.y).sum::<f64>() / 4.0,
        );
        if self.contains(centroid) {
            return centroid;
        }
        self.corners
            .iter()
            .flat_map(|c| {
                [0.25, 0.5, 0.75].map(|t| {
                    Point::new(
                        centroid.x + (c.x - centroid.x) * t,
                        centroid.y + (c.y - centroid.y) * t,
                    )
                })
            })
            .find(|p| self.contains(*p))
            .unwrap_or(centroid)
    }
}

/// Weighted squared distance of an offset from an ellipse's center.
fn ellipse_distance(dx: f64, dy: f64, rx: f64, ry: f64) -> f64 {
    (dx * dx) / (rx * rx) + (dy * dy) / (ry * ry)
}

/// True when the offset is on or outside the inner ellipse, or there is none.
fn outside_inner(dx: f64, dy: f64, rx: f64, ry: f64) -> bool {
    if rx > 0.0 && ry > 0.0 {
        ellipse_distance(dx, dy, rx, ry) >= 1.0
    } else {
        true
    }
}

/// Angle of an offset in [0, 360).
fn point_angle(dx: f64, dy: f64) -> f64 {
    let angle = dy.atan2(dx).to_degrees();
    if angle < 0.0 {
        angle + 360.0
    } else {
        angle
    }
}

/// Whether `angle` lies in the closed sweep `[start, start + sweep]` modulo 360.
fn angle_within(angle: f64, start_deg: f64, sweep_deg: f64) -> bool {
    if sweep_deg >= 360.0 {
        return true;
    }
    let start = start_deg.rem_euclid(360.0);
    let end = start + sweep_deg;
    if end > 360.0 {
        angle >= start || angle <= end - 360.0
    } else {
        angle >= start && angle <= end
    }
}

/// Ray-casting point-in-polygon; points on an edge count as inside.
fn point_in_polygon(p: Point, polygon: &[Point]) -> bool {
    let n = polygon.len();
    if n < 3 {
        return false;
    }
    for i in 0..n {
        if on_segment(p, polygon[i], polygon[(i + 1) % n]) {
            return true;
        }
    }

    let mut inside = false;
    let mut j = n - 1;
    for i in 0..n {
        let (a, b) = (polygon[i], polygon[j]);
        if (a.y > p.y) != (b.y > p.y) {
            let cross_x = (b.x - a.x) * (p.y - a.y) / (b.y - a.y) + a.x;
            if p.x < cross_x {
                inside = !inside;
            }
        }
        j = i;
    }
    inside
}

fn on_segment(p: Point, a: Point, b: Point) -> bool {
    let cross = (b.x - a.x) * (p.y - a.y) - (b.y - a.y) * (p.x - a.x);
    if cross.abs() > EPSILON {
        return false;
    }
    p.x >= a.x.min(b.x) - EPSILON
        && p.x <= a.x.max(b.x) + EPSILON
        && p.y >= a.y.min(b.y) - EPSILON
        && p.y <= a.y.max(b.y) + EPSILON
}

// ============================================
// Shapes and regions
// ============================================

/// Geometry of a region.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Shape {
    Rect(Rect),
    Grid(Grid),
    EllipticalSector(EllipticalSector),
    ClippedSector(ClippedSector),
    /// Area inside `bounds` not covered by any of `excluded`
    Remainder { bounds: Rect, excluded: Vec<Shape> },
}

impl Shape {
    pub fn contains(&self, p: Point) -> bool {
        if !p.is_finite() {
            return false;
        }
        match self {
            Shape::Rect(r) => r.contains(p),
            Shape::Grid(g) => g.contains(p),
            Shape::EllipticalSector(s) => s.contains(p),
            Shape::ClippedSector(s) => s.contains(p),
            Shape::Remainder { bounds, excluded } => {
                bounds.contains(p) && !excluded.iter().any(|s| s.contains(p))
            }
        }
    }

    /// Reflection through the diagram center.
    pub fn mirrored(&self) -> Shape {
        match self {
            Shape::Rect(r) => Shape::Rect(r.mirrored()),
            Shape::Grid(g) => Shape::Grid(*g),
            Shape::EllipticalSector(s) => Shape::EllipticalSector(s.mirrored()),
            Shape::ClippedSector(s) => Shape::ClippedSector(s.mirrored()),
            Shape::Remainder { bounds, excluded } => Shape::Remainder {
                bounds: bounds.mirrored(),
                excluded: excluded.iter().map(Shape::mirrored).collect(),
            },
        }
    }

    /// A point that lies inside the shape, used to highlight a selection.
    pub fn representative_point(&self) -> Point {
        match self {
            Shape::Rect(r) => r.center(),
            Shape::Grid(_) => Point::new(0.5, 0.5),
            Shape::EllipticalSector(s) => s.representative_point(),
            Shape::ClippedSector(s) => s.representative_point(),
            Shape::Remainder { bounds, .. } => {
                const STEPS: usize = 8;
                let width = bounds.right - bounds.left;
                let height = bounds.bottom - bounds.top;
                (0..STEPS)
                    .flat_map(|row| (0..STEPS).map(move |col| (row, col)))
                    .map(|(row, col)| {
                        Point::new(
                            bounds.left + width * (col as f64 + 0.5) / STEPS as f64,
                            bounds.top + height * (row as f64 + 0.5) / STEPS as f64,
                        )
                    })
                    .find(|p| self.contains(*p))
                    .unwrap_or_else(|| bounds.center())
            }
        }
    }
}

/// A labelled region of a diagram.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Region {
    pub label: String,
    #[serde(flatten)]
    pub shape: Shape,
}

impl Region {
    pub fn new(label: impl Into<String>, shape: Shape) -> Self {
        Self {
            label: label.into(),
            shape,
        }
    }

    pub fn rect(label: &str, left: f64, top: f64, right: f64, bottom: f64) -> Self {
        Self::new(label, Shape::Rect(Rect::new(left, top, right, bottom)))
    }

    /// Label for a point inside this region; grid regions yield the cell label.
    pub fn label_at(&self, p: Point) -> Option<String> {
        match &self.shape {
            Shape::Grid(grid) => grid.label_at(p),
            shape if shape.contains(p) => Some(self.label.clone()),
            _ => None,
        }
    }

    pub fn mirrored(&self) -> Region {
        Region::new(self.label.clone(), self.shape.mirrored())
    }
}

// ============================================
// Field view and mirroring
// ============================================

/// Which way the field is drawn for the robot being scouted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldView {
    /// Alliance of the scouted robot
    pub alliance: Alliance,
    /// Field-orientation toggle: blue alliance drawn on the right
    pub blue_right: bool,
}

impl FieldView {
    pub fn new(alliance: Alliance, blue_right: bool) -> Self {
        Self {
            alliance,
            blue_right,
        }
    }

    /// Whether the scouted robot's side is drawn on the right.
    pub fn robot_on_right(&self) -> bool {
        match self.alliance {
            Alliance::Blue => self.blue_right,
            Alliance::Red => !self.blue_right,
        }
    }

    pub fn toggled(&self) -> FieldView {
        FieldView::new(self.alliance, !self.blue_right)
    }
}

/// Where left-hand coordinates come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MirrorMode {
    /// Use the hand-authored left-hand tables as they are
    #[default]
    Authored,
    /// Reflect the right-hand tables through the diagram center
    Derived,
}

// ============================================
// Diagrams
// ============================================

/// A field diagram with right- and left-hand region tables.
#[derive(Debug, Clone, PartialEq)]
pub struct Diagram {
    pub name: String,
    pub right: Vec<Region>,
    pub left: Vec<Region>,
}

impl Diagram {
    pub fn new(name: impl Into<String>, right: Vec<Region>, left: Vec<Region>) -> Self {
        Self {
            name: name.into(),
            right,
            left,
        }
    }

    /// A diagram drawn the same regardless of orientation.
    pub fn symmetric(name: impl Into<String>, regions: Vec<Region>) -> Self {
        Self::new(name, regions.clone(), regions)
    }

    /// A diagram whose left-hand table is the reflection of `right`.
    pub fn derived(name: impl Into<String>, right: Vec<Region>) -> Self {
        let left = right.iter().map(Region::mirrored).collect();
        Self::new(name, right, left)
    }

    /// Replace the left-hand table with the reflection of the right-hand one.
    pub fn with_mirror_mode(self, mode: MirrorMode) -> Self {
        match mode {
            MirrorMode::Authored => self,
            MirrorMode::Derived => Self::derived(self.name, self.right),
        }
    }

    pub fn regions(&self, view: FieldView) -> &[Region] {
        if view.robot_on_right() {
            &self.right
        } else {
            &self.left
        }
    }

    /// Label of the first region containing `point`, or `None`.
    pub fn resolve(&self, point: Point, view: FieldView) -> Option<String> {
        if !point.is_finite() {
            return None;
        }
        self.regions(view)
            .iter()
            .find_map(|region| region.label_at(point))
    }

    /// Distinct labels across both tables, in declaration order.
    pub fn labels(&self) -> Vec<String> {
        let mut labels: Vec<String> = Vec::new();
        for region in self.right.iter().chain(self.left.iter()) {
            let names = match &region.shape {
                Shape::Grid(grid) => grid.labels(),
                _ => vec![region.label.clone()],
            };
            for name in names {
                if !labels.contains(&name) {
                    labels.push(name);
                }
            }
        }
        labels
    }
}

/// The built-in diagrams plus any custom ones, keyed for lookup.
#[derive(Debug, Clone)]
pub struct DiagramSet {
    builtin: BTreeMap<DiagramKind, Diagram>,
    custom: BTreeMap<String, Diagram>,
}

impl DiagramSet {
    /// Built-in diagrams with the given mirroring.
    pub fn builtin(mode: MirrorMode) -> Self {
        let builtin = DiagramKind::ALL
            .into_iter()
            .map(|kind| (kind, builtin(kind).with_mirror_mode(mode)))
            .collect();
        Self {
            builtin,
            custom: BTreeMap::new(),
        }
    }

    /// Built-ins per the geometry config, plus custom diagrams from its directory.
    pub fn from_config(config: &GeometryConfig) -> Result<Self> {
        let mut set = Self::builtin(config.mirror_mode);
        if let Some(dir) = &config.diagram_dir {
            for diagram in custom::load_dir(dir)? {
                set.insert_custom(diagram);
            }
        }
        Ok(set)
    }

    pub fn insert_custom(&mut self, diagram: Diagram) {
        tracing::debug!(name = %diagram.name, "registered custom diagram");
        self.custom.insert(diagram.name.clone(), diagram);
    }

    pub fn get(&self, kind: DiagramKind) -> Option<&Diagram> {
        self.builtin.get(&kind)
    }

    pub fn get_custom(&self, name: &str) -> Option<&Diagram> {
        self.custom.get(name)
    }

    /// Look a diagram up by built-in kind name or custom name.
    pub fn find(&self, name: &str) -> Option<&Diagram> {
        match name.parse::<DiagramKind>() {
            Ok(kind) => self.get(kind),
            Err(_) => self.get_custom(name),
        }
    }

    pub fn resolve(&self, kind: DiagramKind, point: Point, view: FieldView) -> Option<String> {
        self.get(kind)?.resolve(point, view)
    }

    pub fn custom_names(&self) -> impl Iterator<Item = &str> {
        self.custom.keys().map(String::as_str)
    }
}

impl Default for DiagramSet {
    fn default() -> Self {
        Self::builtin(MirrorMode::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BLUE_RIGHT: FieldView = FieldView {
        alliance: Alliance::Blue,
        blue_right: true,
    };

    #[test]
    fn test_robot_on_right_rule() {
        assert!(FieldView::new(Alliance::Blue, true).robot_on_right());
        assert!(!FieldView::new(Alliance::Blue, false).robot_on_right());
        assert!(!FieldView::new(Alliance::Red, true).robot_on_right());
        assert!(FieldView::new(Alliance::Red, false).robot_on_right());
        assert!(!BLUE_RIGHT.toggled().robot_on_right());
    }

    #[test]
    fn test_rect_is_boundary_inclusive() {
        let rect = Rect::new(0.05, 0.06, 0.27, 0.94);
        assert!(rect.contains(Point::new(0.05, 0.06)));
        assert!(rect.contains(Point::new(0.27, 0.94)));
        assert!(rect.contains(Point::new(0.16, 0.50)));
        assert!(!rect.contains(Point::new(0.2700001, 0.5)));
    }

    #[test]
    fn test_grid_labels_and_clamping() {
        let grid = Grid::default();
        assert_eq!(grid.label_at(Point::new(0.0, 0.0)).as_deref(), Some("A1"));
        assert_eq!(grid.label_at(Point::new(0.99, 0.1)).as_deref(), Some("A5"));
        assert_eq!(grid.label_at(Point::new(0.1, 0.99)).as_deref(), Some("E1"));
        assert_eq!(grid.label_at(Point::new(1.0, 1.0)).as_deref(), Some("E5"));
        assert_eq!(grid.label_at(Point::new(0.45, 0.65)).as_deref(), Some("D3"));
        assert_eq!(grid.label_at(Point::new(1.2, 0.5)).as_deref(), Some("C5"));
        assert_eq!(grid.label_at(Point::new(f64::NAN, 0.5)), None);
        assert_eq!(grid.label_at(Point::new(0.5, f64::INFINITY)), None);
        assert_eq!(grid.labels().len(), 25);
    }

    #[test]
    fn test_grid_clamps_negative_coordinates() {
        let grid = Grid::default();
        assert_eq!(grid.label_at(Point::new(-0.01, 0.0)).as_deref(), Some("A1"));
        assert_eq!(grid.label_at(Point::new(0.5, -3.0)).as_deref(), Some("A3"));
        assert_eq!(grid.label_at(Point::new(-1.0, 7.5)).as_deref(), Some("E1"));
        assert!(grid.contains(Point::new(-1.0, 7.5)));
    }

    #[test]
    fn test_grid_cell_center_round_trips() {
        let grid = Grid::default();
        for label in grid.labels() {
            let center = grid.cell_center(&label).unwrap();
            assert_eq!(grid.label_at(center), Some(label));
        }
        assert_eq!(grid.cell_center("F1"), None);
        assert_eq!(grid.cell_center("A6"), None);
        assert_eq!(grid.cell_center("A0"), None);
    }

    #[test]
    fn test_filled_sector_with_wraparound() {
        // Right half of an ellipse: -90..90
        let sector = EllipticalSector {
            cx: 0.5,
            cy: 0.5,
            inner_rx: 0.0,
            inner_ry: 0.0,
            outer_rx: 0.2,
            outer_ry: 0.1,
            start_deg: -90.0,
            sweep_deg: 180.0,
        };
        assert!(sector.contains(Point::new(0.6, 0.5)));
        assert!(sector.contains(Point::new(0.5, 0.45)));
        assert!(sector.contains(Point::new(0.7, 0.5)));
        assert!(!sector.contains(Point::new(0.4, 0.5)));
        assert!(!sector.contains(Point::new(0.6, 0.65)));
    }

    #[test]
    fn test_annular_sector_excludes_hole() {
        let sector = EllipticalSector {
            cx: 0.0,
            cy: 0.0,
            inner_rx: 0.2,
            inner_ry: 0.2,
            outer_rx: 0.4,
            outer_ry: 0.4,
            start_deg: 0.0,
            sweep_deg: 90.0,
        };
        assert!(!sector.contains(Point::new(0.1, 0.1)));
        assert!(sector.contains(Point::new(0.2, 0.0)));
        assert!(sector.contains(Point::new(0.4, 0.0)));
        assert!(sector.contains(Point::new(0.2, 0.2)));
        assert!(!sector.contains(Point::new(0.3, 0.3)));
    }

    #[test]
    fn test_sector_mirror_keeps_membership() {
        let sector = EllipticalSector {
            cx: 0.98,
            cy: 0.043,
            inner_rx: 0.332,
            inner_ry: 0.201,
            outer_rx: 0.612,
            outer_ry: 0.370,
            start_deg: 90.0,
            sweep_deg: 90.0,
        };
        let p = sector.representative_point();
        assert!(sector.contains(p));
        assert!(sector.mirrored().contains(p.mirrored()));
        assert_eq!(sector.mirrored().start_deg, 270.0);
    }

    #[test]
    fn test_clipped_sector() {
        let sector = ClippedSector {
            corners: [
                Point::new(0.0, 0.0),
                Point::new(0.6, 0.0),
                Point::new(0.6, 0.4),
                Point::new(0.0, 0.4),
            ],
            cx: 0.0,
            cy: 0.0,
            inner_rx: 0.3,
            inner_ry: 0.2,
        };
        assert!(!sector.contains(Point::new(0.1, 0.1)));
        assert!(sector.contains(Point::new(0.5, 0.3)));
        assert!(sector.contains(Point::new(0.6, 0.2)));
        assert!(sector.contains(Point::new(0.3, 0.0)));
        assert!(!sector.contains(Point::new(0.7, 0.2)));
        assert!(sector.contains(sector.representative_point()));
        assert!(sector
            .mirrored()
            .contains(Point::new(0.5, 0.3).mirrored()));
    }

    #[test]
    fn test_point_in_polygon_non_rectangular() {
        let quad = [
            Point::new(0.5, 0.0),
            Point::new(1.0, 0.5),
            Point::new(0.5, 1.0),
            Point::new(0.0, 0.5),
        ];
        assert!(point_in_polygon(Point::new(0.5, 0.5), &quad));
        assert!(point_in_polygon(Point::new(0.75, 0.25), &quad));
        assert!(!point_in_polygon(Point::new(0.9, 0.1), &quad));
    }

    #[test]
    fn test_remainder_excludes_shapes() {
        let hole = Shape::Rect(Rect::new(0.4, 0.4, 0.6, 0.6));
        let remainder = Shape::Remainder {
            bounds: Rect::new(0.0, 0.0, 1.0, 1.0),
            excluded: vec![hole],
        };
        assert!(!remainder.contains(Point::new(0.5, 0.5)));
        assert!(remainder.contains(Point::new(0.1, 0.5)));
        assert!(remainder.contains(remainder.representative_point()));
    }

    #[test]
    fn test_first_declared_region_wins() {
        let diagram = Diagram::symmetric(
            "overlap",
            vec![
                Region::rect("Depot", 0.1, 0.1, 0.2, 0.2),
                Region::rect("Alliance", 0.0, 0.0, 0.5, 1.0),
            ],
        );
        assert_eq!(
            diagram.resolve(Point::new(0.15, 0.15), BLUE_RIGHT).as_deref(),
            Some("Depot")
        );
        assert_eq!(
            diagram.resolve(Point::new(0.3, 0.5), BLUE_RIGHT).as_deref(),
            Some("Alliance")
        );
        assert_eq!(diagram.resolve(Point::new(0.8, 0.5), BLUE_RIGHT), None);
    }

    #[test]
    fn test_non_finite_point_resolves_to_none() {
        let diagram = Diagram::symmetric("all", vec![Region::rect("X", 0.0, 0.0, 1.0, 1.0)]);
        assert_eq!(
            diagram.resolve(Point::new(f64::INFINITY, 0.5), BLUE_RIGHT),
            None
        );
    }

    #[test]
    fn test_derived_diagram_mirrors_right_table() {
        let diagram = Diagram::derived("d", vec![Region::rect("A", 0.7, 0.1, 0.9, 0.3)]);
        let left_view = FieldView::new(Alliance::Red, true);
        assert_eq!(
            diagram.resolve(Point::new(0.2, 0.8), left_view).as_deref(),
            Some("A")
        );
        assert_eq!(diagram.resolve(Point::new(0.8, 0.2), left_view), None);
    }

    #[test]
    fn test_diagram_set_lookup() {
        let set = DiagramSet::default();
        assert!(set.find("load").is_some());
        assert!(set.find("nope").is_none());
        assert_eq!(
            set.resolve(DiagramKind::Grid, Point::new(0.05, 0.05), BLUE_RIGHT)
                .as_deref(),
            Some("A1")
        );
    }
}
