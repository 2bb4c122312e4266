//! Custom diagrams defined in TOML.
//!
//! A definition file names the diagram and lists its right-hand regions in
//! resolution order. The left-hand table is optional; when it is missing it is
//! derived by reflecting the right-hand one through the diagram center.
//!
//! ```toml
//! name = "hub"
//!
//! [[right]]
//! label = "Depot"
//! kind = "rect"
//! left = 0.887
//! top = 0.621
//! right = 0.952
//! bottom = 0.807
//!
//! [[right]]
//! label = "Ring"
//! kind = "elliptical_sector"
//! cx = 0.98
//! cy = 0.043
//! outer_rx = 0.332
//! outer_ry = 0.201
//! start_deg = 90.0
//! sweep_deg = 90.0
//! ```

use super::{Diagram, Region, Shape};
use crate::error::{Error, Result};
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Deserialize)]
struct DiagramFile {
    name: String,
    right: Vec<Region>,
    left: Option<Vec<Region>>,
}

/// Parse and validate one diagram definition. `source` names it in errors.
pub fn parse_diagram(content: &str, source: &str) -> Result<Diagram> {
    let file: DiagramFile = toml::from_str(content).map_err(|e| Error::Diagram {
        diagram: source.to_string(),
        message: format!("failed to parse: {}", e),
    })?;

    let name = file.name.trim().to_string();
    if name.is_empty() {
        return Err(invalid(source, "name must not be empty"));
    }
    if name.parse::<super::DiagramKind>().is_ok() {
        return Err(invalid(
            source,
            &format!("name '{}' is reserved for a built-in diagram", name),
        ));
    }
    if file.right.is_empty() {
        return Err(invalid(source, "at least one right-hand region is required"));
    }

    for region in file.right.iter().chain(file.left.iter().flatten()) {
        validate_region(region).map_err(|message| Error::Diagram {
            diagram: name.clone(),
            message,
        })?;
    }

    Ok(match file.left {
        Some(left) => Diagram::new(name, file.right, left),
        None => Diagram::derived(name, file.right),
    })
}

/// Read and parse a diagram definition file.
pub fn load_file(path: &Path) -> Result<Diagram> {
    let content = std::fs::read_to_string(path)?;
    parse_diagram(&content, &path.display().to_string())
}

/// Load every `*.toml` diagram in `dir`, in file-name order.
///
/// A missing directory yields no diagrams. Any invalid file fails the load.
pub fn load_dir(dir: &Path) -> Result<Vec<Diagram>> {
    if !dir.is_dir() {
        tracing::warn!(dir = %dir.display(), "custom diagram directory not found");
        return Ok(vec![]);
    }

    let pattern = dir.join("*.toml");
    let entries = glob::glob(&pattern.to_string_lossy()).map_err(|e| Error::Diagram {
        diagram: dir.display().to_string(),
        message: format!("invalid glob pattern: {}", e),
    })?;

    let mut paths: Vec<_> = entries.flatten().collect();
    paths.sort();

    let mut diagrams = Vec::with_capacity(paths.len());
    for path in paths {
        let diagram = load_file(&path)?;
        tracing::debug!(path = %path.display(), name = %diagram.name, "loaded custom diagram");
        diagrams.push(diagram);
    }
    Ok(diagrams)
}

fn invalid(source: &str, message: &str) -> Error {
    Error::Diagram {
        diagram: source.to_string(),
        message: message.to_string(),
    }
}

fn validate_region(region: &Region) -> std::result::Result<(), String> {
    if region.label.trim().is_empty() {
        return Err("region label must not be empty".to_string());
    }
    validate_shape(&region.shape).map_err(|e| format!("region '{}': {}", region.label, e))
}

fn validate_shape(shape: &Shape) -> std::result::Result<(), String> {
    match shape {
        Shape::Rect(r) => {
            if ![r.left, r.top, r.right, r.bottom].iter().all(|v| v.is_finite()) {
                return Err("rectangle bounds must be finite".to_string());
            }
            if r.left > r.right || r.top > r.bottom {
                return Err("rectangle left/top must not exceed right/bottom".to_string());
            }
        }
        Shape::Grid(g) => {
            if g.rows == 0 || g.cols == 0 {
                return Err("grid must have at least one row and column".to_string());
            }
            if g.rows > 26 {
                return Err("grid rows are lettered A-Z".to_string());
            }
        }
        Shape::EllipticalSector(s) => {
            let values = [
                s.cx,
                s.cy,
                s.inner_rx,
                s.inner_ry,
                s.outer_rx,
                s.outer_ry,
                s.start_deg,
                s.sweep_deg,
            ];
            if !values.iter().all(|v| v.is_finite()) {
                return Err("sector parameters must be finite".to_string());
            }
            if [s.inner_rx, s.inner_ry, s.outer_rx, s.outer_ry]
                .iter()
                .any(|r| *r < 0.0)
            {
                return Err("sector radii must not be negative".to_string());
            }
            if s.sweep_deg <= 0.0 || s.sweep_deg > 360.0 {
                return Err("sweep_deg must be in (0, 360]".to_string());
            }
        }
        Shape::ClippedSector(s) => {
            let finite = s.corners.iter().all(|c| c.is_finite())
                && [s.cx, s.cy, s.inner_rx, s.inner_ry]
                    .iter()
                    .all(|v| v.is_finite());
            if !finite {
                return Err("clipped sector parameters must be finite".to_string());
            }
            if s.inner_rx < 0.0 || s.inner_ry < 0.0 {
                return Err("clipped sector radii must not be negative".to_string());
            }
        }
        Shape::Remainder { bounds, excluded } => {
            validate_shape(&Shape::Rect(*bounds))?;
            for shape in excluded {
                validate_shape(shape)?;
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{FieldView, Point};
    use crate::types::Alliance;
    use tempfile::TempDir;

    const RIGHT: FieldView = FieldView {
        alliance: Alliance::Blue,
        blue_right: true,
    };
    const LEFT: FieldView = FieldView {
        alliance: Alliance::Blue,
        blue_right: false,
    };

    const HUB: &str = r#"
name = "hub"

[[right]]
label = "Lane"
kind = "clipped_sector"
corners = [
    { x = 0.5, y = 0.0 },
    { x = 1.0, y = 0.0 },
    { x = 1.0, y = 0.5 },
    { x = 0.5, y = 0.5 },
]
cx = 1.0
cy = 0.0
inner_rx = 0.2
inner_ry = 0.2

[[right]]
label = "Rest"
kind = "rect"
left = 0.0
top = 0.0
right = 1.0
bottom = 1.0
"#;

    #[test]
    fn test_parse_clipped_sector_diagram() {
        let diagram = parse_diagram(HUB, "hub.toml").unwrap();
        assert_eq!(diagram.name, "hub");
        assert_eq!(diagram.right.len(), 2);

        // Inside the corner hole falls through to the enclosing rectangle
        assert_eq!(
            diagram.resolve(Point::new(0.95, 0.05), RIGHT).as_deref(),
            Some("Rest")
        );
        assert_eq!(
            diagram.resolve(Point::new(0.6, 0.4), RIGHT).as_deref(),
            Some("Lane")
        );
    }

    #[test]
    fn test_missing_left_table_is_derived() {
        let diagram = parse_diagram(HUB, "hub.toml").unwrap();
        assert_eq!(
            diagram
                .resolve(Point::new(0.6, 0.4).mirrored(), LEFT)
                .as_deref(),
            Some("Lane")
        );
    }

    #[test]
    fn test_explicit_left_table_is_kept() {
        let content = r#"
name = "halves"

[[right]]
label = "Near"
kind = "rect"
left = 0.5
top = 0.0
right = 1.0
bottom = 1.0

[[left]]
label = "Near"
kind = "rect"
left = 0.0
top = 0.0
right = 0.4
bottom = 1.0
"#;
        let diagram = parse_diagram(content, "halves.toml").unwrap();
        assert_eq!(
            diagram.resolve(Point::new(0.45, 0.5), LEFT),
            None
        );
        assert_eq!(
            diagram.resolve(Point::new(0.2, 0.5), LEFT).as_deref(),
            Some("Near")
        );
    }

    #[test]
    fn test_rejects_invalid_definitions() {
        let inverted = r#"
name = "bad"
[[right]]
label = "X"
kind = "rect"
left = 0.8
top = 0.0
right = 0.2
bottom = 1.0
"#;
        let err = parse_diagram(inverted, "bad.toml").unwrap_err();
        assert!(matches!(err, Error::Diagram { .. }));
        assert!(err.to_string().contains("region 'X'"));

        let reserved = "name = \"load\"\n[[right]]\nlabel = \"X\"\nkind = \"grid\"\nrows = 2\ncols = 2\n";
        assert!(parse_diagram(reserved, "load.toml").is_err());

        let empty = "name = \"nothing\"\nright = []\n";
        assert!(parse_diagram(empty, "nothing.toml").is_err());

        assert!(parse_diagram("not toml at all [", "x.toml").is_err());
    }

    #[test]
    fn test_load_dir_sorted_and_filtered() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("b_hub.toml"), HUB).unwrap();
        std::fs::write(
            dir.path().join("a_grid.toml"),
            "name = \"coarse\"\n[[right]]\nlabel = \"Field\"\nkind = \"grid\"\nrows = 2\ncols = 3\n",
        )
        .unwrap();
        std::fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let diagrams = load_dir(dir.path()).unwrap();
        let names: Vec<_> = diagrams.iter().map(|d| d.name.as_str()).collect();
        assert_eq!(names, vec!["coarse", "hub"]);
        assert_eq!(
            diagrams[0].resolve(Point::new(0.9, 0.9), RIGHT).as_deref(),
            Some("B3")
        );
    }

    #[test]
    fn test_load_dir_missing_is_empty() {
        let dir = TempDir::new().unwrap();
        assert!(load_dir(&dir.path().join("absent")).unwrap().is_empty());
    }
}
