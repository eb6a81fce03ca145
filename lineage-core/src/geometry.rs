//! Connector geometry for the positioned graph.
//!
//! Every placed union gets a stub line from each partner and a connector dot
//! at the union point. Unions with children additionally get a vertical drop
//! to a branch bar and one riser per child up to the child's avatar anchor.

use crate::layout::LayoutOptions;
use serde::{Deserialize, Serialize};

/// A straight polyline segment in world coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    pub x1: f64,
    pub y1: f64,
    pub x2: f64,
    pub y2: f64,
}

/// A connector dot at a union point.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Dot {
    pub x: f64,
    pub y: f64,
}

/// A union with everything the emitter needs already resolved to coordinates.
#[derive(Debug, Clone)]
pub(crate) struct PlacedUnion {
    pub x: f64,
    pub y: f64,
    pub partner_points: Vec<(f64, f64)>,
    pub child_points: Vec<(f64, f64)>,
}

/// Emit stub lines, connector dots, drops, branch bars and risers.
pub(crate) fn emit_connectors(
    placed: &[PlacedUnion],
    opts: &LayoutOptions,
) -> (Vec<Segment>, Vec<Dot>) {
    let mut segments = Vec::new();
    let mut dots = Vec::new();

    for union in placed {
        for &(px, py) in &union.partner_points {
            segments.push(Segment {
                x1: px,
                y1: py,
                x2: union.x,
                y2: union.y,
            });
        }
        dots.push(Dot {
            x: union.x,
            y: union.y,
        });

        if union.child_points.is_empty() {
            continue;
        }

        let branch_y = union.y + opts.branch_drop;
        segments.push(Segment {
            x1: union.x,
            y1: union.y,
            x2: union.x,
            y2: branch_y,
        });

        if union.child_points.len() > 1 {
            let min_x = union
                .child_points
                .iter()
                .map(|&(x, _)| x)
                .fold(f64::INFINITY, f64::min);
            let max_x = union
                .child_points
                .iter()
                .map(|&(x, _)| x)
                .fold(f64::NEG_INFINITY, f64::max);
            segments.push(Segment {
                x1: min_x,
                y1: branch_y,
                x2: max_x,
                y2: branch_y,
            });
        }

        for &(cx, cy) in &union.child_points {
            segments.push(Segment {
                x1: cx,
                y1: branch_y,
                x2: cx,
                y2: cy - opts.child_clearance,
            });
        }
    }

    (segments, dots)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn opts() -> LayoutOptions {
        LayoutOptions::default()
    }

    #[test]
    fn childless_union_gets_stubs_and_dot_only() {
        let placed = vec![PlacedUnion {
            x: 100.0,
            y: 80.0,
            partner_points: vec![(30.0, 80.0), (170.0, 80.0)],
            child_points: vec![],
        }];
        let (segments, dots) = emit_connectors(&placed, &opts());
        assert_eq!(segments.len(), 2);
        assert_eq!(dots.len(), 1);
        assert_eq!(dots[0], Dot { x: 100.0, y: 80.0 });
    }

    #[test]
    fn single_child_skips_the_branch_bar() {
        let placed = vec![PlacedUnion {
            x: 100.0,
            y: 80.0,
            partner_points: vec![(30.0, 80.0), (170.0, 80.0)],
            child_points: vec![(100.0, 260.0)],
        }];
        let (segments, _) = emit_connectors(&placed, &opts());
        // 2 stubs + 1 drop + 1 riser, no bar.
        assert_eq!(segments.len(), 4);
        let riser = segments[3];
        assert_eq!(riser.x1, 100.0);
        assert_eq!(riser.y2, 260.0 - opts().child_clearance);
    }

    #[test]
    fn branch_bar_spans_child_extremes() {
        let placed = vec![PlacedUnion {
            x: 100.0,
            y: 80.0,
            partner_points: vec![],
            child_points: vec![(40.0, 260.0), (220.0, 260.0), (100.0, 260.0)],
        }];
        let (segments, _) = emit_connectors(&placed, &opts());
        let bar = segments[1];
        assert_eq!((bar.x1, bar.x2), (40.0, 220.0));
        assert_eq!(bar.y1, 80.0 + opts().branch_drop);
    }
}
