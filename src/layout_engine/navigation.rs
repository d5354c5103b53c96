use tracing::trace;

use super::geometry::{ADJACENCY_TOLERANCE, Bounds, WindowBounds};
use super::Direction;
use crate::model::NodeId;

const OVERLAP_WEIGHT: f64 = 0.7;
const DISTANCE_WEIGHT: f64 = 0.3;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Candidate {
    pub id: NodeId,
    pub overlap_fraction: f64,
    pub gap: f64,
    pub score: f64,
}

/// Gap between `active` and `other` along `direction`, or `None` when `other`
/// does not lie entirely beyond `active` in that direction.
fn gap_beyond(active: &Bounds, other: &Bounds, direction: Direction) -> Option<f64> {
    let gap = match direction {
        Direction::Left => active.left - other.right,
        Direction::Right => other.left - active.right,
        Direction::Up => active.top - other.bottom,
        Direction::Down => other.top - active.bottom,
    };
    (gap > -ADJACENCY_TOLERANCE).then(|| gap.max(0.0))
}

/// Scores every leaf lying beyond `active` in `direction`, in input order.
pub fn score_candidates(
    bounds: &[WindowBounds],
    active: NodeId,
    direction: Direction,
) -> Vec<Candidate> {
    let Some(current) = bounds.iter().find(|wb| wb.id == active) else {
        return Vec::new();
    };
    let perpendicular = direction.orientation().perpendicular();
    let (start, end) = current.bounds.span(perpendicular);
    let extent = end - start;

    bounds
        .iter()
        .filter(|wb| wb.id != active)
        .filter_map(|wb| {
            let gap = gap_beyond(&current.bounds, &wb.bounds, direction)?;
            let overlap = current.bounds.overlap(&wb.bounds, perpendicular);
            if overlap <= 0.0 {
                return None;
            }
            let overlap_fraction = if extent > 0.0 { overlap / extent } else { 0.0 };
            let score = OVERLAP_WEIGHT * overlap_fraction + DISTANCE_WEIGHT * (1.0 / (1.0 + gap));
            Some(Candidate { id: wb.id, overlap_fraction, gap, score })
        })
        .collect()
}

/// Best leaf to move focus to from `active`. The earliest candidate wins ties.
pub fn find_best_neighbor(
    bounds: &[WindowBounds],
    active: NodeId,
    direction: Direction,
) -> Option<NodeId> {
    let best = score_candidates(bounds, active, direction).into_iter().fold(
        None::<Candidate>,
        |best, candidate| match best {
            Some(b) if b.score >= candidate.score => Some(b),
            _ => Some(candidate),
        },
    );
    trace!(?best, %direction, "navigation candidate");
    best.map(|c| c.id)
}
