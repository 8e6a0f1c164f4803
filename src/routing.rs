//! Orthogonal wire routing.
//!
//! Paths are lists of grid points where consecutive points differ on exactly
//! one axis. Diagonal steps are broken with a single corner at
//! `(next.x, current.y)`: horizontal first, then vertical.

use crate::model::{Circuit, GridPoint};

/// Append `p` to `path`, inserting a corner if the step would be diagonal
/// and skipping it if it repeats the last point.
fn push_orthogonal(path: &mut Vec<GridPoint>, p: GridPoint) {
    let Some(&last) = path.last() else {
        path.push(p);
        return;
    };
    if last == p {
        return;
    }
    if last.x != p.x && last.y != p.y {
        path.push(GridPoint::new(p.x, last.y));
    }
    path.push(p);
}

/// Route `start` → `waypoints` → `end` as an orthogonal path.
///
/// Waypoints that coincide with their predecessor are dropped. A wire whose
/// start and end coincide (with no waypoints) routes to a single point.
pub fn route(start: GridPoint, end: GridPoint, waypoints: &[GridPoint]) -> Vec<GridPoint> {
    let mut path = Vec::with_capacity(waypoints.len() * 2 + 3);
    path.push(start);
    for &p in waypoints.iter().chain(std::iter::once(&end)) {
        push_orthogonal(&mut path, p);
    }
    path
}

/// True if every segment of `path` is horizontal or vertical and no two
/// consecutive points coincide.
pub fn is_orthogonal(path: &[GridPoint]) -> bool {
    path.windows(2)
        .all(|w| (w[0].x == w[1].x) != (w[0].y == w[1].y))
}

/// Move vertex `index` to `to`, re-routing only the two segments that touch
/// it. Returns `None` if `index` is out of range.
pub fn move_point(path: &[GridPoint], index: usize, to: GridPoint) -> Option<Vec<GridPoint>> {
    if index >= path.len() {
        return None;
    }
    let mut out = Vec::with_capacity(path.len() + 2);
    out.extend_from_slice(&path[..index]);
    push_orthogonal(&mut out, to);
    for &p in &path[index + 1..] {
        push_orthogonal(&mut out, p);
    }
    Some(out)
}

fn between(v: i32, a: i32, b: i32) -> bool {
    a.min(b) <= v && v <= a.max(b)
}

/// True if `p` lies on the axis-aligned segment `a`–`b` (ends included).
pub fn on_segment(a: GridPoint, b: GridPoint, p: GridPoint) -> bool {
    (a.x == b.x && p.x == a.x && between(p.y, a.y, b.y))
        || (a.y == b.y && p.y == a.y && between(p.x, a.x, b.x))
}

/// Index of the first segment (`path[i]`–`path[i+1]`) containing `p`.
pub fn segment_containing(path: &[GridPoint], p: GridPoint) -> Option<usize> {
    path.windows(2).position(|w| on_segment(w[0], w[1], p))
}

/// Position of `p` along the path as a vertex index: the vertex itself, or
/// the start vertex of the segment it lies on.
pub fn path_position(path: &[GridPoint], p: GridPoint) -> Option<usize> {
    path.iter()
        .position(|&q| q == p)
        .or_else(|| segment_containing(path, p))
}

/// Make `at` a vertex of `path`, splitting the segment it lies on. Returns
/// the vertex index, or `None` if `at` is not on the path.
pub fn insert_vertex(path: &mut Vec<GridPoint>, at: GridPoint) -> Option<usize> {
    if let Some(i) = path.iter().position(|&q| q == at) {
        return Some(i);
    }
    let segment = segment_containing(path, at)?;
    path.insert(segment + 1, at);
    Some(segment + 1)
}

fn clamp_to_segment(a: GridPoint, b: GridPoint, p: GridPoint) -> GridPoint {
    if a.x == b.x {
        GridPoint::new(a.x, p.y.clamp(a.y.min(b.y), a.y.max(b.y)))
    } else if a.y == b.y {
        GridPoint::new(p.x.clamp(a.x.min(b.x), a.x.max(b.x)), a.y)
    } else if dist2(a, p) <= dist2(b, p) {
        a
    } else {
        b
    }
}

fn dist2(a: GridPoint, b: GridPoint) -> i64 {
    let dx = (a.x - b.x) as i64;
    let dy = (a.y - b.y) as i64;
    dx * dx + dy * dy
}

/// The grid point on `path` closest to `p`. Earlier segments win ties.
pub fn closest_point_on_path(path: &[GridPoint], p: GridPoint) -> Option<GridPoint> {
    if path.len() == 1 {
        return path.first().copied();
    }
    path.windows(2)
        .map(|w| clamp_to_segment(w[0], w[1], p))
        .min_by_key(|&q| dist2(q, p))
}

pub fn translate_path(path: &[GridPoint], dx: i32, dy: i32) -> Vec<GridPoint> {
    path.iter().map(|p| p.offset(dx, dy)).collect()
}

/// Length of the common prefix of two paths; the first vertex index at which
/// the new path differs from the old one.
pub fn first_change(old: &[GridPoint], new: &[GridPoint]) -> usize {
    old.iter().zip(new).take_while(|(a, b)| a == b).count()
}

/// After the path of `wire_index` changed from `old_path`, move every
/// junction on it that sits at or after the first changed vertex.
///
/// A moved junction snaps to the closest point of the new path, becomes a
/// vertex of it, and drags the start of its tapping wire along. Tapping
/// wires that carry junctions of their own are refreshed in turn. Returns
/// the number of junctions re-snapped.
pub fn refresh_junctions(circuit: &mut Circuit, wire_index: usize, old_path: &[GridPoint]) -> usize {
    let budget = circuit.junctions.len();
    refresh_junctions_bounded(circuit, wire_index, old_path, budget)
}

fn refresh_junctions_bounded(
    circuit: &mut Circuit,
    wire_index: usize,
    old_path: &[GridPoint],
    budget: usize,
) -> usize {
    let Some(new_path) = circuit.wires.get(wire_index).map(|w| w.points.clone()) else {
        return 0;
    };
    let changed_from = first_change(old_path, &new_path);
    if changed_from == old_path.len() && changed_from == new_path.len() {
        return 0;
    }

    let mut moved = 0;
    for j in 0..circuit.junctions.len() {
        if circuit.junctions[j].source_wire_index != wire_index {
            continue;
        }
        let old_pos = circuit.junctions[j].pos;
        let affected = match path_position(old_path, old_pos) {
            Some(i) => i >= changed_from || path_position(&new_path, old_pos).is_none(),
            None => true,
        };
        if !affected {
            continue;
        }

        let source = &mut circuit.wires[wire_index];
        let Some(new_pos) = closest_point_on_path(&source.points, old_pos) else {
            continue;
        };
        insert_vertex(&mut source.points, new_pos);
        circuit.junctions[j].pos = new_pos;
        moved += 1;
        if new_pos == old_pos {
            continue;
        }
        log::debug!("junction {j} on wire {wire_index} moved {old_pos} -> {new_pos}");

        let tap_id = circuit.junctions[j].connected_wire_id.clone();
        let Some((tap_index, tap)) = circuit.wire_by_id(&tap_id) else {
            continue;
        };
        let tap_old = tap.points.clone();
        let vertex = if tap.start_point() == old_pos { 0 } else { tap_old.len().saturating_sub(1) };
        if let Some(points) = move_point(&tap_old, vertex, new_pos) {
            let tap = &mut circuit.wires[tap_index];
            tap.points = points;
            tap.sync_end_positions();
            if budget > 0 {
                moved += refresh_junctions_bounded(circuit, tap_index, &tap_old, budget - 1);
            }
        }
    }
    moved
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{PortDirection, Wire, WireEnd, WireJunction};

    fn p(x: i32, y: i32) -> GridPoint {
        GridPoint::new(x, y)
    }

    #[test]
    fn diagonal_pair_gets_horizontal_first_corner() {
        assert_eq!(route(p(7, 6), p(10, 5), &[]), vec![p(7, 6), p(10, 6), p(10, 5)]);
    }

    #[test]
    fn straight_runs_need_no_corner() {
        assert_eq!(route(p(0, 0), p(5, 0), &[]), vec![p(0, 0), p(5, 0)]);
        assert_eq!(route(p(0, 0), p(0, -4), &[]), vec![p(0, 0), p(0, -4)]);
    }

    #[test]
    fn waypoints_are_routed_in_order() {
        let path = route(p(0, 0), p(6, 6), &[p(3, 2), p(3, 2), p(1, 5)]);
        assert_eq!(path, vec![p(0, 0), p(3, 0), p(3, 2), p(1, 2), p(1, 5), p(6, 5), p(6, 6)]);
        assert!(is_orthogonal(&path));
    }

    #[test]
    fn waypoint_on_destination_is_not_duplicated() {
        let path = route(p(0, 0), p(4, 4), &[p(4, 0), p(4, 4)]);
        assert_eq!(path, vec![p(0, 0), p(4, 0), p(4, 4)]);
    }

    #[test]
    fn degenerate_wire_is_one_point() {
        assert_eq!(route(p(2, 2), p(2, 2), &[]), vec![p(2, 2)]);
    }

    #[test]
    fn router_never_emits_diagonals() {
        let coords = [-3, 0, 2, 7];
        for &sx in &coords {
            for &sy in &coords {
                for &ex in &coords {
                    for &ey in &coords {
                        let wp = [p(sy, ex), p(ey, sx)];
                        let path = route(p(sx, sy), p(ex, ey), &wp);
                        assert!(is_orthogonal(&path), "{path:?}");
                        assert_eq!(path.first(), Some(&p(sx, sy)));
                        assert_eq!(path.last(), Some(&p(ex, ey)));
                    }
                }
            }
        }
    }

    #[test]
    fn moving_an_endpoint_only_touches_its_segment() {
        let path = vec![p(0, 0), p(4, 0), p(4, 4), p(8, 4)];
        let moved = move_point(&path, 3, p(9, 6)).unwrap();
        assert_eq!(moved, vec![p(0, 0), p(4, 0), p(4, 4), p(9, 4), p(9, 6)]);
        let moved = move_point(&path, 0, p(-1, 2)).unwrap();
        assert_eq!(moved, vec![p(-1, 2), p(4, 2), p(4, 0), p(4, 4), p(8, 4)]);
        assert!(move_point(&path, 4, p(0, 0)).is_none());
    }

    #[test]
    fn insert_vertex_splits_segment() {
        let mut path = vec![p(0, 0), p(6, 0), p(6, 4)];
        assert_eq!(insert_vertex(&mut path, p(6, 0)), Some(1));
        assert_eq!(insert_vertex(&mut path, p(3, 0)), Some(1));
        assert_eq!(path, vec![p(0, 0), p(3, 0), p(6, 0), p(6, 4)]);
        assert_eq!(insert_vertex(&mut path, p(1, 1)), None);
    }

    #[test]
    fn closest_point_clamps_to_segments() {
        let path = vec![p(0, 0), p(6, 0), p(6, 4)];
        assert_eq!(closest_point_on_path(&path, p(3, 2)), Some(p(3, 0)));
        assert_eq!(closest_point_on_path(&path, p(9, 3)), Some(p(6, 3)));
        assert_eq!(closest_point_on_path(&[p(1, 1)], p(9, 9)), Some(p(1, 1)));
    }

    fn tap_circuit() -> Circuit {
        let mut circuit = Circuit::new("c", "main");
        let mut trunk = Wire::routed(
            Some("trunk".into()),
            WireEnd::detached(PortDirection::Output, p(0, 0)),
            WireEnd::detached(PortDirection::Input, p(8, 0)),
            &[],
        );
        insert_vertex(&mut trunk.points, p(4, 0));
        circuit.insert_wire(None, trunk).unwrap();
        let tap = Wire::routed(
            Some("tap".into()),
            WireEnd::detached(PortDirection::Output, p(4, 0)),
            WireEnd::detached(PortDirection::Input, p(4, 5)),
            &[],
        );
        circuit.insert_wire(None, tap).unwrap();
        circuit
            .insert_junction(
                None,
                WireJunction {
                    pos: p(4, 0),
                    source_wire_index: 0,
                    connected_wire_id: "tap".into(),
                },
            )
            .unwrap();
        circuit
    }

    #[test]
    fn change_after_junction_leaves_it_alone() {
        let mut circuit = tap_circuit();
        let old = circuit.wires[0].points.clone();
        circuit.wires[0].points = move_point(&old, 2, p(8, 3)).unwrap();
        assert_eq!(refresh_junctions(&mut circuit, 0, &old), 0);
        assert_eq!(circuit.junctions[0].pos, p(4, 0));
    }

    #[test]
    fn change_before_junction_moves_tap() {
        let mut circuit = tap_circuit();
        let old = circuit.wires[0].points.clone();
        // Drag the whole trunk down by two rows.
        circuit.wires[0].points = translate_path(&old, 0, 2);
        assert_eq!(refresh_junctions(&mut circuit, 0, &old), 1);
        assert_eq!(circuit.junctions[0].pos, p(4, 2));
        let tap = &circuit.wires[1];
        assert_eq!(tap.start_point(), p(4, 2));
        assert_eq!(tap.start.pos, p(4, 2));
        assert!(is_orthogonal(&tap.points));
        assert_eq!(tap.end_point(), p(4, 5));
    }
}
