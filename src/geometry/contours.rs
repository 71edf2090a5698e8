//! Chaining loose outline pieces into closed polygons
//!
//! Courtyards and the board edge are drawn as separate lines, arcs and
//! curves. They only describe an area once their end points chain into
//! closed loops.

use super::{Coord, LineChain, Point, PolySet, Polygon};

/// End points closer than this are considered joined (1 µm)
pub const CHAINING_EPSILON: Coord = 1_000;

fn near(a: Point, b: Point, epsilon: Coord) -> bool {
    let e = epsilon as i128;
    a.squared_distance(b) <= e * e
}

/// Chain open polylines and already-closed rings into polygons
///
/// Contours nested inside another contour become its holes. On failure the
/// point where a chain could not be continued is returned.
pub fn build_closed_contours(
    open: &[Vec<Point>],
    closed: &[Vec<Point>],
    epsilon: Coord,
) -> Result<PolySet, Point> {
    let mut contours: Vec<LineChain> = closed
        .iter()
        .filter(|ring| ring.len() >= 3)
        .map(|ring| LineChain::new(ring.clone()))
        .collect();

    let mut used = vec![false; open.len()];
    for start in 0..open.len() {
        if used[start] || open[start].is_empty() {
            continue;
        }
        used[start] = true;
        let mut chain: Vec<Point> = open[start].clone();

        loop {
            let (Some(&first), Some(&last)) = (chain.first(), chain.last()) else {
                break;
            };
            if chain.len() > 2 && first == last {
                chain.pop();
                break;
            }
            let next = (0..open.len()).find_map(|i| {
                if used[i] || open[i].is_empty() {
                    return None;
                }
                let piece = &open[i];
                if near(piece[0], last, epsilon) {
                    Some((i, false))
                } else if near(piece[piece.len() - 1], last, epsilon) {
                    Some((i, true))
                } else {
                    None
                }
            });
            // A near miss only closes the loop once no unused piece continues it
            let Some((i, reversed)) = next else {
                if chain.len() > 2 && near(first, last, epsilon) {
                    chain.pop();
                    break;
                }
                return Err(last);
            };
            used[i] = true;
            let mut piece = open[i].clone();
            if reversed {
                piece.reverse();
            }
            chain.extend(piece.into_iter().skip(1));
        }

        if chain.len() < 3 {
            return Err(chain.first().copied().unwrap_or_default());
        }
        contours.push(LineChain::new(chain));
    }

    Ok(nest_contours(contours))
}

/// Outermost contours become outlines; contours inside them become holes
fn nest_contours(mut contours: Vec<LineChain>) -> PolySet {
    contours.sort_by_key(|c| std::cmp::Reverse(c.signed_area2().abs()));
    let mut polygons: Vec<Polygon> = Vec::new();
    for contour in contours {
        let probe = contour.points[0];
        let parent = polygons
            .iter_mut()
            .find(|p| p.outline.strictly_contains(probe) && !p.holes.iter().any(|h| h.contains(probe)));
        match parent {
            Some(poly) => poly.holes.push(contour),
            None => polygons.push(Polygon::with_holes(contour, Vec::new())),
        }
    }
    PolySet::new(polygons)
}
