use crate::data::{FeatureId, Neighborhood, Ring};
use crate::map::spatial::FeatureGrid;

/// Even-odd ray cast: a point is inside when a horizontal ray to the right
/// crosses the boundary an odd number of times. Counting crossings across
/// every ring of a polygon makes holes subtract naturally.
fn polygon_contains(rings: &[Ring], lon: f64, lat: f64) -> bool {
    let mut inside = false;
    for ring in rings {
        let n = ring.len();
        if n < 3 {
            continue;
        }
        let mut j = n - 1;
        for i in 0..n {
            let (xi, yi) = ring[i];
            let (xj, yj) = ring[j];
            if (yi > lat) != (yj > lat) && lon < (xj - xi) * (lat - yi) / (yj - yi) + xi {
                inside = !inside;
            }
            j = i;
        }
    }
    inside
}

/// Whether the feature's boundary contains the point
pub fn feature_contains(feature: &Neighborhood, lon: f64, lat: f64) -> bool {
    if !feature.bounds.contains(lon, lat) {
        return false;
    }
    feature
        .polygons
        .iter()
        .any(|rings| polygon_contains(rings, lon, lat))
}

/// Topmost feature under the point. Features draw in collection order, so
/// on overlap the highest index was drawn last and wins.
pub fn hit_test(
    features: &[Neighborhood],
    grid: &FeatureGrid,
    lon: f64,
    lat: f64,
) -> Option<FeatureId> {
    grid.query_point(lon, lat)
        .iter()
        .copied()
        .filter(|&idx| {
            features
                .get(idx)
                .is_some_and(|f| feature_contains(f, lon, lat))
        })
        .max()
        .and_then(|idx| features.get(idx))
        .map(|f| f.id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::Bounds;

    fn hood(id: FeatureId, polygons: Vec<Vec<Ring>>) -> Neighborhood {
        let mut bounds = Bounds::empty();
        for rings in &polygons {
            for ring in rings {
                for &(lon, lat) in ring {
                    bounds.include(lon, lat);
                }
            }
        }
        Neighborhood {
            id,
            name: None,
            old_name: None,
            acres: None,
            sq_miles: None,
            npu: None,
            editor: None,
            edited: None,
            global_id: None,
            polygons,
            bounds,
        }
    }

    fn square(x0: f64, y0: f64, size: f64) -> Ring {
        vec![
            (x0, y0),
            (x0 + size, y0),
            (x0 + size, y0 + size),
            (x0, y0 + size),
            (x0, y0),
        ]
    }

    #[test]
    fn test_square_contains() {
        let feature = hood(1, vec![vec![square(0.0, 0.0, 10.0)]]);
        assert!(feature_contains(&feature, 5.0, 5.0));
        assert!(feature_contains(&feature, 0.5, 9.5));
        assert!(!feature_contains(&feature, 10.5, 5.0));
        assert!(!feature_contains(&feature, -0.5, 5.0));
    }

    #[test]
    fn test_hole_is_outside() {
        let feature = hood(1, vec![vec![square(0.0, 0.0, 10.0), square(4.0, 4.0, 2.0)]]);
        assert!(feature_contains(&feature, 2.0, 2.0));
        assert!(!feature_contains(&feature, 5.0, 5.0));
    }

    #[test]
    fn test_multipolygon_parts() {
        let feature = hood(
            1,
            vec![vec![square(0.0, 0.0, 1.0)], vec![square(5.0, 5.0, 1.0)]],
        );
        assert!(feature_contains(&feature, 0.5, 0.5));
        assert!(feature_contains(&feature, 5.5, 5.5));
        assert!(!feature_contains(&feature, 3.0, 3.0));
    }

    #[test]
    fn test_unclosed_ring_still_works() {
        // Same square without the repeated closing coordinate
        let mut ring = square(0.0, 0.0, 10.0);
        ring.pop();
        let feature = hood(1, vec![vec![ring]]);
        assert!(feature_contains(&feature, 5.0, 5.0));
        assert!(!feature_contains(&feature, 11.0, 5.0));
    }

    #[test]
    fn test_topmost_wins_on_overlap() {
        let features = vec![
            hood(10, vec![vec![square(0.0, 0.0, 10.0)]]),
            hood(20, vec![vec![square(5.0, 5.0, 10.0)]]),
        ];
        let grid = FeatureGrid::build(features.iter().map(|f| f.bounds), 1.0);

        // Overlap region: drawn-last feature 20 wins
        assert_eq!(hit_test(&features, &grid, 7.0, 7.0), Some(20));
        // Exclusive regions resolve to their own feature
        assert_eq!(hit_test(&features, &grid, 2.0, 2.0), Some(10));
        assert_eq!(hit_test(&features, &grid, 13.0, 13.0), Some(20));
        // Empty space resolves to none
        assert_eq!(hit_test(&features, &grid, 40.0, 40.0), None);
    }

    #[test]
    fn test_bbox_overlap_without_containment_misses() {
        // A thin diagonal sliver: its bbox covers (4,1) but the polygon
        // itself does not
        let feature = hood(
            3,
            vec![vec![vec![(0.0, 0.0), (5.0, 5.0), (4.5, 5.0), (0.0, 0.5), (0.0, 0.0)]]],
        );
        let features = vec![feature];
        let grid = FeatureGrid::build(features.iter().map(|f| f.bounds), 1.0);
        assert_eq!(hit_test(&features, &grid, 4.0, 1.0), None);
    }
}
