use crate::data::Bounds;
use std::collections::HashMap;

/// Conservative spatial index over feature bounding boxes. Each feature is
/// indexed into every grid cell its bbox overlaps, so a point query may
/// return false positives but never misses a feature; the ray-cast in the
/// hit-tester discards the false positives.
pub struct FeatureGrid {
    cells: HashMap<(i32, i32), Vec<usize>>,
    cell_size: f64,
}

impl FeatureGrid {
    /// Build from per-feature bounding boxes, in draw order. Indices within
    /// a cell stay in insertion (ascending draw) order.
    pub fn build(bboxes: impl Iterator<Item = Bounds>, cell_size: f64) -> Self {
        let mut grid = Self {
            cells: HashMap::new(),
            cell_size,
        };
        for (idx, bounds) in bboxes.enumerate() {
            if bounds.is_empty() {
                continue;
            }
            let min_cell = grid.to_cell(bounds.min_lon, bounds.min_lat);
            let max_cell = grid.to_cell(bounds.max_lon, bounds.max_lat);
            for y in min_cell.1..=max_cell.1 {
                for x in min_cell.0..=max_cell.0 {
                    grid.cells.entry((x, y)).or_default().push(idx);
                }
            }
        }
        grid
    }

    #[inline(always)]
    fn to_cell(&self, lon: f64, lat: f64) -> (i32, i32) {
        let x = (lon / self.cell_size).floor() as i32;
        let y = (lat / self.cell_size).floor() as i32;
        (x, y)
    }

    /// Feature indices whose bbox covers the cell containing the point
    pub fn query_point(&self, lon: f64, lat: f64) -> &[usize] {
        self.cells
            .get(&self.to_cell(lon, lat))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}
