use crate::braille::BrailleCanvas;
use crate::data::{Bounds, FeatureId, Neighborhood, NeighborhoodSet};
use crate::flags::{FeatureFlag, FlagTable};
use crate::map::geometry::{draw_line, fill_polygon};
use crate::map::hittest;
use crate::map::spatial::FeatureGrid;
use crate::map::viewport::Viewport;

/// How many grid cells to spread the dataset across per axis
const GRID_DIVISIONS: f64 = 32.0;

/// Per-frame render output, one canvas per visual layer. The UI colors and
/// stacks them back-to-front: outlines, then selected, then hovered.
pub struct MapLayers {
    pub outlines: BrailleCanvas,
    pub hovered: BrailleCanvas,
    pub selected: BrailleCanvas,
}

struct LoadedSet {
    set: NeighborhoodSet,
    grid: FeatureGrid,
}

/// Renders the boundary collection as outline and highlight layers and
/// answers hit-test queries against it. Holds no transient state: which
/// feature gets a highlight is read from the flag table at draw time.
pub struct MapRenderer {
    loaded: Option<LoadedSet>,
}

impl MapRenderer {
    pub fn new() -> Self {
        Self { loaded: None }
    }

    /// Attach the loaded collection and build its hit-test index
    pub fn attach(&mut self, set: NeighborhoodSet) {
        let bounds = set.bounds();
        let span = (bounds.max_lon - bounds.min_lon)
            .max(bounds.max_lat - bounds.min_lat)
            .max(1e-6);
        let grid = FeatureGrid::build(
            set.features().iter().map(|f| f.bounds),
            span / GRID_DIVISIONS,
        );
        self.loaded = Some(LoadedSet { set, grid });
    }

    pub fn has_data(&self) -> bool {
        self.loaded.is_some()
    }

    pub fn bounds(&self) -> Option<Bounds> {
        self.loaded.as_ref().map(|l| l.set.bounds())
    }

    pub fn feature(&self, id: FeatureId) -> Option<&Neighborhood> {
        self.loaded.as_ref().and_then(|l| l.set.get(id))
    }

    pub fn feature_count(&self) -> usize {
        self.loaded.as_ref().map_or(0, |l| l.set.len())
    }

    /// Topmost feature under a geographic point, or none
    pub fn hit_test(&self, lon: f64, lat: f64) -> Option<FeatureId> {
        let loaded = self.loaded.as_ref()?;
        hittest::hit_test(loaded.set.features(), &loaded.grid, lon, lat)
    }

    /// Render all layers for one frame. `width`/`height` are character
    /// dimensions; the flag table decides which feature gets which
    /// highlight layer.
    pub fn render(
        &self,
        width: usize,
        height: usize,
        viewport: &Viewport,
        flags: &FlagTable,
    ) -> MapLayers {
        let mut layers = MapLayers {
            outlines: BrailleCanvas::new(width, height),
            hovered: BrailleCanvas::new(width, height),
            selected: BrailleCanvas::new(width, height),
        };

        let Some(loaded) = self.loaded.as_ref() else {
            return layers;
        };

        let mut projected: Vec<Vec<(i32, i32)>> = Vec::new();
        for feature in loaded.set.features() {
            let hover = flags.is_set(feature.id, FeatureFlag::Hover);
            let selected = flags.is_set(feature.id, FeatureFlag::Selected);

            for rings in &feature.polygons {
                projected.clear();
                projected.extend(
                    rings
                        .iter()
                        .map(|ring| ring.iter().map(|&(lon, lat)| viewport.project(lon, lat)).collect()),
                );

                for ring in &projected {
                    draw_ring(&mut layers.outlines, ring, viewport);
                }
                if hover {
                    fill_polygon(&mut layers.hovered, &projected);
                    for ring in &projected {
                        draw_ring(&mut layers.hovered, ring, viewport);
                    }
                }
                if selected {
                    fill_polygon(&mut layers.selected, &projected);
                    for ring in &projected {
                        draw_ring(&mut layers.selected, ring, viewport);
                    }
                }
            }
        }

        layers
    }
}

impl Default for MapRenderer {
    fn default() -> Self {
        Self::new()
    }
}

/// Draw a projected ring outline with per-segment culling, closing it if
/// the data left the ring open
fn draw_ring(canvas: &mut BrailleCanvas, ring: &[(i32, i32)], viewport: &Viewport) {
    if ring.len() < 2 {
        return;
    }

    let mut draw_segment = |a: (i32, i32), b: (i32, i32)| {
        let dist = ((b.0 - a.0).abs() + (b.1 - a.1).abs()) as usize;
        if dist < viewport.width && viewport.segment_visible(a, b) {
            draw_line(canvas, a.0, a.1, b.0, b.1);
        }
    };

    for pair in ring.windows(2) {
        draw_segment(pair[0], pair[1]);
    }
    let (first, last) = (ring[0], ring[ring.len() - 1]);
    if first != last {
        draw_segment(last, first);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::Ring;
    use crate::flags::FlagSink;

    fn square(x0: f64, y0: f64, size: f64) -> Ring {
        vec![
            (x0, y0),
            (x0 + size, y0),
            (x0 + size, y0 + size),
            (x0, y0 + size),
            (x0, y0),
        ]
    }

    fn hood(id: FeatureId, ring: Ring) -> Neighborhood {
        let mut bounds = Bounds::empty();
        for &(lon, lat) in &ring {
            bounds.include(lon, lat);
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
            polygons: vec![vec![ring]],
            bounds,
        }
    }

    fn renderer_with_squares() -> MapRenderer {
        let set = NeighborhoodSet::from_features(vec![
            hood(1, square(0.0, 0.0, 1.0)),
            hood(2, square(2.0, 0.0, 1.0)),
        ]);
        let mut renderer = MapRenderer::new();
        renderer.attach(set);
        renderer
    }

    fn fitted_viewport(renderer: &MapRenderer, width: usize, height: usize) -> Viewport {
        let mut viewport = Viewport::world(width * 2, height * 4);
        viewport.fit(renderer.bounds().unwrap());
        viewport
    }

    #[test]
    fn test_render_without_data_is_blank() {
        let renderer = MapRenderer::new();
        let viewport = Viewport::world(80, 40);
        let layers = renderer.render(40, 10, &viewport, &FlagTable::new());
        assert!(layers.outlines.rows().all(|r| r.chars().all(|c| c == '\u{2800}')));
    }

    #[test]
    fn test_outlines_drawn_for_all_features() {
        let renderer = renderer_with_squares();
        let viewport = fitted_viewport(&renderer, 40, 10);
        let layers = renderer.render(40, 10, &viewport, &FlagTable::new());

        let lit = layers
            .outlines
            .rows()
            .flat_map(|r| r.chars().collect::<Vec<_>>())
            .filter(|&c| c != '\u{2800}')
            .count();
        assert!(lit > 0, "outline layer should have content");
    }

    #[test]
    fn test_hover_flag_drives_highlight_layer() {
        let renderer = renderer_with_squares();
        let viewport = fitted_viewport(&renderer, 40, 10);

        let mut flags = FlagTable::new();
        let blank = renderer.render(40, 10, &viewport, &flags);
        assert!(blank.hovered.rows().all(|r| r.chars().all(|c| c == '\u{2800}')));

        flags.set(1, FeatureFlag::Hover, true);
        let layers = renderer.render(40, 10, &viewport, &flags);

        // The hovered feature's center pixel is filled
        let (px, py) = viewport.project(0.5, 0.5);
        assert!(layers.hovered.is_lit(px as usize, py as usize));
        // The other feature's center is not
        let (qx, qy) = viewport.project(2.5, 0.5);
        assert!(!layers.hovered.is_lit(qx as usize, qy as usize));
    }

    #[test]
    fn test_selected_flag_drives_selected_layer() {
        let renderer = renderer_with_squares();
        let viewport = fitted_viewport(&renderer, 40, 10);

        let mut flags = FlagTable::new();
        flags.set(2, FeatureFlag::Selected, true);
        let layers = renderer.render(40, 10, &viewport, &flags);

        let (px, py) = viewport.project(2.5, 0.5);
        assert!(layers.selected.is_lit(px as usize, py as usize));
        let (qx, qy) = viewport.project(0.5, 0.5);
        assert!(!layers.selected.is_lit(qx as usize, qy as usize));
    }

    #[test]
    fn test_hit_test_through_renderer() {
        let renderer = renderer_with_squares();
        assert_eq!(renderer.hit_test(0.5, 0.5), Some(1));
        assert_eq!(renderer.hit_test(2.5, 0.5), Some(2));
        assert_eq!(renderer.hit_test(1.5, 0.5), None);
        assert_eq!(MapRenderer::new().hit_test(0.5, 0.5), None);
    }
}
