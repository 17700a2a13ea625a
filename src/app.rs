use crate::data::{FeatureId, Neighborhood, NeighborhoodSet};
use crate::flags::FlagTable;
use crate::interact::Interaction;
use crate::map::{MapRenderer, Viewport};
use anyhow::Result;
use ratatui::layout::Rect;

/// Load lifecycle of the boundary dataset
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DataStatus {
    Loading,
    Ready,
    Failed,
}

/// Application state
pub struct App {
    pub viewport: Viewport,
    pub renderer: MapRenderer,
    /// Feature-state table the renderer reads at draw time
    pub flags: FlagTable,
    pub data_status: DataStatus,
    pub should_quit: bool,
    interaction: Interaction,
    /// Full record backing the detail panel; present exactly while a
    /// feature is selected
    panel: Option<Neighborhood>,
    /// Mouse position in terminal cells, for the cursor marker
    mouse_pos: Option<(u16, u16)>,
    /// Anchor of an in-progress left-button drag
    drag_anchor: Option<(u16, u16)>,
    /// Whether the current press turned into a drag (suppresses the click)
    dragged: bool,
    /// Map widget inner area, recorded at render time so pointer math
    /// agrees with what was actually drawn
    map_inner: Rect,
}

impl App {
    pub fn new(width: usize, height: usize) -> Self {
        // Braille gives 2x4 resolution per character; account for the map
        // border plus the status bar
        let inner_width = width.saturating_sub(2);
        let inner_height = height.saturating_sub(3);

        Self {
            viewport: Viewport::world(inner_width * 2, inner_height * 4),
            renderer: MapRenderer::new(),
            flags: FlagTable::new(),
            data_status: DataStatus::Loading,
            should_quit: false,
            interaction: Interaction::new(),
            panel: None,
            mouse_pos: None,
            drag_anchor: None,
            dragged: false,
            map_inner: Rect::new(0, 0, 0, 0),
        }
    }

    /// Update viewport size when the terminal resizes
    pub fn resize(&mut self, width: usize, height: usize) {
        let inner_width = width.saturating_sub(2);
        let inner_height = height.saturating_sub(3);
        self.viewport.width = inner_width * 2;
        self.viewport.height = inner_height * 4;
    }

    /// Apply the one-time load result. Failure leaves the map empty and
    /// interactive for the rest of the session.
    pub fn attach_load_result(&mut self, result: Result<NeighborhoodSet>) {
        match result {
            Ok(set) => {
                self.renderer.attach(set);
                if let Some(bounds) = self.renderer.bounds() {
                    self.viewport.fit(bounds);
                }
                self.data_status = DataStatus::Ready;
            }
            Err(e) => {
                tracing::error!("boundary load failed: {e:#}");
                self.data_status = DataStatus::Failed;
            }
        }
    }

    pub fn is_loading(&self) -> bool {
        self.data_status == DataStatus::Loading
    }

    pub fn quit(&mut self) {
        self.should_quit = true;
    }

    // --- viewport control -------------------------------------------------

    pub fn pan(&mut self, dx: i32, dy: i32) {
        self.viewport.pan(dx, dy);
    }

    pub fn zoom_in(&mut self) {
        self.viewport.zoom_in();
    }

    pub fn zoom_out(&mut self) {
        self.viewport.zoom_out();
    }

    /// Zoom toward the map pixel under a terminal cell
    pub fn zoom_in_at(&mut self, col: u16, row: u16) {
        self.zoom_at_cell(col, row, true);
    }

    pub fn zoom_out_at(&mut self, col: u16, row: u16) {
        self.zoom_at_cell(col, row, false);
    }

    fn zoom_at_cell(&mut self, col: u16, row: u16, zoom_in: bool) {
        let (px, py) = self.pixel_at(col, row);
        let mut viewport = self.hit_viewport();
        if zoom_in {
            viewport.zoom_in_at(px, py);
        } else {
            viewport.zoom_out_at(px, py);
        }
        self.viewport.center_lon = viewport.center_lon;
        self.viewport.center_lat = viewport.center_lat;
        self.viewport.zoom = viewport.zoom;
    }

    /// Refit the viewport to the dataset, or reset to the world view when
    /// nothing is loaded
    pub fn refit(&mut self) {
        match self.renderer.bounds() {
            Some(bounds) => self.viewport.fit(bounds),
            None => {
                self.viewport = Viewport::world(self.viewport.width, self.viewport.height);
            }
        }
    }

    // --- pointer handling -------------------------------------------------

    pub fn set_mouse_pos(&mut self, col: u16, row: u16) {
        self.mouse_pos = Some((col, row));
    }

    /// Pointer moved to a terminal cell; resolves the feature under it and
    /// updates the hover highlight. Moving off the map widget reads as
    /// leaving the surface.
    pub fn pointer_moved(&mut self, col: u16, row: u16) {
        let candidate = self.candidate_at(col, row);
        self.interaction.pointer_move(&mut self.flags, candidate);
    }

    /// Pointer left the interactive surface entirely (terminal focus lost)
    pub fn pointer_left(&mut self) {
        self.interaction.pointer_leave(&mut self.flags);
        self.mouse_pos = None;
    }

    pub fn press(&mut self, col: u16, row: u16) {
        self.drag_anchor = Some((col, row));
        self.dragged = false;
    }

    /// Drag pans the map and cancels the pending click
    pub fn drag_to(&mut self, col: u16, row: u16) {
        if let Some((anchor_col, anchor_row)) = self.drag_anchor {
            let dx = (anchor_col as i32 - col as i32) * 2;
            let dy = (anchor_row as i32 - row as i32) * 4;
            self.pan(dx, dy);
        }
        self.drag_anchor = Some((col, row));
        self.dragged = true;
    }

    /// Button released: a press that never dragged is a click
    pub fn release(&mut self, col: u16, row: u16) {
        let was_drag = self.dragged;
        self.drag_anchor = None;
        self.dragged = false;
        if !was_drag {
            self.click_at(col, row);
        }
    }

    /// Click: move the selection to the feature under the cell (or clear it
    /// on empty space) and publish the full record to the panel
    pub fn click_at(&mut self, col: u16, row: u16) {
        let candidate = self.candidate_at(col, row);
        let selected = self.interaction.click(&mut self.flags, candidate);
        self.panel = selected.and_then(|id| self.renderer.feature(id).cloned());
    }

    /// Explicit panel dismissal
    pub fn close_panel(&mut self) {
        self.interaction.clear_selection(&mut self.flags);
        self.panel = None;
    }

    pub fn panel(&self) -> Option<&Neighborhood> {
        self.panel.as_ref()
    }

    pub fn hovering(&self) -> bool {
        self.interaction.hovered().is_some()
    }

    pub fn hovered_name(&self) -> Option<&str> {
        self.interaction
            .hovered()
            .and_then(|id| self.renderer.feature(id))
            .and_then(|f| f.name.as_deref())
    }

    pub fn selected_id(&self) -> Option<FeatureId> {
        self.interaction.selected()
    }

    // --- geometry between cells and canvas --------------------------------

    /// Record where the map widget actually rendered this frame
    pub fn set_map_inner(&mut self, area: Rect) {
        self.map_inner = area;
    }

    /// Cursor position relative to the map widget, if it is over the map
    pub fn cursor_cell(&self) -> Option<(u16, u16)> {
        let (col, row) = self.mouse_pos?;
        if self.cell_on_map(col, row) {
            Some((col - self.map_inner.x, row - self.map_inner.y))
        } else {
            None
        }
    }

    fn cell_on_map(&self, col: u16, row: u16) -> bool {
        col >= self.map_inner.x
            && col < self.map_inner.x + self.map_inner.width
            && row >= self.map_inner.y
            && row < self.map_inner.y + self.map_inner.height
    }

    /// Viewport sized to the rendered map widget, so hit-testing and
    /// zoom anchoring agree with what is on screen
    pub fn hit_viewport(&self) -> Viewport {
        if self.map_inner.width == 0 || self.map_inner.height == 0 {
            return self.viewport.clone();
        }
        let mut viewport = self.viewport.clone();
        viewport.width = self.map_inner.width as usize * 2;
        viewport.height = self.map_inner.height as usize * 4;
        viewport
    }

    /// Terminal cell to Braille pixel coordinates within the map widget
    fn pixel_at(&self, col: u16, row: u16) -> (i32, i32) {
        let px = (col as i32 - self.map_inner.x as i32) * 2;
        let py = (row as i32 - self.map_inner.y as i32) * 4;
        (px, py)
    }

    /// Topmost feature under a terminal cell, or none when the cell is off
    /// the map widget, over empty space, or no data is loaded
    fn candidate_at(&self, col: u16, row: u16) -> Option<FeatureId> {
        if !self.cell_on_map(col, row) || !self.renderer.has_data() {
            return None;
        }
        let (px, py) = self.pixel_at(col, row);
        let (lon, lat) = self.hit_viewport().unproject(px, py);
        self.renderer.hit_test(lon, lat)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{Bounds, Ring};
    use crate::flags::FeatureFlag;

    fn square(x0: f64, y0: f64, size: f64) -> Ring {
        vec![
            (x0, y0),
            (x0 + size, y0),
            (x0 + size, y0 + size),
            (x0, y0 + size),
            (x0, y0),
        ]
    }

    fn hood(id: FeatureId, name: &str, acres: Option<f64>, ring: Ring) -> Neighborhood {
        let mut bounds = Bounds::empty();
        for &(lon, lat) in &ring {
            bounds.include(lon, lat);
        }
        Neighborhood {
            id,
            name: Some(name.to_string()),
            old_name: None,
            acres,
            sq_miles: None,
            npu: None,
            editor: None,
            edited: None,
            global_id: None,
            polygons: vec![vec![ring]],
            bounds,
        }
    }

    /// App with two neighborhoods attached and a fixed map widget area
    fn test_app() -> App {
        let mut app = App::new(80, 24);
        app.attach_load_result(Ok(NeighborhoodSet::from_features(vec![
            hood(42, "Midtown", Some(733.2), square(-84.39, 33.77, 0.02)),
            hood(7, "Summerhill", None, square(-84.36, 33.73, 0.02)),
        ])));
        app.set_map_inner(Rect::new(1, 1, 60, 20));
        app
    }

    /// Terminal cell over the center of a feature's bounding square
    fn cell_over(app: &App, lon: f64, lat: f64) -> (u16, u16) {
        let viewport = app.hit_viewport();
        let (px, py) = viewport.project(lon, lat);
        assert!(px >= 0 && py >= 0, "point projects off-canvas");
        (1 + (px / 2) as u16, 1 + (py / 4) as u16)
    }

    #[test]
    fn test_hover_then_click_publishes_panel() {
        let mut app = test_app();
        let (col, row) = cell_over(&app, -84.38, 33.78);

        app.pointer_moved(col, row);
        assert!(app.hovering());
        assert_eq!(app.hovered_name(), Some("Midtown"));
        assert!(app.flags.is_set(42, FeatureFlag::Hover));

        app.press(col, row);
        app.release(col, row);

        let panel = app.panel().expect("panel should be populated");
        assert_eq!(panel.id, 42);
        assert_eq!(panel.name.as_deref(), Some("Midtown"));
        assert_eq!(panel.acres, Some(733.2));
        assert_eq!(app.selected_id(), Some(42));
        assert!(app.flags.is_set(42, FeatureFlag::Selected));
    }

    #[test]
    fn test_click_empty_space_clears_selection() {
        let mut app = test_app();
        let (col, row) = cell_over(&app, -84.38, 33.78);
        app.click_at(col, row);
        assert!(app.panel().is_some());

        // The fitted view keeps a margin; the widget's top-left corner is
        // outside every boundary
        app.click_at(1, 1);
        assert!(app.panel().is_none());
        assert_eq!(app.selected_id(), None);
        assert!(!app.flags.is_set(42, FeatureFlag::Selected));
    }

    #[test]
    fn test_close_panel_clears_flag_and_record() {
        let mut app = test_app();
        let (col, row) = cell_over(&app, -84.38, 33.78);
        app.click_at(col, row);

        app.close_panel();
        assert!(app.panel().is_none());
        assert_eq!(app.selected_id(), None);
        assert!(!app.flags.is_set(42, FeatureFlag::Selected));
    }

    #[test]
    fn test_drag_suppresses_click() {
        let mut app = test_app();
        let (col, row) = cell_over(&app, -84.38, 33.78);

        app.press(col, row);
        app.drag_to(col + 2, row + 1);
        app.release(col + 2, row + 1);

        assert!(app.panel().is_none());
        assert_eq!(app.selected_id(), None);
    }

    #[test]
    fn test_moving_off_map_widget_clears_hover() {
        let mut app = test_app();
        let (col, row) = cell_over(&app, -84.38, 33.78);
        app.pointer_moved(col, row);
        assert!(app.hovering());

        // The widget spans x 1..61; column 70 is over the panel/status area
        app.pointer_moved(70, row);
        assert!(!app.hovering());
        assert!(!app.flags.is_set(42, FeatureFlag::Hover));
    }

    #[test]
    fn test_focus_lost_clears_hover() {
        let mut app = test_app();
        let (col, row) = cell_over(&app, -84.38, 33.78);
        app.pointer_moved(col, row);

        app.pointer_left();
        assert!(!app.hovering());
        assert_eq!(app.cursor_cell(), None);
    }

    #[test]
    fn test_interactive_before_load_resolves() {
        let mut app = App::new(80, 24);
        app.set_map_inner(Rect::new(1, 1, 60, 20));
        assert!(app.is_loading());

        // Pointer and viewport work with zero features
        app.pointer_moved(10, 10);
        assert!(!app.hovering());
        app.click_at(10, 10);
        assert!(app.panel().is_none());
        app.pan(5, 0);
        app.zoom_in_at(10, 10);
    }

    #[test]
    fn test_failed_load_leaves_map_empty() {
        let mut app = App::new(80, 24);
        app.attach_load_result(Err(anyhow::anyhow!("no such file")));
        assert_eq!(app.data_status, DataStatus::Failed);
        assert!(!app.renderer.has_data());
    }
}
