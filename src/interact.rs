use crate::data::FeatureId;
use crate::flags::{FeatureFlag, FlagSink};

/// Pointer-driven interaction state: which feature is under the cursor and
/// which one is selected. Both ids live outside the render path, so hover
/// transitions cost exactly the flag writes they cause. Invariant: at most
/// one feature carries the hover flag and at most one the selected flag;
/// the old id is always cleared independently of the new id being set.
#[derive(Default)]
pub struct Interaction {
    hovered: Option<FeatureId>,
    selected: Option<FeatureId>,
}

impl Interaction {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn hovered(&self) -> Option<FeatureId> {
        self.hovered
    }

    pub fn selected(&self) -> Option<FeatureId> {
        self.selected
    }

    /// Apply a pointer move that resolved to `candidate`. Repeated moves
    /// over the same feature (or the same empty space) write nothing.
    /// Returns true while a feature is under the pointer so the caller can
    /// switch the cursor affordance.
    pub fn pointer_move<S: FlagSink>(
        &mut self,
        table: &mut S,
        candidate: Option<FeatureId>,
    ) -> bool {
        if candidate != self.hovered {
            if let Some(old) = self.hovered {
                table.set(old, FeatureFlag::Hover, false);
            }
            if let Some(new) = candidate {
                table.set(new, FeatureFlag::Hover, true);
            }
            self.hovered = candidate;
        }
        self.hovered.is_some()
    }

    /// The pointer left the interactive surface. The surface does not
    /// promise a final move event on exit, so this is invoked explicitly
    /// and always clears any active hover.
    pub fn pointer_leave<S: FlagSink>(&mut self, table: &mut S) {
        self.pointer_move(table, None);
    }

    /// Apply a click that resolved to `candidate`. The previous selection's
    /// flag is cleared unconditionally before the new one is set, so
    /// re-clicking the selected feature nets to an unchanged selection and
    /// clicking empty space clears it. Returns the new selection for the
    /// caller to publish to the detail panel.
    pub fn click<S: FlagSink>(
        &mut self,
        table: &mut S,
        candidate: Option<FeatureId>,
    ) -> Option<FeatureId> {
        if let Some(old) = self.selected {
            table.set(old, FeatureFlag::Selected, false);
        }
        if let Some(new) = candidate {
            table.set(new, FeatureFlag::Selected, true);
        }
        self.selected = candidate;
        self.selected
    }

    /// Explicit dismissal of the current selection (closing the panel)
    pub fn clear_selection<S: FlagSink>(&mut self, table: &mut S) {
        if let Some(old) = self.selected.take() {
            table.set(old, FeatureFlag::Selected, false);
        }
    }
}
