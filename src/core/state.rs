use crate::core::models::request::ReportKind;

/// Host-side view state: which report is shown and whether a foreground
/// invocation is in flight. Presentation-only concerns such as zoom live with
/// the renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UiState {
    view: ReportKind,
    running: bool,
}

impl UiState {
    pub fn new(view: ReportKind) -> Self {
        Self {
            view,
            running: false,
        }
    }

    pub fn view(&self) -> ReportKind {
        self.view
    }

    /// Switches the displayed report. Refused while a run is in flight.
    pub fn select(&mut self, view: ReportKind) -> bool {
        if self.running {
            return false;
        }
        self.view = view;
        true
    }

    /// Claims the run control. Returns false if a run is already in flight,
    /// so overlapping invocations never race for the output view.
    pub fn try_begin(&mut self) -> bool {
        if self.running {
            return false;
        }
        self.running = true;
        true
    }

    pub fn finish(&mut self) {
        self.running = false;
    }
}
