//! Mutually exclusive display of the original vs. result image.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageView {
    Original,
    Result,
}

impl ImageView {
    pub const ALL: &[ImageView] = &[ImageView::Original, ImageView::Result];

    pub fn name(self) -> &'static str {
        match self {
            ImageView::Original => "Original",
            ImageView::Result => "Result",
        }
    }

    pub fn other(self) -> ImageView {
        match self {
            ImageView::Original => ImageView::Result,
            ImageView::Result => ImageView::Original,
        }
    }
}

/// Exactly one of the two views is shown at any time; its selector button is
/// the active one. Starts out showing the original.
#[derive(Debug, Clone)]
pub struct ViewToggle {
    shown: ImageView,
}

impl Default for ViewToggle {
    fn default() -> Self {
        Self {
            shown: ImageView::Original,
        }
    }
}

impl ViewToggle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Show `shown` and hide `hidden`. Idempotent; callers must pass two
    /// distinct views.
    pub fn activate(&mut self, shown: ImageView, hidden: ImageView) {
        debug_assert_ne!(shown, hidden);
        self.shown = shown;
    }

    pub fn shown(&self) -> ImageView {
        self.shown
    }

    pub fn is_shown(&self, view: ImageView) -> bool {
        self.shown == view
    }
}
