//! The page the glitch layer decorates.
//!
//! The controller only talks to the document through [`Page`]. The browser
//! build implements it over `web-sys`; tests use an in-memory page.

use crate::error::GlitchError;
use crate::surface::CanvasSurface;

/// Index into the page's interactive targets (`[data-glitch-target]`).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TargetId(pub usize);

/// Index into the page's gallery canvases (`.glitch-canvas`).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SurfaceId(pub usize);

/// A live fragment node inside the fragment container.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FragmentId(pub u64);

/// Geometry and colour of one falling fragment.
#[derive(Clone, Debug, PartialEq)]
pub struct FragmentStyle {
    pub left_pct: f64,
    pub width_px: f64,
    pub height_px: f64,
    pub color: String,
}

impl FragmentStyle {
    /// Inline CSS for the fragment node.
    pub fn css(&self) -> String {
        format!(
            "left:{}%;width:{}px;height:{}px;background:{}",
            self.left_pct, self.width_px, self.height_px, self.color
        )
    }
}

pub trait Page {
    fn target_count(&self) -> usize;

    fn surface_count(&self) -> usize;

    fn add_class(&mut self, target: TargetId, class: &str);

    fn remove_class(&mut self, target: TargetId, class: &str);

    /// Remove each class from every element of the document that carries it.
    fn remove_class_everywhere(&mut self, classes: &[&str]);

    /// Text content, `None` when the element has none.
    fn text(&self, target: TargetId) -> Option<String>;

    fn set_text(&mut self, target: TargetId, text: &str);

    fn read_surface(&self, surface: SurfaceId) -> Result<CanvasSurface, GlitchError>;

    fn write_surface(&mut self, surface: SurfaceId, pixels: &CanvasSurface) -> Result<(), GlitchError>;

    /// `(width, height)` of the canvas in pixels.
    fn surface_size(&self, surface: SurfaceId) -> Result<(usize, usize), GlitchError>;

    fn append_fragment(&mut self, style: &FragmentStyle) -> FragmentId;

    /// Detach a fragment; unknown or already removed ids are ignored.
    fn remove_fragment(&mut self, id: FragmentId);

    fn clear_fragments(&mut self);

    fn set_toggle_label(&mut self, text: &str);

    /// Set or clear the CSS `filter` on the page body.
    fn set_page_filter(&mut self, filter: Option<&str>);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fragment_css_lists_geometry_and_colour() {
        let style = FragmentStyle {
            left_pct: 12.5,
            width_px: 6.0,
            height_px: 40.0,
            color: "#00ff41".into(),
        };
        assert_eq!(style.css(), "left:12.5%;width:6px;height:40px;background:#00ff41");
    }
}
