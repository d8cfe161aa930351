#![allow(dead_code)]

use std::collections::{BTreeMap, BTreeSet};

use glitch_wasm::{CanvasSurface, FragmentId, FragmentStyle, GlitchError, Page, SurfaceId, TargetId};

#[derive(Clone, Debug, Default)]
pub struct FakeElement {
    pub text: Option<String>,
    pub classes: BTreeSet<String>,
}

/// In-memory page recording everything the controller does to it.
#[derive(Debug, Default)]
pub struct FakePage {
    pub targets: Vec<FakeElement>,
    pub surfaces: Vec<CanvasSurface>,
    /// Every buffer written, per surface, oldest first.
    pub writes: Vec<Vec<CanvasSurface>>,
    /// Every class ever added, in order.
    pub class_history: Vec<(TargetId, String)>,
    pub fragments: BTreeMap<FragmentId, FragmentStyle>,
    pub fragments_appended: usize,
    pub toggle_label: String,
    pub filter: Option<String>,
    /// Classes on elements outside the target set.
    pub other_marked: BTreeSet<String>,
    next_fragment: u64,
}

impl FakePage {
    pub fn new(texts: &[&str], surfaces: usize, size: (usize, usize)) -> Self {
        Self {
            targets: texts
                .iter()
                .map(|t| FakeElement {
                    text: (!t.is_empty()).then(|| t.to_string()),
                    classes: BTreeSet::new(),
                })
                .collect(),
            surfaces: (0..surfaces).map(|_| CanvasSurface::new(size.0, size.1)).collect(),
            writes: vec![Vec::new(); surfaces],
            toggle_label: "REDUCE CHAOS".into(),
            ..Default::default()
        }
    }

    pub fn text_of(&self, i: usize) -> &str {
        self.targets[i].text.as_deref().unwrap_or("")
    }

    pub fn has_class(&self, i: usize, class: &str) -> bool {
        self.targets[i].classes.contains(class)
    }

    pub fn any_marked(&self) -> bool {
        self.targets.iter().any(|t| !t.classes.is_empty()) || !self.other_marked.is_empty()
    }

    pub fn ever_had(&self, i: usize, class: &str) -> bool {
        self.class_history.iter().any(|(t, c)| t.0 == i && c == class)
    }
}

impl Page for FakePage {
    fn target_count(&self) -> usize {
        self.targets.len()
    }

    fn surface_count(&self) -> usize {
        self.surfaces.len()
    }

    fn add_class(&mut self, target: TargetId, class: &str) {
        self.targets[target.0].classes.insert(class.to_string());
        self.class_history.push((target, class.to_string()));
    }

    fn remove_class(&mut self, target: TargetId, class: &str) {
        self.targets[target.0].classes.remove(class);
    }

    fn remove_class_everywhere(&mut self, classes: &[&str]) {
        for t in &mut self.targets {
            for c in classes {
                t.classes.remove(*c);
            }
        }
        for c in classes {
            self.other_marked.remove(*c);
        }
    }

    fn text(&self, target: TargetId) -> Option<String> {
        self.targets[target.0].text.clone()
    }

    fn set_text(&mut self, target: TargetId, text: &str) {
        self.targets[target.0].text = Some(text.to_string());
    }

    fn read_surface(&self, surface: SurfaceId) -> Result<CanvasSurface, GlitchError> {
        self.surfaces
            .get(surface.0)
            .cloned()
            .ok_or(GlitchError::UnknownSurface(surface.0))
    }

    fn write_surface(&mut self, surface: SurfaceId, pixels: &CanvasSurface) -> Result<(), GlitchError> {
        let slot = self
            .surfaces
            .get_mut(surface.0)
            .ok_or(GlitchError::UnknownSurface(surface.0))?;
        *slot = pixels.clone();
        self.writes[surface.0].push(pixels.clone());
        Ok(())
    }

    fn surface_size(&self, surface: SurfaceId) -> Result<(usize, usize), GlitchError> {
        self.surfaces
            .get(surface.0)
            .map(|s| (s.width(), s.height()))
            .ok_or(GlitchError::UnknownSurface(surface.0))
    }

    fn append_fragment(&mut self, style: &FragmentStyle) -> FragmentId {
        let id = FragmentId(self.next_fragment);
        self.next_fragment += 1;
        self.fragments.insert(id, style.clone());
        self.fragments_appended += 1;
        id
    }

    fn remove_fragment(&mut self, id: FragmentId) {
        self.fragments.remove(&id);
    }

    fn clear_fragments(&mut self) {
        self.fragments.clear();
    }

    fn set_toggle_label(&mut self, text: &str) {
        self.toggle_label = text.to_string();
    }

    fn set_page_filter(&mut self, filter: Option<&str>) {
        self.filter = filter.map(str::to_string);
    }
}
