use std::collections::HashMap;

use wasm_bindgen::{Clamped, JsCast};
use web_sys::{CanvasRenderingContext2d, Document, Element, HtmlCanvasElement, HtmlElement, ImageData};

use crate::error::GlitchError;
use crate::page::{FragmentId, FragmentStyle, Page, SurfaceId, TargetId};
use crate::surface::CanvasSurface;

pub const TARGET_SELECTOR: &str = "[data-glitch-target]";
pub const CANVAS_SELECTOR: &str = ".glitch-canvas";
pub const GALLERY_SELECTOR: &str = ".gallery-item";
pub const CTA_SELECTOR: &str = ".cta-button";
pub const TOGGLE_ID: &str = "glitch-toggle";
pub const TOGGLE_LABEL_SELECTOR: &str = ".toggle-text";
pub const FRAGMENTS_SELECTOR: &str = ".glitch-fragments";

/// Elements the driver attaches listeners to.
pub struct Handles {
    pub targets: Vec<HtmlElement>,
    /// Gallery tiles paired with the index of the canvas they contain.
    pub gallery: Vec<(Element, SurfaceId)>,
    pub cta: Element,
    pub toggle: Element,
}

/// [`Page`] over the live document.
pub struct WebPage {
    document: Document,
    targets: Vec<HtmlElement>,
    canvases: Vec<HtmlCanvasElement>,
    gallery: Vec<(Element, SurfaceId)>,
    cta: Element,
    toggle: Element,
    toggle_label: Element,
    fragments: Element,
    live_fragments: HashMap<FragmentId, Element>,
    next_fragment: u64,
}

fn query_all<T: JsCast>(document: &Document, selector: &str) -> Result<Vec<T>, GlitchError> {
    let list = document.query_selector_all(selector)?;
    Ok((0..list.length())
        .filter_map(|i| list.item(i))
        .filter_map(|node| node.dyn_into::<T>().ok())
        .collect())
}

fn require(found: Result<Option<Element>, wasm_bindgen::JsValue>, selector: &str) -> Result<Element, GlitchError> {
    found?.ok_or_else(|| GlitchError::MissingElement(selector.to_string()))
}

fn context_2d(canvas: &HtmlCanvasElement) -> Result<CanvasRenderingContext2d, GlitchError> {
    canvas
        .get_context("2d")?
        .ok_or_else(|| GlitchError::Dom("no 2d context".into()))?
        .dyn_into::<CanvasRenderingContext2d>()
        .map_err(|_| GlitchError::Dom("not CanvasRenderingContext2d".into()))
}

impl WebPage {
    /// Look up every collaborator. Missing controls are an error; empty
    /// target and canvas sets are allowed.
    pub fn discover(document: &Document) -> Result<Self, GlitchError> {
        let targets = query_all::<HtmlElement>(document, TARGET_SELECTOR)?;
        let canvases = query_all::<HtmlCanvasElement>(document, CANVAS_SELECTOR)?;

        let mut gallery = Vec::new();
        for item in query_all::<Element>(document, GALLERY_SELECTOR)? {
            let Some(canvas) = item.query_selector(CANVAS_SELECTOR)? else {
                log::warn!("gallery item without {CANVAS_SELECTOR}");
                continue;
            };
            if let Some(index) = canvases.iter().position(|c| c.is_same_node(Some(&*canvas))) {
                gallery.push((item, SurfaceId(index)));
            }
        }

        let cta = require(document.query_selector(CTA_SELECTOR), CTA_SELECTOR)?;
        let toggle = document
            .get_element_by_id(TOGGLE_ID)
            .ok_or_else(|| GlitchError::MissingElement(format!("#{TOGGLE_ID}")))?;
        let toggle_label = require(toggle.query_selector(TOGGLE_LABEL_SELECTOR), TOGGLE_LABEL_SELECTOR)?;
        let fragments = require(document.query_selector(FRAGMENTS_SELECTOR), FRAGMENTS_SELECTOR)?;

        Ok(Self {
            document: document.clone(),
            targets,
            canvases,
            gallery,
            cta,
            toggle,
            toggle_label,
            fragments,
            live_fragments: HashMap::new(),
            next_fragment: 0,
        })
    }

    pub fn handles(&self) -> Handles {
        Handles {
            targets: self.targets.clone(),
            gallery: self.gallery.clone(),
            cta: self.cta.clone(),
            toggle: self.toggle.clone(),
        }
    }

    fn canvas(&self, surface: SurfaceId) -> Result<&HtmlCanvasElement, GlitchError> {
        self.canvases
            .get(surface.0)
            .ok_or(GlitchError::UnknownSurface(surface.0))
    }
}

impl Page for WebPage {
    fn target_count(&self) -> usize {
        self.targets.len()
    }

    fn surface_count(&self) -> usize {
        self.canvases.len()
    }

    fn add_class(&mut self, target: TargetId, class: &str) {
        if let Some(el) = self.targets.get(target.0) {
            el.class_list().add_1(class).ok();
        }
    }

    fn remove_class(&mut self, target: TargetId, class: &str) {
        if let Some(el) = self.targets.get(target.0) {
            el.class_list().remove_1(class).ok();
        }
    }

    fn remove_class_everywhere(&mut self, classes: &[&str]) {
        if classes.is_empty() {
            return;
        }
        let selector = classes
            .iter()
            .map(|c| format!(".{c}"))
            .collect::<Vec<_>>()
            .join(", ");
        let marked = match query_all::<Element>(&self.document, &selector) {
            Ok(marked) => marked,
            Err(e) => {
                log::warn!("clearing glitch classes: {e}");
                return;
            }
        };
        for el in marked {
            for class in classes {
                el.class_list().remove_1(class).ok();
            }
        }
    }

    fn text(&self, target: TargetId) -> Option<String> {
        self.targets.get(target.0).and_then(|el| el.text_content())
    }

    fn set_text(&mut self, target: TargetId, text: &str) {
        if let Some(el) = self.targets.get(target.0) {
            el.set_text_content(Some(text));
        }
    }

    fn read_surface(&self, surface: SurfaceId) -> Result<CanvasSurface, GlitchError> {
        let canvas = self.canvas(surface)?;
        let (w, h) = (canvas.width() as usize, canvas.height() as usize);
        if w == 0 || h == 0 {
            return Ok(CanvasSurface::new(w, h));
        }
        let data = context_2d(canvas)?.get_image_data(0.0, 0.0, w as f64, h as f64)?;
        CanvasSurface::from_rgba(w, h, data.data().0)
    }

    fn write_surface(&mut self, surface: SurfaceId, pixels: &CanvasSurface) -> Result<(), GlitchError> {
        let canvas = self.canvas(surface)?;
        if pixels.width() == 0 || pixels.height() == 0 {
            return Ok(());
        }
        let data = ImageData::new_with_u8_clamped_array_and_sh(
            Clamped(pixels.as_rgba()),
            pixels.width() as u32,
            pixels.height() as u32,
        )?;
        context_2d(canvas)?.put_image_data(&data, 0.0, 0.0)?;
        Ok(())
    }

    fn surface_size(&self, surface: SurfaceId) -> Result<(usize, usize), GlitchError> {
        let canvas = self.canvas(surface)?;
        Ok((canvas.width() as usize, canvas.height() as usize))
    }

    fn append_fragment(&mut self, style: &FragmentStyle) -> FragmentId {
        let id = FragmentId(self.next_fragment);
        self.next_fragment += 1;
        let el = match self.document.create_element("div") {
            Ok(el) => el,
            Err(e) => {
                log::warn!("fragment create failed: {e:?}");
                return id;
            }
        };
        el.set_class_name("fragment");
        el.set_attribute("style", &style.css()).ok();
        if self.fragments.append_child(&el).is_ok() {
            self.live_fragments.insert(id, el);
        }
        id
    }

    fn remove_fragment(&mut self, id: FragmentId) {
        if let Some(el) = self.live_fragments.remove(&id) {
            el.remove();
        }
    }

    fn clear_fragments(&mut self) {
        self.fragments.set_inner_html("");
        self.live_fragments.clear();
    }

    fn set_toggle_label(&mut self, text: &str) {
        self.toggle_label.set_text_content(Some(text));
    }

    fn set_page_filter(&mut self, filter: Option<&str>) {
        let Some(body) = self.document.body() else {
            return;
        };
        let style = body.style();
        let result = match filter {
            Some(f) => style.set_property("filter", f),
            None => style.remove_property("filter").map(|_| ()),
        };
        if let Err(e) = result {
            log::warn!("page filter: {e:?}");
        }
    }
}
