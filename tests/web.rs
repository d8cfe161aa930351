#![cfg(target_arch = "wasm32")]

use glitch_wasm::rng::seeded;
use glitch_wasm::wasm::dom::WebPage;
use glitch_wasm::{EffectController, GlitchConfig, GlitchError, Page, SurfaceId};
use wasm_bindgen_test::*;
use web_sys::Document;

wasm_bindgen_test_configure!(run_in_browser);

const FIXTURE: &str = r#"
<h1 class="title" data-glitch-target>BROKEN</h1>
<p data-glitch-target>system failure</p>
<div class="gallery-item"><canvas class="glitch-canvas" width="32" height="16"></canvas></div>
<div class="gallery-item"><canvas class="glitch-canvas" width="32" height="16"></canvas></div>
<button class="cta-button">ENTER THE VOID</button>
<button id="glitch-toggle"><span class="toggle-text">REDUCE CHAOS</span></button>
<div class="glitch-fragments"></div>
"#;

fn mount(html: &str) -> Document {
    let document = web_sys::window().unwrap().document().unwrap();
    document.body().unwrap().set_inner_html(html);
    document
}

fn text_of(document: &Document, selector: &str) -> String {
    document
        .query_selector(selector)
        .unwrap()
        .and_then(|el| el.text_content())
        .unwrap_or_default()
}

#[wasm_bindgen_test]
fn discovers_the_page_contract() {
    let page = WebPage::discover(&mount(FIXTURE)).unwrap();
    assert_eq!(page.target_count(), 2);
    assert_eq!(page.surface_count(), 2);
    assert_eq!(page.surface_size(SurfaceId(1)).unwrap(), (32, 16));
    assert_eq!(page.handles().gallery.len(), 2);
}

#[wasm_bindgen_test]
fn missing_toggle_is_reported() {
    let document = mount(r#"<button class="cta-button"></button><div class="glitch-fragments"></div>"#);
    match WebPage::discover(&document) {
        Err(GlitchError::MissingElement(sel)) => assert_eq!(sel, "#glitch-toggle"),
        Err(e) => panic!("unexpected error {e}"),
        Ok(_) => panic!("discovery should fail"),
    }
}

#[wasm_bindgen_test]
fn reduced_motion_then_cta_glitches_targets_and_canvases() {
    let document = mount(FIXTURE);
    let page = WebPage::discover(&document).unwrap();
    let mut c = EffectController::new(page, seeded(5), GlitchConfig::default(), true, 0.0).unwrap();
    assert_eq!(text_of(&document, ".toggle-text"), "CHAOS REDUCED");

    c.toggle();
    assert_eq!(text_of(&document, ".toggle-text"), "REDUCE CHAOS");
    let before = c.page().read_surface(SurfaceId(0)).unwrap();
    c.on_cta_click();
    c.tick(0.0);

    let title = document.query_selector(".title").unwrap().unwrap();
    assert!(title.class_list().contains("glitch-active"));
    assert_ne!(c.page().read_surface(SurfaceId(0)).unwrap(), before);

    c.tick(2500.0);
    assert!(!title.class_list().contains("glitch-active"));
}

#[wasm_bindgen_test]
fn fragments_live_in_the_container_for_two_seconds() {
    let document = mount(FIXTURE);
    let page = WebPage::discover(&document).unwrap();
    let mut c = EffectController::new(page, seeded(9), GlitchConfig::default(), false, 0.0).unwrap();
    let container = document.query_selector(".glitch-fragments").unwrap().unwrap();

    c.create_fragments();
    assert_eq!(container.child_element_count(), 5);
    c.tick(2000.0);
    assert_eq!(container.child_element_count(), 0);
}

#[wasm_bindgen_test]
fn disabling_clears_markers_and_fragments() {
    let document = mount(FIXTURE);
    let page = WebPage::discover(&document).unwrap();
    let mut c = EffectController::new(page, seeded(2), GlitchConfig::default(), false, 0.0).unwrap();
    let container = document.query_selector(".glitch-fragments").unwrap().unwrap();

    c.on_cta_click();
    c.tick(120.0);
    c.toggle();
    assert_eq!(text_of(&document, ".toggle-text"), "ENABLE CHAOS");
    assert_eq!(container.child_element_count(), 0);
    assert!(document.query_selector(".glitch-active").unwrap().is_none());
    assert!(document.query_selector(".text-scramble").unwrap().is_none());
    assert_eq!(text_of(&document, ".title"), "BROKEN");
}
