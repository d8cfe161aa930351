use std::cell::RefCell;
use std::rc::Rc;

use wasm_bindgen::{closure::Closure, JsCast};
use web_sys::{window, Document, EventTarget, KeyboardEvent, Window};

use super::dom::WebPage;
use crate::config::GlitchConfig;
use crate::controller::EffectController;
use crate::error::GlitchError;
use crate::page::{SurfaceId, TargetId};
use crate::rng::{self, GlitchRng};

type Shared = Rc<RefCell<EffectController<WebPage, GlitchRng>>>;

const CONFIG_ATTRIBUTE: &str = "data-glitch-config";
const REDUCED_MOTION_QUERY: &str = "(prefers-reduced-motion: reduce)";

/// Build the controller for the current document, wire its listeners and
/// start the timer pump.
pub fn start() -> Result<(), GlitchError> {
    let window = window().ok_or_else(|| GlitchError::MissingElement("window".into()))?;
    let document = window
        .document()
        .ok_or_else(|| GlitchError::MissingElement("document".into()))?;

    let config = load_config(&document);
    let reduced_motion = window
        .match_media(REDUCED_MOTION_QUERY)?
        .map(|query| query.matches())
        .unwrap_or(false);

    let page = WebPage::discover(&document)?;
    let handles = page.handles();
    let seed = (js_sys::Math::random() * u64::MAX as f64) as u64 ^ js_sys::Date::now() as u64;
    let controller: Shared = Rc::new(RefCell::new(EffectController::new(
        page,
        rng::seeded(seed),
        config,
        reduced_motion,
        now_ms(&window),
    )?));

    listen(&document, "click", &controller, |c| c.on_document_click())?;
    for (index, target) in handles.targets.iter().enumerate() {
        listen(target, "mouseenter", &controller, move |c| c.on_target_hover(TargetId(index)))?;
    }
    for (item, surface) in &handles.gallery {
        let surface: SurfaceId = *surface;
        listen(item, "mouseenter", &controller, move |c| c.on_gallery_hover(surface))?;
    }
    listen(&handles.cta, "click", &controller, |c| c.on_cta_click())?;
    listen(&handles.toggle, "click", &controller, |c| c.toggle())?;

    let keys = {
        let controller = controller.clone();
        Closure::wrap(Box::new(move |event: KeyboardEvent| {
            if let Ok(mut c) = controller.try_borrow_mut() {
                c.on_key_down(event.key_code());
            }
        }) as Box<dyn FnMut(KeyboardEvent)>)
    };
    document.add_event_listener_with_callback("keydown", keys.as_ref().unchecked_ref())?;
    keys.forget();

    start_timer_loop(window, controller)?;
    Ok(())
}

fn listen(
    target: &EventTarget,
    event: &str,
    controller: &Shared,
    mut handler: impl FnMut(&mut EffectController<WebPage, GlitchRng>) + 'static,
) -> Result<(), GlitchError> {
    let controller = controller.clone();
    let closure = Closure::wrap(Box::new(move || {
        // A listener firing while another holds the controller is dropped.
        match controller.try_borrow_mut() {
            Ok(mut c) => handler(&mut *c),
            Err(_) => log::warn!("glitch controller busy, event dropped"),
        }
    }) as Box<dyn FnMut()>);
    target.add_event_listener_with_callback(event, closure.as_ref().unchecked_ref())?;
    closure.forget();
    Ok(())
}

/// `data-glitch-config` on `<body>` overrides the defaults. A bad value is
/// reported and ignored.
fn load_config(document: &Document) -> GlitchConfig {
    let Some(raw) = document.body().and_then(|b| b.get_attribute(CONFIG_ATTRIBUTE)) else {
        return GlitchConfig::default();
    };
    match GlitchConfig::from_json(&raw) {
        Ok(config) => config,
        Err(e) => {
            log::warn!("{e}; using defaults");
            GlitchConfig::default()
        }
    }
}

fn now_ms(window: &Window) -> f64 {
    window
        .performance()
        .map(|p| p.now())
        .unwrap_or_else(js_sys::Date::now)
}

/// Pump the controller's timers once per animation frame.
fn start_timer_loop(window: Window, controller: Shared) -> Result<(), GlitchError> {
    // `f` holds the animation-frame closure so it can re-request itself.
    let f: Rc<RefCell<Option<Closure<dyn FnMut()>>>> = Rc::new(RefCell::new(None));
    let g = f.clone();
    let frame_window = window.clone();
    *g.borrow_mut() = Some(Closure::wrap(Box::new(move || {
        match controller.try_borrow_mut() {
            Ok(mut c) => c.tick(now_ms(&frame_window)),
            Err(_) => log::warn!("glitch controller busy, frame skipped"),
        }

        if let Some(next) = f.borrow().as_ref() {
            if let Err(e) = frame_window.request_animation_frame(next.as_ref().unchecked_ref()) {
                log::error!("timer loop stopped: {e:?}");
            }
        }
    }) as Box<dyn FnMut()>));

    if let Some(first) = g.borrow().as_ref() {
        window.request_animation_frame(first.as_ref().unchecked_ref())?;
    }
    Ok(())
}
