//! Decorative glitch layer for a web page: canvas corruption, text scrambling,
//! falling fragments and a randomized trigger loop.
//!
//! The effect logic is platform independent and drives the page through the
//! [`page::Page`] trait. The browser binding lives in the `wasm` module and is
//! only compiled for `wasm32`.

pub mod config;
pub mod controller;
pub mod error;
pub mod keyseq;
pub mod page;
pub mod rng;
pub mod scheduler;
pub mod scramble;
pub mod surface;

pub use config::GlitchConfig;
pub use controller::{ControllerState, EffectController};
pub use error::GlitchError;
pub use page::{FragmentId, FragmentStyle, Page, SurfaceId, TargetId};
pub use rng::RandomSource;
pub use surface::CanvasSurface;

// Only compile wasm-specific code when targeting wasm32.

#[cfg(target_arch = "wasm32")]
pub mod wasm {
    use wasm_bindgen::prelude::*;
    use wasm_bindgen::JsCast;

    pub mod dom;
    pub mod driver;

    #[wasm_bindgen(start)]
    pub fn main() -> Result<(), JsValue> {
        wasm_logger::init(wasm_logger::Config::new(log::Level::Info));
        std::panic::set_hook(Box::new(|info| {
            web_sys::console::error_1(&info.to_string().into());
        }));

        let window = web_sys::window().ok_or("no window")?;
        let document = window.document().ok_or("no document")?;
        if document.ready_state() == "loading" {
            let on_ready = Closure::once(boot);
            document.add_event_listener_with_callback(
                "DOMContentLoaded",
                on_ready.as_ref().unchecked_ref(),
            )?;
            on_ready.forget();
        } else {
            boot();
        }
        Ok(())
    }

    /// A page without the glitch markup keeps working, just undecorated.
    fn boot() {
        if let Err(e) = driver::start() {
            log::error!("glitch layer failed to start: {e}");
        }
    }
}
