use std::fmt;

/// Failures the glitch layer can report.
///
/// Effects themselves never fail; these come from wiring, configuration and
/// pixel transfer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GlitchError {
    /// A required element of the page is absent, named by its selector.
    MissingElement(String),
    /// A surface id outside the page's surface set.
    UnknownSurface(usize),
    /// A pixel buffer whose length is not `width * height * 4`.
    BufferSize { expected: usize, actual: usize },
    /// Invalid or unparsable configuration.
    Config(String),
    /// An error raised by the browser, stringified.
    Dom(String),
}

impl fmt::Display for GlitchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingElement(selector) => write!(f, "required element `{selector}` not found"),
            Self::UnknownSurface(id) => write!(f, "no canvas surface with index {id}"),
            Self::BufferSize { expected, actual } => {
                write!(f, "pixel buffer has {actual} bytes, expected {expected}")
            }
            Self::Config(msg) => write!(f, "invalid glitch config: {msg}"),
            Self::Dom(msg) => write!(f, "dom error: {msg}"),
        }
    }
}

impl std::error::Error for GlitchError {}

#[cfg(target_arch = "wasm32")]
impl From<GlitchError> for wasm_bindgen::JsValue {
    fn from(err: GlitchError) -> Self {
        wasm_bindgen::JsValue::from_str(&err.to_string())
    }
}

#[cfg(target_arch = "wasm32")]
impl From<wasm_bindgen::JsValue> for GlitchError {
    fn from(value: wasm_bindgen::JsValue) -> Self {
        GlitchError::Dom(value.as_string().unwrap_or_else(|| format!("{value:?}")))
    }
}
