//! Tunables for the glitch layer.
//!
//! `GlitchConfig::default()` reproduces the page's stock behaviour. A page can
//! override any subset of fields through a JSON object; missing fields keep
//! their defaults.

use serde::Deserialize;

use crate::error::GlitchError;

/// Floor for the cycle delay and the scramble/restore tick periods.
const MIN_PERIOD_MS: f64 = 1.0;

/// Every probability, delay and string the controller uses.
///
/// Delays are milliseconds. Probabilities are in `[0, 1]`.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct GlitchConfig {
    /// Gradient start colours, picked by surface index modulo length.
    pub palette: Vec<[u8; 3]>,
    pub rect_count: usize,
    pub rect_min_size: f64,
    pub rect_size_range: f64,
    pub scan_line_period: usize,

    pub shear_probability: f64,
    pub shear_max_shift: i64,
    pub noise_probability: f64,
    pub canvas_restore_ms: f64,
    /// Redraw a glitched surface with its own palette entry instead of entry 0.
    pub restore_own_palette: bool,

    pub active_class: String,
    pub scramble_class: String,
    pub element_glitch_ms: f64,
    pub scramble_probability: f64,
    pub scramble_alphabet: String,
    pub scramble_tick_ms: f64,
    pub scramble_phase_ms: f64,
    pub restore_tick_ms: f64,

    pub click_probability: f64,
    pub hover_probability: f64,
    pub cycle_probability: f64,
    pub cycle_min_ms: f64,
    pub cycle_max_ms: f64,
    /// Longest stretch of missed time replayed on one tick. A longer gap
    /// (a tab left in the background) is skipped, not replayed.
    pub max_catch_up_ms: f64,

    pub major_target_stagger_ms: f64,
    pub major_burst_count: usize,
    pub major_burst_stagger_ms: f64,
    pub major_surface_stagger_ms: f64,

    pub fragments_per_burst: usize,
    pub fragment_lifetime_ms: f64,
    pub fragment_colors: [String; 2],

    pub label_reduced: String,
    pub label_enabled: String,
    pub label_disabled: String,

    pub easter_egg_sequence: Vec<u32>,
    pub easter_egg_filter: String,
    pub easter_egg_ms: f64,
}

impl Default for GlitchConfig {
    fn default() -> Self {
        Self {
            palette: vec![[0xff, 0x00, 0x80], [0x00, 0xff, 0x41], [0x00, 0x80, 0xff]],
            rect_count: 10,
            rect_min_size: 10.0,
            rect_size_range: 50.0,
            scan_line_period: 4,

            shear_probability: 0.1,
            shear_max_shift: 10,
            noise_probability: 0.05,
            canvas_restore_ms: 200.0,
            restore_own_palette: false,

            active_class: "glitch-active".into(),
            scramble_class: "text-scramble".into(),
            element_glitch_ms: 300.0,
            scramble_probability: 0.5,
            scramble_alphabet: "!@#$%^&*()_+-=[]{}|;:,.<>?~`".into(),
            scramble_tick_ms: 50.0,
            scramble_phase_ms: 300.0,
            restore_tick_ms: 30.0,

            click_probability: 0.3,
            hover_probability: 0.4,
            cycle_probability: 0.7,
            cycle_min_ms: 3000.0,
            cycle_max_ms: 8000.0,
            max_catch_up_ms: 10_000.0,

            major_target_stagger_ms: 100.0,
            major_burst_count: 10,
            major_burst_stagger_ms: 200.0,
            major_surface_stagger_ms: 150.0,

            fragments_per_burst: 5,
            fragment_lifetime_ms: 2000.0,
            fragment_colors: ["#00ff41".into(), "#ff0080".into()],

            label_reduced: "CHAOS REDUCED".into(),
            label_enabled: "REDUCE CHAOS".into(),
            label_disabled: "ENABLE CHAOS".into(),

            easter_egg_sequence: vec![38, 38, 40, 40, 37, 39, 37, 39, 66, 65],
            easter_egg_filter: "hue-rotate(180deg) saturate(2) contrast(1.5)".into(),
            easter_egg_ms: 3000.0,
        }
    }
}

impl GlitchConfig {
    /// Parse a (possibly partial) JSON override and validate the result.
    pub fn from_json(json: &str) -> Result<Self, GlitchError> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| GlitchError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), GlitchError> {
        let probabilities = [
            ("shear_probability", self.shear_probability),
            ("noise_probability", self.noise_probability),
            ("scramble_probability", self.scramble_probability),
            ("click_probability", self.click_probability),
            ("hover_probability", self.hover_probability),
            ("cycle_probability", self.cycle_probability),
        ];
        for (name, p) in probabilities {
            if !(0.0..=1.0).contains(&p) {
                return Err(GlitchError::Config(format!("{name} must be in [0, 1], got {p}")));
            }
        }
        if self.palette.is_empty() {
            return Err(GlitchError::Config("palette must not be empty".into()));
        }
        if self.scramble_alphabet.is_empty() {
            return Err(GlitchError::Config("scramble_alphabet must not be empty".into()));
        }
        if self.scan_line_period == 0 {
            return Err(GlitchError::Config("scan_line_period must be positive".into()));
        }
        if !(self.cycle_min_ms >= MIN_PERIOD_MS) {
            return Err(GlitchError::Config(format!(
                "cycle_min_ms must be at least {MIN_PERIOD_MS}, got {}",
                self.cycle_min_ms
            )));
        }
        if self.cycle_max_ms < self.cycle_min_ms {
            return Err(GlitchError::Config(format!(
                "cycle delay range is inverted ({} > {})",
                self.cycle_min_ms, self.cycle_max_ms
            )));
        }
        for (name, period) in [
            ("scramble_tick_ms", self.scramble_tick_ms),
            ("restore_tick_ms", self.restore_tick_ms),
        ] {
            if !(period >= MIN_PERIOD_MS) {
                return Err(GlitchError::Config(format!(
                    "{name} must be at least {MIN_PERIOD_MS}, got {period}"
                )));
            }
        }
        if !(self.max_catch_up_ms >= 0.0) {
            return Err(GlitchError::Config("max_catch_up_ms must not be negative".into()));
        }
        Ok(())
    }
}
