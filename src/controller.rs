//! The effect controller.
//!
//! Owns the enabled flag, the page, the random source and a single timer
//! queue. Every delayed step of every effect is a [`Task`] in that queue, so
//! disabling the layer revokes in-flight effects instead of letting them run
//! out.

use std::collections::HashMap;

use log::{debug, info, warn};

use crate::config::GlitchConfig;
use crate::error::GlitchError;
use crate::keyseq::KeySequence;
use crate::page::{FragmentId, FragmentStyle, Page, SurfaceId, TargetId};
use crate::rng::RandomSource;
use crate::scheduler::{Scheduler, TaskHandle};
use crate::scramble::{RestoreStep, ScrambleJob};
use crate::surface::CanvasSurface;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ControllerState {
    pub enabled: bool,
    /// Multiplier on the per-pixel canvas glitch probabilities.
    pub intensity: f64,
}

#[derive(Clone, Debug, PartialEq)]
enum Task {
    Cycle,
    ClearFilter,
    GlitchElement(TargetId),
    RemoveMarker(TargetId),
    SpawnFragments,
    RemoveFragment(FragmentId),
    GlitchCanvas(SurfaceId),
    RestoreCanvas(SurfaceId),
    ScrambleTick(TargetId),
    BeginRestore(TargetId),
    RestoreTick(TargetId),
}

impl Task {
    /// Effect steps are revoked when the layer is disabled; the cycle loop
    /// and the easter-egg reset keep running.
    fn is_effect(&self) -> bool {
        !matches!(self, Task::Cycle | Task::ClearFilter)
    }
}

struct ActiveScramble {
    job: ScrambleJob,
    timer: TaskHandle,
    phase: Option<TaskHandle>,
}

pub struct EffectController<P: Page, R: RandomSource> {
    state: ControllerState,
    config: GlitchConfig,
    alphabet: Vec<char>,
    page: P,
    rng: R,
    timers: Scheduler<Task>,
    scrambles: HashMap<TargetId, ActiveScramble>,
    keys: KeySequence,
    filter_reset: Option<TaskHandle>,
}

impl<P: Page, R: RandomSource> EffectController<P, R> {
    /// Paint every canvas, start the glitch cycle and apply the reduced-motion
    /// preference.
    pub fn new(
        page: P,
        rng: R,
        config: GlitchConfig,
        reduced_motion: bool,
        now_ms: f64,
    ) -> Result<Self, GlitchError> {
        config.validate()?;
        let mut controller = Self {
            state: ControllerState {
                enabled: true,
                intensity: 1.0,
            },
            alphabet: config.scramble_alphabet.chars().collect(),
            keys: KeySequence::new(config.easter_egg_sequence.clone()),
            config,
            page,
            rng,
            timers: Scheduler::new(now_ms),
            scrambles: HashMap::new(),
            filter_reset: None,
        };

        for index in 0..controller.page.surface_count() {
            controller.draw_initial_image(SurfaceId(index), index)?;
        }
        controller.start_glitch_cycle();

        if reduced_motion {
            controller.state.enabled = false;
            let label = controller.config.label_reduced.clone();
            controller.page.set_toggle_label(&label);
        }
        info!(
            "glitch layer ready: {} targets, {} canvases, enabled={}",
            controller.page.target_count(),
            controller.page.surface_count(),
            controller.state.enabled
        );
        Ok(controller)
    }

    pub fn state(&self) -> ControllerState {
        self.state
    }

    pub fn is_enabled(&self) -> bool {
        self.state.enabled
    }

    pub fn set_intensity(&mut self, intensity: f64) {
        self.state.intensity = intensity.max(0.0);
    }

    pub fn page(&self) -> &P {
        &self.page
    }

    /// Number of queued timer entries, the glitch cycle included.
    pub fn pending_timers(&self) -> usize {
        self.timers.len()
    }

    pub fn next_due(&self) -> Option<f64> {
        self.timers.next_due()
    }

    /// Run every timer due by `now_ms`.
    ///
    /// At most `max_catch_up_ms` of missed time is replayed; the rest of a
    /// longer gap is skipped with every pending timer keeping its remaining
    /// delay.
    pub fn tick(&mut self, now_ms: f64) {
        let lag = now_ms - self.timers.now_ms();
        if lag > self.config.max_catch_up_ms {
            let skipped = lag - self.config.max_catch_up_ms;
            debug!("skipping {skipped:.0} ms of missed timers");
            self.timers.fast_forward(skipped);
        }
        while let Some((_, task)) = self.timers.pop_due(now_ms) {
            self.run(task);
        }
    }

    fn run(&mut self, task: Task) {
        match task {
            Task::Cycle => self.run_cycle(),
            Task::ClearFilter => {
                self.filter_reset = None;
                self.page.set_page_filter(None);
            }
            Task::GlitchElement(target) => self.glitch_element(target),
            Task::RemoveMarker(target) => {
                let class = &self.config.active_class;
                self.page.remove_class(target, class);
            }
            Task::SpawnFragments => self.create_fragments(),
            Task::RemoveFragment(id) => self.page.remove_fragment(id),
            Task::GlitchCanvas(surface) => {
                let result = self.glitch_canvas(surface);
                self.report(result);
            }
            Task::RestoreCanvas(surface) => {
                // Stock behaviour repaints with palette entry 0 whichever
                // surface was glitched.
                let index = if self.config.restore_own_palette { surface.0 } else { 0 };
                let result = self.draw_initial_image(surface, index);
                self.report(result);
            }
            Task::ScrambleTick(target) => self.scramble_tick(target),
            Task::BeginRestore(target) => self.begin_restore(target),
            Task::RestoreTick(target) => self.restore_tick(target),
        }
    }

    fn report(&self, result: Result<(), GlitchError>) {
        if let Err(e) = result {
            warn!("glitch effect failed: {e}");
        }
    }

    /// Paint the resting image of `surface` using palette entry `index`.
    pub fn draw_initial_image(&mut self, surface: SurfaceId, index: usize) -> Result<(), GlitchError> {
        let (width, height) = self.page.surface_size(surface)?;
        let mut pixels = CanvasSurface::new(width, height);
        pixels.paint_initial(
            index,
            &self.config.palette,
            self.config.rect_count,
            (self.config.rect_min_size, self.config.rect_size_range),
            self.config.scan_line_period,
            &mut self.rng,
        );
        self.page.write_surface(surface, &pixels)
    }

    /// Corrupt the canvas and schedule its repaint.
    pub fn glitch_canvas(&mut self, surface: SurfaceId) -> Result<(), GlitchError> {
        if !self.state.enabled {
            return Ok(());
        }
        let mut pixels = self.page.read_surface(surface)?;
        let touched = pixels.glitch(
            (self.config.shear_probability * self.state.intensity).min(1.0),
            self.config.shear_max_shift,
            (self.config.noise_probability * self.state.intensity).min(1.0),
            &mut self.rng,
        );
        self.page.write_surface(surface, &pixels)?;
        debug!("canvas {} glitched ({touched} pixels)", surface.0);
        self.timers
            .schedule(self.config.canvas_restore_ms, Task::RestoreCanvas(surface));
        Ok(())
    }

    /// Flash the marker class on `target`, sometimes scrambling its text.
    pub fn glitch_element(&mut self, target: TargetId) {
        if !self.state.enabled {
            return;
        }
        self.page.add_class(target, &self.config.active_class);

        let has_text = self.page.text(target).is_some_and(|t| !t.is_empty());
        if has_text && self.rng.chance(self.config.scramble_probability) {
            self.scramble_text(target);
        }

        self.timers
            .schedule(self.config.element_glitch_ms, Task::RemoveMarker(target));
    }

    /// Scramble the text of `target`, then type the original back in.
    ///
    /// Restarting on an element that is still scrambling keeps the original
    /// text of the running job.
    pub fn scramble_text(&mut self, target: TargetId) {
        let original = match self.scrambles.remove(&target) {
            Some(active) => {
                self.timers.cancel(active.timer);
                if let Some(phase) = active.phase {
                    self.timers.cancel(phase);
                }
                active.job.original()
            }
            None => self.page.text(target).unwrap_or_default(),
        };

        self.page.add_class(target, &self.config.scramble_class);
        let timer = self
            .timers
            .schedule_interval(self.config.scramble_tick_ms, Task::ScrambleTick(target));
        let phase = self
            .timers
            .schedule(self.config.scramble_phase_ms, Task::BeginRestore(target));
        self.scrambles.insert(
            target,
            ActiveScramble {
                job: ScrambleJob::new(&original),
                timer,
                phase: Some(phase),
            },
        );
    }

    fn scramble_tick(&mut self, target: TargetId) {
        if let Some(active) = self.scrambles.get_mut(&target) {
            let text = active.job.scramble(&self.alphabet, &mut self.rng);
            self.page.set_text(target, &text);
        }
    }

    fn begin_restore(&mut self, target: TargetId) {
        if let Some(active) = self.scrambles.get_mut(&target) {
            self.timers.cancel(active.timer);
            active.phase = None;
            active.timer = self
                .timers
                .schedule_interval(self.config.restore_tick_ms, Task::RestoreTick(target));
        }
    }

    fn restore_tick(&mut self, target: TargetId) {
        let Some(active) = self.scrambles.get_mut(&target) else {
            return;
        };
        match active.job.restore_step() {
            RestoreStep::Partial(text) => self.page.set_text(target, &text),
            RestoreStep::Done(original) => {
                self.timers.cancel(active.timer);
                self.scrambles.remove(&target);
                self.page.set_text(target, &original);
                self.page.remove_class(target, &self.config.scramble_class);
            }
        }
    }

    /// Glitch one random target and drop a fragment burst.
    pub fn trigger_random_glitch(&mut self) {
        if !self.state.enabled {
            return;
        }
        let count = self.page.target_count();
        if count > 0 {
            let target = TargetId(self.rng.index(count));
            debug!("random glitch on target {}", target.0);
            self.glitch_element(target);
        }
        self.create_fragments();
    }

    /// Staggered glitch of every target and canvas plus a fragment storm.
    pub fn trigger_major_glitch(&mut self) {
        if !self.state.enabled {
            return;
        }
        info!("major glitch");
        for i in 0..self.page.target_count() {
            let delay = i as f64 * self.config.major_target_stagger_ms;
            self.timers.schedule(delay, Task::GlitchElement(TargetId(i)));
        }
        for i in 0..self.config.major_burst_count {
            let delay = i as f64 * self.config.major_burst_stagger_ms;
            self.timers.schedule(delay, Task::SpawnFragments);
        }
        for i in 0..self.page.surface_count() {
            let delay = i as f64 * self.config.major_surface_stagger_ms;
            self.timers.schedule(delay, Task::GlitchCanvas(SurfaceId(i)));
        }
    }

    /// Append a burst of fragments, each removed after its lifetime.
    pub fn create_fragments(&mut self) {
        if !self.state.enabled {
            return;
        }
        for _ in 0..self.config.fragments_per_burst {
            let left_pct = self.rng.next_f64() * 100.0;
            let width_px = self.rng.next_f64() * 20.0 + 5.0;
            let height_px = self.rng.next_f64() * 100.0 + 20.0;
            let pick = if self.rng.chance(0.5) { 0 } else { 1 };
            let color = self.config.fragment_colors[pick].clone();
            let id = self.page.append_fragment(&FragmentStyle {
                left_pct,
                width_px,
                height_px,
                color,
            });
            self.timers
                .schedule(self.config.fragment_lifetime_ms, Task::RemoveFragment(id));
        }
    }

    pub fn start_glitch_cycle(&mut self) {
        let delay = self.rng.range(self.config.cycle_min_ms, self.config.cycle_max_ms);
        self.timers.schedule(delay, Task::Cycle);
    }

    fn run_cycle(&mut self) {
        if self.state.enabled && self.rng.chance(self.config.cycle_probability) {
            self.trigger_random_glitch();
        }
        self.start_glitch_cycle();
    }

    /// Flip the enabled flag. Disabling revokes every pending effect step and
    /// resets the page.
    pub fn toggle(&mut self) {
        self.state.enabled = !self.state.enabled;
        let label = if self.state.enabled {
            self.config.label_enabled.clone()
        } else {
            self.config.label_disabled.clone()
        };
        self.page.set_toggle_label(&label);
        info!("glitch effects {}", if self.state.enabled { "enabled" } else { "disabled" });

        if !self.state.enabled {
            self.clear_all_glitches();
        }
    }

    /// Stop in-flight effects and return the page to its resting state.
    pub fn clear_all_glitches(&mut self) {
        let revoked = self.timers.cancel_where(Task::is_effect);
        debug!("revoked {revoked} pending effect timers");

        for (target, active) in self.scrambles.drain() {
            self.page.set_text(target, &active.job.original());
        }
        let classes = [self.config.active_class.as_str(), self.config.scramble_class.as_str()];
        self.page.remove_class_everywhere(&classes);
        self.page.clear_fragments();

        for index in 0..self.page.surface_count() {
            let result = self.draw_initial_image(SurfaceId(index), index);
            self.report(result);
        }
    }

    pub fn on_document_click(&mut self) {
        if self.rng.chance(self.config.click_probability) {
            self.trigger_random_glitch();
        }
    }

    pub fn on_target_hover(&mut self, target: TargetId) {
        if self.state.enabled && self.rng.chance(self.config.hover_probability) {
            self.glitch_element(target);
        }
    }

    pub fn on_gallery_hover(&mut self, surface: SurfaceId) {
        if self.state.enabled {
            let result = self.glitch_canvas(surface);
            self.report(result);
        }
    }

    pub fn on_cta_click(&mut self) {
        self.trigger_major_glitch();
    }

    /// Feed a key code to the easter-egg matcher. Runs whether or not effects
    /// are enabled.
    pub fn on_key_down(&mut self, code: u32) {
        if !self.keys.push(code) {
            return;
        }
        info!("easter egg unlocked");
        self.page.set_page_filter(Some(self.config.easter_egg_filter.as_str()));
        if let Some(previous) = self.filter_reset.take() {
            self.timers.cancel(previous);
        }
        self.filter_reset = Some(self.timers.schedule(self.config.easter_egg_ms, Task::ClearFilter));
    }
}
