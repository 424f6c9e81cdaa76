//! ProgressButton: the animated download button.
//!
//! The button is a small state machine of its own. The coordinator drives
//! it through `ProgressControl`; the event loop calls `tick()` once per
//! frame so the displayed progress can chase the target progress.
//!
//! Animation rules:
//! - A new target freezes the running motion at the current displayed
//!   value and arms one debounce deadline. Later targets inside the window
//!   replace the pending one without moving the deadline.
//! - When the deadline passes, exactly one animation run starts from the
//!   displayed value towards the latest target.
//! - Runs towards 100% use the shorter finish duration.
//! - Leaving `Loading` drops all animation state and resets to 0.

use crate::core::config::{PROGRESS_ANIMATION, PROGRESS_DEBOUNCE, PROGRESS_FINISH_ANIMATION};
use crate::core::control::{ControlState, ProgressControl};
use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::Span;
use ratatui::widgets::Widget;
use std::f32::consts::PI;
use std::time::{Duration, Instant};
use tracing::trace;

const SWEEP_GLYPHS: [&str; 5] = ["○", "◔", "◑", "◕", "●"];

/// Arc angle of the sweep indicator, in degrees.
pub fn sweep_angle(displayed: f32) -> f32 {
    displayed * 3.6
}

/// Glyph approximating a pie slice of `angle` degrees.
pub fn sweep_glyph(angle: f32) -> &'static str {
    let quarter = (angle.clamp(0.0, 360.0) / 90.0).ceil() as usize;
    SWEEP_GLYPHS[quarter.min(SWEEP_GLYPHS.len() - 1)]
}

/// Accelerate/decelerate curve over `t` in `0..=1`.
fn ease(t: f32) -> f32 {
    ((t + 1.0) * PI).cos() / 2.0 + 0.5
}

fn clamp_percent(p: f32) -> f32 {
    if p.is_nan() { 0.0 } else { p.clamp(0.0, 100.0) }
}

#[derive(Debug, Clone, Copy)]
struct Animation {
    from: f32,
    to: f32,
    started: Instant,
    duration: Duration,
}

impl Animation {
    fn fraction(&self, now: Instant) -> f32 {
        let elapsed = now.saturating_duration_since(self.started);
        (elapsed.as_secs_f32() / self.duration.as_secs_f32()).min(1.0)
    }

    fn value_at(&self, now: Instant) -> f32 {
        self.from + (self.to - self.from) * ease(self.fraction(now))
    }

    fn finished(&self, now: Instant) -> bool {
        self.fraction(now) >= 1.0
    }
}

#[derive(Debug, Clone, Copy)]
struct PendingTarget {
    target: f32,
    fire_at: Instant,
}

/// Colors of the button.
#[derive(Debug, Clone, Copy)]
pub struct ButtonStyle {
    pub background: Color,
    pub text: Color,
    pub loading_text: Color,
    pub loading_fill: Color,
    pub success: Color,
    pub failure: Color,
}

impl Default for ButtonStyle {
    fn default() -> Self {
        Self {
            background: Color::Cyan,
            text: Color::Black,
            loading_text: Color::White,
            loading_fill: Color::Blue,
            success: Color::Green,
            failure: Color::Red,
        }
    }
}

pub struct ProgressButton {
    state: ControlState,
    label: String,
    idle_label: String,
    target: f32,
    displayed: f32,
    animation: Option<Animation>,
    pending: Option<PendingTarget>,
    runs: u64,
    style: ButtonStyle,
}

impl ProgressButton {
    pub fn new(idle_label: impl Into<String>, style: ButtonStyle) -> Self {
        let idle_label = idle_label.into();
        Self {
            state: ControlState::Idle,
            label: idle_label.clone(),
            idle_label,
            target: 0.0,
            displayed: 0.0,
            animation: None,
            pending: None,
            runs: 0,
            style,
        }
    }

    pub fn set_style(&mut self, style: ButtonStyle) {
        self.style = style;
    }

    pub fn state(&self) -> ControlState {
        self.state
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    /// Latest accepted target progress.
    pub fn progress(&self) -> f32 {
        self.target
    }

    /// Progress currently drawn on screen.
    pub fn displayed_progress(&self) -> f32 {
        self.displayed
    }

    /// True while a run is in motion or a target waits for its deadline.
    pub fn is_animating(&self) -> bool {
        self.animation.is_some() || self.pending.is_some()
    }

    pub fn set_progress_at(&mut self, percent: f32, now: Instant) {
        if self.state != ControlState::Loading {
            trace!(event = "progress_ignored", state = ?self.state, percent);
            return;
        }
        let percent = clamp_percent(percent);
        if percent == self.target {
            return;
        }

        if let Some(animation) = self.animation.take() {
            self.displayed = animation.value_at(now);
        }
        self.target = percent;
        // An armed deadline keeps its time; only the target is replaced.
        let fire_at = self
            .pending
            .map_or(now + PROGRESS_DEBOUNCE, |pending| pending.fire_at);
        self.pending = Some(PendingTarget {
            target: percent,
            fire_at,
        });
    }

    /// Advance the animation clock. Returns `true` when the displayed value
    /// changed or is still moving, i.e. a redraw is due.
    pub fn tick_at(&mut self, now: Instant) -> bool {
        if !self.is_animating() {
            return false;
        }
        if let Some(pending) = self.pending
            && now >= pending.fire_at
        {
            self.pending = None;
            let duration = if pending.target >= 100.0 {
                PROGRESS_FINISH_ANIMATION
            } else {
                PROGRESS_ANIMATION
            };
            self.animation = Some(Animation {
                from: self.displayed,
                to: pending.target,
                started: now,
                duration,
            });
            self.runs += 1;
            trace!(
                event = "progress_animation",
                run = self.runs,
                from = self.displayed,
                to = pending.target,
            );
        }

        let Some(animation) = self.animation else {
            return false;
        };
        if animation.finished(now) {
            self.displayed = animation.to;
            self.animation = None;
        } else {
            self.displayed = animation.value_at(now);
        }
        true
    }

    fn reset_progress(&mut self) {
        self.animation = None;
        self.pending = None;
        self.target = 0.0;
        self.displayed = 0.0;
    }

    fn caption_style(&self) -> Style {
        let fg = match self.state {
            ControlState::Idle => self.style.text,
            ControlState::Loading => self.style.loading_text,
            ControlState::Completed => self.style.success,
            ControlState::Failed => self.style.failure,
        };
        Style::default().fg(fg).add_modifier(Modifier::BOLD)
    }
}

impl ProgressControl for ProgressButton {
    fn set_state(&mut self, state: ControlState) {
        let was_loading = self.state == ControlState::Loading;
        if state == ControlState::Loading {
            if !was_loading {
                self.reset_progress();
            }
        } else {
            self.reset_progress();
            self.label = self.idle_label.clone();
        }
        self.state = state;
    }

    fn set_progress(&mut self, percent: f32) {
        self.set_progress_at(percent, Instant::now());
    }

    fn set_label(&mut self, text: &str) {
        self.label = text.to_string();
    }
}

impl Widget for &ProgressButton {
    fn render(self, area: Rect, buf: &mut Buffer) {
        if area.is_empty() {
            return;
        }
        buf.set_style(area, Style::default().bg(self.style.background));

        let loading = self.state == ControlState::Loading;
        if loading {
            let fill = (f32::from(area.width) * self.displayed / 100.0).round() as u16;
            let fill_area = Rect {
                width: fill.min(area.width),
                ..area
            };
            buf.set_style(fill_area, Style::default().bg(self.style.loading_fill));
        }

        let caption_width = (Span::raw(self.label.as_str()).width() as u16).min(area.width);
        let x = area.x + (area.width - caption_width) / 2;
        let y = area.y + area.height / 2;
        buf.set_stringn(
            x,
            y,
            &self.label,
            usize::from(caption_width),
            self.caption_style(),
        );

        if loading {
            // One cell gap after the measured caption.
            let spinner_x = x + caption_width + 1;
            if spinner_x < area.right() {
                buf.set_string(
                    spinner_x,
                    y,
                    sweep_glyph(sweep_angle(self.displayed)),
                    Style::default().fg(self.style.loading_text),
                );
            }
        }
    }
}

#[cfg(test)]
impl ProgressButton {
    /// Number of animation runs started since creation.
    fn animation_runs(&self) -> u64 {
        self.runs
    }

    /// `(from, to)` of the running animation.
    fn animation_span(&self) -> Option<(f32, f32)> {
        self.animation.map(|a| (a.from, a.to))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    fn loading_button() -> ProgressButton {
        let mut button = ProgressButton::new("Download", ButtonStyle::default());
        button.set_label("Downloading");
        button.set_state(ControlState::Loading);
        button
    }

    /// Tick until every animation settled.
    fn settle(button: &mut ProgressButton, mut now: Instant) -> Instant {
        while button.is_animating() {
            now += ms(16);
            button.tick_at(now);
        }
        now
    }

    #[test]
    fn settled_progress_equals_clamped_target() {
        for (input, expected) in [(42.0, 42.0), (100.0, 100.0), (130.0, 100.0), (-5.0, 0.0)] {
            let mut button = loading_button();
            let t0 = Instant::now();
            button.set_progress_at(10.0, t0);
            let t1 = settle(&mut button, t0);
            button.set_progress_at(input, t1);
            settle(&mut button, t1);
            assert_eq!(button.displayed_progress(), expected, "input {input}");
        }
    }

    #[test]
    fn nan_is_treated_as_zero() {
        let mut button = loading_button();
        let t0 = Instant::now();
        button.set_progress_at(40.0, t0);
        let t1 = settle(&mut button, t0);
        button.set_progress_at(f32::NAN, t1);
        settle(&mut button, t1);
        assert_eq!(button.displayed_progress(), 0.0);
    }

    #[test]
    fn burst_inside_debounce_window_starts_one_run_to_latest_target() {
        let mut button = loading_button();
        let t0 = Instant::now();

        button.set_progress_at(30.0, t0);
        button.tick_at(t0 + ms(50));
        button.set_progress_at(70.0, t0 + ms(60));

        button.tick_at(t0 + ms(90));
        assert_eq!(button.animation_runs(), 0);
        assert_eq!(button.displayed_progress(), 0.0);

        // The deadline armed by the first target still holds.
        button.tick_at(t0 + ms(100));
        assert_eq!(button.animation_runs(), 1);
        assert_eq!(button.animation_span(), Some((0.0, 70.0)));

        settle(&mut button, t0 + ms(100));
        assert_eq!(button.animation_runs(), 1);
        assert_eq!(button.displayed_progress(), 70.0);
    }

    #[test]
    fn steady_updates_faster_than_debounce_still_animate() {
        let mut button = loading_button();
        let t0 = Instant::now();
        let mut now = t0;
        let mut next_update = t0;
        let mut sent = 0.0;

        while now < t0 + ms(2000) {
            if now >= next_update && sent < 40.0 {
                sent += 1.0;
                button.set_progress_at(sent, now);
                next_update += ms(50);
            }
            button.tick_at(now);
            now += ms(16);
        }

        assert!(button.animation_runs() >= 5, "runs = {}", button.animation_runs());
        assert!(button.displayed_progress() > 0.0);

        settle(&mut button, now);
        assert_eq!(button.displayed_progress(), 40.0);
    }

    #[test]
    fn new_target_mid_animation_continues_from_displayed_value() {
        let mut button = loading_button();
        let t0 = Instant::now();

        button.set_progress_at(40.0, t0);
        button.tick_at(t0 + ms(100));
        button.tick_at(t0 + ms(350));
        let midway = button.displayed_progress();
        assert!(midway > 0.0 && midway < 40.0, "midway = {midway}");

        button.set_progress_at(80.0, t0 + ms(350));
        // Frozen during the debounce window: no snap back, no jump ahead.
        button.tick_at(t0 + ms(400));
        assert_eq!(button.displayed_progress(), midway);

        button.tick_at(t0 + ms(450));
        assert_eq!(button.animation_span(), Some((midway, 80.0)));
        assert_eq!(button.animation_runs(), 2);

        let mut last = midway;
        let mut now = t0 + ms(450);
        while button.is_animating() {
            now += ms(16);
            button.tick_at(now);
            assert!(button.displayed_progress() >= last);
            last = button.displayed_progress();
        }
        assert_eq!(last, 80.0);
    }

    #[test]
    fn finish_animation_is_faster() {
        let t0 = Instant::now();
        let start = t0 + PROGRESS_DEBOUNCE;

        let mut finishing = loading_button();
        finishing.set_progress_at(100.0, t0);
        finishing.tick_at(start);
        finishing.tick_at(start + PROGRESS_FINISH_ANIMATION);
        assert!(!finishing.is_animating());
        assert_eq!(finishing.displayed_progress(), 100.0);

        let mut intermediate = loading_button();
        intermediate.set_progress_at(50.0, t0);
        intermediate.tick_at(start);
        intermediate.tick_at(start + PROGRESS_FINISH_ANIMATION);
        assert!(intermediate.is_animating());
        assert!(intermediate.displayed_progress() < 50.0);

        assert!(PROGRESS_FINISH_ANIMATION < PROGRESS_ANIMATION);
    }

    #[test]
    fn progress_outside_loading_is_ignored() {
        let mut button = ProgressButton::new("Download", ButtonStyle::default());
        button.set_progress_at(50.0, Instant::now());
        assert_eq!(button.progress(), 0.0);
        assert!(!button.is_animating());
    }

    #[test]
    fn leaving_loading_resets_and_cancels_animation() {
        let mut button = loading_button();
        let t0 = Instant::now();
        button.set_progress_at(60.0, t0);
        button.tick_at(t0 + ms(300));
        assert!(button.is_animating());

        button.set_state(ControlState::Completed);

        assert!(!button.is_animating());
        assert_eq!(button.displayed_progress(), 0.0);
        assert_eq!(button.progress(), 0.0);
        assert_eq!(button.label(), "Download");
        assert!(!button.tick_at(t0 + ms(900)));
        assert_eq!(button.displayed_progress(), 0.0);
    }

    #[test]
    fn entering_loading_starts_from_zero() {
        let mut button = loading_button();
        let t0 = Instant::now();
        button.set_progress_at(80.0, t0);
        settle(&mut button, t0);

        button.set_state(ControlState::Failed);
        button.set_state(ControlState::Loading);

        assert_eq!(button.displayed_progress(), 0.0);
        assert_eq!(button.state(), ControlState::Loading);
    }

    #[test]
    fn sweep_glyph_follows_angle() {
        assert_eq!(sweep_angle(50.0), 180.0);
        assert_eq!(sweep_glyph(sweep_angle(0.0)), "○");
        assert_eq!(sweep_glyph(sweep_angle(10.0)), "◔");
        assert_eq!(sweep_glyph(sweep_angle(50.0)), "◑");
        assert_eq!(sweep_glyph(sweep_angle(70.0)), "◕");
        assert_eq!(sweep_glyph(sweep_angle(100.0)), "●");
    }

    #[test]
    fn idle_render_shows_centered_caption_only() {
        let button = ProgressButton::new("Download", ButtonStyle::default());
        let area = Rect::new(0, 0, 20, 3);
        let mut buf = Buffer::empty(area);

        (&button).render(area, &mut buf);

        let row: String = (0..20).map(|x| buf[(x, 1)].symbol().to_string()).collect();
        assert_eq!(row, "      Download      ");
        assert_eq!(buf[(0, 1)].bg, ButtonStyle::default().background);
    }

    #[test]
    fn loading_render_fills_and_places_spinner_after_caption() {
        let mut button = loading_button();
        button.set_label("Go");
        let t0 = Instant::now();
        button.set_progress_at(50.0, t0);
        settle(&mut button, t0);

        let area = Rect::new(0, 0, 20, 3);
        let mut buf = Buffer::empty(area);
        (&button).render(area, &mut buf);

        let style = ButtonStyle::default();
        assert_eq!(buf[(9, 0)].bg, style.loading_fill);
        assert_eq!(buf[(10, 0)].bg, style.background);
        // Caption "Go" at x = 9..11, one cell gap, spinner at 12.
        assert_eq!(buf[(9, 1)].symbol(), "G");
        assert_eq!(buf[(10, 1)].symbol(), "o");
        assert_eq!(buf[(11, 1)].symbol(), " ");
        assert_eq!(buf[(12, 1)].symbol(), "◑");
    }
}
