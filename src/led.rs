// ReflexPod — LED Frame Rendering
//
// Expands a `LightRequest` into a sequence of timed frames for the ring. The
// WS2812 driver writes each frame and holds it; keeping the expansion here
// lets the animations be checked on the host.

use crate::actuator::{LightRequest, PatternKind, PatternRequest, SyncPhase};
use crate::config::NUM_LEDS;

pub type Rgb = (u8, u8, u8);
pub type Frame = [Rgb; NUM_LEDS];

pub const OFF: Rgb = (0, 0, 0);
const RED: Rgb = (255, 0, 0);
const GREEN: Rgb = (0, 255, 0);
const YELLOW: Rgb = (255, 255, 0);

/// One frame and how long to hold it before the next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Step {
    pub frame: Frame,
    pub hold_ms: u32,
}

pub fn rgb(color: u32) -> Rgb {
    ((color >> 16) as u8, (color >> 8) as u8, color as u8)
}

fn fill(color: Rgb) -> Frame {
    [color; NUM_LEDS]
}

fn step(frame: Frame, hold_ms: u32) -> Step {
    Step { frame, hold_ms }
}

fn scale(color: Rgb, percent: u32) -> Rgb {
    let s = |c: u8| (u32::from(c) * percent / 100) as u8;
    (s(color.0), s(color.1), s(color.2))
}

/// Colour wheel: 0–255 cycles red → green → blue → red.
pub fn wheel(pos: u8) -> Rgb {
    let pos = 255 - pos;
    if pos < 85 {
        (255 - pos * 3, 0, pos * 3)
    } else if pos < 170 {
        let pos = pos - 85;
        (0, pos * 3, 255 - pos * 3)
    } else {
        let pos = pos - 170;
        (pos * 3, 255 - pos * 3, 0)
    }
}

/// Render a request into frames. An empty result means nothing to draw.
pub fn steps(request: &LightRequest) -> Vec<Step> {
    match *request {
        LightRequest::Pattern(pattern) => pattern_steps(&pattern),
        LightRequest::Timer {
            seconds,
            total_seconds,
        } => vec![step(timer_frame(seconds, total_seconds), 0)],
        LightRequest::Intensity { level } => vec![step(intensity_frame(level), 0)],
        LightRequest::Sync(phase) => vec![step(sync_frame(&phase), 0)],
        LightRequest::Identify { device_id } => blinks(GREEN, u32::from(device_id), 300, 200),
        LightRequest::Clear => vec![step(fill(OFF), 0)],
    }
}

fn blinks(color: Rgb, count: u32, on_ms: u32, off_ms: u32) -> Vec<Step> {
    (0..count)
        .flat_map(|_| [step(fill(color), on_ms), step(fill(OFF), off_ms)])
        .collect()
}

fn ramp(color: Rgb, levels: impl Iterator<Item = u32>, hold_ms: u32) -> impl Iterator<Item = Step> {
    levels.map(move |percent| step(fill(scale(color, percent)), hold_ms))
}

fn pattern_steps(pattern: &PatternRequest) -> Vec<Step> {
    let color = rgb(pattern.color);
    match pattern.kind {
        PatternKind::Solid => vec![step(fill(color), 0)],
        PatternKind::Off => vec![step(fill(OFF), 0)],
        PatternKind::Flash => blinks(color, 3, 150, 150),
        PatternKind::Pulse => blinks(color, 5, 200, 200),
        PatternKind::Chase => {
            let mut out: Vec<Step> = (0..3 * NUM_LEDS)
                .map(|i| {
                    let mut frame = fill(OFF);
                    frame[i % NUM_LEDS] = color;
                    step(frame, 50)
                })
                .collect();
            out.push(step(fill(OFF), 0));
            out
        }
        PatternKind::Rainbow => {
            let mut out: Vec<Step> = (0..=255u8).map(|j| step(rainbow_frame(j), 10)).collect();
            out.push(step(fill(OFF), 0));
            out
        }
        PatternKind::Celebration => {
            let mut out: Vec<Step> = (0..3)
                .flat_map(|_| (0..32u8).map(|j| step(rainbow_frame(j * 8), 20)))
                .collect();
            out.push(step(fill(OFF), 0));
            out
        }
        PatternKind::Warmup => {
            // Orange glow, 50 → 150 → 50 on the red channel.
            let orange = |i: u8| (i, i / 2, 0);
            (50..=150u8)
                .step_by(10)
                .chain((50..=150u8).rev().step_by(10))
                .map(|i| step(fill(orange(i)), 50))
                .collect()
        }
        PatternKind::Breathing | PatternKind::Rest => (0..3)
            .flat_map(|_| {
                ramp(color, (0..=100).step_by(5), 80).chain(ramp(color, (0..=100).rev().step_by(5), 80))
            })
            .collect(),
        PatternKind::Timer | PatternKind::Intensity | PatternKind::Wave | PatternKind::Unknown => {
            Vec::new()
        }
    }
}

fn rainbow_frame(offset: u8) -> Frame {
    let mut frame = fill(OFF);
    for (i, px) in frame.iter_mut().enumerate() {
        *px = wheel((i as u8).wrapping_add(offset));
    }
    frame
}

/// Progress bar: green, yellow under 30 s, red under 10 s.
pub fn timer_frame(seconds: u32, total_seconds: u32) -> Frame {
    let lit = if total_seconds == 0 {
        0
    } else {
        (seconds.min(total_seconds) as usize * NUM_LEDS) / total_seconds as usize
    };
    let color = match seconds {
        0..=10 => RED,
        11..=30 => YELLOW,
        _ => GREEN,
    };
    bar(lit, color)
}

/// Level 1–10 bar: green up to 3, yellow up to 7, red above.
pub fn intensity_frame(level: u8) -> Frame {
    let level = level.clamp(1, 10);
    let lit = 1 + (usize::from(level) - 1) * (NUM_LEDS - 1) / 9;
    let color = match level {
        1..=3 => GREEN,
        4..=7 => YELLOW,
        _ => RED,
    };
    bar(lit, color)
}

fn bar(lit: usize, color: Rgb) -> Frame {
    let mut frame = fill(OFF);
    for px in frame.iter_mut().take(lit) {
        *px = color;
    }
    frame
}

/// Sine wave around the ring, 22° per pixel, red where high and blue where low.
pub fn sync_frame(phase: &SyncPhase) -> Frame {
    let mut frame = fill(OFF);
    let start = phase.start_deg();
    for (i, px) in frame.iter_mut().enumerate() {
        let deg = (start + i as u32 * 22) % 360;
        let level = ((f64::from(deg).to_radians().sin() + 1.0) * 127.0) as u8;
        *px = (level, 0, 255 - level);
    }
    frame
}

/// Apply global brightness (0–255) to a pixel.
pub fn dim(px: Rgb, brightness: u8) -> Rgb {
    let d = |c: u8| ((u16::from(c) * u16::from(brightness)) / 255) as u8;
    (d(px.0), d(px.1), d(px.2))
}
