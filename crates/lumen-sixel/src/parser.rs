//! Streaming SIXEL parser.
//!
//! Consumes the code points *between* the DCS introducer and ST — the outer
//! escape-sequence dispatcher handles those — and translates them into
//! semantic events on a [`SixelEvents`] sink. The canonical sink is
//! [`SixelImageBuilder`](crate::builder::SixelImageBuilder), but anything
//! implementing the trait works (tests use a recording sink).
//!
//! # Protocol elements
//!
//! - `"Pan;Pad;Ph;Pv` — raster attributes (aspect ratio, dimensions)
//! - `#Pc` — select a color register
//! - `#Pc;Pu;Px;Py;Pz` — define the color of a register (RGB or HLS)
//! - `!Pn<byte>` — repeat a sixel byte `Pn` times
//! - `$` — graphics carriage return
//! - `-` — graphics newline (down 6 pixels)
//! - `?`..`~` — sixel data; `code - 63` is a 6-bit column mask, bit 0 on top
//!
//! The parser never fails: unknown or out-of-place code points are dropped
//! and decoding continues, so a damaged stream still yields an image.

use lumen_graphics::{PixelSize, RgbColor};

/// Sink for the semantic events of a SIXEL stream.
pub trait SixelEvents {
    /// Define a new color at the given register index.
    fn set_color(&mut self, index: u32, color: RgbColor);

    /// Use the given register for future paints.
    fn use_color(&mut self, index: u32);

    /// Move the sixel cursor to the left border.
    fn rewind(&mut self);

    /// Move the sixel cursor to the left border of the next sixel band.
    fn newline(&mut self);

    /// Establish the aspect ratio (`pan / pad`) and the pixel dimensions of
    /// the upcoming image data.
    fn set_raster(&mut self, pan: u32, pad: u32, size: PixelSize);

    /// Render one sixel (a 6-bit column mask) at the cursor position.
    fn render(&mut self, sixel: u8);
}

/// Parser state. Command introducers move between states; leaving a
/// parameter-accepting state fires that state's action.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
enum State {
    /// Sixel data and command introducers.
    #[default]
    Ground,
    /// After `!`: a repeat count, then the sixel byte to repeat.
    RepeatIntroducer,
    /// After `#`: awaiting the first digit of a register index.
    ColorIntroducer,
    /// Inside color selection or definition parameters.
    ColorParam,
    /// After `"`: the four raster attribute parameters.
    RasterSettings,
}

/// Streaming SIXEL state machine.
///
/// Feed code points with [`parse`](Self::parse) (or a whole fragment with
/// [`parse_fragment`](Self::parse_fragment)) and call
/// [`finish`](Self::finish) at ST so a pending color selection or raster
/// setting still takes effect.
pub struct SixelParser {
    state: State,
    params: Vec<u32>,
    finalizer: Option<Box<dyn FnMut()>>,
}

impl std::fmt::Debug for SixelParser {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SixelParser")
            .field("state", &self.state)
            .field("params", &self.params)
            .field("finalizer", &self.finalizer.is_some())
            .finish()
    }
}

impl Default for SixelParser {
    fn default() -> Self {
        Self::new()
    }
}

impl SixelParser {
    pub fn new() -> Self {
        Self {
            state: State::Ground,
            params: Vec::new(),
            finalizer: None,
        }
    }

    /// A parser whose [`finish`](Self::finish) additionally runs the given
    /// closure, e.g. to hand the finished build to an image pool.
    pub fn with_finalizer(finalizer: impl FnMut() + 'static) -> Self {
        Self {
            finalizer: Some(Box::new(finalizer)),
            ..Self::new()
        }
    }

    /// Decode a complete stream in one call, including finalization.
    pub fn decode<E: SixelEvents>(input: &str, events: &mut E) {
        let mut parser = Self::new();
        parser.parse_fragment(input, events);
        parser.finish(events);
    }

    /// Feed every code point of `input`.
    pub fn parse_fragment<E: SixelEvents>(&mut self, input: &str, events: &mut E) {
        for ch in input.chars() {
            self.parse(ch, events);
        }
    }

    /// Feed a single code point.
    pub fn parse<E: SixelEvents>(&mut self, ch: char, events: &mut E) {
        match self.state {
            State::Ground => self.fallback(ch, events),

            // '!' NUMBER BYTE
            State::RepeatIntroducer => {
                if let Some(digit) = to_digit(ch) {
                    self.param_shift_and_add_digit(digit);
                } else if let Some(sixel) = to_sixel(ch) {
                    for _ in 0..self.params[0] {
                        events.render(sixel);
                    }
                    self.transition_to(State::Ground, events);
                } else {
                    self.fallback(ch, events);
                }
            }

            State::ColorIntroducer => {
                if let Some(digit) = to_digit(ch) {
                    self.param_shift_and_add_digit(digit);
                    self.transition_to(State::ColorParam, events);
                } else {
                    self.fallback(ch, events);
                }
            }

            State::ColorParam => {
                if let Some(digit) = to_digit(ch) {
                    self.param_shift_and_add_digit(digit);
                } else if ch == ';' {
                    self.params.push(0);
                } else {
                    self.fallback(ch, events);
                }
            }

            State::RasterSettings => {
                if let Some(digit) = to_digit(ch) {
                    self.param_shift_and_add_digit(digit);
                } else if ch == ';' {
                    self.params.push(0);
                } else {
                    self.fallback(ch, events);
                }
            }
        }
    }

    /// Finalize the stream: fire any pending leave action and run the
    /// finalizer.
    pub fn finish<E: SixelEvents>(&mut self, events: &mut E) {
        self.transition_to(State::Ground, events);

        if let Some(finalizer) = self.finalizer.as_mut() {
            finalizer();
        }
    }

    /// Handle a code point that the current state has no rule for: command
    /// introducers switch state (firing the current state's leave action),
    /// sixel bytes render, everything else is dropped.
    fn fallback<E: SixelEvents>(&mut self, ch: char, events: &mut E) {
        match ch {
            '#' => self.transition_to(State::ColorIntroducer, events),
            '!' => self.transition_to(State::RepeatIntroducer, events),
            '"' => self.transition_to(State::RasterSettings, events),
            '$' => {
                self.transition_to(State::Ground, events);
                events.rewind();
            }
            '-' => {
                self.transition_to(State::Ground, events);
                events.newline();
            }
            _ => {
                if self.state != State::Ground {
                    self.transition_to(State::Ground, events);
                }
                if let Some(sixel) = to_sixel(ch) {
                    events.render(sixel);
                }
            }
        }
    }

    fn param_shift_and_add_digit(&mut self, digit: u32) {
        let number = self.params.last_mut().expect("params seeded on state entry");
        *number = number.saturating_mul(10).saturating_add(digit);
    }

    fn transition_to<E: SixelEvents>(&mut self, new_state: State, events: &mut E) {
        self.leave_state(events);
        self.state = new_state;
        self.enter_state();
    }

    fn enter_state(&mut self) {
        match self.state {
            State::ColorIntroducer | State::RepeatIntroducer | State::RasterSettings => {
                self.params.clear();
                self.params.push(0);
            }
            State::Ground | State::ColorParam => {}
        }
    }

    fn leave_state<E: SixelEvents>(&mut self, events: &mut E) {
        match self.state {
            State::Ground | State::ColorIntroducer | State::RepeatIntroducer => {}

            // " Pan ; Pad ; Ph ; Pv
            State::RasterSettings => {
                if self.params.len() == 4 {
                    let pan = self.params[0];
                    let pad = self.params[1];
                    let size = PixelSize::new(self.params[2], self.params[3]);
                    events.set_raster(pan, pad, size);
                    self.state = State::Ground;
                }
            }

            // # Pc               — select a register
            // # Pc ; Pu ; Px ; Py ; Pz — define a register's color
            State::ColorParam => {
                if self.params.len() == 1 {
                    events.use_color(self.params[0]);
                } else if self.params.len() == 5 {
                    let index = self.params[0];
                    // Pu = 2 is RGB with components on a 0..100 scale.
                    // Pu = 1 is HLS; dropped rather than misread as RGB.
                    if self.params[1] == 2 {
                        let color = RgbColor::new(
                            scale_color_component(self.params[2]),
                            scale_color_component(self.params[3]),
                            scale_color_component(self.params[4]),
                        );
                        events.set_color(index, color);
                    } else {
                        log::debug!(
                            "dropping color definition for register {index}: colorspace {} not supported",
                            self.params[1]
                        );
                    }
                }
            }
        }
    }
}

fn to_digit(ch: char) -> Option<u32> {
    ch.to_digit(10)
}

/// Sixel data bytes are `?` (63) through `~` (126); the sixel value is the
/// code point minus 63.
fn to_sixel(ch: char) -> Option<u8> {
    let code = ch as u32;
    if (63..=126).contains(&code) {
        Some((code - 63) as u8)
    } else {
        None
    }
}

/// Convert a color component from the 0..100 protocol scale to 0..255.
fn scale_color_component(value: u32) -> u8 {
    ((u64::from(value) * 255 / 100) % 256) as u8
}
