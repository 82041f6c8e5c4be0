use std::time::Duration;

use crashdump_core::platform::{Buttons, Input};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind};
use tracing::{debug, warn};

/// Maps a key press onto the handheld's buttons.
pub fn map_key(key: &KeyEvent) -> Buttons {
    if key.kind != KeyEventKind::Press {
        return Buttons::NONE;
    }
    match key.code {
        KeyCode::Char('p' | 'P') | KeyCode::Esc => Buttons::POWER,
        KeyCode::Char('h' | 'H') | KeyCode::Home => Buttons::HOME,
        KeyCode::Char('a' | 'A') | KeyCode::Enter => Buttons::A,
        _ => Buttons::NONE,
    }
}

/// Keyboard input: `p`/Esc is POWER, `h` HOME, `a`/Enter A.
pub struct KeyboardInput;

impl KeyboardInput {
    fn read_key() -> std::io::Result<Buttons> {
        match event::read()? {
            Event::Key(key) => Ok(map_key(&key)),
            _ => Ok(Buttons::NONE),
        }
    }
}

impl Input for KeyboardInput {
    fn poll(&mut self, timeout: Option<Duration>) -> Buttons {
        let result = match timeout {
            Some(timeout) => match event::poll(timeout) {
                Ok(true) => Self::read_key(),
                Ok(false) => Ok(Buttons::NONE),
                Err(err) => Err(err),
            },
            None => loop {
                match Self::read_key() {
                    Ok(Buttons::NONE) => {}
                    other => break other,
                }
            },
        };
        // A lost terminal cannot deliver the power button any more.
        result.unwrap_or_else(|err| {
            warn!("keyboard input failed: {err}");
            Buttons::POWER
        })
    }
}

/// Input for unattended runs: nothing is pressed during timed waits and the
/// final prompt is answered with POWER at once.
#[derive(Default)]
pub struct HeadlessInput {
    polls: usize,
}

impl HeadlessInput {
    pub fn polls(&self) -> usize {
        self.polls
    }
}

impl Input for HeadlessInput {
    fn poll(&mut self, timeout: Option<Duration>) -> Buttons {
        self.polls += 1;
        debug!(?timeout, "headless poll");
        match timeout {
            Some(_) => Buttons::NONE,
            None => Buttons::POWER,
        }
    }
}
