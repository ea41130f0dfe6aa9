//! 4×4 keypad edge tracker.
//!
//! ## Layout
//!
//! ```text
//!  ┌───┬───┬───┬───┐
//!  │ 1 │ 2 │ 3 │ h │   h = humidity control start/stop
//!  ├───┼───┼───┼───┤
//!  │ 4 │ 5 │ 6 │ f │   f = fan control start/stop
//!  ├───┼───┼───┼───┤
//!  │ 7 │ 8 │ 9 │ s │   s = settings / confirm
//!  ├───┼───┼───┼───┤
//!  │ . │ 0 │ d │ x │   d = delete, x = unused
//!  └───┴───┴───┴───┘
//! ```
//!
//! Matrix scanning and debouncing happen below this layer.  The tracker
//! receives the currently pressed key (or none) once per loop and turns
//! it into edges:
//!
//! | Edge       | Condition                                  |
//! |------------|--------------------------------------------|
//! | `Pressed`  | a key goes down                            |
//! | `Held`     | still down after the hold delay (once)     |
//! | `Released` | the key goes up, or another key replaces it|

/// Characters printed on the keypad, row-major.
pub const KEYMAP: [[char; 4]; 4] = [
    ['1', '2', '3', 'h'],
    ['4', '5', '6', 'f'],
    ['7', '8', '9', 's'],
    ['.', '0', 'd', 'x'],
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Digit(u8),
    Decimal,
    Delete,
    Settings,
    HumidityToggle,
    FanToggle,
    Unused,
}

impl Key {
    pub fn from_char(c: char) -> Option<Self> {
        match c {
            '0'..='9' => Some(Self::Digit(c as u8 - b'0')),
            '.' => Some(Self::Decimal),
            'd' => Some(Self::Delete),
            's' => Some(Self::Settings),
            'h' => Some(Self::HumidityToggle),
            'f' => Some(Self::FanToggle),
            'x' => Some(Self::Unused),
            _ => None,
        }
    }

    pub fn to_char(self) -> char {
        match self {
            Self::Digit(d) => char::from(b'0' + d.min(9)),
            Self::Decimal => '.',
            Self::Delete => 'd',
            Self::Settings => 's',
            Self::HumidityToggle => 'h',
            Self::FanToggle => 'f',
            Self::Unused => 'x',
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyEdge {
    Pressed,
    Held,
    Released,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyEvent {
    pub key: Key,
    pub edge: KeyEdge,
}

impl KeyEvent {
    pub const fn new(key: Key, edge: KeyEdge) -> Self {
        Self { key, edge }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TrackState {
    Idle,
    Down { key: Key, since_ms: u32, held: bool },
}

/// At most one release and one press per update.
pub type KeyEvents = heapless::Vec<KeyEvent, 2>;

pub struct KeypadTracker {
    hold_delay_ms: u32,
    state: TrackState,
}

impl KeypadTracker {
    pub fn new(hold_delay_ms: u16) -> Self {
        Self {
            hold_delay_ms: u32::from(hold_delay_ms),
            state: TrackState::Idle,
        }
    }

    /// Feed the key currently down (after debouncing).
    pub fn update(&mut self, now_ms: u32, pressed: Option<Key>) -> KeyEvents {
        let mut events = KeyEvents::new();

        match (self.state, pressed) {
            (TrackState::Idle, None) => {}

            (TrackState::Idle, Some(key)) => {
                self.press(key, now_ms, &mut events);
            }

            (TrackState::Down { key, since_ms, held }, Some(now_key)) if now_key == key => {
                if !held && now_ms.wrapping_sub(since_ms) >= self.hold_delay_ms {
                    self.state = TrackState::Down {
                        key,
                        since_ms,
                        held: true,
                    };
                    events.push(KeyEvent::new(key, KeyEdge::Held)).ok();
                }
            }

            (TrackState::Down { key, .. }, Some(other)) => {
                events.push(KeyEvent::new(key, KeyEdge::Released)).ok();
                self.press(other, now_ms, &mut events);
            }

            (TrackState::Down { key, .. }, None) => {
                self.state = TrackState::Idle;
                events.push(KeyEvent::new(key, KeyEdge::Released)).ok();
            }
        }

        events
    }

    fn press(&mut self, key: Key, now_ms: u32, events: &mut KeyEvents) {
        self.state = TrackState::Down {
            key,
            since_ms: now_ms,
            held: false,
        };
        events.push(KeyEvent::new(key, KeyEdge::Pressed)).ok();
    }
}
