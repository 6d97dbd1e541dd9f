//! PIN candidates and keypad encoding.
//!
//! A candidate is an integer in `0..SPACE_SIZE` that is always typed as
//! exactly four decimal digits, leading zeros included (`7` -> `"0007"`).

use std::fmt;

use serde::{Deserialize, Serialize};

/// Number of digits in a PIN.
pub const PIN_LENGTH: usize = 4;

/// Size of the candidate space (`0000` through `9999`).
pub const SPACE_SIZE: u32 = 10_000;

/// Android `KEYCODE_0`; digits are contiguous from here.
pub const KEYCODE_DIGIT_BASE: u8 = 7;

/// Android `KEYCODE_ENTER`, used to confirm a PIN.
pub const KEYCODE_CONFIRM: u8 = 66;

/// Android `KEYCODE_DEL`, used to clear a partially typed PIN.
pub const KEYCODE_DELETE: u8 = 67;

/// One 4-digit PIN under test.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct Candidate(u16);

impl Candidate {
    /// Create a candidate, or None if `value` is outside the PIN space.
    pub fn new(value: u32) -> Option<Self> {
        (value < SPACE_SIZE).then_some(Self(value as u16))
    }

    pub fn value(self) -> u32 {
        u32::from(self.0)
    }

    /// Zero-padded 4-character rendering.
    pub fn render(self) -> String {
        format!("{:0width$}", self.0, width = PIN_LENGTH)
    }

    /// Keycodes for each digit, most significant first.
    pub fn keycodes(self) -> [u8; PIN_LENGTH] {
        let mut codes = [0u8; PIN_LENGTH];
        let mut rest = self.0;
        for slot in codes.iter_mut().rev() {
            *slot = digit_keycode((rest % 10) as u8);
            rest /= 10;
        }
        codes
    }

    /// Iterate candidates in ascending order, stopping at `total` or the end of the space.
    pub fn ascending(total: u32) -> impl Iterator<Item = Candidate> {
        (0..total.min(SPACE_SIZE)).map(|v| Candidate(v as u16))
    }
}

impl fmt::Display for Candidate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:0width$}", self.0, width = PIN_LENGTH)
    }
}

impl From<Candidate> for String {
    fn from(c: Candidate) -> Self {
        c.render()
    }
}

impl TryFrom<String> for Candidate {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl std::str::FromStr for Candidate {
    type Err = String;

    /// Parse a 4-digit string such as `"0042"`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.len() != PIN_LENGTH || !s.bytes().all(|b| b.is_ascii_digit()) {
            return Err(format!("'{}' is not a {}-digit PIN", s, PIN_LENGTH));
        }
        s.parse::<u32>()
            .ok()
            .and_then(Candidate::new)
            .ok_or_else(|| format!("'{}' is out of range", s))
    }
}

/// Keycode for a single decimal digit.
pub fn digit_keycode(digit: u8) -> u8 {
    debug_assert!(digit < 10);
    digit + KEYCODE_DIGIT_BASE
}
