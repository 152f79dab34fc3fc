use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Resume point for keyset pagination: the id of the last row a client has seen.
///
/// Serialized as the bare integer so clients echo `nextCursor` back verbatim. A cursor
/// is only meaningful for the sort order it was issued under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Cursor(i64);

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CursorError {
    #[error("Cursor must be an integer")]
    NotAnInteger,
}

impl Cursor {
    pub fn new(id: i64) -> Self {
        Self(id)
    }

    pub fn id(&self) -> i64 {
        self.0
    }
}

impl FromStr for Cursor {
    type Err = CursorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse::<i64>().map(Cursor).map_err(|_| CursorError::NotAnInteger)
    }
}

impl fmt::Display for Cursor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for Cursor {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_integer_cursor() {
        assert_eq!(" 42 ".parse::<Cursor>(), Ok(Cursor::new(42)));
        assert_eq!("abc".parse::<Cursor>(), Err(CursorError::NotAnInteger));
        assert_eq!("1.5".parse::<Cursor>(), Err(CursorError::NotAnInteger));
    }

    #[test]
    fn serializes_as_bare_integer() {
        assert_eq!(serde_json::to_string(&Cursor::new(7)).unwrap(), "7");
        assert_eq!(serde_json::from_str::<Cursor>("7").unwrap(), Cursor::new(7));
        assert_eq!(Cursor::new(7).to_string(), "7");
    }
}
