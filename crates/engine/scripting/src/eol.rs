//! Line-ending normalization
//!
//! Editor buffers arrive in whatever convention the document was saved with.
//! Lua accepts any of them, but tracebacks and long strings are only reliable
//! with a single `\n` terminator, so every buffer is rewritten to LF before it
//! is evaluated.

use std::fmt;
use std::str::FromStr;

const CR: u8 = b'\r';
const LF: u8 = b'\n';

/// Line-termination convention of a document buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EolMode {
    /// `\n`
    #[default]
    Lf,
    /// `\r`
    Cr,
    /// `\r\n`
    CrLf,
}

impl EolMode {
    /// Guess the convention from buffer contents.
    ///
    /// The first CRLF pair wins; otherwise any lone CR means CR, else LF.
    pub fn detect(buffer: &[u8]) -> Self {
        if buffer.windows(2).any(|pair| pair == [CR, LF]) {
            EolMode::CrLf
        } else if buffer.contains(&CR) {
            EolMode::Cr
        } else {
            EolMode::Lf
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            EolMode::Lf => "lf",
            EolMode::Cr => "cr",
            EolMode::CrLf => "crlf",
        }
    }
}

impl fmt::Display for EolMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EolMode {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "lf" => Ok(EolMode::Lf),
            "cr" => Ok(EolMode::Cr),
            "crlf" => Ok(EolMode::CrLf),
            other => Err(format!("unknown EOL mode `{other}` (expected lf, cr or crlf)")),
        }
    }
}

/// Rewrite `buffer` into LF-terminated text.
///
/// - `CrLf`: every CR byte is removed, including a CR that is not followed by LF.
/// - `Cr`: every CR becomes LF.
/// - `Lf`: returned unchanged.
pub fn normalize(buffer: &[u8], mode: EolMode) -> Vec<u8> {
    match mode {
        EolMode::Lf => buffer.to_vec(),
        EolMode::Cr => buffer
            .iter()
            .map(|&b| if b == CR { LF } else { b })
            .collect(),
        EolMode::CrLf => buffer.iter().copied().filter(|&b| b != CR).collect(),
    }
}
