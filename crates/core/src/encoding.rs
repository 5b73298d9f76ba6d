// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Text encodings for log sinks

use serde::{Deserialize, Serialize};
use std::fmt;
use std::io;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EncodingError {
    #[error("unknown encoding: {0}")]
    UnknownEncoding(String),
    #[error("unknown encoding error policy: {0}")]
    UnknownPolicy(String),
}

/// Byte encoding used when writing log lines
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Encoding {
    #[default]
    #[serde(rename = "utf-8", alias = "utf8", alias = "UTF-8")]
    Utf8,
    #[serde(rename = "ascii", alias = "us-ascii")]
    Ascii,
    #[serde(rename = "latin-1", alias = "latin1", alias = "iso-8859-1")]
    Latin1,
}

/// What to do with characters the encoding cannot represent
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EncodeErrors {
    /// Fail the write
    #[default]
    Strict,
    /// Substitute `?`
    Replace,
    /// Drop the character
    Ignore,
}

impl Encoding {
    /// Highest code point representable in a single byte, `None` for UTF-8
    fn max_code_point(self) -> Option<u32> {
        match self {
            Encoding::Utf8 => None,
            Encoding::Ascii => Some(0x7f),
            Encoding::Latin1 => Some(0xff),
        }
    }

    /// Encode `text`, applying `errors` to unrepresentable characters
    pub fn encode(self, text: &str, errors: EncodeErrors) -> io::Result<Vec<u8>> {
        let Some(max) = self.max_code_point() else {
            return Ok(text.as_bytes().to_vec());
        };

        let mut out = Vec::with_capacity(text.len());
        for (index, ch) in text.char_indices() {
            let code = u32::from(ch);
            match u8::try_from(code) {
                Ok(byte) if code <= max => out.push(byte),
                _ => match errors {
                    EncodeErrors::Strict => {
                        return Err(io::Error::new(
                            io::ErrorKind::InvalidData,
                            format!("{self} can't encode character {ch:?} at position {index}"),
                        ))
                    }
                    EncodeErrors::Replace => out.push(b'?'),
                    EncodeErrors::Ignore => {}
                },
            }
        }
        Ok(out)
    }
}

impl fmt::Display for Encoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Encoding::Utf8 => "utf-8",
            Encoding::Ascii => "ascii",
            Encoding::Latin1 => "latin-1",
        };
        f.write_str(name)
    }
}

impl FromStr for Encoding {
    type Err = EncodingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().replace('_', "-").as_str() {
            "utf-8" | "utf8" => Ok(Encoding::Utf8),
            "ascii" | "us-ascii" => Ok(Encoding::Ascii),
            "latin-1" | "latin1" | "iso-8859-1" => Ok(Encoding::Latin1),
            _ => Err(EncodingError::UnknownEncoding(s.to_string())),
        }
    }
}

impl fmt::Display for EncodeErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EncodeErrors::Strict => "strict",
            EncodeErrors::Replace => "replace",
            EncodeErrors::Ignore => "ignore",
        };
        f.write_str(name)
    }
}

impl FromStr for EncodeErrors {
    type Err = EncodingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "strict" => Ok(EncodeErrors::Strict),
            "replace" => Ok(EncodeErrors::Replace),
            "ignore" => Ok(EncodeErrors::Ignore),
            _ => Err(EncodingError::UnknownPolicy(s.to_string())),
        }
    }
}

#[cfg(test)]
#[path = "encoding_tests.rs"]
mod tests;
