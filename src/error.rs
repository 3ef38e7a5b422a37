// Copyright (C) 2025-2026 Michael Herstine <sp1ff@pobox.com>
//
// This file is part of gelf-udp.
//
// gelf-udp is free software: you can redistribute it and/or modify it under the terms of the GNU
// General Public License as published by the Free Software Foundation, either version 3 of the
// License, or (at your option) any later version.
//
// gelf-udp is distributed in the hope that it will be useful, but WITHOUT ANY WARRANTY; without
// even the implied warranty of MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the GNU
// General Public License for more details.
//
// You should have received a copy of the GNU General Public License along with gelf-udp.  If not,
// see <http://www.gnu.org/licenses/>.

//! [gelf-udp](crate) errors

use backtrace::Backtrace;

/// [gelf-udp](crate) error type
///
/// [gelf-udp](crate) eschews libraries like [thiserror], [anyhow] & [Snafu] in favor of a
/// straightforward enumeration with a few match arms chosen on the basis of what the caller will
/// need to respond. Note that the crate's reliability contract means most callers will never see
/// one of these: the [`Client`] swallows every error after reporting it on the error channel.
///
/// [thiserror]: https://docs.rs/thiserror
/// [anyhow]: https://docs.rs/anyhow
/// [Snafu]: https://docs.rs/snafu/latest/snafu
/// [`Client`]: crate::client::Client
#[non_exhaustive]
pub enum Error {
    /// The configured server address did not resolve to a socket address
    BadAddress {
        addr: String,
        source: Box<dyn std::error::Error + Send + Sync + 'static>,
        back: Backtrace,
    },
    /// Failed to encode a normalized document as JSON
    Encode {
        source: serde_json::Error,
        back: Backtrace,
    },
    /// A serialized document would need more chunks than the single-byte sequence-count field
    /// can express
    TooManyChunks { needed: usize, back: Backtrace },
    /// General transport layer error
    Transport {
        source: std::io::Error,
        back: Backtrace,
    },
}

impl std::fmt::Display for Error {
    // `Error` is non-exhaustive so that adding variants won't be a breaking change to our
    // callers. That means the compiler won't catch us if we miss a variant here, so we
    // always include a `_` arm.
    #[allow(unreachable_patterns)]
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Error::BadAddress { addr, source, .. } => {
                write!(f, "While resolving {}, got {}", addr, source)
            }
            Error::Encode { source, .. } => {
                write!(f, "While encoding a GELF document, got {}", source)
            }
            Error::TooManyChunks { needed, .. } => write!(
                f,
                "Document requires {} chunks; the GELF sequence-count octet tops out at {}",
                needed,
                crate::transport::MAX_CHUNKS
            ),
            Error::Transport { source, .. } => write!(f, "Transport error: {}", source),
            _ => write!(f, "Other gelf-udp error"),
        }
    }
}

impl std::fmt::Debug for Error {
    #[allow(unreachable_patterns)]
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Error::BadAddress { back, .. } => write!(f, "{}\n{:?}", self, back),
            Error::Encode { back, .. } => write!(f, "{}\n{:?}", self, back),
            Error::TooManyChunks { back, .. } => write!(f, "{}\n{:?}", self, back),
            Error::Transport { back, .. } => write!(f, "{}\n{:?}", self, back),
            err => write!(f, "gelf-udp error: {}", err),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::BadAddress { source, .. } => Some(source.as_ref()),
            Error::Encode { source, .. } => Some(source),
            Error::Transport { source, .. } => Some(source),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
