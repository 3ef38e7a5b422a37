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

//! The GELF transport layer.
//!
//! This module defines the [`Transport`] trait all implementations must support, as well as the
//! chunking UDP implementation. A serialized document that fits in one datagram goes out as
//! exactly its own bytes; a larger one is split into the GELF chunked-datagram format: each
//! chunk is a 12-byte header (two magic bytes, an 8-byte random message id shared by every chunk
//! of the document, a sequence number & a sequence count) followed by its slice of the payload.
//! The receiving server reassembles by message id & sequence number; arrival order is its
//! problem, not ours.
//!
//! Delivery is fire-and-forget. Every datagram is sent on its own ephemeral socket, scoped to
//! the one send; there is no pooling, no retry, no acknowledgement & no delivery guarantee. That
//! is the protocol working as intended.
//!
//! # Examples
//!
//! To ship documents to a Graylog daemon listening on the default port on localhost:
//!
//! ```rust
//! use gelf_udp::transport::UdpTransport;
//! let transpo = UdpTransport::local().unwrap();
//! ```
//!
//! On a non-standard port on another host:
//!
//! ```rust
//! use gelf_udp::transport::UdpTransport;
//! let transpo = UdpTransport::new("some-host.domain.io:5514");
//! assert!(transpo.is_err()); // no such host, after all
//! ```

use crate::error::{Error, Result};

use backtrace::Backtrace;
use bytes::BufMut;
use rand::RngCore;

use std::net::{SocketAddr, ToSocketAddrs, UdpSocket};

/// Every chunk datagram opens with these two bytes.
pub const CHUNK_MAGIC: [u8; 2] = [0x1e, 0x0f];

/// Magic + message id + sequence number + sequence count.
pub const CHUNK_HEADER_LEN: usize = 12;

/// The sequence count is a single octet, so a document can span at most 128 chunks.
pub const MAX_CHUNKS: usize = 128;

/// Default per-datagram payload threshold, in bytes. A design parameter, not derived: small
/// enough to clear the conservative MTU assumptions of the usual receivers.
pub const DEFAULT_MAX_PAYLOAD: usize = 1100;

/// Operations all transport layers must support.
pub trait Transport {
    /// Hand one serialized document to the network layer.
    ///
    /// A successful return means the bytes were accepted by the local stack, nothing more; UDP
    /// has no notion of delivery to report.
    fn send(&self, buf: &[u8]) -> Result<()>;
}

/// Split `payload` into the datagrams that will carry it: either the payload itself, verbatim,
/// or a sequence of chunk datagrams sharing `message_id`.
///
/// Pure function; the slices cover `payload` in order with no gaps or overlap, and
/// concatenating them (header dropped) reconstructs it exactly.
pub fn datagrams(payload: &[u8], message_id: [u8; 8], max_payload: usize) -> Result<Vec<Vec<u8>>> {
    if payload.len() <= max_payload {
        return Ok(vec![payload.to_vec()]);
    }

    let count = payload.len().div_ceil(max_payload);
    // An explicit guard, rather than letting the count wrap in the single-byte field and
    // corrupting the sequence on the wire.
    if count > MAX_CHUNKS {
        return Err(Error::TooManyChunks {
            needed: count,
            back: Backtrace::new(),
        });
    }

    let mut chunks = Vec::with_capacity(count);
    for (i, slice) in payload.chunks(max_payload).enumerate() {
        let mut chunk = Vec::with_capacity(CHUNK_HEADER_LEN + slice.len());
        chunk.put_slice(&CHUNK_MAGIC);
        chunk.put_slice(&message_id);
        chunk.put_u8(i as u8);
        chunk.put_u8(count as u8);
        chunk.put_slice(slice);
        chunks.push(chunk);
    }
    Ok(chunks)
}

/// Sending GELF documents via UDP datagrams, chunking as needed.
#[derive(Clone, Debug)]
pub struct UdpTransport {
    target: SocketAddr,
    max_payload: usize,
}

impl UdpTransport {
    /// Construct a [`Transport`] implementation via UDP at `addr`. The address is resolved
    /// here, once; construction is the only fallible step on the happy path.
    pub fn new<A: ToSocketAddrs + std::fmt::Debug>(addr: A) -> Result<UdpTransport> {
        let target = addr
            .to_socket_addrs()
            .map_err(|err| Error::BadAddress {
                addr: format!("{:?}", addr),
                source: Box::new(err),
                back: Backtrace::new(),
            })?
            .next()
            .ok_or_else(|| Error::BadAddress {
                addr: format!("{:?}", addr),
                source: "no addresses resolved".into(),
                back: Backtrace::new(),
            })?;
        Ok(UdpTransport {
            target,
            max_payload: DEFAULT_MAX_PAYLOAD,
        })
    }

    /// Construct a [`Transport`] implementation via UDP at localhost:12201.
    pub fn local() -> Result<UdpTransport> {
        UdpTransport::new("localhost:12201")
    }

    /// Override the per-datagram payload threshold.
    pub fn with_max_payload(mut self, max_payload: usize) -> UdpTransport {
        self.max_payload = max_payload;
        self
    }

    pub fn max_payload(&self) -> usize {
        self.max_payload
    }

    // One datagram, one socket: open, send, close. Socket lifetime is scoped to this single
    // send, so calls share no mutable state.
    fn send_datagram(&self, buf: &[u8]) -> Result<()> {
        let socket = UdpSocket::bind("0.0.0.0:0").map_err(|err| Error::Transport {
            source: err,
            back: Backtrace::new(),
        })?;
        socket
            .send_to(buf, self.target)
            .map_err(|err| Error::Transport {
                source: err,
                back: Backtrace::new(),
            })?;
        Ok(())
    }
}

impl Transport for UdpTransport {
    fn send(&self, buf: &[u8]) -> Result<()> {
        let mut message_id = [0u8; 8];
        rand::rng().fill_bytes(&mut message_id);
        for datagram in datagrams(buf, message_id, self.max_payload)? {
            // Dispatched in sequence order, but independently; nothing waits on delivery.
            self.send_datagram(&datagram)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::time::Duration;

    #[test]
    fn small_payload_is_one_verbatim_datagram() {
        let payload = br#"{"version":"1.1","message":"hi"}"#;
        let grams = datagrams(payload, [7; 8], DEFAULT_MAX_PAYLOAD).unwrap();
        assert_eq!(grams.len(), 1);
        assert_eq!(grams[0], payload.to_vec());

        // Exactly at the threshold still fits in one datagram.
        let payload = vec![b'x'; 1100];
        let grams = datagrams(&payload, [7; 8], 1100).unwrap();
        assert_eq!(grams.len(), 1);
        assert_eq!(grams[0], payload);
    }

    #[test]
    fn oversized_payload_chunks_reassemble_exactly() {
        let payload: Vec<u8> = (0..2500u32).map(|i| (i % 251) as u8).collect();
        let id = [1, 2, 3, 4, 5, 6, 7, 8];
        let grams = datagrams(&payload, id, 1100).unwrap();

        // ceil(2500 / 1100) == 3
        assert_eq!(grams.len(), 3);
        let mut reassembled = Vec::new();
        for (i, gram) in grams.iter().enumerate() {
            assert!(gram.len() <= 1100 + CHUNK_HEADER_LEN);
            assert_eq!(&gram[0..2], &CHUNK_MAGIC);
            assert_eq!(&gram[2..10], &id);
            assert_eq!(gram[10], i as u8);
            assert_eq!(gram[11], 3);
            reassembled.extend_from_slice(&gram[CHUNK_HEADER_LEN..]);
        }
        assert_eq!(reassembled, payload);
    }

    #[test]
    fn boundary_chunk_counts() {
        // 128 chunks is fine...
        let payload = vec![0u8; 128 * 100];
        let grams = datagrams(&payload, [0; 8], 100).unwrap();
        assert_eq!(grams.len(), 128);
        assert_eq!(grams[127][11], 128);

        // ...129 is refused outright: zero datagrams, no wrapped count byte on the wire.
        let payload = vec![0u8; 128 * 100 + 1];
        match datagrams(&payload, [0; 8], 100) {
            Err(Error::TooManyChunks { needed, .. }) => assert_eq!(needed, 129),
            other => panic!("expected TooManyChunks, got {:?}", other.map(|v| v.len())),
        }
    }

    #[test]
    fn sends_over_loopback() {
        let receiver = UdpSocket::bind("127.0.0.1:0").unwrap();
        receiver
            .set_read_timeout(Some(Duration::from_secs(5)))
            .unwrap();
        let transpo = UdpTransport::new(receiver.local_addr().unwrap())
            .unwrap()
            .with_max_payload(16);

        // Unchunked...
        transpo.send(b"short payload").unwrap();
        let mut buf = [0u8; 64];
        let n = receiver.recv(&mut buf).unwrap();
        assert_eq!(&buf[..n], b"short payload");

        // ...and chunked: 40 bytes over a 16-byte threshold is three chunks.
        let payload: Vec<u8> = (0..40u8).collect();
        transpo.send(&payload).unwrap();
        let mut reassembled = vec![Vec::new(); 3];
        let mut id = None;
        for _ in 0..3 {
            let mut buf = [0u8; 64];
            let n = receiver.recv(&mut buf).unwrap();
            let gram = &buf[..n];
            assert_eq!(&gram[0..2], &CHUNK_MAGIC);
            match id {
                None => id = Some(gram[2..10].to_vec()),
                Some(ref id) => assert_eq!(&gram[2..10], &id[..]),
            }
            assert_eq!(gram[11], 3);
            reassembled[gram[10] as usize] = gram[CHUNK_HEADER_LEN..].to_vec();
        }
        assert_eq!(reassembled.concat(), payload);
    }
}
