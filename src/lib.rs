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

//! A client for shipping application log values to a [GELF] server (such as [Graylog]) over
//! UDP, transparently splitting oversized documents into the GELF chunked-datagram format.
//!
//! [GELF]: https://go2docs.graylog.org/current/getting_in_log_data/gelf.html
//! [Graylog]: https://graylog.org/
//!
//! # Introduction
//!
//! GELF -- the Graylog Extended Log Format -- is a JSON-based log document schema with a
//! defined UDP chunking scheme for payloads exceeding one datagram. The delivery discipline is
//! deliberately best-effort: no acknowledgement, no retransmission, no delivery guarantee. What
//! you get in exchange is a logging call that cannot block or crash the application being
//! instrumented, which is the core reliability contract of this crate: *log calls never throw*.
//!
//! The interesting work happens in three places:
//!
//! 1. [`level`] resolves heterogeneous level requests (a code, a name in arbitrary case, a
//!    custom code/name pair, or nothing at all) against the canonical eight-entry severity
//!    table, degrading gracefully when a request matches nothing;
//!
//! 2. [`document`] deterministically normalizes an arbitrary input value -- a string, a
//!    number, a structured record, a caught error, an array -- into a single valid JSON
//!    document carrying the required GELF fields, or drops it silently when JSON cannot carry
//!    it at all;
//!
//! 3. [`transport`] serializes the document, decides single- versus multi-datagram delivery,
//!    generates chunk headers & fires the datagrams, each on its own ephemeral socket.
//!
//! The [`client`] module strings these together behind a small facade: construction-time
//! configuration (server address, node identity, default level), a `log` entry point that
//! defers the whole pipeline to a detached thread so the caller never waits on socket setup,
//! and the eight conventional severity shortcuts. [`layer`] adds a [`tracing-subscriber`]
//! `Layer` so that ordinary `tracing` events can be shipped without touching the facade
//! directly.
//!
//! [`tracing-subscriber`]: https://docs.rs/tracing-subscriber/latest/tracing_subscriber/index.html
//!
//! # Usage
//!
//! The [`Client`](client::Client) comes with sane defaults (`localhost:12201`, level INFO):
//!
//! ```no_run
//! use gelf_udp::client::Client;
//!
//! let graylog = Client::builder()
//!     .address("graylog.server.address")
//!     .host("my-web-project.com")
//!     .node("dev.log.test")
//!     .build()
//!     .unwrap();
//!
//! graylog.log("String line log");
//! graylog.log(serde_json::json!({"code": 1245, "label": "label"}));
//! graylog.log_at(gelf_udp::level::DEBUG, "noisy detail");
//! graylog.error("error conditions");
//! ```
//!
//! A caught error ships with its message, a captured backtrace and any properties you attach:
//!
//! ```no_run
//! use gelf_udp::{client::Client, input::CaughtError};
//!
//! let graylog = Client::builder().build().unwrap();
//! match std::fs::read("/i/am/not/there") {
//!     Ok(_) => (),
//!     Err(err) => graylog.error(CaughtError::new(&err).with_property("path", "/i/am/not/there")),
//! }
//! ```
//!
//! Or hook the whole thing up to `tracing`:
//!
//! ```no_run
//! use gelf_udp::{client::Client, layer::GelfLayer};
//! use tracing_subscriber::layer::SubscriberExt; // Needed to get `with()`
//! use tracing_subscriber::registry::Registry;
//!
//! let client = Client::builder().address("graylog.internal").build().unwrap();
//! let subscriber = Registry::default().with(GelfLayer::new(client));
//! let _guard = tracing::subscriber::set_default(subscriber);
//!
//! tracing::info!(code = 1245, "Hello, world!");
//! ```

pub mod client;
pub mod document;
pub mod error;
pub mod input;
pub mod layer;
pub mod level;
pub mod transport;
