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

//! The GELF client facade.
//!
//! [`Client`] owns the configuration (server address, node identity, default severity) and the
//! scheduling decision, and strings the core together: resolve the level, normalize the input,
//! serialize, ship. Logging calls never block the caller by default ([`Client::log`] defers the
//! whole pipeline to a detached thread) and never fail: a dropped input is silent, and a
//! transport error is reported on the error channel via `tracing::error!` & swallowed. The call
//! has already returned, or will return, normally either way.
//!
//! # Examples
//!
//! ```no_run
//! use gelf_udp::client::Client;
//! use gelf_udp::level;
//!
//! let client = Client::builder()
//!     .address("graylog.server.address")
//!     .host("my-web-project.com")
//!     .node("dev.log.test")
//!     .build()
//!     .unwrap();
//!
//! client.log("String line log");
//! client.log_at(level::DEBUG, "a debug line");
//! client.error("error conditions");
//! ```

use crate::{
    document::{normalize, Defaults},
    error::Result,
    input::LogInput,
    level::{self, LevelSpec},
    transport::{Transport, UdpTransport, DEFAULT_MAX_PAYLOAD},
};

use backtrace::Backtrace;

/// A GELF-over-UDP log client.
///
/// Cheap to clone; clones share nothing but the immutable configuration.
#[derive(Clone, Debug)]
pub struct Client {
    transport: UdpTransport,
    defaults: Defaults,
}

/// Configuration for a [`Client`]: `localhost:12201`, node `"node"`, level INFO & no host
/// unless overridden.
pub struct ClientBuilder {
    address: String,
    port: u16,
    host: Option<String>,
    node: String,
    default_level: LevelSpec,
    max_payload: usize,
}

impl std::default::Default for ClientBuilder {
    fn default() -> Self {
        ClientBuilder {
            address: "localhost".to_string(),
            port: 12201,
            host: None,
            node: "node".to_string(),
            default_level: LevelSpec::from(level::INFO),
            max_payload: DEFAULT_MAX_PAYLOAD,
        }
    }
}

impl ClientBuilder {
    /// Graylog server address (hostname or IP).
    pub fn address<S: Into<String>>(mut self, address: S) -> Self {
        self.address = address.into();
        self
    }

    /// Graylog server port.
    pub fn port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Client hostname, shipped as the documents' `host` field.
    pub fn host<S: Into<String>>(mut self, host: S) -> Self {
        self.host = Some(host.into());
        self
    }

    /// Use the machine's own identity for `host`: the hostname when one can be retrieved, a
    /// local IP address otherwise, nothing when neither can be had.
    pub fn detected_host(mut self) -> Self {
        self.host = hostname::get()
            .ok()
            .map(|h| h.to_string_lossy().into_owned())
            .or_else(|| local_ip_address::local_ip().ok().map(|ip| ip.to_string()));
        self
    }

    /// Client node name.
    pub fn node<S: Into<String>>(mut self, node: S) -> Self {
        self.node = node.into();
        self
    }

    /// Severity applied when a logging call requests none.
    pub fn default_level<L: Into<LevelSpec>>(mut self, level: L) -> Self {
        self.default_level = level.into();
        self
    }

    /// Per-datagram payload threshold, in bytes.
    pub fn max_payload(mut self, max_payload: usize) -> Self {
        self.max_payload = max_payload;
        self
    }

    /// Resolve the server address & construct the [`Client`].
    pub fn build(self) -> Result<Client> {
        let transport = UdpTransport::new((self.address.as_str(), self.port))?
            .with_max_payload(self.max_payload);
        Ok(Client {
            transport,
            defaults: Defaults {
                node: self.node,
                host: self.host,
                default_level: self.default_level,
            },
        })
    }
}

impl Client {
    pub fn builder() -> ClientBuilder {
        ClientBuilder::default()
    }

    /// Log `input` at the configured default level, in the background.
    pub fn log<I: Into<LogInput>>(&self, input: I) {
        self.dispatch(input.into(), None, true)
    }

    /// Log `input` at `level`, in the background.
    pub fn log_at<L: Into<LevelSpec>, I: Into<LogInput>>(&self, level: L, input: I) {
        self.dispatch(input.into(), Some(level.into()), true)
    }

    /// Log `input` at the configured default level, returning only after every datagram has
    /// been handed to the network stack (not after any acknowledgement -- there is none).
    pub fn log_sync<I: Into<LogInput>>(&self, input: I) {
        self.dispatch(input.into(), None, false)
    }

    /// Log `input` at `level`, foreground.
    pub fn log_at_sync<L: Into<LevelSpec>, I: Into<LogInput>>(&self, level: L, input: I) {
        self.dispatch(input.into(), Some(level.into()), false)
    }

    /// Send an emergency log to the server.
    pub fn emergency<I: Into<LogInput>>(&self, input: I) {
        self.log_at(level::EMERGENCY, input)
    }

    /// Send an alert log to the server.
    pub fn alert<I: Into<LogInput>>(&self, input: I) {
        self.log_at(level::ALERT, input)
    }

    /// Send a critical log to the server.
    pub fn critical<I: Into<LogInput>>(&self, input: I) {
        self.log_at(level::CRITICAL, input)
    }

    /// Send an error log to the server.
    pub fn error<I: Into<LogInput>>(&self, input: I) {
        self.log_at(level::ERROR, input)
    }

    /// Send a warning log to the server.
    pub fn warning<I: Into<LogInput>>(&self, input: I) {
        self.log_at(level::WARNING, input)
    }

    /// Send a notice log to the server.
    pub fn notice<I: Into<LogInput>>(&self, input: I) {
        self.log_at(level::NOTICE, input)
    }

    /// Send an info log to the server.
    pub fn info<I: Into<LogInput>>(&self, input: I) {
        self.log_at(level::INFO, input)
    }

    /// Send a debug log to the server.
    pub fn debug<I: Into<LogInput>>(&self, input: I) {
        self.log_at(level::DEBUG, input)
    }

    // Background dispatch hands the whole pipeline (normalization included) to a detached
    // thread, so the logging call returns before any DNS-free socket work begins. Deferred
    // tasks from different calls carry no ordering guarantee; each document is self-describing
    // on the wire.
    fn dispatch(&self, input: LogInput, requested: Option<LevelSpec>, background: bool) {
        if background {
            let worker = self.clone();
            std::thread::spawn(move || worker.run(input, requested));
        } else {
            self.run(input, requested);
        }
    }

    // The synchronous pipeline. Never panics, never returns an error: a rejected input is
    // dropped silently, a transport failure is reported & swallowed.
    fn run(&self, input: LogInput, requested: Option<LevelSpec>) {
        let doc = match normalize(input, requested, &self.defaults) {
            Some(doc) => doc,
            None => return,
        };
        let buf = match serde_json::to_vec(&doc) {
            Ok(buf) => buf,
            Err(err) => {
                let err = crate::error::Error::Encode {
                    source: err,
                    back: Backtrace::new(),
                };
                tracing::error!("failed to encode GELF document: {}", err);
                return;
            }
        };
        if let Err(err) = self.transport.send(&buf) {
            tracing::error!("failed to send GELF document: {}", err);
        }
    }
}
