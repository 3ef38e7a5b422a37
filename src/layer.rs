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

//! A [`tracing-subscriber`] [`Layer`] that ships [`tracing`] [`Event`]s to a GELF server.
//!
//! [`tracing-subscriber`]: https://docs.rs/tracing-subscriber/latest/tracing_subscriber/index.html
//! [`Layer`]: https://docs.rs/tracing-subscriber/latest/tracing_subscriber/layer/trait.Layer.html
//! [`Event`]: https://docs.rs/tracing/latest/tracing/struct.Event.html
//!
//! Each event's fields are visited into a structured [`LogInput`]: the `message` field becomes
//! the document's `message`, every other field rides along as a GELF additional field &
//! receives the normalizer's usual coercion. The event's verbosity maps onto the syslog-derived
//! severities (TRACE & DEBUG to DEBUG, INFO to INFO, WARN to WARNING, ERROR to ERROR) unless
//! the caller installs a mapping of their own.
//!
//! # Examples
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
//! tracing::info!(code = 1245, label = "label", "the message field");
//! ```

use crate::{
    client::Client,
    input::{FieldValue, LogInput},
    level::{self, SeverityLevel},
};

use tracing::field::{Field, Visit};
use tracing::Event;
use tracing_subscriber::layer::Context;

fn default_level_mapping(level: &tracing::Level) -> SeverityLevel {
    match level {
        &tracing::Level::TRACE | &tracing::Level::DEBUG => level::DEBUG,
        &tracing::Level::INFO => level::INFO,
        &tracing::Level::WARN => level::WARNING,
        &tracing::Level::ERROR => level::ERROR,
    }
}

#[derive(Default)]
struct EventVisitor {
    message: Option<String>,
    fields: Vec<(String, FieldValue)>,
}

impl Visit for EventVisitor {
    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        if field.name() == "message" {
            // Regrettably, we have only a `Debug` implementation available to us; but the
            // tracing macros `info!()`, `event!()` & the like all take care to "pre-format" the
            // `message` field so that `value` actually refers to a `std::fmt::Arguments`
            // instance, which will print to a debug format without enclosing double-quotes.
            self.message = Some(format!("{:?}", value));
        } else {
            self.fields.push((
                field.name().to_string(),
                FieldValue::from(format!("{:?}", value)),
            ));
        }
    }
    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "message" {
            self.message = Some(value.to_string());
        } else {
            self.fields
                .push((field.name().to_string(), FieldValue::from(value)));
        }
    }
    fn record_i64(&mut self, field: &Field, value: i64) {
        self.fields
            .push((field.name().to_string(), FieldValue::from(value)));
    }
    fn record_u64(&mut self, field: &Field, value: u64) {
        self.fields
            .push((field.name().to_string(), FieldValue::from(value)));
    }
    fn record_f64(&mut self, field: &Field, value: f64) {
        self.fields
            .push((field.name().to_string(), FieldValue::from(value)));
    }
    fn record_bool(&mut self, field: &Field, value: bool) {
        self.fields
            .push((field.name().to_string(), FieldValue::from(value)));
    }
}

/// A [`Layer`] implementation that forwards every event through a [`Client`].
///
/// [`Layer`]: https://docs.rs/tracing-subscriber/latest/tracing_subscriber/layer/trait.Layer.html
pub struct GelfLayer {
    client: Client,
    background: bool,
    map_level: Box<dyn Fn(&tracing::Level) -> SeverityLevel + Send + Sync>,
}

impl GelfLayer {
    /// Wrap `client` with the default level mapping & background dispatch.
    pub fn new(client: Client) -> GelfLayer {
        GelfLayer {
            client,
            background: true,
            map_level: Box::new(default_level_mapping),
        }
    }

    /// Dispatch events synchronously: `on_event` returns only after the datagrams are handed
    /// to the network stack.
    pub fn with_blocking_dispatch(mut self) -> GelfLayer {
        self.background = false;
        self
    }

    /// Replace the verbosity-to-severity mapping.
    pub fn with_level_mapping<F>(mut self, map_level: F) -> GelfLayer
    where
        F: Fn(&tracing::Level) -> SeverityLevel + Send + Sync + 'static,
    {
        self.map_level = Box::new(map_level);
        self
    }
}

impl<S: tracing::Subscriber> tracing_subscriber::layer::Layer<S> for GelfLayer {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        // The client reports its own transport failures on this very channel; feeding those
        // back through the layer would loop.
        if event.metadata().target().starts_with("gelf_udp") {
            return;
        }

        let mut visitor = EventVisitor::default();
        event.record(&mut visitor);

        let mut fields = Vec::with_capacity(visitor.fields.len() + 1);
        if let Some(message) = visitor.message {
            fields.push(("message".to_string(), FieldValue::from(message)));
        }
        fields.extend(visitor.fields);

        let severity = (self.map_level)(event.metadata().level());
        if self.background {
            self.client.log_at(severity, LogInput::Object(fields));
        } else {
            self.client.log_at_sync(severity, LogInput::Object(fields));
        }
    }
}
