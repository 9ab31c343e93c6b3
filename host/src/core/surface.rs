//! The embedded browser surface hosting the web content.

use std::io::Write;

use serde::Serialize;
use shared::{BridgeReply, ContentEvent};

/// What the host needs from the browser surface.
pub trait BrowserSurface {
    fn load_url(&mut self, url: &str);
    /// Deliver an event to the content's registered handler.
    fn post_event(&mut self, event: ContentEvent);
    /// Answer a geolocation prompt the surface raised for `origin`.
    fn resolve_geolocation_prompt(&mut self, origin: &str, allow: bool, retain: bool);
    fn can_go_back(&self) -> bool;
    fn go_back(&mut self);
}

/// A message from the host to whoever drives a headless surface.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum HostMessage {
    Loaded { url: String },
    Event { event: ContentEvent },
    PromptResolved { origin: String, allow: bool, retain: bool },
    Reply { reply: BridgeReply },
    Exit,
}

/// A surface without a browser which writes everything it receives as JSON lines.
pub struct JsonLinesSurface<W> {
    out: W,
    history: Vec<String>,
}

impl<W: Write> JsonLinesSurface<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            history: Vec::new(),
        }
    }

    /// The underlying writer.
    pub fn get_ref(&self) -> &W {
        &self.out
    }

    pub fn send(&mut self, message: &HostMessage) {
        let result = serde_json::to_writer(&mut self.out, message)
            .map_err(std::io::Error::from)
            .and_then(|()| writeln!(self.out))
            .and_then(|()| self.out.flush());
        if let Err(e) = result {
            tracing::error!("Failed to write host message: {e}");
        }
    }
}

impl<W: Write> BrowserSurface for JsonLinesSurface<W> {
    fn load_url(&mut self, url: &str) {
        self.history.push(url.to_string());
        self.send(&HostMessage::Loaded {
            url: url.to_string(),
        });
    }

    fn post_event(&mut self, event: ContentEvent) {
        self.send(&HostMessage::Event { event });
    }

    fn resolve_geolocation_prompt(&mut self, origin: &str, allow: bool, retain: bool) {
        self.send(&HostMessage::PromptResolved {
            origin: origin.to_string(),
            allow,
            retain,
        });
    }

    fn can_go_back(&self) -> bool {
        self.history.len() > 1
    }

    fn go_back(&mut self) {
        self.history.pop();
        if let Some(url) = self.history.last().cloned() {
            self.send(&HostMessage::Loaded { url });
        }
    }
}
