//! Text rendering of events and finished request blocks.
//!
//! # Responsibilities
//! - One summary line per finished request, buffered events indented below
//! - Per-kind one-line formats for well-known event kinds
//! - Generic fallback for unknown kinds, raw messages, and malformed events
//!
//! # Design Decisions
//! - A kind renderer returns `None` when a field it needs is missing; the
//!   event is then rendered generically instead of failing
//! - Rendering is pure: text in, text out, no I/O

use serde_json::Value;
use std::collections::HashMap;

use crate::correlator::{FinishedBlock, Outcome};
use crate::event::LogEvent;
use crate::output::inspect::{inline, pretty};
use crate::output::palette::Palette;

/// Prefix added per nesting level.
pub const INDENT: &str = "  ";

type KindRenderer = fn(&LogEvent, &Palette) -> Option<String>;

/// Dispatches events to per-kind renderers.
pub struct Renderer {
    palette: Palette,
    kinds: HashMap<&'static str, KindRenderer>,
}

impl Renderer {
    pub fn new(palette: Palette) -> Self {
        let mut kinds: HashMap<&'static str, KindRenderer> = HashMap::new();
        kinds.insert("db/call", render_db_call);
        kinds.insert("db/update", render_db_update);
        kinds.insert("cache/invalidate", render_cache);
        kinds.insert("cache/get", render_cache);
        kinds.insert("cache/set", render_cache);
        kinds.insert("email/sent", render_email_sent);
        kinds.insert("email/batch", render_email_batch);
        Self { palette, kinds }
    }

    /// Render a standalone event. May span several lines.
    pub fn render_event(&self, event: &LogEvent) -> String {
        if !event.is_raw() {
            if let Some(line) = self
                .kinds
                .get(event.kind())
                .and_then(|render| render(event, &self.palette))
            {
                return line;
            }
        }
        self.render_generic(event)
    }

    /// Summary line followed by every buffered event one level deeper.
    pub fn render_block(&self, block: &FinishedBlock) -> String {
        let mut lines = vec![self.render_summary(block)];
        for event in &block.events {
            lines.push(indent(&self.render_event(event), INDENT));
        }
        lines.join("\n")
    }

    /// `METHOD STATUS URL (Nms)`
    pub fn render_summary(&self, block: &FinishedBlock) -> String {
        let fallback = match block.outcome {
            Outcome::Responded { .. } => "",
            Outcome::TimedOut { .. } => "TIMEOUT",
            Outcome::Aborted { .. } => "ABORTED",
        };
        format!(
            "{} {} {}{}",
            block.meta.method.to_uppercase(),
            self.palette.status(block.outcome.status(), fallback),
            block.meta.url,
            self.palette.duration(block.elapsed_ms())
        )
    }

    fn render_generic(&self, event: &LogEvent) -> String {
        let header = format!(
            "{}{}",
            self.palette.kind(event.kind()),
            self.palette.maybe_duration(event.duration_ms())
        );
        let body = match event.message() {
            Some(message) => message.to_string(),
            None => pretty(&Value::Object(event.fields().clone())),
        };
        format!("{}\n{}", header, indent(&body, INDENT))
    }
}

/// Prefix every line of `text`.
pub fn indent(text: &str, prefix: &str) -> String {
    text.lines()
        .map(|line| format!("{}{}", prefix, line))
        .collect::<Vec<_>>()
        .join("\n")
}

/// `db/call name(arg, arg)`
fn render_db_call(event: &LogEvent, palette: &Palette) -> Option<String> {
    let name = event.field("name")?.as_str()?;
    let args = event.field("args")?.as_array()?;
    let args: Vec<String> = args.iter().map(inline).collect();
    Some(format!(
        "{} {}({}){}",
        palette.kind(event.kind()),
        name,
        args.join(", "),
        palette.maybe_duration(event.duration_ms())
    ))
}

/// `db/update` with every `?` replaced by the next value, in order.
fn render_db_update(event: &LogEvent, palette: &Palette) -> Option<String> {
    let statement = event.field("statement")?.as_str()?;
    let values = event.field("values")?.as_array()?;
    Some(format!(
        "{} {}{}",
        palette.kind(event.kind()),
        substitute_placeholders(statement, values),
        palette.maybe_duration(event.duration_ms())
    ))
}

/// Replace positional `?` placeholders with inline renderings of `values`.
/// Placeholders beyond the supplied values are left as `?`.
pub fn substitute_placeholders(statement: &str, values: &[Value]) -> String {
    let mut values = values.iter();
    let mut out = String::with_capacity(statement.len());
    for c in statement.chars() {
        if c != '?' {
            out.push(c);
            continue;
        }
        match values.next() {
            Some(value) => out.push_str(&inline(value)),
            None => out.push('?'),
        }
    }
    out
}

/// `cache/get partition row`
fn render_cache(event: &LogEvent, palette: &Palette) -> Option<String> {
    let partition = event.field("partition")?;
    let row = event.field("row")?;
    Some(format!(
        "{} {} {}",
        palette.kind(event.kind()),
        inline(partition),
        inline(row)
    ))
}

/// `email/sent 'subject' to 'recipient'`
fn render_email_sent(event: &LogEvent, palette: &Palette) -> Option<String> {
    let subject = event.field("subject")?;
    let to = event.field("to")?;
    Some(format!(
        "{} {} to {}",
        palette.kind(event.kind()),
        inline(subject),
        inline(to)
    ))
}

/// `email/batch size: N`
fn render_email_batch(event: &LogEvent, palette: &Palette) -> Option<String> {
    let size = event.field("size")?;
    Some(format!("{} size: {}", palette.kind(event.kind()), inline(size)))
}
