// ReflexPod — Console Link
//
// Line-oriented stand-in for the wireless link, used on the bench and over
// the target's serial console. Each input line is one of:
//   {...}    a command payload
//   attach   a peer connected
//   detach   the peer disconnected
//   tap      poke the simulated piezo (bench only)
// Outbound payloads are written one per line.

use std::io::{BufRead, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::Sender;
use std::sync::Arc;

use anyhow::Context;

use crate::events::LinkEvent;
use crate::link::Transport;

/// Shared flag the bench piezo turns into one hit.
pub type TapTrigger = Arc<AtomicBool>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsoleLine {
    Link(LinkEvent),
    Tap,
    Blank,
}

pub fn parse_line(line: &str) -> ConsoleLine {
    match line.trim() {
        "" => ConsoleLine::Blank,
        "attach" => ConsoleLine::Link(LinkEvent::Attached),
        "detach" => ConsoleLine::Link(LinkEvent::Detached),
        "tap" => ConsoleLine::Tap,
        payload => ConsoleLine::Link(LinkEvent::Payload(payload.to_owned())),
    }
}

/// Reads lines until EOF or until the control task goes away.
pub fn console_task<R: BufRead>(input: R, link_tx: Sender<LinkEvent>, tap: Option<TapTrigger>) {
    log::info!("Console task started");

    for line in input.lines() {
        let line = match line {
            Ok(line) => line,
            Err(e) => {
                log::warn!("Console read error: {}", e);
                continue;
            }
        };
        match parse_line(&line) {
            ConsoleLine::Link(event) => {
                if link_tx.send(event).is_err() {
                    log::warn!("Link channel closed, exiting console task");
                    return;
                }
            }
            ConsoleLine::Tap => match &tap {
                Some(trigger) => trigger.store(true, Ordering::SeqCst),
                None => log::warn!("No simulated piezo on this build"),
            },
            ConsoleLine::Blank => {}
        }
    }
    log::info!("Console closed");
}

/// Writes each payload as one line.
pub struct ConsoleTransport<W: Write> {
    out: W,
}

impl<W: Write> ConsoleTransport<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> Transport for ConsoleTransport<W> {
    fn transmit(&mut self, payload: &str) -> anyhow::Result<()> {
        writeln!(self.out, "{}", payload).context("console write")?;
        self.out.flush().context("console flush")
    }

    fn resume_discovery(&mut self) -> anyhow::Result<()> {
        log::info!("Waiting for a peer (send `attach`)");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use std::sync::mpsc;

    #[test]
    fn lines_map_to_link_events() {
        assert_eq!(parse_line("  attach "), ConsoleLine::Link(LinkEvent::Attached));
        assert_eq!(parse_line("detach"), ConsoleLine::Link(LinkEvent::Detached));
        assert_eq!(parse_line("tap"), ConsoleLine::Tap);
        assert_eq!(parse_line("   "), ConsoleLine::Blank);
        assert_eq!(
            parse_line(r#"{"type":"ping"}"#),
            ConsoleLine::Link(LinkEvent::Payload(r#"{"type":"ping"}"#.into()))
        );
    }

    #[test]
    fn console_task_forwards_events_and_taps() {
        let (tx, rx) = mpsc::channel();
        let trigger: TapTrigger = Arc::new(AtomicBool::new(false));
        let input = Cursor::new("attach\n\ntap\n{\"type\":\"ping\"}\ndetach\n");

        console_task(input, tx, Some(Arc::clone(&trigger)));

        let events: Vec<LinkEvent> = rx.try_iter().collect();
        assert_eq!(
            events,
            vec![
                LinkEvent::Attached,
                LinkEvent::Payload(r#"{"type":"ping"}"#.into()),
                LinkEvent::Detached,
            ]
        );
        assert!(trigger.load(Ordering::SeqCst));
    }

    #[test]
    fn transport_writes_one_line_per_payload() {
        let mut t = ConsoleTransport::new(Vec::new());
        t.transmit(r#"{"a":1}"#).unwrap();
        t.transmit(r#"{"b":2}"#).unwrap();
        assert_eq!(String::from_utf8(t.into_inner()).unwrap(), "{\"a\":1}\n{\"b\":2}\n");
    }
}
