use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::time::Duration;

use crossterm::event::{self, Event as CtEvent, KeyCode, KeyEventKind};
use serde_json::{json, Value};

use crate::events::{
    OS_CLICK, OS_FOREGROUND_ENTER, OS_FOREGROUND_EXIT, OS_SCROLL_BOTTOM, OS_SCROLL_TOP,
    TAP_FALLBACK_CODE,
};

/// Unified event type consumed by the main loop.
#[derive(Clone, Debug)]
pub enum HubEvent {
    /// Raw device payload, exactly as the gesture firmware would deliver it.
    Device(Value),
    Resize,
    Quit,
    /// Watcher poll step; produced on timeout.
    Poll,
}

/// Source of inbound events (device payloads, terminal resize, quit).
///
/// Dropping a source disconnects its channel, which stops the producer
/// thread: that is the unsubscribe for clean shutdown.
pub trait HubEventSource: Send + 'static {
    /// Block for up to `timeout` waiting for an event.
    /// Returns Ok(event) if one arrives before the timeout, or Err(Timeout).
    fn recv_timeout(&self, timeout: Duration) -> Result<HubEvent, RecvTimeoutError>;
}

/// Production source for the terminal simulator: translates key presses into
/// the same raw payload shapes the glasses firmware emits, so the whole
/// classifier path runs in the simulator too.
///
/// Keys: space/enter = tap (CLICK), `t` = tap via the fallback code, up/down
/// arrows = swipes, `b` = toggle foreground, `q`/esc = quit.
pub struct KeyEventSource {
    rx: Receiver<HubEvent>,
}

fn sys_payload(code: i64) -> Value {
    json!({ "sysEvent": { "eventType": code } })
}

fn text_payload(code: i64) -> Value {
    json!({ "textEvent": { "eventType": code } })
}

impl KeyEventSource {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::channel();

        std::thread::spawn(move || {
            let mut foreground = true;
            loop {
                let hub_event = match event::read() {
                    Ok(CtEvent::Key(key)) => {
                        if key.kind == KeyEventKind::Release {
                            continue;
                        }
                        match key.code {
                            KeyCode::Char(' ') | KeyCode::Enter => {
                                Some(HubEvent::Device(text_payload(OS_CLICK)))
                            }
                            KeyCode::Char('t') => {
                                Some(HubEvent::Device(text_payload(TAP_FALLBACK_CODE)))
                            }
                            KeyCode::Up => Some(HubEvent::Device(text_payload(OS_SCROLL_TOP))),
                            KeyCode::Down => {
                                Some(HubEvent::Device(text_payload(OS_SCROLL_BOTTOM)))
                            }
                            KeyCode::Char('b') => {
                                foreground = !foreground;
                                let code = if foreground {
                                    OS_FOREGROUND_ENTER
                                } else {
                                    OS_FOREGROUND_EXIT
                                };
                                Some(HubEvent::Device(sys_payload(code)))
                            }
                            KeyCode::Char('q') | KeyCode::Esc => Some(HubEvent::Quit),
                            _ => None,
                        }
                    }
                    Ok(CtEvent::Resize(_, _)) => Some(HubEvent::Resize),
                    Ok(_) => None,
                    Err(_) => break,
                };
                if let Some(ev) = hub_event {
                    if tx.send(ev).is_err() {
                        break;
                    }
                }
            }
        });

        Self { rx }
    }
}

impl Default for KeyEventSource {
    fn default() -> Self {
        Self::new()
    }
}

impl HubEventSource for KeyEventSource {
    fn recv_timeout(&self, timeout: Duration) -> Result<HubEvent, RecvTimeoutError> {
        self.rx.recv_timeout(timeout)
    }
}

/// Configurable ticker interface
pub trait Ticker: Send + Sync + 'static {
    fn interval(&self) -> Duration;
}

/// Fixed interval ticker
#[derive(Clone, Copy, Debug)]
pub struct FixedTicker {
    interval: Duration,
}

impl FixedTicker {
    pub fn new(interval: Duration) -> Self {
        Self { interval }
    }
}

impl Ticker for FixedTicker {
    fn interval(&self) -> Duration {
        self.interval
    }
}

/// Test event source for unit and headless integration tests
pub struct TestEventSource {
    rx: Receiver<HubEvent>,
}

impl TestEventSource {
    pub fn new(rx: Receiver<HubEvent>) -> Self {
        Self { rx }
    }
}

impl HubEventSource for TestEventSource {
    fn recv_timeout(&self, timeout: Duration) -> Result<HubEvent, RecvTimeoutError> {
        self.rx.recv_timeout(timeout)
    }
}

/// Runner that advances the overlay one event/poll at a time
pub struct Runner<E: HubEventSource, T: Ticker> {
    event_source: E,
    ticker: T,
}

impl<E: HubEventSource, T: Ticker> Runner<E, T> {
    pub fn new(event_source: E, ticker: T) -> Self {
        Self {
            event_source,
            ticker,
        }
    }

    /// Blocks up to the poll interval and returns the next event, or Poll on
    /// timeout.
    pub fn step(&self) -> HubEvent {
        match self.event_source.recv_timeout(self.ticker.interval()) {
            Ok(ev) => ev,
            Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => HubEvent::Poll,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use std::sync::mpsc;

    #[test]
    fn step_returns_poll_on_timeout() {
        let (_tx, rx) = mpsc::channel();
        let es = TestEventSource::new(rx);
        let ticker = FixedTicker::new(Duration::from_millis(1));
        let runner = Runner::new(es, ticker);

        assert_matches!(runner.step(), HubEvent::Poll);
    }

    #[test]
    fn step_passes_through_events() {
        let (tx, rx) = mpsc::channel();
        tx.send(HubEvent::Device(text_payload(OS_CLICK))).unwrap();
        tx.send(HubEvent::Quit).unwrap();
        let es = TestEventSource::new(rx);
        let ticker = FixedTicker::new(Duration::from_millis(10));
        let runner = Runner::new(es, ticker);

        assert_matches!(runner.step(), HubEvent::Device(_));
        assert_matches!(runner.step(), HubEvent::Quit);
    }

    #[test]
    fn disconnected_source_degrades_to_poll() {
        let (tx, rx) = mpsc::channel::<HubEvent>();
        drop(tx);
        let es = TestEventSource::new(rx);
        let runner = Runner::new(es, FixedTicker::new(Duration::from_millis(1)));
        assert_matches!(runner.step(), HubEvent::Poll);
    }
}
