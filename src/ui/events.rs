// Event pump: terminal input and ticks, funneled into one channel
// Raw crossterm events are forwarded as-is because modal prompts need real
// keystrokes, not pre-digested commands; the app does its own dispatch.

use crossterm::event;
use std::time::Duration;
use tokio::sync::mpsc;

const POLL_INTERVAL: Duration = Duration::from_millis(50);

#[derive(Debug)]
pub enum AppEvent {
    Input(event::Event),
    /// Fires whenever input is quiet for a poll interval; drives player
    /// completion handling and anything else time-based.
    Tick,
}

pub struct EventHandler {
    event_sender: mpsc::UnboundedSender<AppEvent>,
    event_receiver: mpsc::UnboundedReceiver<AppEvent>,
}

impl EventHandler {
    pub fn new() -> Self {
        let (event_sender, event_receiver) = mpsc::unbounded_channel();
        Self {
            event_sender,
            event_receiver,
        }
    }

    pub fn sender(&self) -> mpsc::UnboundedSender<AppEvent> {
        self.event_sender.clone()
    }

    pub async fn next_event(&mut self) -> Option<AppEvent> {
        self.event_receiver.recv().await
    }

    /// Pump terminal events from a blocking thread; `event::read` blocks, so
    /// it cannot live on the async runtime directly.
    pub fn spawn_input_pump(&self) {
        let sender = self.event_sender.clone();
        tokio::task::spawn_blocking(move || loop {
            let message = match event::poll(POLL_INTERVAL) {
                Ok(true) => match event::read() {
                    Ok(ev) => AppEvent::Input(ev),
                    Err(_) => return,
                },
                Ok(false) => AppEvent::Tick,
                Err(_) => return,
            };
            if sender.send(message).is_err() {
                // receiver gone, the app is shutting down
                return;
            }
        });
    }
}

impl Default for EventHandler {
    fn default() -> Self {
        Self::new()
    }
}
