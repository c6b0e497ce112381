use tokio::sync::{mpsc, oneshot};
use tracing::warn;

use crate::decoration::DecorationKey;
use crate::metrics::PerformanceReport;

#[derive(Debug)]
pub enum SessionEvent {
    TextChanged,
    WindowMoved,
    Scrolled,
    SpaceChanged,
    Hovered(DecorationKey),
    Clicked(DecorationKey),
    ApplyTranslation(DecorationKey),
    SetSourceLanguage(String),
    ReportRequested(oneshot::Sender<PerformanceReport>),
    Shutdown,
}

#[derive(Clone)]
pub struct SessionHandle {
    events: mpsc::UnboundedSender<SessionEvent>,
}

impl SessionHandle {
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<SessionEvent>) {
        let (events, receiver) = mpsc::unbounded_channel();
        (Self { events }, receiver)
    }

    pub fn text_changed(&self) {
        self.send(SessionEvent::TextChanged);
    }

    pub fn window_moved(&self) {
        self.send(SessionEvent::WindowMoved);
    }

    pub fn scrolled(&self) {
        self.send(SessionEvent::Scrolled);
    }

    pub fn space_changed(&self) {
        self.send(SessionEvent::SpaceChanged);
    }

    pub fn hovered(&self, key: DecorationKey) {
        self.send(SessionEvent::Hovered(key));
    }

    pub fn clicked(&self, key: DecorationKey) {
        self.send(SessionEvent::Clicked(key));
    }

    pub fn apply_translation(&self, key: DecorationKey) {
        self.send(SessionEvent::ApplyTranslation(key));
    }

    pub fn set_source_language(&self, language_code: impl Into<String>) {
        self.send(SessionEvent::SetSourceLanguage(language_code.into()));
    }

    pub async fn performance_report(&self) -> Option<PerformanceReport> {
        self.request_report()?.await.ok()
    }

    pub fn request_report(&self) -> Option<oneshot::Receiver<PerformanceReport>> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.send(SessionEvent::ReportRequested(reply_tx))
            .then_some(reply_rx)
    }

    pub fn shutdown(&self) {
        self.send(SessionEvent::Shutdown);
    }

    pub fn is_closed(&self) -> bool {
        self.events.is_closed()
    }

    fn send(&self, event: SessionEvent) -> bool {
        match self.events.send(event) {
            Ok(()) => true,
            Err(err) => {
                warn!("session loop is gone; dropped {:?}", err.0);
                false
            }
        }
    }
}
