use fest_booking::{
    BookingFlow, BookingReference, Effect, FlowError, FlowEvent, FlowView, TicketCard, Transition,
};
use fest_catalog::EventDetails;
use fest_core::{AvatarUploader, BookingRepository, DraftRepository, UploadError};
use fest_shared::FlowNotice;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, mpsc, oneshot};
use tracing::{error, info, warn};

const COMMAND_BUFFER: usize = 64;
const NOTICE_BUFFER: usize = 100;

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error(transparent)]
    Flow(#[from] FlowError),
    #[error("Booking session has stopped")]
    Closed,
}

enum Command {
    View {
        reply: oneshot::Sender<FlowView>,
    },
    Apply {
        event: FlowEvent,
        reply: oneshot::Sender<Result<FlowView, SessionError>>,
    },
    StartUpload {
        index: usize,
        image: Vec<u8>,
        file_name: String,
        reply: oneshot::Sender<Result<FlowView, SessionError>>,
    },
    Card {
        index: usize,
        reply: oneshot::Sender<Result<TicketCard, SessionError>>,
    },
    UploadFinished {
        index: usize,
        reference: BookingReference,
        result: Result<String, String>,
    },
}

/// Collaborators the session needs
#[derive(Clone)]
pub struct SessionDeps {
    pub bookings: Arc<dyn BookingRepository>,
    pub drafts: Arc<dyn DraftRepository>,
    pub uploader: Arc<dyn AvatarUploader>,
    pub event: EventDetails,
    pub upload_timeout: Duration,
}

/// Cheap, cloneable access to the running session
#[derive(Clone)]
pub struct SessionHandle {
    tx: mpsc::Sender<Command>,
    notices: broadcast::Sender<FlowNotice>,
}

impl SessionHandle {
    pub async fn view(&self) -> Result<FlowView, SessionError> {
        let (reply, rx) = oneshot::channel();
        self.send(Command::View { reply }).await?;
        rx.await.map_err(|_| SessionError::Closed)
    }

    pub async fn apply(&self, event: FlowEvent) -> Result<FlowView, SessionError> {
        let (reply, rx) = oneshot::channel();
        self.send(Command::Apply { event, reply }).await?;
        rx.await.map_err(|_| SessionError::Closed)?
    }

    /// Mark the slot as uploading and hand the image to the uploader in the
    /// background. The outcome shows up in the flow and as a notice.
    pub async fn start_upload(
        &self,
        index: usize,
        image: Vec<u8>,
        file_name: String,
    ) -> Result<FlowView, SessionError> {
        let (reply, rx) = oneshot::channel();
        self.send(Command::StartUpload {
            index,
            image,
            file_name,
            reply,
        })
        .await?;
        rx.await.map_err(|_| SessionError::Closed)?
    }

    pub async fn card(&self, index: usize) -> Result<TicketCard, SessionError> {
        let (reply, rx) = oneshot::channel();
        self.send(Command::Card { index, reply }).await?;
        rx.await.map_err(|_| SessionError::Closed)?
    }

    pub fn subscribe(&self) -> broadcast::Receiver<FlowNotice> {
        self.notices.subscribe()
    }

    async fn send(&self, command: Command) -> Result<(), SessionError> {
        self.tx.send(command).await.map_err(|_| SessionError::Closed)
    }
}

/// Owner of the booking flow. Runs as one task; every change to the flow
/// happens inside `run`.
pub struct Session {
    deps: SessionDeps,
    notices: broadcast::Sender<FlowNotice>,
    tx: mpsc::WeakSender<Command>,
}

impl Session {
    /// Restore the mirrored draft (or start fresh) and start the control loop
    pub async fn spawn(deps: SessionDeps) -> SessionHandle {
        let flow = match deps.drafts.load_draft().await {
            Ok(Some(flow)) => {
                info!("Resuming booking {} at {}", flow.reference(), flow.step());
                flow.resume()
            }
            Ok(None) => BookingFlow::new(),
            Err(e) => {
                warn!("Ignoring unreadable draft: {}", e);
                BookingFlow::new()
            }
        };

        let (tx, rx) = mpsc::channel(COMMAND_BUFFER);
        let (notices, _) = broadcast::channel(NOTICE_BUFFER);

        let session = Session {
            deps,
            notices: notices.clone(),
            tx: tx.downgrade(),
        };
        tokio::spawn(session.run(flow, rx));

        SessionHandle { tx, notices }
    }

    async fn run(self, mut flow: BookingFlow, mut rx: mpsc::Receiver<Command>) {
        info!("Booking session started with {}", flow.reference());
        while let Some(command) = rx.recv().await {
            flow = self.handle(flow, command).await;
        }
        info!("Booking session stopped");
    }

    async fn handle(&self, flow: BookingFlow, command: Command) -> BookingFlow {
        match command {
            Command::View { reply } => {
                let _ = reply.send(flow.view());
                flow
            }
            Command::Card { index, reply } => {
                let _ = reply.send(flow.card(index, &self.deps.event).map_err(SessionError::from));
                flow
            }
            Command::Apply { event, reply } => {
                let (flow, result) = self.drive(flow, event).await;
                let _ = reply.send(result.map(|_| flow.view()));
                flow
            }
            Command::StartUpload {
                index,
                image,
                file_name,
                reply,
            } => {
                let reference = flow.reference().clone();
                let (flow, result) = self.drive(flow, FlowEvent::AvatarUploadStarted { index }).await;
                if result.is_ok() {
                    self.spawn_upload(index, reference, image, file_name);
                }
                let _ = reply.send(result.map(|_| flow.view()));
                flow
            }
            Command::UploadFinished {
                index,
                reference,
                result,
            } => {
                let event = FlowEvent::AvatarUploadFinished {
                    index,
                    reference,
                    result,
                };
                self.drive(flow, event).await.0
            }
        }
    }

    /// Apply one event, carry out its effects and mirror the outcome
    async fn drive(&self, flow: BookingFlow, event: FlowEvent) -> (BookingFlow, Result<(), SessionError>) {
        let (flow, result) = match flow.apply(event) {
            Ok(transition) => self.run_effects(transition).await,
            Err(rejection) => {
                if let Some(notice) = rejection.notice() {
                    self.publish(notice);
                }
                (rejection.flow, Err(rejection.error.into()))
            }
        };
        self.mirror(&flow).await;
        (flow, result)
    }

    async fn run_effects(&self, transition: Transition) -> (BookingFlow, Result<(), SessionError>) {
        let Transition { mut flow, effects } = transition;

        for effect in effects {
            match effect {
                Effect::Notify(notice) => self.publish(notice),
                Effect::Persist(record) => {
                    // The Reviewing step is only entered once the write has landed.
                    let outcome = match self.deps.bookings.put(&record.booking_reference, &record).await {
                        Ok(()) => FlowEvent::PersistenceSucceeded,
                        Err(e) => {
                            error!("Failed to persist booking {}: {}", record.booking_reference, e);
                            FlowEvent::PersistenceFailed { message: e.to_string() }
                        }
                    };
                    match flow.apply(outcome) {
                        Ok(next) => {
                            for notice in next.notices() {
                                self.publish(notice.clone());
                            }
                            flow = next.flow;
                        }
                        Err(rejection) => {
                            if let Some(notice) = rejection.notice() {
                                self.publish(notice);
                            }
                            return (rejection.flow, Err(rejection.error.into()));
                        }
                    }
                }
            }
        }
        (flow, Ok(()))
    }

    fn spawn_upload(&self, index: usize, reference: BookingReference, image: Vec<u8>, file_name: String) {
        let uploader = self.deps.uploader.clone();
        let timeout = self.deps.upload_timeout;
        let tx = self.tx.clone();

        tokio::spawn(async move {
            let result = match tokio::time::timeout(timeout, uploader.upload(image, &file_name)).await {
                Ok(Ok(url)) => Ok(url),
                Ok(Err(e)) => Err(e.to_string()),
                Err(_) => Err(UploadError::Timeout(timeout).to_string()),
            };
            if let Some(tx) = tx.upgrade() {
                let _ = tx
                    .send(Command::UploadFinished {
                        index,
                        reference,
                        result,
                    })
                    .await;
            }
        });
    }

    async fn mirror(&self, flow: &BookingFlow) {
        if let Err(e) = self.deps.drafts.save_draft(flow).await {
            warn!("Could not mirror draft for {}: {}", flow.reference(), e);
        }
    }

    fn publish(&self, notice: FlowNotice) {
        // No subscribers is fine.
        let _ = self.notices.send(notice);
    }
}
