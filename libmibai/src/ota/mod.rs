pub mod types;

use crate::router::MessageHandler;
use crate::storage::{BankDescriptor, StorageError, UpdateStorage};
use crate::types::{ChannelId, Message, OTA_CONTROL, OTA_DATA, OTA_STATUS};

pub use self::types::{OtaCommand, OtaError, OtaStatus};

/// Smallest candidate-bank capacity accepted for an update, sized for the
/// largest image this device ships.
pub const MIN_IMAGE_SIZE: u32 = 0x4_0000;

/// Pushes a payload back to the peer, fire-and-forget. Implementations must
/// not block and must silently drop the payload when no peer is connected;
/// a missed notification is never retried.
pub trait StatusNotifier {
    fn send(&self, channel: ChannelId, payload: &[u8]);
}

/// Requests a device restart after a successful promotion. The
/// implementation is expected to delay long enough for the final status
/// notification to flush before the reset actually happens.
pub trait Restarter {
    fn request_restart(&self);
}

/// The firmware-update state machine.
///
/// Consumes control commands and image chunks routed from the update
/// channels, stages the image into the inactive bank and promotes it on an
/// explicit `Confirm`. Only ever driven by the single consumer task; the
/// staging-session handle is owned here and never shared.
pub struct OtaController<S: UpdateStorage, N: StatusNotifier, R: Restarter> {
    status: OtaStatus,
    bytes_received: usize,
    session: Option<S::Handle>,
    target: Option<BankDescriptor>,
    storage: S,
    notifier: N,
    restarter: R,
}

impl<S: UpdateStorage, N: StatusNotifier, R: Restarter> OtaController<S, N, R> {
    pub fn new(storage: S, notifier: N, restarter: R) -> Self {
        Self {
            status: OtaStatus::Idle,
            bytes_received: 0,
            session: None,
            target: None,
            storage,
            notifier,
            restarter,
        }
    }

    pub fn status(&self) -> OtaStatus {
        self.status
    }

    /// Image bytes staged so far. Tracked for observability only; completion
    /// is signaled by the peer's `Confirm`, never by a byte count.
    pub fn bytes_received(&self) -> usize {
        self.bytes_received
    }

    /// Periodic hook for time-based bookkeeping. Nothing is time-driven yet;
    /// all transitions happen in response to messages.
    pub fn update(&mut self) {}

    /// Aborts any open staging write and returns to `Idle`.
    pub async fn reset(&mut self) {
        if let Some(session) = self.session.take() {
            self.storage.abort(session).await;
        }
        self.target = None;
        self.bytes_received = 0;
        self.set_status(OtaStatus::Idle);
    }

    fn set_status(&mut self, status: OtaStatus) {
        self.status = status;
        self.notifier.send(OTA_STATUS, &[status as u8]);
    }

    async fn process_control(&mut self, payload: &[u8]) {
        let Some(&byte) = payload.first() else {
            error!("empty control command");
            return;
        };
        let Some(command) = OtaCommand::from_byte(byte) else {
            error!("unknown control command: {}", byte);
            return;
        };

        match command {
            OtaCommand::Start => {
                // Unconditional: a Start in any state recovers to a clean
                // Ready, so a duplicate or a stuck session can always be
                // unwedged from the peer side.
                self.reset().await;
                self.set_status(OtaStatus::Ready);
                info!("update session armed");
            }
            OtaCommand::Cancel => {
                info!("update cancelled by peer");
                self.reset().await;
            }
            OtaCommand::Confirm => match self.status {
                OtaStatus::Updating | OtaStatus::Ready => match self.finish_update().await {
                    Ok(()) => {
                        info!("image promoted, restart scheduled");
                        self.set_status(OtaStatus::Complete);
                        self.restarter.request_restart();
                    }
                    Err(e) => {
                        error!("failed to finalize update: {:?}", e);
                        self.set_status(OtaStatus::Failed);
                    }
                },
                status => {
                    warn!("Confirm ignored in {:?}", status);
                }
            },
        }
    }

    async fn finish_update(&mut self) -> Result<(), OtaError> {
        // Promotion requires a staged write. A Confirm before any data was
        // received has nothing to promote and fails without touching storage.
        let session = self.session.take().ok_or(OtaError::NoStagedImage)?;
        let target = self.target.take().ok_or(OtaError::NoStagedImage)?;
        self.storage.close_write(session).await?;
        self.storage.set_active_bank(&target).await?;
        Ok(())
    }

    async fn process_data(&mut self, payload: &[u8]) {
        if !matches!(self.status, OtaStatus::Ready | OtaStatus::Updating) {
            error!("image chunk while not ready, status {:?}", self.status);
            return;
        }

        if self.session.is_none() {
            // First chunk after a Start: resolve the target bank and open
            // the staging write before consuming it.
            match self.start_write().await {
                Ok(()) => self.set_status(OtaStatus::Updating),
                Err(e) => {
                    error!("failed to open staging write: {:?}", e);
                    self.fail().await;
                    return;
                }
            }
        }

        let Some(session) = self.session.as_mut() else {
            return;
        };
        match self.storage.write_chunk(session, payload).await {
            Ok(()) => {
                self.bytes_received += payload.len();
                trace!("staged {} bytes, {} total", payload.len(), self.bytes_received);
            }
            Err(e) => {
                error!("staging write failed: {:?}", e);
                self.fail().await;
            }
        }
    }

    async fn start_write(&mut self) -> Result<(), OtaError> {
        let bank = self.resolve_target()?;
        match self.storage.open_write(&bank).await {
            Ok(session) => {
                info!("staging into bank at {:#x}, {} bytes", bank.address, bank.size);
                self.session = Some(session);
                self.target = Some(bank);
                Ok(())
            }
            Err(StorageError::AlreadyReserved) => {
                // A staging session from a previously aborted run is still
                // reserved. Drop whatever handle we may hold, re-affirm the
                // running image so the bootloader cannot roll it back, then
                // re-resolve and retry exactly once.
                warn!("staging area already reserved, recovering");
                if let Some(stale) = self.session.take() {
                    self.storage.abort(stale).await;
                }
                self.storage.mark_running_valid().await?;
                let bank = self.resolve_target()?;
                let session = self.storage.open_write(&bank).await?;
                self.session = Some(session);
                self.target = Some(bank);
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }

    fn resolve_target(&self) -> Result<BankDescriptor, OtaError> {
        let running = self.storage.running_bank();
        let candidate = self
            .storage
            .candidate_bank()
            .ok_or(OtaError::NoCandidateBank)?;
        if candidate.address == running.address {
            return Err(OtaError::CandidateIsRunning);
        }
        if candidate.size < MIN_IMAGE_SIZE {
            return Err(OtaError::BankTooSmall);
        }
        Ok(candidate)
    }

    /// Storage-level failure: abort the open session and latch `Failed`
    /// until the peer issues a Start.
    async fn fail(&mut self) {
        if let Some(session) = self.session.take() {
            self.storage.abort(session).await;
        }
        self.target = None;
        self.set_status(OtaStatus::Failed);
    }
}

impl<S: UpdateStorage, N: StatusNotifier, R: Restarter> MessageHandler
    for OtaController<S, N, R>
{
    async fn handle_message(&mut self, msg: Message) {
        match msg.channel {
            OTA_CONTROL => self.process_control(&msg.payload).await,
            OTA_DATA => self.process_data(&msg.payload).await,
            other => warn!("update controller got message for channel {:?}", other),
        }
    }
}
