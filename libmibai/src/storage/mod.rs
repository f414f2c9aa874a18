//! Seam between the update controller and the dual-bank flash layout.

/// One firmware bank: a contiguous flash region holding a complete image.
/// Exactly one bank boots at a time; the other is the staging area.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct BankDescriptor {
    pub address: u32,
    pub size: u32,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum StorageError {
    /// A staging session is already reserved, e.g. left over from a
    /// previously aborted run.
    AlreadyReserved,
    /// The staged image would overrun the target bank.
    OutOfSpace,
    /// Flash-level failure while erasing, writing or finalizing.
    Flash,
}

/// Dual-bank update storage.
///
/// The backend owns the bank geometry and the flash driver; the controller
/// owns the single staging-session handle. Bank resolution is idempotent and
/// side-effect-free, so callers may repeat it freely.
#[allow(async_fn_in_trait)]
pub trait UpdateStorage {
    /// Open staging-write session.
    type Handle;

    /// Opens an append-only write session into `bank`.
    async fn open_write(&mut self, bank: &BankDescriptor) -> Result<Self::Handle, StorageError>;

    /// Appends a chunk to the open session.
    async fn write_chunk(
        &mut self,
        session: &mut Self::Handle,
        data: &[u8],
    ) -> Result<(), StorageError>;

    /// Finalizes the session, flushing anything still buffered.
    async fn close_write(&mut self, session: Self::Handle) -> Result<(), StorageError>;

    /// Abandons the session. Idempotent at the backend level.
    async fn abort(&mut self, session: Self::Handle);

    /// Marks `bank` as the boot target for the next restart.
    async fn set_active_bank(&mut self, bank: &BankDescriptor) -> Result<(), StorageError>;

    /// The bank an update may be staged into, if the layout provides one.
    fn candidate_bank(&self) -> Option<BankDescriptor>;

    /// The bank the running firmware booted from.
    fn running_bank(&self) -> BankDescriptor;

    /// Re-affirms the running bank as valid, so the bootloader will not roll
    /// it back while a new image is being staged.
    async fn mark_running_valid(&mut self) -> Result<(), StorageError>;
}
