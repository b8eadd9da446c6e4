//! Startup hooks that choose and install the WAL storage manager.
//!
//! Installation runs in three phases that mirror server bring-up:
//!
//! 1. [`SmgrBootstrap::register`] - validate the configuration and record
//!    whether WAL encryption is enabled
//! 2. [`SmgrBootstrap::shmem_init`] - allocate the encryption buffer, once,
//!    and only if encryption is enabled
//! 3. [`SmgrBootstrap::install`] - hand out the storage manager the WAL
//!    engine will use for the rest of the process
//!
//! The choice cannot be changed afterwards.

use crate::config::Config;
use crate::crypto::{CipherEngine, KeyProvider};
use crate::error::{CoreError, CoreResult};
use crate::smgr::{EncryptedSmgr, PageCodec, ScratchBuffer, SegmentStorage, StandardSmgr};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info};

/// Lifecycle of the encryption buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScratchState {
    /// No buffer exists yet (or encryption is disabled).
    Uninitialized,
    /// The buffer has been allocated but not handed to a storage manager.
    Allocated,
    /// The buffer is owned by the installed storage manager.
    Ready,
}

/// Drives storage manager selection during startup.
pub struct SmgrBootstrap {
    config: Config,
    keys: Arc<dyn KeyProvider>,
    engine: Arc<dyn CipherEngine>,
    scratch: Option<ScratchBuffer>,
    state: ScratchState,
    installed: bool,
}

impl SmgrBootstrap {
    /// Registers the storage manager choice.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn register(
        config: Config,
        keys: Arc<dyn KeyProvider>,
        engine: Arc<dyn CipherEngine>,
    ) -> CoreResult<Self> {
        config.validate()?;
        debug!(wal_encrypt = config.wal_encrypt, "registered WAL storage manager");

        Ok(Self {
            config,
            keys,
            engine,
            scratch: None,
            state: ScratchState::Uninitialized,
            installed: false,
        })
    }

    /// Allocates the encryption buffer if WAL encryption is enabled.
    ///
    /// A no-op when encryption is disabled.
    ///
    /// # Errors
    ///
    /// Returns an error if the buffer was already allocated or cannot be.
    pub fn shmem_init(&mut self) -> CoreResult<()> {
        if !self.config.wal_encrypt {
            return Ok(());
        }
        if self.state != ScratchState::Uninitialized {
            return Err(CoreError::invalid_operation(
                "WAL encryption buffer already initialized",
            ));
        }

        let scratch = ScratchBuffer::allocate(self.config.scratch_size(), self.config.io_align)?;
        self.scratch = Some(scratch);
        self.state = ScratchState::Allocated;
        Ok(())
    }

    /// Bytes the encryption buffer needs, or `0` if encryption is disabled.
    #[must_use]
    pub fn shmem_size(&self) -> usize {
        if self.config.wal_encrypt {
            self.config.scratch_size()
        } else {
            0
        }
    }

    /// Current state of the encryption buffer.
    #[must_use]
    pub fn scratch_state(&self) -> ScratchState {
        self.state
    }

    /// The registered configuration.
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Returns the storage manager for the WAL engine.
    ///
    /// # Errors
    ///
    /// - [`CoreError::ScratchNotAllocated`] if encryption is enabled and
    ///   [`shmem_init`](Self::shmem_init) has not run
    /// - [`CoreError::InvalidOperation`] if a manager was already installed
    pub fn install(&mut self) -> CoreResult<Box<dyn SegmentStorage>> {
        if self.installed {
            return Err(CoreError::invalid_operation(
                "WAL storage manager already installed",
            ));
        }

        let smgr: Box<dyn SegmentStorage> = if self.config.wal_encrypt {
            let scratch = self.scratch.take().ok_or(CoreError::ScratchNotAllocated)?;
            let codec = PageCodec::new(Arc::clone(&self.keys), Arc::clone(&self.engine));
            self.state = ScratchState::Ready;
            Box::new(EncryptedSmgr::new(codec, scratch))
        } else {
            Box::new(StandardSmgr)
        };

        self.installed = true;
        info!(smgr = smgr.name(), "installed WAL storage manager");
        Ok(smgr)
    }
}

impl fmt::Debug for SmgrBootstrap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SmgrBootstrap")
            .field("config", &self.config)
            .field("state", &self.state)
            .field("installed", &self.installed)
            .finish_non_exhaustive()
    }
}

/// Runs all startup phases and returns the storage manager.
///
/// # Errors
///
/// Returns an error if any phase fails.
pub fn install_smgr(
    config: Config,
    keys: Arc<dyn KeyProvider>,
    engine: Arc<dyn CipherEngine>,
) -> CoreResult<Box<dyn SegmentStorage>> {
    let mut bootstrap = SmgrBootstrap::register(config, keys, engine)?;
    bootstrap.shmem_init()?;
    bootstrap.install()
}
