//! Error policies around calls into the external decoder.
//!
//! Every call into the decoder runs inside `catch_unwind`, so a decoder that
//! panics mid-stream (libjpeg's `error_exit`) unwinds back here instead of past
//! the caller. Under [`ErrorPolicy::Recover`] the failure is handed back as an
//! [`ErrorMessage`]; under [`ErrorPolicy::Abort`] it is raised again as a panic
//! carrying the diagnostic.

use std::panic::{self, AssertUnwindSafe};

use tracing::{error, warn};

use crate::error::ErrorMessage;
use crate::options::ErrorPolicy;

#[derive(Debug, Clone, Copy)]
pub(crate) struct Checkpoint {
    policy: ErrorPolicy,
}

impl Checkpoint {
    pub(crate) fn new(policy: ErrorPolicy) -> Self {
        Self { policy }
    }

    /// Run one decoder call under this checkpoint's policy.
    ///
    /// Panics raised inside `op` are caught under both policies: recover turns
    /// them into an [`ErrorKind::Aborted`](crate::ErrorKind::Aborted) message,
    /// abort re-raises them with the decoder diagnostic attached.
    pub(crate) fn call<T>(
        &self,
        op: impl FnOnce() -> Result<T, ErrorMessage>,
    ) -> Result<T, ErrorMessage> {
        let result = match panic::catch_unwind(AssertUnwindSafe(op)) {
            Ok(result) => result,
            Err(payload) => {
                let msg = ErrorMessage::from_panic(payload);
                warn!(%msg, "decoder aborted, resuming at checkpoint");
                Err(msg)
            }
        };
        self.settle(result)
    }

    /// Settle a failed decode according to the policy: abort, or hand the message back.
    pub(crate) fn settle<T>(&self, result: Result<T, ErrorMessage>) -> Result<T, ErrorMessage> {
        match (self.policy, result) {
            (ErrorPolicy::Abort, Err(msg)) => abort(msg),
            (_, result) => result,
        }
    }
}

/// The abort path: no recovery, the diagnostic travels with the panic.
pub(crate) fn abort(msg: ErrorMessage) -> ! {
    error!(%msg, "fatal decode error");
    panic!("JPEG decode failed: {msg}");
}
