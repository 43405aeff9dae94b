//! Observer pattern for harness events.
//!
//! Observers are called synchronously from the harness task and must not
//! block. They never influence control flow.

use tokenrig_primitives::{Address, WriteCall, WriteReceipt};

use crate::{HarnessState, Observation, TokenHandle};

/// Events emitted by a [`Harness`](crate::Harness).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HarnessEvent {
    /// The harness moved between lifecycle states.
    StateChanged {
        /// Previous state.
        from: HarnessState,
        /// New state.
        to: HarnessState,
    },
    /// The backend answered its readiness probe.
    BackendStarted {
        /// RPC endpoint.
        endpoint: String,
        /// Number of pre-funded accounts.
        accounts: usize,
    },
    /// The naming registry was deployed or verified.
    DependencyResolved {
        /// Registry address.
        registry: Address,
    },
    /// The token contract was deployed.
    Deployed(TokenHandle),
    /// A read call was evaluated.
    Observed(Observation),
    /// A write call was mined.
    Mined {
        /// The call.
        call: WriteCall,
        /// Its receipt.
        receipt: WriteReceipt,
    },
}

/// Observer that receives harness events.
pub trait HarnessObserver: Send + Sync {
    /// Called when any harness event occurs.
    fn on_event(&self, event: &HarnessEvent);
}

/// Observer that logs events via tracing.
///
/// Deployment addresses, observations and receipts are logged at `info`
/// when `verbose` is set and at `debug` otherwise. State changes are always
/// `debug`.
#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingObserver {
    verbose: bool,
}

impl LoggingObserver {
    /// Creates a logging observer.
    pub const fn new(verbose: bool) -> Self {
        Self { verbose }
    }
}

macro_rules! observe {
    ($verbose:expr, $($arg:tt)+) => {
        if $verbose {
            tracing::info!($($arg)+);
        } else {
            tracing::debug!($($arg)+);
        }
    };
}

impl HarnessObserver for LoggingObserver {
    fn on_event(&self, event: &HarnessEvent) {
        match event {
            HarnessEvent::StateChanged { from, to } => {
                tracing::debug!(%from, %to, "harness state changed");
            }
            HarnessEvent::BackendStarted { endpoint, accounts } => {
                observe!(self.verbose, endpoint = %endpoint, accounts, "backend started");
            }
            HarnessEvent::DependencyResolved { registry } => {
                observe!(self.verbose, %registry, "naming registry resolved");
            }
            HarnessEvent::Deployed(token) => {
                observe!(
                    self.verbose,
                    address = %token.address,
                    deployer = %token.deployer,
                    block = token.block_number,
                    "token deployed"
                );
            }
            HarnessEvent::Observed(observation) => {
                observe!(
                    self.verbose,
                    call = %observation.call,
                    value = %observation.value,
                    block = observation.block_number,
                    "observed"
                );
            }
            HarnessEvent::Mined { call, receipt } => {
                observe!(
                    self.verbose,
                    %call,
                    tx = %receipt.tx_hash,
                    block = receipt.block_number,
                    gas_used = receipt.gas_used,
                    "write mined"
                );
            }
        }
    }
}

/// Observer that records every event. Used in tests.
#[derive(Debug, Default)]
pub struct RecordingObserver {
    events: std::sync::Mutex<Vec<HarnessEvent>>,
}

impl RecordingObserver {
    /// Returns a copy of the events recorded so far.
    pub fn events(&self) -> Vec<HarnessEvent> {
        self.events.lock().unwrap().clone()
    }
}

impl HarnessObserver for RecordingObserver {
    fn on_event(&self, event: &HarnessEvent) {
        self.events.lock().unwrap().push(event.clone());
    }
}
