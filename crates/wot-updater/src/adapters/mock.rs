//! Recording connector for tests and local development.
//!
//! Records every call in order, can fail selected operations, and can hold
//! calls at a gate so a test can keep the worker busy while it queues more
//! jobs behind it.

use crate::domain::{IdentityId, TrustScore};
use crate::error::ConnectorError;
use crate::ports::outbound::WebOfTrustConnector;
use parking_lot::{Condvar, Mutex, RwLock};
use std::collections::HashSet;
use std::time::{Duration, Instant};

/// A call observed by [`RecordingConnector`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ConnectorCall {
    /// `set_trust`
    SetTrust {
        /// Identity assigning the trust
        truster: IdentityId,
        /// Identity receiving the trust
        trustee: IdentityId,
        /// Score sent to the backend
        score: TrustScore,
        /// Comment sent with the score
        comment: Option<String>,
    },
    /// `remove_trust`
    RemoveTrust {
        /// Identity that assigned the trust
        truster: IdentityId,
        /// Identity that received the trust
        trustee: IdentityId,
    },
    /// `add_context`
    AddContext {
        /// Own identity changed
        own_identity: IdentityId,
        /// Context added
        context: String,
    },
    /// `remove_context`
    RemoveContext {
        /// Own identity changed
        own_identity: IdentityId,
        /// Context removed
        context: String,
    },
    /// `set_property`
    SetProperty {
        /// Own identity changed
        own_identity: IdentityId,
        /// Property name
        name: String,
        /// Property value
        value: String,
    },
    /// `remove_property`
    RemoveProperty {
        /// Own identity changed
        own_identity: IdentityId,
        /// Property name
        name: String,
    },
}

impl ConnectorCall {
    /// Connector operation name, as used by [`RecordingConnector::fail_operation`].
    pub fn operation(&self) -> &'static str {
        match self {
            Self::SetTrust { .. } => "set_trust",
            Self::RemoveTrust { .. } => "remove_trust",
            Self::AddContext { .. } => "add_context",
            Self::RemoveContext { .. } => "remove_context",
            Self::SetProperty { .. } => "set_property",
            Self::RemoveProperty { .. } => "remove_property",
        }
    }
}

type CallHook = Box<dyn Fn(&ConnectorCall) + Send + Sync>;

/// Connector that records calls instead of talking to a backend.
#[derive(Default)]
pub struct RecordingConnector {
    calls: Mutex<Vec<ConnectorCall>>,
    call_recorded: Condvar,
    failing: RwLock<HashSet<&'static str>>,
    gate_closed: Mutex<bool>,
    gate_opened: Condvar,
    on_call: Option<CallHook>,
}

impl RecordingConnector {
    /// Creates a connector that accepts every call.
    pub fn new() -> Self {
        Self::default()
    }

    /// Runs `hook` at the start of every call, before it is recorded.
    pub fn with_hook(hook: impl Fn(&ConnectorCall) + Send + Sync + 'static) -> Self {
        Self {
            on_call: Some(Box::new(hook)),
            ..Self::default()
        }
    }

    /// Makes every future call of `operation` fail with a backend fault.
    pub fn fail_operation(&self, operation: &'static str) {
        self.failing.write().insert(operation);
    }

    /// Lets future calls of `operation` succeed again.
    pub fn heal_operation(&self, operation: &'static str) {
        self.failing.write().remove(operation);
    }

    /// Holds every following call (after recording it) until [`Self::open_gate`].
    pub fn close_gate(&self) {
        *self.gate_closed.lock() = true;
    }

    /// Releases held calls.
    pub fn open_gate(&self) {
        *self.gate_closed.lock() = false;
        self.gate_opened.notify_all();
    }

    /// Calls recorded so far, in order.
    pub fn calls(&self) -> Vec<ConnectorCall> {
        self.calls.lock().clone()
    }

    /// Number of calls recorded so far.
    pub fn call_count(&self) -> usize {
        self.calls.lock().len()
    }

    /// Blocks until at least `count` calls were recorded or `timeout` passed.
    /// Returns whether the count was reached.
    pub fn wait_for_calls(&self, count: usize, timeout: Duration) -> bool {
        let mut calls = self.calls.lock();
        let deadline = Instant::now().checked_add(timeout);
        while calls.len() < count {
            match deadline {
                Some(deadline) => {
                    if self.call_recorded.wait_until(&mut calls, deadline).timed_out() {
                        return calls.len() >= count;
                    }
                }
                None => self.call_recorded.wait(&mut calls),
            }
        }
        true
    }

    fn handle(&self, call: ConnectorCall) -> Result<(), ConnectorError> {
        if let Some(hook) = &self.on_call {
            hook(&call);
        }
        let operation = call.operation();
        self.calls.lock().push(call);
        self.call_recorded.notify_all();

        let mut closed = self.gate_closed.lock();
        while *closed {
            self.gate_opened.wait(&mut closed);
        }
        drop(closed);

        if self.failing.read().contains(operation) {
            return Err(ConnectorError::fault(operation, "configured to fail"));
        }
        Ok(())
    }
}

impl WebOfTrustConnector for RecordingConnector {
    fn set_trust(
        &self,
        truster: &IdentityId,
        trustee: &IdentityId,
        score: TrustScore,
        comment: Option<&str>,
    ) -> Result<(), ConnectorError> {
        self.handle(ConnectorCall::SetTrust {
            truster: truster.clone(),
            trustee: trustee.clone(),
            score,
            comment: comment.map(str::to_string),
        })
    }

    fn remove_trust(
        &self,
        truster: &IdentityId,
        trustee: &IdentityId,
    ) -> Result<(), ConnectorError> {
        self.handle(ConnectorCall::RemoveTrust {
            truster: truster.clone(),
            trustee: trustee.clone(),
        })
    }

    fn add_context(&self, own_identity: &IdentityId, context: &str) -> Result<(), ConnectorError> {
        self.handle(ConnectorCall::AddContext {
            own_identity: own_identity.clone(),
            context: context.to_string(),
        })
    }

    fn remove_context(
        &self,
        own_identity: &IdentityId,
        context: &str,
    ) -> Result<(), ConnectorError> {
        self.handle(ConnectorCall::RemoveContext {
            own_identity: own_identity.clone(),
            context: context.to_string(),
        })
    }

    fn set_property(
        &self,
        own_identity: &IdentityId,
        name: &str,
        value: &str,
    ) -> Result<(), ConnectorError> {
        self.handle(ConnectorCall::SetProperty {
            own_identity: own_identity.clone(),
            name: name.to_string(),
            value: value.to_string(),
        })
    }

    fn remove_property(&self, own_identity: &IdentityId, name: &str) -> Result<(), ConnectorError> {
        self.handle(ConnectorCall::RemoveProperty {
            own_identity: own_identity.clone(),
            name: name.to_string(),
        })
    }
}
