//! Lifecycle callbacks.
//!
//! Every transaction carries one [`TransactionListener`]. The validation gate fires the
//! kind's `*_prepared` callback once; the adapter then fires `*_initiated` before the
//! network call and exactly one of `*_succeeded` / `*_failed` after the result is
//! attached.
//!
//! All callbacks default to no-ops, so an implementation overrides only what it needs.
//!
//! # Examples
//!
//! ```
//! use iveri_gateway::transaction::{Transaction, TransactionListener};
//!
//! #[derive(Debug)]
//! struct Receipts;
//!
//! impl TransactionListener for Receipts {
//!     fn debit_succeeded(&self, transaction: &Transaction) {
//!         println!("paid: {}", transaction.id());
//!     }
//! }
//! ```

use std::fmt;

use tracing::{info, warn};

use super::{Transaction, TransactionKind};

/// Point in a transaction's lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LifecycleEvent {
    /// Validation passed.
    Prepared,
    /// Request about to be sent.
    Initiated,
    /// Result attached, no error.
    Succeeded,
    /// Result attached, error present.
    Failed,
}

impl LifecycleEvent {
    /// Lower-case event name for logging.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Prepared => "prepared",
            Self::Initiated => "initiated",
            Self::Succeeded => "succeeded",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for LifecycleEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lifecycle hooks for the three transaction kinds.
pub trait TransactionListener: Send + Sync + fmt::Debug {
    /// 3-D Secure lookup passed validation.
    fn lookup_prepared(&self, _transaction: &Transaction) {}
    /// 3-D Secure lookup is about to be sent.
    fn lookup_initiated(&self, _transaction: &Transaction) {}
    /// 3-D Secure lookup failed.
    fn lookup_failed(&self, _transaction: &Transaction) {}
    /// 3-D Secure lookup succeeded.
    fn lookup_succeeded(&self, _transaction: &Transaction) {}

    /// 3-D Secure authorize passed validation.
    fn authorize_prepared(&self, _transaction: &Transaction) {}
    /// 3-D Secure authorize is about to be sent.
    fn authorize_initiated(&self, _transaction: &Transaction) {}
    /// 3-D Secure authorize failed.
    fn authorize_failed(&self, _transaction: &Transaction) {}
    /// 3-D Secure authorize succeeded.
    fn authorize_succeeded(&self, _transaction: &Transaction) {}

    /// Debit passed validation.
    fn debit_prepared(&self, _transaction: &Transaction) {}
    /// Debit is about to be sent.
    fn debit_initiated(&self, _transaction: &Transaction) {}
    /// Debit failed.
    fn debit_failed(&self, _transaction: &Transaction) {}
    /// Debit succeeded.
    fn debit_succeeded(&self, _transaction: &Transaction) {}
}

/// Routes `event` for `kind` to the matching listener callback.
pub(crate) fn notify(
    listener: &dyn TransactionListener,
    kind: TransactionKind,
    event: LifecycleEvent,
    transaction: &Transaction,
) {
    use LifecycleEvent::{Failed, Initiated, Prepared, Succeeded};
    use TransactionKind::{Debit, ThreeDSecureAuthorize, ThreeDSecureLookup};

    match (kind, event) {
        (ThreeDSecureLookup, Prepared) => listener.lookup_prepared(transaction),
        (ThreeDSecureLookup, Initiated) => listener.lookup_initiated(transaction),
        (ThreeDSecureLookup, Failed) => listener.lookup_failed(transaction),
        (ThreeDSecureLookup, Succeeded) => listener.lookup_succeeded(transaction),
        (ThreeDSecureAuthorize, Prepared) => listener.authorize_prepared(transaction),
        (ThreeDSecureAuthorize, Initiated) => listener.authorize_initiated(transaction),
        (ThreeDSecureAuthorize, Failed) => listener.authorize_failed(transaction),
        (ThreeDSecureAuthorize, Succeeded) => listener.authorize_succeeded(transaction),
        (Debit, Prepared) => listener.debit_prepared(transaction),
        (Debit, Initiated) => listener.debit_initiated(transaction),
        (Debit, Failed) => listener.debit_failed(transaction),
        (Debit, Succeeded) => listener.debit_succeeded(transaction),
    }
}

/// Listener that ignores every callback.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopListener;

impl TransactionListener for NoopListener {}

/// Listener that logs every callback through `tracing`.
///
/// Logs the transaction id, kind and outcome only; card data never reaches the log.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingListener;

impl TracingListener {
    fn record(transaction: &Transaction, kind: TransactionKind, event: LifecycleEvent) {
        match event {
            LifecycleEvent::Failed => warn!(
                transaction_id = %transaction.id(),
                kind = %kind,
                event = %event,
                error_code = transaction.error_code().unwrap_or_default(),
                error_message = transaction.error_message().unwrap_or_default(),
                "transaction lifecycle"
            ),
            _ => info!(
                transaction_id = %transaction.id(),
                kind = %kind,
                event = %event,
                "transaction lifecycle"
            ),
        }
    }
}

impl TransactionListener for TracingListener {
    fn lookup_prepared(&self, t: &Transaction) {
        Self::record(t, TransactionKind::ThreeDSecureLookup, LifecycleEvent::Prepared);
    }
    fn lookup_initiated(&self, t: &Transaction) {
        Self::record(t, TransactionKind::ThreeDSecureLookup, LifecycleEvent::Initiated);
    }
    fn lookup_failed(&self, t: &Transaction) {
        Self::record(t, TransactionKind::ThreeDSecureLookup, LifecycleEvent::Failed);
    }
    fn lookup_succeeded(&self, t: &Transaction) {
        Self::record(t, TransactionKind::ThreeDSecureLookup, LifecycleEvent::Succeeded);
    }
    fn authorize_prepared(&self, t: &Transaction) {
        Self::record(t, TransactionKind::ThreeDSecureAuthorize, LifecycleEvent::Prepared);
    }
    fn authorize_initiated(&self, t: &Transaction) {
        Self::record(t, TransactionKind::ThreeDSecureAuthorize, LifecycleEvent::Initiated);
    }
    fn authorize_failed(&self, t: &Transaction) {
        Self::record(t, TransactionKind::ThreeDSecureAuthorize, LifecycleEvent::Failed);
    }
    fn authorize_succeeded(&self, t: &Transaction) {
        Self::record(t, TransactionKind::ThreeDSecureAuthorize, LifecycleEvent::Succeeded);
    }
    fn debit_prepared(&self, t: &Transaction) {
        Self::record(t, TransactionKind::Debit, LifecycleEvent::Prepared);
    }
    fn debit_initiated(&self, t: &Transaction) {
        Self::record(t, TransactionKind::Debit, LifecycleEvent::Initiated);
    }
    fn debit_failed(&self, t: &Transaction) {
        Self::record(t, TransactionKind::Debit, LifecycleEvent::Failed);
    }
    fn debit_succeeded(&self, t: &Transaction) {
        Self::record(t, TransactionKind::Debit, LifecycleEvent::Succeeded);
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use super::*;

    #[derive(Debug, Default)]
    struct Recorder(Mutex<Vec<String>>);

    impl Recorder {
        fn push(&self, name: &str) {
            self.0.lock().unwrap().push(name.to_owned());
        }
    }

    impl TransactionListener for Recorder {
        fn lookup_prepared(&self, _: &Transaction) {
            self.push("lookup_prepared");
        }
        fn authorize_failed(&self, _: &Transaction) {
            self.push("authorize_failed");
        }
        fn debit_succeeded(&self, _: &Transaction) {
            self.push("debit_succeeded");
        }
    }

    #[test]
    fn test_notify_routes_to_matching_callback() {
        let recorder = Arc::new(Recorder::default());
        let transaction = Transaction::new(recorder.clone());

        notify(recorder.as_ref(), TransactionKind::ThreeDSecureLookup, LifecycleEvent::Prepared, &transaction);
        notify(recorder.as_ref(), TransactionKind::ThreeDSecureAuthorize, LifecycleEvent::Failed, &transaction);
        notify(recorder.as_ref(), TransactionKind::Debit, LifecycleEvent::Succeeded, &transaction);
        notify(recorder.as_ref(), TransactionKind::Debit, LifecycleEvent::Initiated, &transaction);

        let calls = recorder.0.lock().unwrap().clone();
        assert_eq!(calls, vec!["lookup_prepared", "authorize_failed", "debit_succeeded"]);
    }

    #[test]
    fn test_noop_listener_accepts_every_event() {
        let transaction = Transaction::new(Arc::new(NoopListener));
        for kind in TransactionKind::ALL {
            for event in [
                LifecycleEvent::Prepared,
                LifecycleEvent::Initiated,
                LifecycleEvent::Succeeded,
                LifecycleEvent::Failed,
            ] {
                notify(&NoopListener, kind, event, &transaction);
            }
        }
    }

    #[test]
    fn test_tracing_listener_without_subscriber() {
        let transaction = Transaction::new(Arc::new(TracingListener));
        notify(&TracingListener, TransactionKind::Debit, LifecycleEvent::Failed, &transaction);
        notify(&TracingListener, TransactionKind::Debit, LifecycleEvent::Succeeded, &transaction);
    }

    #[test]
    fn test_lifecycle_event_display() {
        assert_eq!(LifecycleEvent::Initiated.to_string(), "initiated");
        assert_eq!(LifecycleEvent::Failed.as_str(), "failed");
    }
}
