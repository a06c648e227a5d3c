
use super::{TransportFault, connection_failure};
use crate::transaction::TransactionKind;

#[test]
fn test_connection_failure_result() {
    let result = connection_failure(TransactionKind::Debit, &TransportFault::Status(502));

    assert!(!result.is_success());
    assert_eq!(result.kind(), TransactionKind::Debit);
    assert_eq!(result.error_code(), Some("N0001"));
    assert_eq!(
        result.error_message(),
        Some("Connection Error: gateway responded with HTTP status 502")
    );
}

#[test]
fn test_connection_failure_keeps_kind() {
    let fault = TransportFault::Malformed("invalid JSON: EOF".to_owned());
    let result = connection_failure(TransactionKind::ThreeDSecureLookup, &fault);
    assert_eq!(result.kind(), TransactionKind::ThreeDSecureLookup);
    assert_eq!(result.error_code(), Some("N0001"));
}
