/// Audit trail core
///
/// Two halves:
///
/// - [`recorder`]: the write path. Appends immutable entries as a side
///   effect of tracked actions, retrying transient storage failures so the
///   triggering action never fails because of its audit record.
/// - [`query`]: the read path. Account-scoped, policy-gated, filtered and
///   paginated retrieval with deterministic newest-first ordering.
///
/// The underlying row model lives in [`crate::models::audit_log`].

pub mod query;
pub mod recorder;
