//! OTLP wire-message encoding.
//!
//! This module converts batches of [`TelemetryEvent`](crate::models::TelemetryEvent)s
//! into the protobuf request structures sent to a collector. Each request
//! carries exactly one resource; within it, records are grouped by
//! instrumentation scope (the event's source context) in first-seen order.

pub mod common;
pub mod logs;
pub mod resource;
pub mod traces;

pub use logs::build_logs_request;
pub use resource::{add_defaults, build_resource};
pub use traces::build_traces_request;

/// Scope-group bookkeeping shared by the logs and traces builders.
pub(crate) mod scope_groups {
    use opentelemetry_proto::tonic::common::v1::InstrumentationScope;

    /// Appends an item to its scope group, creating the group at the end of
    /// the list on first sight so first-seen order is preserved.
    pub(crate) fn push<T>(
        groups: &mut Vec<(Option<String>, Vec<T>)>,
        scope: Option<&str>,
        item: T,
    ) {
        if let Some((_, items)) = groups
            .iter_mut()
            .find(|(name, _)| name.as_deref() == scope)
        {
            items.push(item);
        } else {
            groups.push((scope.map(ToOwned::to_owned), vec![item]));
        }
    }

    /// Materializes a scope group key as an OTLP instrumentation scope;
    /// the scope-less group stays `None` on the wire.
    pub(crate) fn to_scope(name: Option<String>) -> Option<InstrumentationScope> {
        name.map(|name| InstrumentationScope {
            name,
            ..Default::default()
        })
    }
}
