//! Structured log macros.
//!
//! Every ledger log line carries a `subsystem` field so the JSON output can be
//! filtered per component:
//! - `identity`, `asset_graph`, `exchange`, `traceability`, `runtime`

/// Log an event stamped with its subsystem.
#[macro_export]
macro_rules! log_event {
    // Info level with subsystem
    (info, $subsystem:expr, $msg:expr $(, $($field:tt)*)?) => {
        tracing::info!(
            subsystem = $subsystem,
            $($($field)*,)?
            $msg
        )
    };

    // Warn level with subsystem
    (warn, $subsystem:expr, $msg:expr $(, $($field:tt)*)?) => {
        tracing::warn!(
            subsystem = $subsystem,
            $($($field)*,)?
            $msg
        )
    };

    // Error level with subsystem
    (error, $subsystem:expr, $msg:expr $(, $($field:tt)*)?) => {
        tracing::error!(
            subsystem = $subsystem,
            $($($field)*,)?
            $msg
        )
    };

    // Debug level with subsystem
    (debug, $subsystem:expr, $msg:expr $(, $($field:tt)*)?) => {
        tracing::debug!(
            subsystem = $subsystem,
            $($($field)*,)?
            $msg
        )
    };
}

/// Log an event about one asset graph node with standard fields.
#[macro_export]
macro_rules! log_node_event {
    ($level:ident, $subsystem:expr, $msg:expr, $node:expr $(, $($field:tt)*)?) => {
        tracing::$level!(
            subsystem = $subsystem,
            node = %$node,
            $($($field)*,)?
            $msg
        )
    };
}

/// Log an event about one buy request with standard fields.
#[macro_export]
macro_rules! log_request_event {
    ($level:ident, $subsystem:expr, $msg:expr, $request:expr $(, $($field:tt)*)?) => {
        tracing::$level!(
            subsystem = $subsystem,
            request = %$request,
            $($($field)*,)?
            $msg
        )
    };
}
