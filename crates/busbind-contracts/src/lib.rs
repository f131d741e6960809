//! Shared, version-pinned schema identifiers.
//!
//! These constants are the single source of truth for the schema/version
//! strings that appear in machine-readable output.

pub const BINDING_MODEL_SCHEMA_VERSION: &str = "busbind.model@0.1.0";
pub const BUSBINDC_REPORT_SCHEMA_VERSION: &str = "busbindc.report@0.1.0";
