//! catsel Field - Admin Category Select
//!
//! The outermost layer: wraps the cached category tree provider in a form
//! field that hands the admin UI its ui-select configuration, and owns
//! tracing subscriber setup for embedding applications.

pub mod component;
pub mod error;
pub mod field;
pub mod telemetry;

pub use component::{split_value, ComponentJsConfig, FieldSettings};
pub use error::{FieldError, FieldResult};
pub use field::{CategorySelectField, FieldElement};
pub use telemetry::{init_tracing, LogFormat, TelemetryConfig, DEFAULT_FILTER};
