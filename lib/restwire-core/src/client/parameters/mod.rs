//! Request parameter rendering.
//!
//! This module provides:
//!
//! - [`ParamStyle`] - How array values are rendered in paths, queries and headers
//! - [`CustomHeaders`] - Caller-supplied headers applied last
//! - Path template resolution and query string building, used by the executor

mod param;
pub use self::param::ParamStyle;
pub(in crate::client) use self::param::{render_path_value, render_query_values, render_value};

mod path;
pub(in crate::client) use self::path::{PathResolved, placeholders};

mod query;
pub(in crate::client) use self::query::QueryPairs;

mod headers;
pub use self::headers::CustomHeaders;
