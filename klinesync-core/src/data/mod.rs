//! Remote data source: trait, scoped session, HTTP client.

pub mod http;
pub mod provider;
pub mod session;

pub use http::HttpSource;
pub use provider::{
    DataError, DataSource, QueryRequest, Row, RowBatch, RowCursor, SessionHandle, Status,
    VecCursor,
};
pub use session::Session;
