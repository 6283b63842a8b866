//! PowerSchool named-query connector: OAuth client credentials, bearer
//! query calls, row-window pagination and record normalization.

pub mod client;
pub mod mapper;
pub mod models;
pub mod paging;
pub mod token;

pub use client::PowerSchoolClient;
pub use mapper::RecordTransformer;
pub use models::{QueryOutcome, QueryResponse, RawRecord};
pub use paging::PaginatedCollector;
pub use token::{IssuedToken, TokenManager};
