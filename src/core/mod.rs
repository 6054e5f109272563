//! Core pipeline of the user query endpoint
//!
//! Parameters flow through the modules in this order: `params` (decoding),
//! `whitelist` (allowed names), `args` (defaults and value filters),
//! `executor` (engine call), `response` (body and totals). `pipeline` wires
//! them together and `hooks` is consulted at every step.

pub mod args;
pub mod coerce;
pub mod engine;
pub mod error;
pub mod executor;
pub mod hooks;
pub mod params;
pub mod pipeline;
pub mod query;
pub mod response;
pub mod user;
pub mod whitelist;

pub use args::QueryArgs;
pub use engine::{UserQueryEngine, UserQueryResult};
pub use error::{ErrorResponse, UserQueryError};
pub use hooks::{DEFAULT_PRIORITY, Hook, HookRegistry};
pub use params::{RequestParameters, RestRequest};
pub use pipeline::run_user_query;
pub use query::Pagination;
pub use response::UserQueryResponse;
pub use user::UserRecord;
pub use whitelist::AllowedParameterSet;
