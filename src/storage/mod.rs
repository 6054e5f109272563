//! User directory backends

pub mod in_memory;
pub mod meta_query;
pub mod query_vars;

pub use in_memory::InMemoryUserStore;
pub use meta_query::MetaQuery;
pub use query_vars::QueryVars;
