//! Pagination totals for user query responses

use crate::core::args::QueryArgs;
use crate::core::coerce::intval;
use serde::Serialize;
use serde_json::Value;

/// Pagination totals reported alongside a page of users
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Pagination {
    /// Total number of matching users (after filters, before paging)
    pub total: u64,

    /// Page size the totals were computed with
    pub page_size: u64,

    /// Total number of pages
    pub total_pages: u64,
}

impl Pagination {
    /// Compute totals from a match count and a page size
    ///
    /// A page size of zero means "everything on one page".
    pub fn new(total: u64, page_size: u64) -> Self {
        let total_pages = if page_size == 0 {
            1
        } else {
            total.div_ceil(page_size)
        };

        Self {
            total,
            page_size,
            total_pages,
        }
    }

    /// Totals for a result queried with `args`
    pub fn from_args(total: u64, args: &QueryArgs) -> Self {
        Self::new(total, page_size(args))
    }
}

/// Effective page size: the integer value of `number`
///
/// Unset, non-numeric and negative values (`-1` asks for every user) all
/// count as zero.
pub fn page_size(args: &QueryArgs) -> u64 {
    args.get("number").map_or(0, number_to_page_size)
}

fn number_to_page_size(number: &Value) -> u64 {
    u64::try_from(intval(number)).unwrap_or(0)
}
