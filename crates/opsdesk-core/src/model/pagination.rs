//! Offset pagination shared by every `list` operation

use serde::Serialize;

pub const DEFAULT_LIST_LIMIT: u32 = 10;
pub const MAX_LIST_LIMIT: u32 = 100;

/// Validated window into a listing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub limit: u32,
    pub offset: u64,
}

impl PageRequest {
    /// Build a page request, rejecting limits outside `1..=MAX_LIST_LIMIT`
    pub fn new(limit: u32, offset: u64) -> Option<Self> {
        (1..=MAX_LIST_LIMIT)
            .contains(&limit)
            .then_some(Self { limit, offset })
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            limit: DEFAULT_LIST_LIMIT,
            offset: 0,
        }
    }
}

/// A page of rows plus the total under the same predicate
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub limit: u32,
    pub offset: u64,
}
