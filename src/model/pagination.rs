use serde::Serialize;
use utoipa::ToSchema;

use crate::model::attendance::AttendanceEntry;

pub const MAX_PER_PAGE: u32 = 100;

/// Validated offset/limit pair. Page is at least 1 and the page size is
/// clamped to `[1, MAX_PER_PAGE]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u32,
    pub per_page: u32,
}

impl PageRequest {
    pub fn new(page: Option<i64>, per_page: Option<i64>, default_per_page: u32) -> Self {
        let page = page.unwrap_or(1).clamp(1, u32::MAX as i64) as u32;
        let per_page = per_page
            .unwrap_or(default_per_page as i64)
            .clamp(1, MAX_PER_PAGE as i64) as u32;

        Self { page, per_page }
    }

    pub fn offset(&self) -> u64 {
        (self.page as u64 - 1) * self.per_page as u64
    }

    pub fn limit(&self) -> u64 {
        self.per_page as u64
    }

    pub fn pagination(&self, total_records: u64) -> Pagination {
        Pagination {
            current_page: self.page,
            total_pages: total_records.div_ceil(self.per_page as u64),
            total_records,
            records_per_page: self.per_page,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    #[schema(example = 1)]
    pub current_page: u32,
    #[schema(example = 3)]
    pub total_pages: u64,
    #[schema(example = 25)]
    pub total_records: u64,
    #[schema(example = 10)]
    pub records_per_page: u32,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct AttendancePage {
    pub attendance: Vec<AttendanceEntry>,
    pub pagination: Pagination,
}
