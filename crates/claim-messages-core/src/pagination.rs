use std::num::NonZeroU32;

use crate::model::{PageDescriptor, PartialPageDescriptor};

pub const DEFAULT_PAGE_SIZE: NonZeroU32 = match NonZeroU32::new(10) {
    Some(size) => size,
    None => unreachable!(),
};

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct PaginationConfig {
    /// Page size used when neither the caller nor the upstream service supplies a positive one.
    pub default_page_size: NonZeroU32,
}

impl Default for PaginationConfig {
    fn default() -> Self {
        Self { default_page_size: DEFAULT_PAGE_SIZE }
    }
}

/// Derives one consistent [`PageDescriptor`] from the requested paging and
/// whatever subset of page metadata the upstream service reported.
#[derive(Debug, Clone, Copy, Default)]
pub struct PaginationReconciler {
    config: PaginationConfig,
}

impl PaginationReconciler {
    #[must_use]
    pub fn new(config: PaginationConfig) -> Self {
        Self { config }
    }

    #[must_use]
    pub fn default_page_size(&self) -> u32 {
        self.config.default_page_size.get()
    }

    /// Reconcile the requested page/size with upstream metadata.
    ///
    /// Upstream values win field by field when present. Number is clamped to
    /// zero, a non-positive size falls back to the requested size and then to
    /// the configured default, and missing totals count as zero. When the
    /// upstream service omits `total_pages` it is derived from
    /// `total_elements` and the reconciled size.
    #[must_use]
    pub fn reconcile(
        &self,
        requested_page: i32,
        requested_size: i32,
        upstream: Option<&PartialPageDescriptor>,
    ) -> PageDescriptor {
        let upstream = upstream.copied().unwrap_or_default();

        let number = upstream.number.unwrap_or_else(|| i64::from(requested_page)).max(0);
        let size = upstream
            .size
            .filter(|size| *size > 0)
            .or_else(|| Some(i64::from(requested_size)).filter(|size| *size > 0))
            .map_or(self.default_page_size(), saturate_u32);
        let total_elements = upstream.total_elements.map_or(0, saturate_u64);
        let total_pages = upstream
            .total_pages
            .map_or_else(|| total_pages_for(total_elements, u64::from(size)), saturate_u64);

        PageDescriptor { number: saturate_u32(number), size, total_elements, total_pages }
    }

    /// Descriptor for a request that produced no upstream page at all.
    #[must_use]
    pub fn from_request(&self, requested_page: i32, requested_size: i32) -> PageDescriptor {
        self.reconcile(requested_page, requested_size, None)
    }
}

fn total_pages_for(total_elements: u64, size: u64) -> u64 {
    if size == 0 {
        return u64::from(total_elements > 0);
    }
    total_elements.div_ceil(size)
}

fn saturate_u32(value: i64) -> u32 {
    u32::try_from(value.max(0)).unwrap_or(u32::MAX)
}

fn saturate_u64(value: i64) -> u64 {
    u64::try_from(value).unwrap_or(0)
}
