use mingle_types::api::Paginated;

/// Fixed page size shared by every listing endpoint.
pub const ITEMS_PER_PAGE: u64 = 4;

/// A 1-based page resolved from an optional path segment.
pub struct Pager {
    pub page: u64,
    pub limit: u64,
    pub offset: u64,
}

impl Pager {
    pub fn new(page: Option<u64>) -> Self {
        let page = page.unwrap_or(1).max(1);
        Pager {
            page,
            limit: ITEMS_PER_PAGE,
            offset: (page - 1) * ITEMS_PER_PAGE,
        }
    }
}

pub fn page_count(total: u64) -> u64 {
    total.div_ceil(ITEMS_PER_PAGE)
}

pub fn paginate<T>(total: u64, pager: &Pager, items: Vec<T>) -> Paginated<T> {
    Paginated {
        total,
        pages: page_count(total),
        page: pager.page,
        items,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_count_is_ceiling_division() {
        assert_eq!(page_count(0), 0);
        assert_eq!(page_count(1), 1);
        assert_eq!(page_count(4), 1);
        assert_eq!(page_count(5), 2);
        assert_eq!(page_count(8), 2);
        assert_eq!(page_count(9), 3);
    }

    #[test]
    fn pager_defaults_and_offsets() {
        let first = Pager::new(None);
        assert_eq!((first.page, first.offset), (1, 0));

        let third = Pager::new(Some(3));
        assert_eq!((third.page, third.offset), (3, 8));

        // Page zero clamps to the first page
        let zero = Pager::new(Some(0));
        assert_eq!((zero.page, zero.offset), (1, 0));
    }
}
