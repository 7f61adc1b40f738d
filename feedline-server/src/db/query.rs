use feedline_types::SortOption;

/// Sentinel category meaning "no category filter".
pub const ALL_CATEGORIES: &str = "All Categories";

/// One predicate on the post feed. Filters are combined with AND.
#[derive(Debug, Clone, PartialEq)]
pub enum PostFilter {
    /// Substring match against post text or author first/last name.
    Search(String),
    /// Exact category match.
    Category(String),
    /// Inclusive lower bound on the date portion of post_date.
    DateFrom(String),
    /// Inclusive upper bound on the date portion of post_date.
    DateTo(String),
    /// Substring match on author first name.
    FirstName(String),
    /// Substring match on author last name.
    LastName(String),
}

/// Build a parameterized WHERE clause for the post/author join.
/// An empty filter list yields an always-true predicate.
pub fn where_clause(filters: &[PostFilter]) -> (String, Vec<String>) {
    let mut fragments: Vec<&'static str> = Vec::new();
    let mut params: Vec<String> = Vec::new();

    for filter in filters {
        match filter {
            PostFilter::Search(term) => {
                fragments.push("(p.text LIKE ? OR a.first_name LIKE ? OR a.last_name LIKE ?)");
                let pattern = format!("%{term}%");
                params.push(pattern.clone());
                params.push(pattern.clone());
                params.push(pattern);
            }
            PostFilter::Category(category) => {
                fragments.push("p.category = ?");
                params.push(category.clone());
            }
            PostFilter::DateFrom(date) => {
                fragments.push("DATE(p.post_date) >= ?");
                params.push(date.clone());
            }
            PostFilter::DateTo(date) => {
                fragments.push("DATE(p.post_date) <= ?");
                params.push(date.clone());
            }
            PostFilter::FirstName(name) => {
                fragments.push("a.first_name LIKE ?");
                params.push(format!("%{name}%"));
            }
            PostFilter::LastName(name) => {
                fragments.push("a.last_name LIKE ?");
                params.push(format!("%{name}%"));
            }
        }
    }

    let clause = if fragments.is_empty() {
        "1=1".to_string()
    } else {
        fragments.join(" AND ")
    };
    (clause, params)
}

/// ORDER BY key for a sort option; every option orders descending.
pub fn order_clause(sort: SortOption) -> &'static str {
    match sort {
        SortOption::MostRecent => "p.post_date DESC",
        SortOption::HighestEngagement => "p.total_engagements DESC",
        SortOption::MostLiked => "p.likes DESC",
        SortOption::MostCommented => "p.comments DESC",
    }
}

/// A 1-indexed page request. Out-of-range inputs are clamped rather than
/// rejected so a bad query string can never underflow the OFFSET.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: i64,
    pub per_page: i64,
}

impl PageRequest {
    pub fn new(page: i64, per_page: i64) -> Self {
        Self {
            page: page.max(1),
            per_page: per_page.max(1),
        }
    }

    pub fn offset(&self) -> i64 {
        (self.page - 1) * self.per_page
    }

    /// ceil(total / per_page), with a floor of one page even when empty.
    pub fn total_pages(&self, total: i64) -> i64 {
        ((total + self.per_page - 1) / self.per_page).max(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn empty_filters_are_always_true() {
        let (clause, params) = where_clause(&[]);
        assert_eq!(clause, "1=1");
        assert!(params.is_empty());
    }

    #[test]
    fn search_expands_to_three_like_params() {
        let (clause, params) = where_clause(&[PostFilter::Search("rust".to_string())]);
        assert_eq!(
            clause,
            "(p.text LIKE ? OR a.first_name LIKE ? OR a.last_name LIKE ?)"
        );
        assert_eq!(params, vec!["%rust%", "%rust%", "%rust%"]);
    }

    #[test]
    fn filters_join_with_and_in_order() {
        let filters = [
            PostFilter::Category("Product".to_string()),
            PostFilter::DateFrom("2024-01-01".to_string()),
            PostFilter::DateTo("2024-12-31".to_string()),
            PostFilter::LastName("Doe".to_string()),
        ];
        let (clause, params) = where_clause(&filters);
        assert_eq!(
            clause,
            "p.category = ? AND DATE(p.post_date) >= ? AND DATE(p.post_date) <= ? AND a.last_name LIKE ?"
        );
        assert_eq!(params, vec!["Product", "2024-01-01", "2024-12-31", "%Doe%"]);
    }

    #[test]
    fn order_clause_mapping() {
        assert_eq!(order_clause(SortOption::MostRecent), "p.post_date DESC");
        assert_eq!(
            order_clause(SortOption::HighestEngagement),
            "p.total_engagements DESC"
        );
        assert_eq!(order_clause(SortOption::MostLiked), "p.likes DESC");
        assert_eq!(order_clause(SortOption::MostCommented), "p.comments DESC");
    }

    #[test]
    fn page_request_clamps_and_offsets() {
        let page = PageRequest::new(0, 0);
        assert_eq!(page, PageRequest::new(1, 1));
        assert_eq!(page.offset(), 0);

        let page = PageRequest::new(3, 10);
        assert_eq!(page.offset(), 20);
    }

    #[test]
    fn total_pages_has_floor_of_one() {
        let page = PageRequest::new(1, 10);
        assert_eq!(page.total_pages(0), 1);
        assert_eq!(page.total_pages(1), 1);
        assert_eq!(page.total_pages(10), 1);
        assert_eq!(page.total_pages(11), 2);
    }

    proptest! {
        #[test]
        fn total_pages_is_ceiling_division(total in 0i64..1_000_000, per_page in 1i64..1000) {
            let page = PageRequest::new(1, per_page);
            let expected = if total == 0 {
                1
            } else {
                (total as f64 / per_page as f64).ceil() as i64
            };
            prop_assert_eq!(page.total_pages(total), expected);
        }

        #[test]
        fn per_page_counts_sum_to_total(total in 0i64..10_000, per_page in 1i64..100) {
            let request = PageRequest::new(1, per_page);
            let pages = request.total_pages(total);
            let mut seen = 0;
            for page in 1..=pages {
                let request = PageRequest::new(page, per_page);
                let remaining = (total - request.offset()).max(0);
                seen += remaining.min(per_page);
            }
            prop_assert_eq!(seen, total);
        }
    }
}
