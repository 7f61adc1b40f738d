use serde::{Deserialize, Serialize};

/// Sort options for the post feed. Parsed from the human-readable labels
/// the frontend sends in `sort_by`; every option orders descending.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum SortOption {
    #[default]
    MostRecent,
    HighestEngagement,
    MostLiked,
    MostCommented,
}

impl SortOption {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortOption::MostRecent => "Most Recent",
            SortOption::HighestEngagement => "Highest Engagement",
            SortOption::MostLiked => "Most Liked",
            SortOption::MostCommented => "Most Commented",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "Most Recent" => Some(SortOption::MostRecent),
            "Highest Engagement" => Some(SortOption::HighestEngagement),
            "Most Liked" => Some(SortOption::MostLiked),
            "Most Commented" => Some(SortOption::MostCommented),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_known_labels() {
        assert_eq!(SortOption::parse("Most Recent"), Some(SortOption::MostRecent));
        assert_eq!(
            SortOption::parse("Highest Engagement"),
            Some(SortOption::HighestEngagement)
        );
        assert_eq!(SortOption::parse("Most Liked"), Some(SortOption::MostLiked));
        assert_eq!(
            SortOption::parse("Most Commented"),
            Some(SortOption::MostCommented)
        );
    }

    #[test]
    fn unknown_label_is_none() {
        assert_eq!(SortOption::parse("most liked"), None);
        assert_eq!(SortOption::parse(""), None);
    }

    #[test]
    fn default_is_most_recent() {
        assert_eq!(SortOption::default(), SortOption::MostRecent);
    }
}
