//! The fixed set of topical categories.
//!
//! Categories double as search-keyword proxies against the news provider and
//! as UI filter buckets. The table is static configuration; ids are stable
//! and persisted in user preferences, so entries must never be renumbered.

/// Identifier of a category, 1..=9.
pub type CategoryId = u8;

/// A partner organization shown alongside stories in a category.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PartnerLink {
    pub label: &'static str,
    pub url: &'static str,
}

/// One topical bucket: display label, accent color, and the fixed keyword
/// query sent to the news provider for trending fetches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Category {
    pub id: CategoryId,
    pub label: &'static str,
    pub color: &'static str,
    pub keywords: &'static str,
    pub partners: &'static [PartnerLink],
}

const CATEGORIES: &[Category] = &[
    Category {
        id: 1,
        label: "Environment",
        color: "#4ade80",
        keywords: "environment climate",
        partners: &[
            PartnerLink { label: "WWF", url: "https://www.worldwildlife.org" },
            PartnerLink { label: "Greenpeace", url: "https://www.greenpeace.org" },
        ],
    },
    Category {
        id: 2,
        label: "Human Rights",
        color: "#f87171",
        keywords: "\"human rights\" OR equality",
        partners: &[
            PartnerLink { label: "Amnesty International", url: "https://www.amnesty.org" },
            PartnerLink { label: "Human Rights Watch", url: "https://www.hrw.org" },
        ],
    },
    Category {
        id: 3,
        label: "Poverty",
        color: "#fb923c",
        keywords: "poverty inequality",
        partners: &[
            PartnerLink { label: "Oxfam", url: "https://www.oxfam.org" },
            PartnerLink { label: "GiveDirectly", url: "https://www.givedirectly.org" },
        ],
    },
    Category {
        id: 4,
        label: "Health",
        color: "#34d399",
        keywords: "health wellbeing",
        partners: &[
            PartnerLink { label: "WHO", url: "https://www.who.int" },
            PartnerLink { label: "Doctors Without Borders", url: "https://www.msf.org" },
        ],
    },
    Category {
        id: 5,
        label: "Education",
        color: "#60a5fa",
        keywords: "education youth",
        partners: &[
            PartnerLink { label: "UNICEF", url: "https://www.unicef.org" },
            PartnerLink { label: "Room to Read", url: "https://www.roomtoread.org" },
        ],
    },
    Category {
        id: 6,
        label: "Politics",
        color: "#facc15",
        keywords: "politics governance democracy",
        partners: &[PartnerLink { label: "UNDP", url: "https://www.undp.org" }],
    },
    Category {
        id: 7,
        label: "Tech Ethics",
        color: "#38bdf8",
        keywords: "technology ethics AI",
        partners: &[PartnerLink { label: "EFF", url: "https://www.eff.org" }],
    },
    Category {
        id: 8,
        label: "Peace",
        color: "#c084fc",
        keywords: "conflict peace",
        partners: &[PartnerLink { label: "ICRC", url: "https://www.icrc.org" }],
    },
    Category {
        id: 9,
        label: "Culture",
        color: "#f472b6",
        keywords: "culture community",
        partners: &[PartnerLink { label: "UNESCO", url: "https://www.unesco.org" }],
    },
];

/// All categories in display order.
pub fn all() -> &'static [Category] {
    CATEGORIES
}

/// Look up a category by id. Unknown ids return `None`.
pub fn by_id(id: CategoryId) -> Option<&'static Category> {
    CATEGORIES.iter().find(|c| c.id == id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nine_categories_with_stable_ids() {
        assert_eq!(all().len(), 9);
        for (i, cat) in all().iter().enumerate() {
            assert_eq!(cat.id as usize, i + 1);
        }
    }

    #[test]
    fn test_by_id_known_and_unknown() {
        assert_eq!(by_id(1).unwrap().label, "Environment");
        assert_eq!(by_id(9).unwrap().label, "Culture");
        assert!(by_id(0).is_none());
        assert!(by_id(10).is_none());
    }

    #[test]
    fn test_every_category_has_keywords_and_a_partner() {
        for cat in all() {
            assert!(!cat.keywords.is_empty());
            assert!(!cat.partners.is_empty());
            assert!(cat.color.starts_with('#'));
        }
    }
}
