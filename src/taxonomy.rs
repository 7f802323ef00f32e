//! Compiled-in catalogs for the two picker domains.
//!
//! Organizations are grouped by business pillar, locations (countries) by
//! geographic region. Both tables are immutable process-wide constants; the
//! rest of the crate is parameterized by a `&'static Taxonomy` so the picker
//! logic exists once for both domains.

use serde::Serialize;
use std::sync::LazyLock;

/// Reserved group for user-created entries. Present in every domain.
pub const CUSTOM_GROUP: &str = "Custom";

/// Sentinel group for the location domain's "applies everywhere" option.
/// Never filterable, never persisted as a custom entry group.
pub const GLOBAL_GROUP: &str = "Global / Multi-region";

/// A single selectable catalog entry. Static items come from the taxonomy,
/// dynamic ones are read-only projections of a user's custom entries.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CatalogItem {
    pub name: String,
    pub group: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}

impl CatalogItem {
    pub fn new(name: &str, group: &str) -> Self {
        Self {
            name: name.to_string(),
            group: group.to_string(),
            code: None,
        }
    }

    pub fn with_code(name: &str, group: &str, code: &str) -> Self {
        Self {
            name: name.to_string(),
            group: group.to_string(),
            code: Some(code.to_string()),
        }
    }
}

/// The synthesized global/multi-region option (location domain only).
pub struct GlobalOption {
    pub group: &'static str,
    pub label: &'static str,
    match_terms: &'static [&'static str],
}

impl GlobalOption {
    /// Shown when the query is empty or is a substring of one of the
    /// match terms ("glob" matches, "france" does not).
    pub fn matches_query(&self, query: &str) -> bool {
        let q = query.trim().to_lowercase();
        q.is_empty() || self.match_terms.iter().any(|t| t.contains(&q))
    }

    /// The sentinel rendered as a selectable item. No code: the display
    /// label is the whole presentation.
    pub fn item(&self) -> CatalogItem {
        CatalogItem::new(self.label, self.group)
    }
}

/// Fixed group/item table for one picker domain. Constructed once at
/// startup, no runtime mutation, no failure modes.
pub struct Taxonomy {
    domain: &'static str,
    groups: Vec<&'static str>,
    items: Vec<CatalogItem>,
    global_option: Option<GlobalOption>,
}

impl Taxonomy {
    /// Short identifier used to namespace remote tables and cache keys.
    pub fn domain(&self) -> &'static str {
        self.domain
    }

    /// Valid groups in display order. Always ends with `Custom`.
    pub fn groups(&self) -> &[&'static str] {
        &self.groups
    }

    pub fn items(&self) -> &[CatalogItem] {
        &self.items
    }

    pub fn global_option(&self) -> Option<&GlobalOption> {
        self.global_option.as_ref()
    }

    pub fn is_valid_group(&self, group: &str) -> bool {
        self.groups.iter().any(|g| *g == group)
    }
}

static ORGANIZATIONS: LazyLock<Taxonomy> = LazyLock::new(|| {
    let g = |name, pillar| CatalogItem::new(name, pillar);
    Taxonomy {
        domain: "organizations",
        groups: vec![
            "Technology",
            "Media & Entertainment",
            "Financial Services",
            "Consumer & Retail",
            CUSTOM_GROUP,
        ],
        items: vec![
            g("Northwind Cloud", "Technology"),
            g("Fabrikam Systems", "Technology"),
            g("Contoso Labs", "Technology"),
            g("Proseware", "Technology"),
            g("Lumon Data", "Technology"),
            g("Blue Yonder Studios", "Media & Entertainment"),
            g("Fourth Coffee Films", "Media & Entertainment"),
            g("Wingtip Broadcasting", "Media & Entertainment"),
            g("Tailspin Interactive", "Media & Entertainment"),
            g("Woodgrove Bank", "Financial Services"),
            g("Humongous Insurance", "Financial Services"),
            g("First Up Capital", "Financial Services"),
            g("Margie's Travel", "Consumer & Retail"),
            g("Adventure Works", "Consumer & Retail"),
            g("Alpine Ski House", "Consumer & Retail"),
            g("Relecloud Retail", "Consumer & Retail"),
        ],
        global_option: None,
    }
});

static LOCATIONS: LazyLock<Taxonomy> = LazyLock::new(|| {
    let c = CatalogItem::with_code;
    Taxonomy {
        domain: "locations",
        groups: vec![
            "North America",
            "Europe",
            "Asia Pacific",
            "Latin America",
            "Middle East & Africa",
            CUSTOM_GROUP,
        ],
        items: vec![
            c("United States", "North America", "US"),
            c("Canada", "North America", "CA"),
            c("Mexico", "North America", "MX"),
            c("United Kingdom", "Europe", "GB"),
            c("Ireland", "Europe", "IE"),
            c("France", "Europe", "FR"),
            c("Germany", "Europe", "DE"),
            c("Netherlands", "Europe", "NL"),
            c("Belgium", "Europe", "BE"),
            c("Spain", "Europe", "ES"),
            c("Portugal", "Europe", "PT"),
            c("Italy", "Europe", "IT"),
            c("Switzerland", "Europe", "CH"),
            c("Austria", "Europe", "AT"),
            c("Sweden", "Europe", "SE"),
            c("Norway", "Europe", "NO"),
            c("Denmark", "Europe", "DK"),
            c("Finland", "Europe", "FI"),
            c("Poland", "Europe", "PL"),
            c("Czechia", "Europe", "CZ"),
            c("Romania", "Europe", "RO"),
            c("Greece", "Europe", "GR"),
            c("Japan", "Asia Pacific", "JP"),
            c("China", "Asia Pacific", "CN"),
            c("India", "Asia Pacific", "IN"),
            c("Singapore", "Asia Pacific", "SG"),
            c("South Korea", "Asia Pacific", "KR"),
            c("Australia", "Asia Pacific", "AU"),
            c("New Zealand", "Asia Pacific", "NZ"),
            c("Indonesia", "Asia Pacific", "ID"),
            c("Malaysia", "Asia Pacific", "MY"),
            c("Philippines", "Asia Pacific", "PH"),
            c("Thailand", "Asia Pacific", "TH"),
            c("Vietnam", "Asia Pacific", "VN"),
            c("Brazil", "Latin America", "BR"),
            c("Argentina", "Latin America", "AR"),
            c("Chile", "Latin America", "CL"),
            c("Colombia", "Latin America", "CO"),
            c("Peru", "Latin America", "PE"),
            c("United Arab Emirates", "Middle East & Africa", "AE"),
            c("Saudi Arabia", "Middle East & Africa", "SA"),
            c("Israel", "Middle East & Africa", "IL"),
            c("South Africa", "Middle East & Africa", "ZA"),
            c("Nigeria", "Middle East & Africa", "NG"),
            c("Kenya", "Middle East & Africa", "KE"),
            c("Egypt", "Middle East & Africa", "EG"),
        ],
        global_option: Some(GlobalOption {
            group: GLOBAL_GROUP,
            label: "Global / Multi-region",
            match_terms: &["global", "multi-region"],
        }),
    }
});

/// The organization/company picker catalog.
pub fn organizations() -> &'static Taxonomy {
    &ORGANIZATIONS
}

/// The country/location picker catalog.
pub fn locations() -> &'static Taxonomy {
    &LOCATIONS
}

/// Look up a domain by its identifier (CLI entry point).
pub fn by_domain(domain: &str) -> Option<&'static Taxonomy> {
    match domain {
        "organizations" => Some(organizations()),
        "locations" => Some(locations()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_every_item_maps_to_a_listed_group() {
        for tax in [organizations(), locations()] {
            for item in tax.items() {
                assert!(
                    tax.is_valid_group(&item.group),
                    "{} has unknown group {}",
                    item.name,
                    item.group
                );
            }
        }
    }

    #[test]
    fn test_custom_group_is_always_last() {
        for tax in [organizations(), locations()] {
            assert_eq!(*tax.groups().last().unwrap(), CUSTOM_GROUP);
        }
    }

    #[test]
    fn test_names_unique_case_insensitive() {
        for tax in [organizations(), locations()] {
            let mut seen = HashSet::new();
            for item in tax.items() {
                assert!(seen.insert(item.name.to_lowercase()), "dup: {}", item.name);
            }
        }
    }

    #[test]
    fn test_global_option_matching() {
        let opt = locations().global_option().unwrap();
        assert!(opt.matches_query(""));
        assert!(opt.matches_query("glob"));
        assert!(opt.matches_query("GLOBAL"));
        assert!(opt.matches_query("multi"));
        assert!(!opt.matches_query("france"));
        assert!(organizations().global_option().is_none());
    }

    #[test]
    fn test_location_codes_present_org_codes_absent() {
        assert!(locations().items().iter().all(|i| i.code.is_some()));
        assert!(organizations().items().iter().all(|i| i.code.is_none()));
    }
}
