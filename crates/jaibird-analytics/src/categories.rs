//! Ordered title rule table. First match wins.

use once_cell::sync::Lazy;
use regex::{Regex, RegexBuilder};
use serde::Serialize;

use jaibird_core::Announcement;

use crate::types::CategorizedFiling;

/// Label for titles no rule matches.
pub const UNCATEGORISED: &str = "Uncategorised";

pub const ACQUISITIONS_AND_DISPOSALS: &str = "Acquisitions & Disposals";
pub const SHARE_BUYBACKS: &str = "Share Buybacks & Treasury";
pub const DEALINGS_BY_DIRECTORS: &str = "Dealings by Directors";

struct RuleDef {
    label: &'static str,
    pattern: &'static str,
    noise: bool,
    /// `(clause, unless)` pairs: `clause` counts only where the text right
    /// after the match does not start with `unless`.
    guarded: &'static [(&'static str, &'static str)],
}

const RULE_DEFS: &[RuleDef] = &[
    // Strategic
    RuleDef {
        label: "Trading Statements & Updates",
        pattern: r"trading\s+(?:statement|update)|operational\s+(?:update|performance)|festive\s+season\s+trading",
        noise: false,
        guarded: &[],
    },
    RuleDef {
        label: "Financial Results",
        pattern: concat!(
            r"(?:financial|interim|annual)\s+results|condensed\s+(?:consolidated\s+)?financial|",
            r"earnings\s+release|quarterly\s+(?:investor\s+)?report|investor\s+report|",
            r"results\s+for\s+the\s+(?:first|second|third|fourth)\s+quarter|",
            r"results\s+presentation|short-form\s+announcement.*results|",
            r"q[1-4]\s+fy\d{4}\s+results|production\s+report|",
            r"business\s+update\s+for\s+the|publication\s+of\s+.*(?:results|financial\s+statements)|",
            r"monthly\s+fact\s*sheet|notice\s+of\s+availability.*factsheet",
        ),
        noise: false,
        guarded: &[],
    },
    RuleDef {
        label: ACQUISITIONS_AND_DISPOSALS,
        pattern: concat!(
            r"proposed\s+acquisition|",
            r"disposal\s+of|disposal\s+by|divestment|general\s+offer\s+to\s+acquire|",
            r"voluntary\s+announcement.*(?:disposal|acquisition|purchase)|",
            r"(?:earn[\s-]*in\s+agreement|prepayment\s+facility)|",
            r"firm\s+intention.*(?:offer|acquire|disposal)|",
            r"offer\s+for\s+.*(?:by|from)\s+",
        ),
        noise: false,
        guarded: &[
            (r"acquisition\s+of\s+", r"beneficial|securities|shares"),
            (r"purchase\s+of\s+", r"investec|.*shares"),
        ],
    },
    // Must precede Dealings by Directors: "Transaction in own shares"
    // also matches the dealings wording.
    RuleDef {
        label: SHARE_BUYBACKS,
        pattern: concat!(
            r"transaction\s+in\s+own\s+shares|repurchase\s+of|share\s+buyback|",
            r"treasury\s+shares|confirmation\s+of\s+treasury|",
            r"buy-?back\s+(?:notification|programme|program)|repurchase\s+programme",
        ),
        noise: false,
        guarded: &[],
    },
    RuleDef {
        label: DEALINGS_BY_DIRECTORS,
        pattern: concat!(
            r"dealings?\s+in\s+securities\s+by|dealings?\s+in\s+securities$|",
            r"transactions?\s+(?:in\s+.*shares|by\s+persons?\s+discharging\s+managerial)|",
            r"dealing\s+in\s+(?:securities|shares)\s+by|dealing\s+in\s+securities$|dealing\s+in\s+shares$|",
            r"dealing\s+by\s+(?:subsidiary|director)|",
            r"share\s+(?:incentive|option).*(?:exercise|settlement|transaction)|",
            r"employee\s+share\s+plan|exercise\s+of\s+options|",
            r"settlement\s+of\s+shares\s+in\s+terms|share\s+(?:plan|scheme)\s+transaction|",
            r"disclosure\s+of\s+management\s+transaction|",
            r"share\s+subdivision|notification\s+of\s+securities",
        ),
        noise: false,
        guarded: &[],
    },
    RuleDef {
        label: "Board & Management Changes",
        pattern: concat!(
            r"change(?:s)?\s+to\s+the\s+board|directorate\s+change|",
            r"appointment\s+of\s+(?:independent\s+)?(?:non-executive\s+)?director|",
            r"retirement\s+of\s+(?:senior\s+executive|.*director)|",
            r"executive\s+responsibilities|management\s+arrangements|",
            r"board\s+committees|termination\s+of\s+board\s+member",
        ),
        noise: false,
        guarded: &[],
    },
    RuleDef {
        label: "Cautionary Announcements",
        pattern: r"cautionary\s+announcement|cautionary$",
        noise: false,
        guarded: &[],
    },
    RuleDef {
        label: "Dividends & Distributions",
        pattern: concat!(
            r"(?:declaration\s+of\s+)?dividend|distribution\s+finalisation|",
            r"preference\s+share\s+dividend|rectification.*dividend",
        ),
        noise: false,
        guarded: &[],
    },
    RuleDef {
        label: "Capital Raises & Placements",
        pattern: r"private\s+placement|rights\s+issue|capital\s+raise|share\s+placement|tap\s+issuance",
        noise: false,
        guarded: &[],
    },
    RuleDef {
        label: "Funding & Debt",
        pattern: concat!(
            r"credit\s+facilit|refinancing|(?:medium\s+term\s+note|note)\s+programme|",
            r"corporate\s+facilities|pricing\s+supplement",
        ),
        noise: false,
        guarded: &[],
    },
    RuleDef {
        label: "Major Holdings Disclosure",
        pattern: concat!(
            r"major\s+holdings?|beneficial\s+interest|change\s+in\s+beneficial|",
            r"disclosure\s+of\s+(?:acquisition|increase|significant\s+holding|beneficial)|",
            r"notification\s+of\s+(?:major|change\s+in\s+(?:a\s+)?major)|",
            r"total\s+voting\s+rights|voting\s+rights\s+and\s+capital|",
            r"schedule\s+13[gd]|acquisition\s+of\s+securities\s+by\s+clients",
        ),
        noise: false,
        guarded: &[],
    },
    RuleDef {
        label: "AGM & Shareholder Meetings",
        pattern: concat!(
            r"general\s+meeting|circular.*shareholders|notice\s+of\s+general\s+meeting|",
            r"results\s+of\s+(?:the\s+)?(?:annual|extraordinary)\s+general\s+meeting|",
            r"withdrawal\s+of\s+resolutions|voluntary\s+business\s+update\s+at\s+agm",
        ),
        noise: false,
        guarded: &[],
    },
    RuleDef {
        label: "Corporate Actions",
        pattern: concat!(
            r"suspension\s+from\s+quotation|reinstatement\s+to\s+quotation|",
            r"auditor\s+(?:appointment|change)|bbbee\s+compliance|",
            r"ceo\s+letter|response\s+to\s+rule|",
            r"notice\s+to\s+affected\s+persons|name\s+change|",
            r"annual\s+financial\s+statements|availability\s+of\s+.*annual",
        ),
        noise: false,
        guarded: &[],
    },
    // Noise
    RuleDef {
        label: "Interest Payments",
        pattern: concat!(
            r"interest\s+(?:payment|amount)|notification\s+of\s+interest|",
            r"interest\s+rate\s+reset|fixed\s+interim\s+payment|",
            r"interest\s+and\s+capital\s+payment",
        ),
        noise: true,
        guarded: &[],
    },
    RuleDef {
        label: "Listing / Delisting of Securities",
        pattern: concat!(
            r"listing\s+of\s+additional|additional\s+listing|partial\s+(?:de-?listing|delisting)|",
            r"new\s+(?:financial\s+instrument\s+)?listing|listing\s+of\s+\d|",
            r"listing\s+of\s+satrix|new\s+listing\s+announcement|",
            r"partial\s+capital\s+redemption|",
            r"(?:de-?listing|delisting)\s+of\s+(?:financial\s+)?instrument|",
            r"notice\s+of\s+(?:expiry|partial\s+redemption)|",
            r"notification\s+of\s+(?:a\s+)?partial\s+capital\s+reduction",
        ),
        noise: true,
        guarded: &[],
    },
    RuleDef {
        label: "ETF / Fund Administration",
        pattern: concat!(
            r"redemption\s+of\s+(?:1nvest|newgold|etf)|partial\s+redemption\s+of\s+securities|",
            r"etf\s+securities|results\s+of\s+the\s+initial\s+offer|",
            r"cdi\s+monthly\s+movement|actively\s+managed\s+certificate|",
            r"early\s+(?:termination|redemption)",
        ),
        noise: true,
        guarded: &[],
    },
    RuleDef {
        label: "Regulatory Forms & Filings",
        pattern: concat!(
            r"form\s+8[.\-]?[3k]|tr-?1:|trp121|",
            r"section\s+(?:122|45)|notice\s+in\s+terms\s+of\s+section|",
            r"notification\s+in\s+terms\s+of\s+section|",
            r"form\s+8[.\-]?\s*(?:announcement|dealing\s+disclosure|opd)|",
            r"public\s+opening\s+position|",
            r"jse\s+contact\s+list|",
            r"notice\s+of\s+availability.*(?:quarterly|portfolio\s+composition)|",
            r"publication\s+of\s+information\s+by\s+means\s+of\s+supplement",
        ),
        noise: true,
        guarded: &[],
    },
    RuleDef {
        label: "Amendments & Corrections",
        pattern: r"amendment|correction|cancellation\s+of\s+s\d|late\s+(?:correction|announcement)",
        noise: true,
        guarded: &[],
    },
    RuleDef {
        label: "Debt Programme Admin",
        pattern: concat!(
            r"amendments?\s+to\s+.*(?:note|bond)\s+programme|",
            r"amended\s+and\s+restated.*pricing|",
            r"notice\s+requesting\s+written\s+consent.*holders|",
            r"final\s+redemption\s+announcement|",
            r"financial\s+instrument\s+(?:partial\s+de-?listing|final\s+redemption)|",
            r"notice\s+of\s+partial\s+redemption|",
            r"issue\s+of\s+zar.*(?:securities|notes)\s+due",
        ),
        noise: true,
        guarded: &[],
    },
];

fn ci(pattern: &str) -> Regex {
    RegexBuilder::new(pattern)
        .case_insensitive(true)
        .build()
        .unwrap()
}

/// A compiled title rule.
pub struct CategoryRule {
    pub label: &'static str,
    pub is_noise: bool,
    pattern: Regex,
    guarded: Vec<(Regex, Regex)>,
}

impl CategoryRule {
    pub fn matches(&self, title: &str) -> bool {
        if self.pattern.is_match(title) {
            return true;
        }
        self.guarded.iter().any(|(clause, unless)| {
            clause
                .find_iter(title)
                .any(|m| !unless.is_match(&title[m.end()..]))
        })
    }
}

/// The rule table, in evaluation order.
pub static CATEGORY_RULES: Lazy<Vec<CategoryRule>> = Lazy::new(|| {
    RULE_DEFS
        .iter()
        .map(|def| CategoryRule {
            label: def.label,
            is_noise: def.noise,
            pattern: ci(def.pattern),
            guarded: def
                .guarded
                .iter()
                .map(|(clause, unless)| (ci(clause), ci(&format!("^(?:{})", unless))))
                .collect(),
        })
        .collect()
});

/// Result of classifying one title.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Category {
    pub label: &'static str,
    pub is_noise: bool,
}

impl Category {
    pub const UNCATEGORISED: Category = Category {
        label: UNCATEGORISED,
        is_noise: false,
    };
}

/// Classify a title. Pure; the first matching rule wins.
pub fn categorize_title(title: &str) -> Category {
    if title.trim().is_empty() {
        return Category::UNCATEGORISED;
    }
    CATEGORY_RULES
        .iter()
        .find(|rule| rule.matches(title))
        .map(|rule| Category {
            label: rule.label,
            is_noise: rule.is_noise,
        })
        .unwrap_or(Category::UNCATEGORISED)
}

pub fn categorize_announcements(announcements: &[Announcement]) -> Vec<CategorizedFiling> {
    announcements
        .iter()
        .map(|ann| {
            let category = categorize_title(&ann.title);
            CategorizedFiling {
                sens_number: ann.sens_number.clone(),
                company_name: ann.company_name.clone(),
                title: ann.title.clone(),
                date_published: ann.date_published,
                is_urgent: ann.is_urgent,
                category: category.label,
                is_noise: category.is_noise,
                ai_summary: ann.ai_summary.clone().unwrap_or_default(),
                pdf_url: ann.pdf_url.clone(),
            }
        })
        .collect()
}

/// Every category in evaluation order, then the fallback.
pub fn all_categories() -> Vec<Category> {
    CATEGORY_RULES
        .iter()
        .map(|rule| Category {
            label: rule.label,
            is_noise: rule.is_noise,
        })
        .chain(std::iter::once(Category::UNCATEGORISED))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn label(title: &str) -> &'static str {
        categorize_title(title).label
    }

    #[test]
    fn test_rule_order_is_fixed() {
        let labels: Vec<&str> = all_categories().iter().map(|c| c.label).collect();
        assert_eq!(
            labels,
            vec![
                "Trading Statements & Updates",
                "Financial Results",
                "Acquisitions & Disposals",
                "Share Buybacks & Treasury",
                "Dealings by Directors",
                "Board & Management Changes",
                "Cautionary Announcements",
                "Dividends & Distributions",
                "Capital Raises & Placements",
                "Funding & Debt",
                "Major Holdings Disclosure",
                "AGM & Shareholder Meetings",
                "Corporate Actions",
                "Interest Payments",
                "Listing / Delisting of Securities",
                "ETF / Fund Administration",
                "Regulatory Forms & Filings",
                "Amendments & Corrections",
                "Debt Programme Admin",
                "Uncategorised",
            ]
        );
        let noise: Vec<bool> = all_categories().iter().map(|c| c.is_noise).collect();
        assert_eq!(noise.iter().filter(|n| **n).count(), 6);
        assert!(noise[13..19].iter().all(|n| *n));
    }

    #[test]
    fn test_buyback_wins_over_director_dealing() {
        assert!(CATEGORY_RULES[4].matches("Transaction in own shares"));
        assert_eq!(label("Transaction in own shares"), SHARE_BUYBACKS);
        assert_eq!(label("TRANSACTION IN OWN SHARES"), SHARE_BUYBACKS);
    }

    #[test]
    fn test_strategic_titles() {
        let c = categorize_title("Voluntary Announcement - disposal of subsidiary");
        assert_eq!(c.label, ACQUISITIONS_AND_DISPOSALS);
        assert!(!c.is_noise);

        assert_eq!(label("Trading Statement for the year ended 28 February 2025"), "Trading Statements & Updates");
        assert_eq!(label("Unaudited Interim Results for the six months"), "Financial Results");
        assert_eq!(label("Dealings in securities by directors"), DEALINGS_BY_DIRECTORS);
        assert_eq!(label("Changes to the Board"), "Board & Management Changes");
        assert_eq!(label("Declaration of final dividend"), "Dividends & Distributions");
        assert_eq!(label("Cautionary Announcement"), "Cautionary Announcements");
        assert_eq!(label("Notice of Annual General Meeting"), "AGM & Shareholder Meetings");
    }

    #[test]
    fn test_guarded_clauses() {
        assert_eq!(label("Acquisition of the remaining stake in Acme"), ACQUISITIONS_AND_DISPOSALS);
        assert_eq!(label("Purchase of property portfolio"), ACQUISITIONS_AND_DISPOSALS);
        // Guard rejects, a later rule picks it up
        assert_eq!(label("Acquisition of beneficial interest"), "Major Holdings Disclosure");
        // Guard rejects and nothing else matches
        assert_eq!(label("Purchase of Investec preference shares"), UNCATEGORISED);
    }

    #[test]
    fn test_noise_titles() {
        let c = categorize_title("Notification of interest payment");
        assert_eq!(c.label, "Interest Payments");
        assert!(c.is_noise);
        assert!(categorize_title("Amendment to announcement").is_noise);
        assert!(categorize_title("Form 8.3 - Acme plc").is_noise);
    }

    #[test]
    fn test_fallback_and_determinism() {
        assert_eq!(categorize_title(""), Category::UNCATEGORISED);
        assert_eq!(categorize_title("   "), Category::UNCATEGORISED);
        assert_eq!(categorize_title("Something entirely unrelated"), Category::UNCATEGORISED);
        let title = "Results of annual general meeting";
        assert_eq!(categorize_title(title), categorize_title(title));
    }

    #[test]
    fn test_categorize_announcements_carries_fields() {
        let mut ann = Announcement::new("S1", "Acme Ltd", "Trading update");
        ann.is_urgent = true;
        ann.ai_summary = Some("Revenue up 12%.".into());
        let out = categorize_announcements(&[ann]);
        assert_eq!(out[0].category, "Trading Statements & Updates");
        assert!(out[0].is_urgent);
        assert_eq!(out[0].ai_summary, "Revenue up 12%.");
    }
}
