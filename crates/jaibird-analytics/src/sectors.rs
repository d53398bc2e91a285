//! Static name-to-sector lookup for well-known JSE issuers.

use crate::aggregate::Tally;
use crate::types::{CategorizedFiling, SectorCount};

pub const OTHER_SECTOR: &str = "Other";

/// Lower-case name fragment and sector, checked in order.
const SECTOR_MAP: &[(&str, &str)] = &[
    // Banking & financial services
    ("standard bank", "Banking"),
    ("absa", "Banking"),
    ("firstrand", "Banking"),
    ("nedbank", "Banking"),
    ("investec", "Financial Services"),
    ("capitec", "Banking"),
    ("discovery", "Financial Services"),
    ("sanlam", "Financial Services"),
    ("old mutual", "Financial Services"),
    ("momentum", "Financial Services"),
    ("african bank", "Banking"),
    // Mining & resources
    ("anglo american", "Mining"),
    ("bhp", "Mining"),
    ("glencore", "Mining"),
    ("south32", "Mining"),
    ("kumba", "Mining"),
    ("exxaro", "Mining"),
    ("gold fields", "Mining"),
    ("harmony", "Mining"),
    ("impala platinum", "Mining"),
    ("sibanye", "Mining"),
    ("northam", "Mining"),
    ("anglo platinum", "Mining"),
    ("eastern platinum", "Mining"),
    ("orion mineral", "Mining"),
    ("southern palladium", "Mining"),
    // Retail
    ("shoprite", "Retail"),
    ("pick n pay", "Retail"),
    ("clicks", "Retail"),
    ("woolworths", "Retail"),
    ("mr price", "Retail"),
    ("truworths", "Retail"),
    ("spar", "Retail"),
    ("pepkor", "Retail"),
    ("dis-chem", "Retail"),
    // Telecoms & technology
    ("mtn", "Telecoms"),
    ("vodacom", "Telecoms"),
    ("telkom", "Telecoms"),
    ("bytes technology", "Technology"),
    ("datatec", "Technology"),
    ("naspers", "Technology"),
    ("prosus", "Technology"),
    // Property
    ("redefine", "Property"),
    ("growthpoint", "Property"),
    ("emira", "Property"),
    ("accelerate", "Property"),
    ("attacq", "Property"),
    ("vukile", "Property"),
    ("resilient", "Property"),
    // Industrial and other
    ("barloworld", "Industrial"),
    ("bidvest", "Industrial"),
    ("imperial", "Industrial"),
    ("mondi", "Industrial"),
    ("sappi", "Industrial"),
    ("sasol", "Energy"),
    ("british american tobacco", "Consumer Goods"),
    ("quilter", "Financial Services"),
    ("life healthcare", "Healthcare"),
    ("mediclinic", "Healthcare"),
    ("netcare", "Healthcare"),
    // ETFs, fund managers, investment banks
    ("satrix", "ETF / Fund"),
    ("sygnia", "ETF / Fund"),
    ("prescient", "ETF / Fund"),
    ("allan gray", "ETF / Fund"),
    ("1nvest", "ETF / Fund"),
    ("easyetf", "ETF / Fund"),
    ("10x fund", "ETF / Fund"),
    ("fnb cis", "ETF / Fund"),
    ("newgold", "ETF / Fund"),
    ("newwave", "ETF / Fund"),
    ("goldman sachs", "Investment Bank"),
    ("ubs", "Investment Bank"),
    ("bnp paribas", "Investment Bank"),
];

/// Sector for a company name by substring lookup; `Other` when unknown.
pub fn classify_sector(company_name: &str) -> &'static str {
    let name = company_name.to_lowercase();
    SECTOR_MAP
        .iter()
        .find(|(fragment, _)| name.contains(fragment))
        .map(|(_, sector)| *sector)
        .unwrap_or(OTHER_SECTOR)
}

pub fn sector_breakdown(items: &[CategorizedFiling], exclude_noise: bool) -> Vec<SectorCount> {
    let mut tally = Tally::default();
    for item in items.iter().filter(|i| !(exclude_noise && i.is_noise)) {
        tally.add(classify_sector(&item.company_name));
    }
    tally
        .most_common()
        .into_iter()
        .map(|(sector, count)| SectorCount { sector, count })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::filing;

    #[test]
    fn test_classify_sector() {
        assert_eq!(classify_sector("Standard Bank Group Ltd"), "Banking");
        assert_eq!(classify_sector("SASOL LIMITED"), "Energy");
        assert_eq!(classify_sector("Satrix MSCI World ETF"), "ETF / Fund");
        assert_eq!(classify_sector("Acme Anvils Ltd"), OTHER_SECTOR);
        // First listed fragment wins
        assert_eq!(classify_sector("Anglo American Platinum"), "Mining");
    }

    #[test]
    fn test_sector_breakdown_excludes_noise() {
        let items = vec![
            filing("Nedbank Group", "Trading update", None),
            filing("Absa Group", "Declaration of dividend", None),
            filing("Absa Group", "Notification of interest payment", None),
            filing("Acme Ltd", "Trading update", None),
        ];
        let sectors = sector_breakdown(&items, true);
        assert_eq!(
            sectors,
            vec![
                SectorCount { sector: "Banking".into(), count: 2 },
                SectorCount { sector: "Other".into(), count: 1 },
            ]
        );
        assert_eq!(sector_breakdown(&items, false)[0].count, 3);
    }
}
