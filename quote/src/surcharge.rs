//! Surcharge ranking by specificity.

use std::collections::BTreeMap;

use landed_common::{CountryCode, Hs6};
use landed_rates::SurchargeRate;

/// `2 * origin_match + hs6_match` for a row that names the origin and/or HS6.
pub fn specificity_score(row: &SurchargeRate, origin: &CountryCode, hs6: &Hs6) -> u8 {
    let origin_match = row.origin.as_ref() == Some(origin);
    let hs6_match = row.hs6.as_ref() == Some(hs6);
    2 * u8::from(origin_match) + u8::from(hs6_match)
}

/// One surcharge per code: the applicable row with the highest score.
///
/// Candidates are considered generic first, so on equal scores the more
/// generic row stays. Codes are returned in lexical order.
pub fn rank_surcharges(rows: &[SurchargeRate], origin: &CountryCode, hs6: &Hs6) -> Vec<SurchargeRate> {
    let mut by_code: BTreeMap<&str, Vec<(u8, &SurchargeRate)>> = BTreeMap::new();
    for row in rows.iter().filter(|r| r.applies_to(origin, hs6)) {
        by_code
            .entry(row.code.as_str())
            .or_default()
            .push((specificity_score(row, origin, hs6), row));
    }

    by_code
        .into_values()
        .filter_map(|mut candidates| {
            candidates.sort_by_key(|(score, _)| *score);
            let mut best: Option<(u8, &SurchargeRate)> = None;
            for (score, row) in candidates {
                match best {
                    Some((top, _)) if top >= score => {}
                    _ => best = Some((score, row)),
                }
            }
            best.map(|(_, row)| row.clone())
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use landed_common::EffectiveWindow;
    use landed_rates::RateTerms;
    use rust_decimal_macros::dec;

    fn cc(code: &str) -> CountryCode {
        CountryCode::parse(code).unwrap()
    }

    fn hs6() -> Hs6 {
        Hs6::parse("851712").unwrap()
    }

    fn surcharge(code: &str, origin: Option<&str>, hs6: Option<Hs6>, pct: rust_decimal::Decimal) -> SurchargeRate {
        SurchargeRate {
            dest: cc("US"),
            code: code.to_string(),
            origin: origin.map(cc),
            hs6,
            terms: RateTerms::ad_valorem(pct),
            min_amt: None,
            max_amt: None,
            window: EffectiveWindow::starting(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()),
        }
    }

    #[test]
    fn test_scores() {
        let origin = cc("CN");
        assert_eq!(specificity_score(&surcharge("X", None, None, dec!(1)), &origin, &hs6()), 0);
        assert_eq!(specificity_score(&surcharge("X", None, Some(hs6()), dec!(1)), &origin, &hs6()), 1);
        assert_eq!(specificity_score(&surcharge("X", Some("CN"), None, dec!(1)), &origin, &hs6()), 2);
        assert_eq!(specificity_score(&surcharge("X", Some("CN"), Some(hs6()), dec!(1)), &origin, &hs6()), 3);
    }

    #[test]
    fn test_most_specific_row_wins_per_code() {
        let rows = vec![
            surcharge("S301", None, None, dec!(7.5)),
            surcharge("S301", Some("CN"), None, dec!(25)),
            surcharge("S301", None, Some(hs6()), dec!(10)),
        ];
        let ranked = rank_surcharges(&rows, &cc("CN"), &hs6());

        assert_eq!(ranked.len(), 1);
        assert_eq!(ranked[0].terms.rate_pct, Some(dec!(25)));
    }

    #[test]
    fn test_distinct_codes_are_all_kept() {
        let rows = vec![
            surcharge("MPF", None, None, dec!(0.3464)),
            surcharge("HMF", None, None, dec!(0.125)),
            surcharge("S301", Some("CN"), None, dec!(25)),
        ];
        let ranked = rank_surcharges(&rows, &cc("CN"), &hs6());
        let codes: Vec<&str> = ranked.iter().map(|r| r.code.as_str()).collect();

        assert_eq!(codes, vec!["HMF", "MPF", "S301"]);
    }

    #[test]
    fn test_inapplicable_rows_are_dropped() {
        let rows = vec![
            surcharge("MPF", None, None, dec!(0.3464)),
            surcharge("S301", Some("CN"), None, dec!(25)),
        ];
        let ranked = rank_surcharges(&rows, &cc("VN"), &hs6());

        assert_eq!(ranked.len(), 1);
        assert_eq!(ranked[0].code, "MPF");
    }

    #[test]
    fn test_equal_scores_keep_generic_first_order() {
        let rows = vec![
            surcharge("FEE", None, None, dec!(1)),
            surcharge("FEE", None, None, dec!(2)),
        ];
        let ranked = rank_surcharges(&rows, &cc("CN"), &hs6());
        assert_eq!(ranked[0].terms.rate_pct, Some(dec!(1)));
    }
}
