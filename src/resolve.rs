use rust_decimal::Decimal;
use std::collections::BTreeSet;
use tracing::{debug, trace};

use crate::{plans::SilverPlans, targets::TargetZip, zips::ZipAreaJoin};

/// A target ZIP with its SLCSP rate, `None` when it cannot be determined.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedTarget {
    pub zipcode: String,
    pub rate: Option<Decimal>,
}

/// Second-lowest distinct value; equal rates count once.
pub fn second_lowest_distinct(rates: &[Decimal]) -> Option<Decimal> {
    rates
        .iter()
        .copied()
        .collect::<BTreeSet<_>>()
        .into_iter()
        .nth(1)
}

/// Resolve every target, in the order given.
///
/// A ZIP gets a rate only when all of its mapping rows agree on one rate
/// area; the rate is then taken from the full Silver rate list of that area.
pub fn resolve(
    targets: &[TargetZip],
    joined: &ZipAreaJoin,
    plans: &SilverPlans,
) -> Vec<ResolvedTarget> {
    targets
        .iter()
        .map(|t| ResolvedTarget {
            zipcode: t.zipcode.clone(),
            rate: resolve_one(&t.zipcode, joined, plans),
        })
        .collect()
}

fn resolve_one(zip: &str, joined: &ZipAreaJoin, plans: &SilverPlans) -> Option<Decimal> {
    let Some(areas) = joined.areas_for(zip) else {
        trace!(zip, "not in mapping table");
        return None;
    };
    let mut iter = areas.iter();
    let area = match (iter.next(), iter.next()) {
        (Some(area), None) => area,
        _ => {
            debug!(zip, areas = areas.len(), "ambiguous rate area");
            return None;
        }
    };

    let rate = second_lowest_distinct(plans.rates(area));
    if rate.is_none() {
        debug!(
            zip,
            state = %area.state,
            rate_area = %area.rate_area,
            "fewer than two distinct silver rates"
        );
    }
    rate
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{plans::read_silver_plans, zips::read_zip_areas};
    use rust_decimal_macros::dec;
    use std::collections::HashSet;

    fn run(plans: &str, zips: &str, targets: &[&str]) -> Vec<ResolvedTarget> {
        let plans =
            SilverPlans::from_records(read_silver_plans(plans.as_bytes(), b',').unwrap());
        let set: HashSet<&str> = targets.iter().copied().collect();
        let joined = read_zip_areas(zips.as_bytes(), b',', &set, &plans).unwrap();
        let targets: Vec<TargetZip> = targets
            .iter()
            .map(|z| TargetZip {
                zipcode: z.to_string(),
            })
            .collect();
        resolve(&targets, &joined, &plans)
    }

    const HEADER_PLANS: &str = "state,rate_area,rate,metal_level\n";
    const HEADER_ZIPS: &str = "zipcode,state,rate_area\n";

    #[test]
    fn second_lowest_ignores_duplicates() {
        assert_eq!(
            second_lowest_distinct(&[dec!(200), dec!(300), dec!(200)]),
            Some(dec!(300))
        );
        assert_eq!(
            second_lowest_distinct(&[dec!(9), dec!(3), dec!(3), dec!(5), dec!(1)]),
            Some(dec!(3))
        );
        assert_eq!(second_lowest_distinct(&[dec!(150), dec!(150.00)]), None);
        assert_eq!(second_lowest_distinct(&[]), None);
    }

    #[test]
    fn single_area_resolves_to_second_distinct_rate() {
        let plans = format!("{HEADER_PLANS}NY,1,200.00,Silver\nNY,1,300.00,Silver\nNY,1,200.00,Silver\n");
        let zips = format!("{HEADER_ZIPS}90001,NY,1\n");
        let out = run(&plans, &zips, &["90001"]);
        assert_eq!(out[0].rate, Some(dec!(300.00)));
    }

    #[test]
    fn sub_cent_rates_are_compared_exactly() {
        let plans = format!(
            "{HEADER_PLANS}NY,1,100.001,Silver\nNY,1,100.004,Silver\nNY,1,200.00,Silver\n"
        );
        let zips = format!("{HEADER_ZIPS}90001,NY,1\n");
        let out = run(&plans, &zips, &["90001"]);
        assert_eq!(out[0].rate, Some(dec!(100.004)));
        assert_eq!(crate::money::format_rate(dec!(100.004)), "100.00");
    }

    #[test]
    fn two_areas_is_ambiguous() {
        let plans = format!(
            "{HEADER_PLANS}NY,1,200.00,Silver\nNY,1,300.00,Silver\nNY,2,200.00,Silver\nNY,2,300.00,Silver\n"
        );
        let zips = format!("{HEADER_ZIPS}90002,NY,1\n90002,NY,2\n");
        let out = run(&plans, &zips, &["90002"]);
        assert_eq!(out[0].rate, None);
    }

    #[test]
    fn second_area_without_plans_is_still_ambiguous() {
        let plans = format!("{HEADER_PLANS}NY,1,200.00,Silver\nNY,1,300.00,Silver\n");
        let zips = format!("{HEADER_ZIPS}90005,NY,1\n90005,NY,7\n");
        let out = run(&plans, &zips, &["90005"]);
        assert_eq!(out[0].rate, None);
    }

    #[test]
    fn same_area_in_several_counties_is_unambiguous() {
        let plans = format!("{HEADER_PLANS}NY,1,200.00,Silver\nNY,1,300.00,Silver\n");
        let zips = "zipcode,state,county_code,rate_area\n90006,NY,001,1\n90006,NY,002,1\n";
        let out = run(&plans, zips, &["90006"]);
        assert_eq!(out[0].rate, Some(dec!(300.00)));
    }

    #[test]
    fn one_distinct_rate_is_blank() {
        let plans = format!("{HEADER_PLANS}NY,3,150.00,Silver\nNY,3,150.00,Silver\n");
        let zips = format!("{HEADER_ZIPS}90003,NY,3\n");
        let out = run(&plans, &zips, &["90003"]);
        assert_eq!(out[0].rate, None);
    }

    #[test]
    fn unmapped_zip_is_blank() {
        let plans = format!("{HEADER_PLANS}NY,1,200.00,Silver\nNY,1,300.00,Silver\n");
        let zips = format!("{HEADER_ZIPS}90001,NY,1\n");
        let out = run(&plans, &zips, &["12345"]);
        assert_eq!(
            out,
            vec![ResolvedTarget {
                zipcode: "12345".into(),
                rate: None
            }]
        );
    }

    #[test]
    fn same_state_other_area_does_not_leak() {
        let plans = format!(
            "{HEADER_PLANS}NY,1,100.00,Silver\nNY,2,200.00,Silver\nNY,2,300.00,Silver\nNJ,1,150.00,Silver\n"
        );
        let zips = format!("{HEADER_ZIPS}90001,NY,1\n");
        let out = run(&plans, &zips, &["90001"]);
        assert_eq!(out[0].rate, None);
    }

    #[test]
    fn output_follows_target_order() {
        let plans = format!("{HEADER_PLANS}NY,1,200.00,Silver\nNY,1,300.00,Silver\n");
        let zips = format!("{HEADER_ZIPS}90001,NY,1\n90002,NY,1\n");
        let out = run(&plans, &zips, &["90002", "99999", "90001"]);
        let zips: Vec<_> = out.iter().map(|r| r.zipcode.as_str()).collect();
        assert_eq!(zips, vec!["90002", "99999", "90001"]);
        assert_eq!(out[1].rate, None);
    }
}
