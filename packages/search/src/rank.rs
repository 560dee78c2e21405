//! Merges the three result sources into one ordered list.

use bloodlink_donor_models::DonorRow;
use bloodlink_facility_models::{BloodBankRecord, HospitalRecord};
use bloodlink_search_models::{Ranked, RankedResult};

/// Combines the three sources, ordered by type priority (blood banks,
/// then hospitals, then donors) and then by ascending distance.
///
/// Nothing is merged or dropped; records of different types never share
/// an identity.
#[must_use]
pub fn rank(
    blood_banks: Vec<Ranked<BloodBankRecord>>,
    hospitals: Vec<Ranked<HospitalRecord>>,
    donors: Vec<Ranked<DonorRow>>,
) -> Vec<RankedResult> {
    let mut combined: Vec<RankedResult> = blood_banks
        .into_iter()
        .map(RankedResult::BloodBank)
        .chain(hospitals.into_iter().map(RankedResult::Hospital))
        .chain(donors.into_iter().map(RankedResult::Donor))
        .collect();

    combined.sort_by(RankedResult::ranking_cmp);
    combined
}

#[cfg(test)]
mod tests {
    use super::*;
    use bloodlink_search_models::ResultType;

    fn bank(distance: f64) -> Ranked<BloodBankRecord> {
        Ranked::new(BloodBankRecord::default(), distance)
    }

    fn hospital(distance: f64) -> Ranked<HospitalRecord> {
        Ranked::new(HospitalRecord::default(), distance)
    }

    #[test]
    fn sorts_within_type_by_distance() {
        let ranked = rank(
            vec![bank(30.0), bank(10.0), bank(20.0)],
            vec![hospital(5.0), hospital(1.0)],
            Vec::new(),
        );

        let order: Vec<(ResultType, f64)> = ranked
            .iter()
            .map(|r| (r.result_type(), r.distance()))
            .collect();

        assert_eq!(
            order,
            [
                (ResultType::BloodBank, 10.0),
                (ResultType::BloodBank, 20.0),
                (ResultType::BloodBank, 30.0),
                (ResultType::Hospital, 1.0),
                (ResultType::Hospital, 5.0),
            ]
        );
    }

    #[test]
    fn keeps_equal_entries() {
        let ranked = rank(vec![bank(10.0), bank(10.0)], Vec::new(), Vec::new());
        assert_eq!(ranked.len(), 2);
    }

    #[test]
    fn empty_inputs_rank_to_empty() {
        assert!(rank(Vec::new(), Vec::new(), Vec::new()).is_empty());
    }
}
