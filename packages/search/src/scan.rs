//! Linear proximity scan over the static facility collections.
//!
//! The collections are small and admin-curated, so every record is
//! checked on every search; there is no spatial index.

use bloodlink_facility_models::Facility;
use bloodlink_geo::LngLat;
use bloodlink_search_models::{Ranked, SearchFilter};

/// Slack added to the radius so a point computed to lie exactly on the
/// boundary is not lost to floating-point rounding.
pub const RADIUS_TOLERANCE_METERS: f64 = 1e-6;

/// Whether `distance` falls inside `radius_meters`, boundary included.
#[must_use]
pub fn within_radius(distance: f64, radius_meters: f64) -> bool {
    distance <= radius_meters + RADIUS_TOLERANCE_METERS
}

/// Returns every record within `radius_meters` of `origin` that satisfies
/// `filter`, annotated with its distance. Input order is preserved.
///
/// Records whose coordinates are missing or malformed are skipped. The
/// returned copies carry no `type` or `distance` fields of their own.
#[must_use]
pub fn scan_facilities<F: Facility + Clone>(
    records: &[F],
    origin: LngLat,
    radius_meters: f64,
    filter: &SearchFilter,
) -> Vec<Ranked<F>> {
    let mut skipped = 0usize;

    let matches = records
        .iter()
        .filter_map(|record| {
            let Some(point) = record.coordinates() else {
                skipped += 1;
                return None;
            };
            let distance = origin.distance_to(point);
            if !(within_radius(distance, radius_meters) && filter.matches_facility(record)) {
                return None;
            }
            let mut record = record.clone();
            record.strip_reserved_fields();
            Some(Ranked::new(record, distance))
        })
        .collect();

    if skipped > 0 {
        log::debug!("Skipped {skipped} records without usable coordinates");
    }

    matches
}

#[cfg(test)]
mod tests {
    use super::*;
    use bloodlink_facility_models::{BloodBankRecord, HospitalRecord};
    use bloodlink_search_models::RankedResult;
    use serde_json::json;

    const ORIGIN: LngLat = LngLat::new(72.8777, 19.0760);

    fn bank_at(name: &str, point: LngLat, inventory: serde_json::Value) -> BloodBankRecord {
        serde_json::from_value(json!({
            "name": name,
            "locationCoords": point.to_geojson_value(),
            "bloodInventory": inventory,
        }))
        .unwrap()
    }

    fn names<F>(ranked: &[Ranked<F>], name: impl Fn(&F) -> Option<&str>) -> Vec<String> {
        ranked
            .iter()
            .filter_map(|r| name(&r.record).map(ToString::to_string))
            .collect()
    }

    #[test]
    fn radius_boundary_is_inclusive() {
        let records = vec![
            bank_at("edge", ORIGIN.destination(0.0, 50_000.0), json!({})),
            bank_at("outside", ORIGIN.destination(90.0, 50_001.0), json!({})),
        ];

        let found = scan_facilities(&records, ORIGIN, 50_000.0, &SearchFilter::Any);

        assert_eq!(names(&found, |r| r.name.as_deref()), ["edge"]);
    }

    #[test]
    fn blood_filter_requires_positive_stock() {
        let records = vec![
            bank_at("empty", ORIGIN.destination(0.0, 1_000.0), json!({ "O+": 0 })),
            bank_at("stocked", ORIGIN.destination(0.0, 2_000.0), json!({ "O+": 1 })),
        ];

        let found = scan_facilities(
            &records,
            ORIGIN,
            50_000.0,
            &SearchFilter::Blood("O+".to_string()),
        );

        assert_eq!(names(&found, |r| r.name.as_deref()), ["stocked"]);
    }

    #[test]
    fn records_without_coordinates_are_skipped() {
        let records: Vec<HospitalRecord> = serde_json::from_value(json!([
            { "name": "no coords" },
            { "name": "null coords", "locationCoords": null },
            { "name": "short", "locationCoords": { "coordinates": [72.88] } },
            { "name": "strings", "locationCoords": { "coordinates": ["72.88", "19.07"] } },
            { "name": "ok", "locationCoords": { "type": "Point", "coordinates": [72.88, 19.08] } },
        ]))
        .unwrap();

        let found = scan_facilities(&records, ORIGIN, 50_000.0, &SearchFilter::Any);

        assert_eq!(names(&found, |r| r.name.as_deref()), ["ok"]);
    }

    #[test]
    fn computed_type_and_distance_are_not_shadowed_by_record_fields() {
        let point = ORIGIN.destination(90.0, 1_500.0);
        let records: Vec<BloodBankRecord> = serde_json::from_value(json!([{
            "name": "State Bank",
            "type": "government",
            "distance": 0,
            "locationCoords": [point.longitude, point.latitude],
        }]))
        .unwrap();

        let mut found = scan_facilities(&records, ORIGIN, 50_000.0, &SearchFilter::Any);
        let text = serde_json::to_string(&RankedResult::BloodBank(found.remove(0))).unwrap();

        assert_eq!(text.matches("\"type\":").count(), 1, "{text}");
        assert_eq!(text.matches("\"distance\":").count(), 1, "{text}");

        let json: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(json["type"], "bloodbank");
        assert!((json["distance"].as_f64().unwrap() - 1_500.0).abs() < 1e-3);
        assert_eq!(records[0].extra.get("type"), Some(&json!("government")));
    }

    #[test]
    fn annotates_distance() {
        let point = ORIGIN.destination(180.0, 12_345.0);
        let records = vec![bank_at("south", point, json!({}))];

        let found = scan_facilities(&records, ORIGIN, 50_000.0, &SearchFilter::Any);

        assert_eq!(found.len(), 1);
        assert!((found[0].distance - 12_345.0).abs() < 1e-3);
    }
}
