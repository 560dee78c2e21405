//! HTTP handler functions for the bloodlink API.

use actix_web::error::{InternalError, QueryPayloadError};
use actix_web::{HttpRequest, HttpResponse, web};
use bloodlink_database::queries::DonorListQuery;
use bloodlink_search::combined_search;
use bloodlink_search_models::{SearchFilter, SearchOrigin};
use bloodlink_server_models::{
    ApiDonorSummary, ApiHealth, ApiMessage, DonorListParams, DonorListResponse,
    PublicDonorResponse, SearchQueryParams,
};
use uuid::Uuid;

use crate::AppState;

fn not_found() -> HttpResponse {
    HttpResponse::NotFound().json(ApiMessage::new("Donor not found"))
}

fn server_error() -> HttpResponse {
    HttpResponse::InternalServerError().json(ApiMessage::new("Server error"))
}

/// Answers malformed query strings with a JSON 400 instead of Actix's
/// plain-text default.
pub fn query_error(err: QueryPayloadError, _req: &HttpRequest) -> actix_web::Error {
    let response = HttpResponse::BadRequest().json(ApiMessage::new(format!(
        "Invalid query parameters: {err}"
    )));
    InternalError::from_response(err, response).into()
}

/// `GET /api/health`
pub async fn health() -> HttpResponse {
    HttpResponse::Ok().json(ApiHealth {
        healthy: true,
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// `GET /api/search`
///
/// Ranks donors, blood banks, and hospitals within the search radius of
/// `lat`/`lng`, optionally narrowed by `type`/`value`. The donor store is
/// not queried unless the coordinates are valid.
pub async fn search(
    state: web::Data<AppState>,
    params: web::Query<SearchQueryParams>,
) -> HttpResponse {
    let origin = match SearchOrigin::parse(params.lat.as_deref(), params.lng.as_deref()) {
        Ok(origin) => origin,
        Err(e) => return HttpResponse::BadRequest().json(ApiMessage::new(e.to_string())),
    };
    let filter = SearchFilter::from_query(params.kind.as_deref(), params.value.as_deref());
    let facilities = state.catalog.snapshot();

    match combined_search(state.donors.as_ref(), &facilities, origin, &filter).await {
        Ok(results) => HttpResponse::Ok().json(results),
        Err(e) => {
            log::error!("Search failed: {e}");
            server_error()
        }
    }
}

/// `GET /api/donors`
///
/// Pages through all donors, newest first.
pub async fn list_donors(
    state: web::Data<AppState>,
    params: web::Query<DonorListParams>,
) -> HttpResponse {
    let query = DonorListQuery {
        filter: SearchFilter::from_query(params.kind.as_deref(), params.value.as_deref()),
        search: params.search.clone(),
        limit: params.limit(),
        offset: params.offset(),
    };

    match state.donors.list_donors(&query).await {
        Ok(page) => HttpResponse::Ok().json(DonorListResponse {
            donors: page.donors.into_iter().map(ApiDonorSummary::from).collect(),
            total: page.total,
            page: params.page(),
        }),
        Err(e) => {
            log::error!("Failed to list donors: {e}");
            server_error()
        }
    }
}

/// `GET /api/donors/public/{user_id}`
///
/// A `user_id` that is not a UUID cannot own a donor and is answered with
/// 404 without touching the store.
pub async fn public_donor(state: web::Data<AppState>, path: web::Path<String>) -> HttpResponse {
    let Ok(user_id) = Uuid::parse_str(path.trim()) else {
        return not_found();
    };

    match state.donors.donor_by_user(user_id).await {
        Ok(Some(row)) => HttpResponse::Ok().json(PublicDonorResponse { donor: row.into() }),
        Ok(None) => not_found(),
        Err(e) => {
            log::error!("Failed to fetch donor for user {user_id}: {e}");
            server_error()
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use actix_web::http::StatusCode;
    use actix_web::{App, test};
    use bloodlink_donor_models::{BloodGroup, DonorRow};
    use bloodlink_facility::FacilityCatalog;
    use bloodlink_facility_models::{BloodBankRecord, HospitalRecord};
    use bloodlink_geo::LngLat;
    use bloodlink_search::DonorStore;
    use bloodlink_search::memory::MemoryDonorStore;
    use chrono::{Duration, Utc};
    use serde_json::{Value, json};
    use uuid::Uuid;

    use crate::{AppState, configure};

    const MUMBAI: LngLat = LngLat::new(72.8777, 19.0760);
    const SEARCH: &str = "/api/search?lat=19.0760&lng=72.8777";

    fn donor(id: &str, group: BloodGroup, meters_north: f64, age_days: i64) -> DonorRow {
        let created_at = Utc::now() - Duration::days(age_days);
        DonorRow {
            id: id.to_string(),
            user_id: Uuid::new_v4().to_string(),
            name: Some(format!("donor {id}")),
            email: Some(format!("{id}@example.com")),
            blood_group: group,
            organ: None,
            age: 30,
            weight: Some(65.0),
            medical_conditions: None,
            location: "Mumbai".to_string(),
            location_coords: Some(MUMBAI.destination(0.0, meters_north)),
            phone: Some("98200 00000".to_string()),
            last_donation: None,
            verified_at: Some(created_at),
            created_at,
            updated_at: created_at,
        }
    }

    fn catalog() -> FacilityCatalog {
        let bank: BloodBankRecord = serde_json::from_value(json!({
            "id": 1,
            "name": "Central Blood Bank",
            "locationCoords": MUMBAI.destination(90.0, 12_000.0).to_geojson_value(),
            "bloodInventory": { "O+": 4, "A+": 0 },
        }))
        .unwrap();
        let hospital: HospitalRecord = serde_json::from_value(json!({
            "id": "1712345678901",
            "name": "City Hospital",
            "locationCoords": MUMBAI.destination(180.0, 6_000.0).to_geojson_value(),
            "bloodInventory": { "O+": 1 },
            "organInventory": { "kidney": 2 },
        }))
        .unwrap();
        FacilityCatalog::from_collections(vec![bank], vec![hospital])
    }

    fn state(store: &Arc<MemoryDonorStore>) -> actix_web::web::Data<AppState> {
        let donors: Arc<dyn DonorStore> = store.clone();
        actix_web::web::Data::new(AppState {
            donors,
            catalog: Arc::new(catalog()),
        })
    }

    fn types(body: &Value) -> Vec<&str> {
        body.as_array()
            .unwrap()
            .iter()
            .map(|r| r["type"].as_str().unwrap())
            .collect()
    }

    #[actix_web::test]
    async fn health_reports_version() {
        let store = Arc::new(MemoryDonorStore::default());
        let app = test::init_service(App::new().app_data(state(&store)).configure(configure)).await;

        let req = test::TestRequest::get().uri("/api/health").to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;

        assert_eq!(body["healthy"], true);
        assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
    }

    #[actix_web::test]
    async fn search_without_coordinates_is_rejected_before_querying() {
        let store = Arc::new(MemoryDonorStore::default());
        let app = test::init_service(App::new().app_data(state(&store)).configure(configure)).await;

        for uri in ["/api/search", "/api/search?lng=72.8777", "/api/search?lat=&lng=72.8"] {
            let req = test::TestRequest::get().uri(uri).to_request();
            let resp = test::call_service(&app, req).await;
            assert_eq!(resp.status(), StatusCode::BAD_REQUEST, "{uri}");

            let body: Value = test::read_body_json(resp).await;
            assert_eq!(body["message"], "Coordinates required");
        }

        assert_eq!(store.calls(), 0);
    }

    #[actix_web::test]
    async fn search_with_invalid_coordinates_is_rejected() {
        let store = Arc::new(MemoryDonorStore::default());
        let app = test::init_service(App::new().app_data(state(&store)).configure(configure)).await;

        for uri in [
            "/api/search?lat=abc&lng=72.8777",
            "/api/search?lat=95&lng=72.8777",
            "/api/search?lat=19.07&lng=NaN",
        ] {
            let req = test::TestRequest::get().uri(uri).to_request();
            let resp = test::call_service(&app, req).await;
            assert_eq!(resp.status(), StatusCode::BAD_REQUEST, "{uri}");

            let body: Value = test::read_body_json(resp).await;
            assert_eq!(body["message"], "Invalid coordinates");
        }

        assert_eq!(store.calls(), 0);
    }

    #[actix_web::test]
    async fn search_ranks_by_type_then_distance() {
        let store = Arc::new(MemoryDonorStore::new(vec![
            donor("far", BloodGroup::OPositive, 9_000.0, 1),
            donor("near", BloodGroup::OPositive, 500.0, 1),
        ]));
        let app = test::init_service(App::new().app_data(state(&store)).configure(configure)).await;

        let req = test::TestRequest::get()
            .uri(&format!("{SEARCH}&type=blood&value=O%2B"))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);

        let body: Value = test::read_body_json(resp).await;
        assert_eq!(types(&body), ["bloodbank", "hospital", "donor", "donor"]);
        assert_eq!(body[0]["name"], "Central Blood Bank");
        assert_eq!(body[1]["organInventory"]["kidney"], 2);
        assert_eq!(body[2]["id"], "near");
        assert_eq!(body[3]["id"], "far");

        let bank_distance = body[0]["distance"].as_f64().unwrap();
        assert!((bank_distance - 12_000.0).abs() < 1.0, "{bank_distance}");
        assert_eq!(store.calls(), 1);
    }

    #[actix_web::test]
    async fn unencoded_plus_in_blood_group_still_matches() {
        let store = Arc::new(MemoryDonorStore::new(vec![
            donor("o-pos", BloodGroup::OPositive, 1_000.0, 1),
            donor("a-pos", BloodGroup::APositive, 1_000.0, 1),
        ]));
        let app = test::init_service(App::new().app_data(state(&store)).configure(configure)).await;

        let req = test::TestRequest::get()
            .uri(&format!("{SEARCH}&type=blood&value=O+"))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;

        let donors: Vec<&Value> = body
            .as_array()
            .unwrap()
            .iter()
            .filter(|r| r["type"] == "donor")
            .collect();
        assert_eq!(donors.len(), 1);
        assert_eq!(donors[0]["bloodGroup"], "O+");
    }

    #[actix_web::test]
    async fn blood_filter_excludes_unstocked_facilities() {
        let store = Arc::new(MemoryDonorStore::default());
        let app = test::init_service(App::new().app_data(state(&store)).configure(configure)).await;

        let req = test::TestRequest::get()
            .uri(&format!("{SEARCH}&type=blood&value=A%2B"))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;

        assert!(body.as_array().unwrap().is_empty());
    }

    #[actix_web::test]
    async fn store_failure_is_a_server_error() {
        let store = Arc::new(MemoryDonorStore::unavailable());
        let app = test::init_service(App::new().app_data(state(&store)).configure(configure)).await;

        let req = test::TestRequest::get().uri(SEARCH).to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body, json!({ "message": "Server error" }));
    }

    #[actix_web::test]
    async fn public_profile_lookup() {
        let row = donor("d1", BloodGroup::AbNegative, 100.0, 3);
        let user_id = row.user_id.clone();
        let store = Arc::new(MemoryDonorStore::new(vec![row]));
        let app = test::init_service(App::new().app_data(state(&store)).configure(configure)).await;

        let req = test::TestRequest::get()
            .uri(&format!("/api/donors/public/{user_id}"))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["donor"]["name"], "donor d1");
        assert!(body["donor"].get("phone").is_none());

        let req = test::TestRequest::get()
            .uri(&format!("/api/donors/public/{}", Uuid::new_v4()))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["message"], "Donor not found");
        assert_eq!(store.calls(), 2);
    }

    #[actix_web::test]
    async fn malformed_user_id_is_not_found_without_querying() {
        let store = Arc::new(MemoryDonorStore::new(vec![donor(
            "d1",
            BloodGroup::OPositive,
            100.0,
            3,
        )]));
        let app = test::init_service(App::new().app_data(state(&store)).configure(configure)).await;

        let req = test::TestRequest::get()
            .uri("/api/donors/public/nobody")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);

        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["message"], "Donor not found");
        assert_eq!(store.calls(), 0);
    }

    #[actix_web::test]
    async fn donor_listing_pages_newest_first() {
        let store = Arc::new(MemoryDonorStore::new(vec![
            donor("oldest", BloodGroup::OPositive, 100.0, 30),
            donor("newest", BloodGroup::OPositive, 100.0, 1),
            donor("middle", BloodGroup::BPositive, 100.0, 10),
        ]));
        let app = test::init_service(App::new().app_data(state(&store)).configure(configure)).await;

        let req = test::TestRequest::get()
            .uri("/api/donors?page=2&limit=2")
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["total"], 3);
        assert_eq!(body["page"], 2);
        assert_eq!(body["donors"].as_array().unwrap().len(), 1);
        assert_eq!(body["donors"][0]["id"], "oldest");
        assert_eq!(body["donors"][0]["type"], "donor");

        let req = test::TestRequest::get()
            .uri("/api/donors?type=blood&value=O%2B")
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["total"], 2);
        assert_eq!(body["page"], 1);
        assert_eq!(body["donors"][0]["id"], "newest");
    }

    #[actix_web::test]
    async fn malformed_paging_is_a_bad_request() {
        let store = Arc::new(MemoryDonorStore::default());
        let app = test::init_service(App::new().app_data(state(&store)).configure(configure)).await;

        let req = test::TestRequest::get()
            .uri("/api/donors?page=first")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let body: Value = test::read_body_json(resp).await;
        assert!(body["message"].as_str().unwrap().starts_with("Invalid query parameters"));
        assert_eq!(store.calls(), 0);
    }
}
