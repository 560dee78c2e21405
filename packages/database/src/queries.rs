//! Donor queries.
//!
//! Every query joins the owning user for display fields. A donor whose
//! user row is gone still comes back, with `name` and `email` set to
//! `None`.

use bloodlink_donor_models::{BloodGroup, DonorRow};
use bloodlink_geo::LngLat;
use bloodlink_search_models::SearchFilter;
use chrono::{DateTime, NaiveDateTime, Utc};
use moosicbox_json_utils::database::ToValue as _;
use switchy_database::{Database, DatabaseValue, Row};
use uuid::Uuid;

use crate::DbError;

const DONOR_SELECT: &str = "SELECT d.id::text AS id, d.user_id::text AS user_id,
            u.username AS name, u.email AS email,
            d.blood_group, d.organ, d.age, d.weight, d.medical_conditions,
            d.location, d.phone, d.last_donation, d.verified_at,
            d.created_at, d.updated_at,
            ST_X(d.location_coords::geometry) AS longitude,
            ST_Y(d.location_coords::geometry) AS latitude
     FROM donors d
     LEFT JOIN users u ON u.id = d.user_id";

/// Parameters for the paginated donor listing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DonorListQuery {
    /// Attribute filter.
    pub filter: SearchFilter,
    /// Case-insensitive substring matched against blood group or organ.
    pub search: Option<String>,
    /// Maximum number of rows to return.
    pub limit: u32,
    /// Number of rows to skip.
    pub offset: u32,
}

/// One page of donors plus the total matching count.
#[derive(Debug, Clone, PartialEq)]
pub struct DonorPage {
    /// Donors on this page, newest first.
    pub donors: Vec<DonorRow>,
    /// Total donors matching the query across all pages.
    pub total: u64,
}

/// Finds donors within `radius_meters` of `origin`, nearest first.
///
/// Uses `ST_DWithin` on the geography column so the `GiST` index bounds the
/// scan. Distances are measured on the sphere rather than the spheroid to
/// stay close to the haversine distance reported to clients; callers still
/// re-check the radius with that distance. Donors without coordinates never
/// match.
///
/// # Errors
///
/// Returns [`DbError`] if the database operation fails.
pub async fn find_donors_within(
    db: &dyn Database,
    origin: LngLat,
    radius_meters: f64,
    filter: &SearchFilter,
) -> Result<Vec<DonorRow>, DbError> {
    let mut sql = format!(
        "{DONOR_SELECT}
         WHERE d.location_coords IS NOT NULL
           AND ST_DWithin(
               d.location_coords,
               ST_SetSRID(ST_MakePoint($1, $2), 4326)::geography,
               $3,
               false
           )"
    );
    let mut params = vec![
        DatabaseValue::Real64(origin.longitude),
        DatabaseValue::Real64(origin.latitude),
        DatabaseValue::Real64(radius_meters),
    ];

    let (clause, filter_params) = filter_clause(filter, params.len() + 1);
    sql.push_str(&clause);
    params.extend(filter_params);

    sql.push_str(
        " ORDER BY d.location_coords <-> ST_SetSRID(ST_MakePoint($1, $2), 4326)::geography",
    );

    let rows = db.query_raw_params(&sql, &params).await?;
    log::debug!(
        "Proximity query at ({}, {}) matched {} donors",
        origin.latitude,
        origin.longitude,
        rows.len()
    );

    Ok(rows.iter().filter_map(donor_from_row).collect())
}

/// Looks up the donor profile owned by `user_id`.
///
/// Binds the ID as `uuid` so the unique index on `donors.user_id` is used.
///
/// # Errors
///
/// Returns [`DbError`] if the database operation fails.
pub async fn find_donor_by_user(
    db: &dyn Database,
    user_id: Uuid,
) -> Result<Option<DonorRow>, DbError> {
    let sql = format!("{DONOR_SELECT} WHERE d.user_id = $1::uuid LIMIT 1");
    let rows = db
        .query_raw_params(&sql, &[DatabaseValue::String(user_id.to_string())])
        .await?;

    Ok(rows.first().and_then(donor_from_row))
}

/// Lists donors page by page, newest first.
///
/// # Errors
///
/// Returns [`DbError`] if the database operation fails.
pub async fn list_donors(db: &dyn Database, query: &DonorListQuery) -> Result<DonorPage, DbError> {
    let (where_sql, mut params) = list_where_clause(query);

    let count_rows = db
        .query_raw_params(
            &format!("SELECT COUNT(*) AS count FROM donors d{where_sql}"),
            &params,
        )
        .await?;
    let count: i64 = count_rows
        .first()
        .map_or(0, |r| r.to_value("count").unwrap_or(0));

    let limit_idx = params.len() + 1;
    let sql = format!(
        "{DONOR_SELECT}{where_sql} ORDER BY d.created_at DESC LIMIT ${limit_idx} OFFSET ${}",
        limit_idx + 1
    );
    params.push(DatabaseValue::Int64(i64::from(query.limit)));
    params.push(DatabaseValue::Int64(i64::from(query.offset)));

    let rows = db.query_raw_params(&sql, &params).await?;

    Ok(DonorPage {
        donors: rows.iter().filter_map(donor_from_row).collect(),
        total: u64::try_from(count).unwrap_or(0),
    })
}

/// SQL fragment and parameters restricting donors to `filter`.
///
/// Placeholders are numbered from `first_param`.
fn filter_clause(filter: &SearchFilter, first_param: usize) -> (String, Vec<DatabaseValue>) {
    match filter {
        SearchFilter::Any => (String::new(), Vec::new()),
        SearchFilter::Blood(group) => (
            format!(" AND d.blood_group = ${first_param}"),
            vec![DatabaseValue::String(group.clone())],
        ),
        SearchFilter::Organ(organ) => (
            format!(" AND d.organ = ${first_param}"),
            vec![DatabaseValue::String(organ.clone())],
        ),
    }
}

fn list_where_clause(query: &DonorListQuery) -> (String, Vec<DatabaseValue>) {
    let (mut sql, mut params) = filter_clause(&query.filter, 1);

    if let Some(term) = query
        .search
        .as_deref()
        .map(str::trim)
        .filter(|t| !t.is_empty())
    {
        let idx = params.len() + 1;
        sql.push_str(&format!(
            " AND (d.blood_group ILIKE ${idx} OR d.organ ILIKE ${idx})"
        ));
        params.push(DatabaseValue::String(format!("%{}%", escape_like(term))));
    }

    if sql.is_empty() {
        (String::new(), params)
    } else {
        (format!(" WHERE 1=1{sql}"), params)
    }
}

/// Escapes `LIKE` wildcards so user input matches literally.
fn escape_like(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len());
    for c in term.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

fn donor_from_row(row: &Row) -> Option<DonorRow> {
    let id: String = row.to_value("id").unwrap_or_default();
    let blood_group_name: String = row.to_value("blood_group").unwrap_or_default();
    let Ok(blood_group) = blood_group_name.parse::<BloodGroup>() else {
        log::warn!("Skipping donor {id} with unknown blood group {blood_group_name:?}");
        return None;
    };

    let longitude: Option<f64> = row.to_value("longitude").unwrap_or(None);
    let latitude: Option<f64> = row.to_value("latitude").unwrap_or(None);
    let location_coords = longitude
        .zip(latitude)
        .map(|(lng, lat)| LngLat::new(lng, lat))
        .filter(LngLat::is_valid);

    let last_donation: Option<NaiveDateTime> = row.to_value("last_donation").unwrap_or(None);
    let verified_at: Option<NaiveDateTime> = row.to_value("verified_at").unwrap_or(None);
    let created_at: NaiveDateTime = row.to_value("created_at").unwrap_or_default();
    let updated_at: NaiveDateTime = row.to_value("updated_at").unwrap_or_default();

    Some(DonorRow {
        id,
        user_id: row.to_value("user_id").unwrap_or_default(),
        name: row.to_value("name").unwrap_or(None),
        email: row.to_value("email").unwrap_or(None),
        blood_group,
        organ: row.to_value("organ").unwrap_or(None),
        age: row.to_value("age").unwrap_or(0),
        weight: row.to_value("weight").unwrap_or(None),
        medical_conditions: row.to_value("medical_conditions").unwrap_or(None),
        location: row.to_value("location").unwrap_or_default(),
        location_coords,
        phone: row.to_value("phone").unwrap_or(None),
        last_donation: last_donation.map(to_utc),
        verified_at: verified_at.map(to_utc),
        created_at: to_utc(created_at),
        updated_at: to_utc(updated_at),
    })
}

fn to_utc(naive: NaiveDateTime) -> DateTime<Utc> {
    DateTime::<Utc>::from_naive_utc_and_offset(naive, Utc)
}
