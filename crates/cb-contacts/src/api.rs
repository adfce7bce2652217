use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};

use crate::payload::{ContactPayload, ContactsPayload};
use crate::signal::{normalize_address, ContactFilter, ContactSelection};
use crate::{ApiError, ApiResult, AppState};

#[derive(Debug, Deserialize, ToSchema)]
pub struct AggregateRequest {
    subject: String,
    /// Contact point names; unknown names are ignored. Omitted means the service default.
    sources: Option<Vec<String>>,
    filter: Option<FilterInput>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct FilterInput {
    addresses: Option<Vec<String>>,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ContactsQuery {
    /// Comma separated contact point names.
    sources: Option<String>,
    /// Comma separated counterparty addresses.
    addresses: Option<String>,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ContactQuery {
    /// Comma separated contact point names.
    sources: Option<String>,
}

#[utoipa::path(
    post,
    path = "/v1/contacts/aggregate",
    tag = "contacts",
    request_body = AggregateRequest,
    responses(
        (status = 200, description = "Aggregated contacts", body = ContactsPayload),
        (status = 400, description = "Missing subject"),
        (status = 500, description = "A contact source failed")
    )
)]
pub async fn aggregate_contacts(
    State(state): State<AppState>,
    Json(request): Json<AggregateRequest>,
) -> ApiResult<Json<ContactsPayload>> {
    let subject = require_subject(&request.subject)?;
    let selection = selection_or_default(&state, request.sources.as_deref());
    let filter = request
        .filter
        .and_then(|filter| filter.addresses)
        .map(ContactFilter::addresses)
        .unwrap_or_default();

    let result = state
        .aggregator
        .aggregate(&subject, &selection, &filter)
        .await?;
    Ok(Json(ContactsPayload::from(&result)))
}

#[utoipa::path(
    get,
    path = "/v1/subjects/{subject}/contacts",
    tag = "contacts",
    params(("subject" = String, Path, description = "Subject address"), ContactsQuery),
    responses(
        (status = 200, description = "Aggregated contacts", body = ContactsPayload),
        (status = 500, description = "A contact source failed")
    )
)]
pub async fn list_contacts(
    State(state): State<AppState>,
    Path(subject): Path<String>,
    Query(query): Query<ContactsQuery>,
) -> ApiResult<Json<ContactsPayload>> {
    let subject = require_subject(&subject)?;
    let sources = query.sources.as_deref().map(split_csv);
    let selection = selection_or_default(&state, sources.as_deref());
    let filter = query
        .addresses
        .as_deref()
        .map(|raw| ContactFilter::addresses(split_csv(raw)))
        .unwrap_or_default();

    let result = state
        .aggregator
        .aggregate(&subject, &selection, &filter)
        .await?;
    Ok(Json(ContactsPayload::from(&result)))
}

#[utoipa::path(
    get,
    path = "/v1/subjects/{subject}/contacts/{counterparty}",
    tag = "contacts",
    params(
        ("subject" = String, Path, description = "Subject address"),
        ("counterparty" = String, Path, description = "Contact address"),
        ContactQuery
    ),
    responses(
        (status = 200, description = "The contact", body = ContactPayload),
        (status = 404, description = "No interaction and no profile"),
        (status = 500, description = "A contact source failed")
    )
)]
pub async fn get_contact(
    State(state): State<AppState>,
    Path((subject, counterparty)): Path<(String, String)>,
    Query(query): Query<ContactQuery>,
) -> ApiResult<Json<ContactPayload>> {
    let subject = require_subject(&subject)?;
    let counterparty = normalize_address(&counterparty);
    if counterparty.is_empty() {
        return Err(ApiError::new(
            StatusCode::BAD_REQUEST,
            "INVALID_REQUEST",
            "counterparty is required",
        ));
    }
    let sources = query.sources.as_deref().map(split_csv);
    let selection = selection_or_default(&state, sources.as_deref());
    let filter = ContactFilter::addresses([counterparty.as_str()]);

    let result = state
        .aggregator
        .aggregate(&subject, &selection, &filter)
        .await?;
    let contact = result
        .contacts()
        .iter()
        .find(|contact| contact.counterparty() == counterparty)
        .ok_or_else(|| ApiError::new(StatusCode::NOT_FOUND, "NOT_FOUND", "contact not found"))?;
    Ok(Json(ContactPayload::from(contact)))
}

fn require_subject(raw: &str) -> ApiResult<String> {
    let subject = normalize_address(raw);
    if subject.is_empty() {
        return Err(ApiError::new(
            StatusCode::BAD_REQUEST,
            "INVALID_REQUEST",
            "subject is required",
        ));
    }
    Ok(subject)
}

fn selection_or_default(state: &AppState, names: Option<&[String]>) -> ContactSelection {
    match names {
        Some(names) if !names.is_empty() => ContactSelection::from_names(names),
        _ => state.default_selection.clone(),
    }
}

fn split_csv(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(str::to_string)
        .collect()
}
