use std::convert::Infallible;

use serde::{Deserialize, Serialize};
use tracing::{error, info};
use warp::http::StatusCode;
use warp::{Filter, Rejection, Reply};

use crate::error::StoreError;
use crate::models::day::NoteId;
use crate::service::day_service::DayService;

const MAX_BODY_BYTES: u64 = 16 * 1024;

/// Prefix of the 404 body for a day with no record, as opposed to an
/// unknown route.
pub const NO_RECORD_PREFIX: &str = "No record for";

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorMessage {
    pub error: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AddNoteRequest {
    pub content: String,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreOnThisDayRequest {
    pub title: String,
    pub year: i64,
    pub wiki_link: String,
}

pub fn routes(
    service: DayService,
) -> impl Filter<Extract = (impl Reply,), Error = Infallible> + Clone {
    let health = warp::path!("health")
        .and(warp::get())
        .map(|| warp::reply::json(&serde_json::json!({ "status": "ok" })));

    let get_day_route = warp::path!("api" / "days" / String)
        .and(warp::get())
        .and(with_service(service.clone()))
        .and_then(get_day_data);

    let get_month_route = warp::path!("api" / "months" / i32 / u32)
        .and(warp::get())
        .and(with_service(service.clone()))
        .and_then(get_month_data);

    let add_note_route = warp::path!("api" / "days" / String / "notes")
        .and(warp::post())
        .and(warp::body::content_length_limit(MAX_BODY_BYTES))
        .and(warp::body::json())
        .and(with_service(service.clone()))
        .and_then(add_note);

    let complete_note_route = warp::path!("api" / "days" / String / "notes" / String / "complete")
        .and(warp::post())
        .and(with_service(service.clone()))
        .and_then(complete_note);

    let store_on_this_day_route = warp::path!("api" / "days" / String / "on-this-day")
        .and(warp::put())
        .and(warp::body::content_length_limit(MAX_BODY_BYTES))
        .and(warp::body::json())
        .and(with_service(service))
        .and_then(store_on_this_day);

    health
        .or(get_day_route)
        .or(get_month_route)
        .or(add_note_route)
        .or(complete_note_route)
        .or(store_on_this_day_route)
        .recover(handle_rejection)
        .with(warp::log::custom(|request| {
            info!(
                "{} {} -> {} ({:?})",
                request.method(),
                request.path(),
                request.status().as_u16(),
                request.elapsed()
            );
        }))
}

fn with_service(
    service: DayService,
) -> impl Filter<Extract = (DayService,), Error = Infallible> + Clone {
    warp::any().map(move || service.clone())
}

async fn get_day_data(date: String, service: DayService) -> Result<Box<dyn Reply>, Infallible> {
    Ok(match service.get_day_data(&date).await {
        Ok(Some(record)) => Box::new(warp::reply::json(&record)),
        Ok(None) => error_reply(StatusCode::NOT_FOUND, format!("{} {}", NO_RECORD_PREFIX, date)),
        Err(err) => store_error_reply(err),
    })
}

async fn get_month_data(
    year: i32,
    month: u32,
    service: DayService,
) -> Result<Box<dyn Reply>, Infallible> {
    Ok(match service.get_month_data(year, month).await {
        Ok(entries) => Box::new(warp::reply::json(&entries)),
        Err(err) => store_error_reply(err),
    })
}

async fn add_note(
    date: String,
    body: AddNoteRequest,
    service: DayService,
) -> Result<Box<dyn Reply>, Infallible> {
    Ok(match service.add_note(&date, &body.content).await {
        Ok(note) => Box::new(warp::reply::with_status(
            warp::reply::json(&note),
            StatusCode::CREATED,
        )),
        Err(err) => store_error_reply(err),
    })
}

async fn complete_note(
    date: String,
    note_id: String,
    service: DayService,
) -> Result<Box<dyn Reply>, Infallible> {
    let Ok(note_id) = note_id.parse::<NoteId>() else {
        return Ok(error_reply(
            StatusCode::BAD_REQUEST,
            format!("Invalid note id: {}", note_id),
        ));
    };
    Ok(match service.complete_note(&date, note_id).await {
        Ok(()) => Box::new(StatusCode::NO_CONTENT),
        Err(err) => store_error_reply(err),
    })
}

async fn store_on_this_day(
    date: String,
    body: StoreOnThisDayRequest,
    service: DayService,
) -> Result<Box<dyn Reply>, Infallible> {
    let result = service
        .store_on_this_day(&date, &body.title, body.year, &body.wiki_link)
        .await;
    Ok(match result {
        Ok(()) => Box::new(StatusCode::NO_CONTENT),
        Err(err) => store_error_reply(err),
    })
}

fn store_error_reply(err: StoreError) -> Box<dyn Reply> {
    let status = match &err {
        StoreError::InvalidDate(_) | StoreError::InvalidMonth { .. } => StatusCode::BAD_REQUEST,
        StoreError::FactAlreadyStored(_) => StatusCode::CONFLICT,
        StoreError::Io(_) | StoreError::Serialize(_) => {
            error!("Store failure: {}", err);
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };
    error_reply(status, err.to_string())
}

fn error_reply(status: StatusCode, message: String) -> Box<dyn Reply> {
    Box::new(warp::reply::with_status(
        warp::reply::json(&ErrorMessage { error: message }),
        status,
    ))
}

async fn handle_rejection(rejection: Rejection) -> Result<impl Reply, Infallible> {
    let (status, message) = if rejection.is_not_found() {
        (StatusCode::NOT_FOUND, "Not found".to_string())
    } else if let Some(err) = rejection.find::<warp::filters::body::BodyDeserializeError>() {
        (StatusCode::BAD_REQUEST, format!("Invalid body: {}", err))
    } else if rejection.find::<warp::reject::PayloadTooLarge>().is_some() {
        (StatusCode::PAYLOAD_TOO_LARGE, "Body too large".to_string())
    } else if rejection.find::<warp::reject::MethodNotAllowed>().is_some() {
        (StatusCode::METHOD_NOT_ALLOWED, "Method not allowed".to_string())
    } else {
        error!("Unhandled rejection: {:?}", rejection);
        (StatusCode::INTERNAL_SERVER_ERROR, "Internal error".to_string())
    };
    Ok(warp::reply::with_status(
        warp::reply::json(&ErrorMessage { error: message }),
        status,
    ))
}
