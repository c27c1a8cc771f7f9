mod comfort;
mod config;
mod error;
mod state;
mod telemetry;
pub mod routes {
    pub mod health;
    pub mod jobs;
    pub mod lessons;
    pub mod planning;
    pub mod rooms;
}

use axum::{
    routing::{get, post, put},
    Router,
};
use state::AppState;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[derive(OpenApi)]
#[openapi(
        paths(
            routes::health::health,
            routes::planning::weekly,
            routes::planning::optimize,
            routes::planning::enqueue_optimize,
            routes::jobs::status,
            routes::lessons::update,
            routes::lessons::delete,
            routes::rooms::day_slots,
        ),
        components(schemas(
            types::Lesson, types::Room, types::ClassCohort, types::Teacher,
            types::LessonDetails, types::TimeSlot, types::DayOfWeek, types::DayBucket,
            types::DateRange, types::DayColumn, types::ClassroomRow, types::WeeklyGrid,
            types::LessonUpdate, types::OptimizeSummary, types::ReoptimizationStatus,
            types::LessonEditOutcome, types::LessonId, types::RoomId, types::ClassId,
            types::TeacherId,
            jobs::JobId, jobs::JobStatus,
            routes::planning::OptimizeIn,
            routes::planning::JobCreated,
        )),
        tags(
            (name = "roomplan", description = "Weekly room planning API")
        )
    )]
struct ApiDoc;

fn router(state: AppState) -> Router {
    Router::new()
        .route("/v1/health", get(routes::health::health))
        .route("/v1/planning", get(routes::planning::weekly))
        .route("/v1/planning/optimize", post(routes::planning::optimize))
        .route("/v1/planning/optimize/jobs", post(routes::planning::enqueue_optimize))
        .route("/v1/jobs/:id", get(routes::jobs::status))
        .route(
            "/v1/lessons/:id",
            put(routes::lessons::update).delete(routes::lessons::delete),
        )
        .route("/v1/rooms/:id/slots", get(routes::rooms::day_slots))
        .merge(SwaggerUi::new("/docs").url("/openapi.json", ApiDoc::openapi()))
        .layer(telemetry::stack())
        .with_state(state)
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
    }
    tracing::info!("shutting down");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    telemetry::init();

    let config = config::Config::load()?;
    let app_state = AppState::from_config(&config)?;
    let app = router(app_state);

    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], config.server.port));
    tracing::info!(%addr, week_strategy = ?config.planning.week_strategy, "listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use chrono::{Datelike, NaiveDate, NaiveDateTime};
    use planning::memory::{InMemoryStore, StoreSeed};
    use planning::{Collaborators, PlanningSettings};
    use sched_core::ports::NoComfortData;
    use std::sync::Arc;
    use tower::ServiceExt;
    use types::{ClassCohort, ClassId, Lesson, LessonId, Room, RoomId, Teacher, TeacherId};

    fn at(day: u32, h: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, day)
            .unwrap()
            .and_hms_opt(h, 0, 0)
            .unwrap()
    }

    fn lesson(id: &str, day: u32, h: u32, teacher: &str) -> Lesson {
        Lesson {
            id: LessonId::from(id),
            title: id.to_uppercase(),
            start: at(day, h),
            end: at(day, h + 1),
            class_id: ClassId::from("c1"),
            room_id: None,
            teacher_id: TeacherId::from(teacher),
        }
    }

    fn app() -> Router {
        let seed = StoreSeed {
            lessons: vec![lesson("l1", 4, 9, "t1"), lesson("l2", 5, 9, "t2")],
            rooms: vec![Room {
                id: RoomId::from("r1"),
                name: "R1".into(),
                capacity: 30,
                building: Some("A".into()),
                floor: Some(1),
                enabled: true,
            }],
            classes: vec![ClassCohort {
                id: ClassId::from("c1"),
                name: "C1".into(),
                student_count: 20,
            }],
            teachers: vec![
                Teacher { id: TeacherId::from("t1"), name: "T1".into() },
                Teacher { id: TeacherId::from("t2"), name: "T2".into() },
            ],
        };
        let repos = Collaborators::in_memory(
            Arc::new(InMemoryStore::new(seed)),
            Arc::new(NoComfortData),
        );
        let config = config::Config::default();
        router(AppState::new(repos, &config, PlanningSettings::default()))
    }

    async fn call(app: Router, req: Request<Body>) -> (StatusCode, serde_json::Value) {
        let res = app.oneshot(req).await.unwrap();
        let status = res.status();
        let bytes = to_bytes(res.into_body(), usize::MAX).await.unwrap();
        let body = serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null);
        (status, body)
    }

    fn json_req(method: &str, uri: &str, body: serde_json::Value) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn optimize_then_read_the_grid() {
        let app = app();
        let (status, body) = call(
            app.clone(),
            json_req("POST", "/v1/planning/optimize", serde_json::json!({"week": 10, "year": 2024})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["lessonsChanged"], 2);

        let req = Request::get("/v1/planning?week=10&year=2024").body(Body::empty()).unwrap();
        let (status, body) = call(app, req).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["classrooms"].as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn week_out_of_range_is_unprocessable() {
        let req = Request::get("/v1/planning?week=60&year=2024").body(Body::empty()).unwrap();
        let (status, body) = call(app(), req).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert!(body["error"].as_str().unwrap().contains("60"));
    }

    #[tokio::test]
    async fn year_at_the_calendar_end_is_unprocessable() {
        let last_year = NaiveDate::MAX.year();
        let req = Request::get(format!("/v1/planning?week=53&year={last_year}"))
            .body(Body::empty())
            .unwrap();
        let (status, _) = call(app(), req).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

        let (status, _) = call(
            app(),
            json_req("POST", "/v1/planning/optimize/jobs", serde_json::json!({"week": 53, "year": last_year})),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn moving_onto_a_busy_teacher_conflicts() {
        let update = serde_json::json!({
            "title": "L1",
            "teacherId": "t2",
            "startTime": "09:30:00",
            "endTime": "10:30:00",
            "date": "2024-03-05",
        });
        let (status, _) = call(app(), json_req("PUT", "/v1/lessons/l1", update)).await;
        assert_eq!(status, StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn unknown_lesson_and_job_are_not_found() {
        let req = Request::delete("/v1/lessons/nope").body(Body::empty()).unwrap();
        let (status, _) = call(app(), req).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let req = Request::get("/v1/jobs/nope").body(Body::empty()).unwrap();
        let (status, _) = call(app(), req).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn room_slots_cover_the_day() {
        let req = Request::get("/v1/rooms/r1/slots?date=2024-03-04").body(Body::empty()).unwrap();
        let (status, body) = call(app(), req).await;
        assert_eq!(status, StatusCode::OK);
        assert!(!body.as_array().unwrap().is_empty());
    }
}
