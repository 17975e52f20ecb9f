// src/routes.rs

use axum::{
    Router,
    http::{HeaderValue, Method, header},
    middleware,
    routing::{delete, get, post, put},
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{
    config::Tenancy,
    handlers::{auth, proforma, responses, surveys, take},
    state::AppState,
    utils::jwt::{auth_middleware, page_auth_middleware},
};

/// Assembles the main application router.
///
/// * Owner routes (builder, responses, exports) sit behind `auth_middleware`.
/// * Owner HTML pages also accept the login cookie.
/// * Account routes are only mounted in multi-tenant mode.
/// * Respondent and proforma routes are public.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin([
            HeaderValue::from_static("http://localhost:3000"),
            HeaderValue::from_static("http://127.0.0.1:3000"),
        ])
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE]);

    let survey_routes = Router::new()
        .route("/", get(surveys::list_surveys).post(surveys::create_survey))
        .route(
            "/{id}",
            get(surveys::get_survey)
                .put(surveys::update_survey)
                .delete(surveys::delete_survey),
        )
        .route("/{id}/publish", post(surveys::publish_survey))
        .route("/{id}/questions", post(surveys::add_question))
        .route("/{id}/questions/order", put(surveys::reorder_questions))
        .route(
            "/{id}/questions/{qid}",
            put(surveys::update_question).delete(surveys::delete_question),
        )
        .route("/{id}/questions/{qid}/duplicate", post(surveys::duplicate_question))
        .route("/{id}/questions/{qid}/move", post(surveys::move_question))
        .route("/{id}/questions/{qid}/options", post(surveys::add_option))
        .route(
            "/{id}/questions/{qid}/options/{index}",
            put(surveys::rename_option).delete(surveys::delete_option),
        )
        .route(
            "/{id}/questions/{qid}/options/{index}/move",
            post(surveys::move_option),
        )
        .route("/{id}/responses", get(responses::list_responses))
        .route(
            "/{id}/responses/{rid}",
            get(responses::get_response).delete(responses::delete_response),
        )
        .route("/{id}/summary", get(responses::survey_summary))
        .route("/{id}/export/{format}", get(responses::export_survey))
        .route(
            "/{id}/responses/{rid}/export/{format}",
            get(responses::export_response),
        )
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    let owner_pages = Router::new()
        .route("/surveys/{id}/responses", get(responses::responses_page))
        .route("/surveys/{id}/responses/{rid}", get(responses::response_page))
        .layer(middleware::from_fn_with_state(state.clone(), page_auth_middleware));

    let public_routes = Router::new()
        .route("/surveys/{id}", get(take::get_public_survey))
        .route(
            "/surveys/{id}/pages/{page}/validate",
            post(take::validate_survey_page),
        )
        .route("/surveys/{id}/responses", post(take::submit_response));

    let proforma_routes = Router::new()
        .route("/proforma", get(proforma::dashboard))
        .route("/proforma/take", get(proforma::take_form).post(proforma::take_step))
        .route("/proforma/responses", get(proforma::responses_page))
        .route("/proforma/responses/{pid}", get(proforma::response_page))
        .route("/proforma/export/{format}", get(proforma::export_all))
        .route(
            "/proforma/responses/{pid}/export/{format}",
            get(proforma::export_one),
        )
        .route("/api/proforma/responses", get(proforma::list_responses))
        .route(
            "/api/proforma/responses/{pid}",
            delete(proforma::delete_response),
        );

    let mut app = Router::new()
        .nest("/api/surveys", survey_routes)
        .nest("/api/public", public_routes)
        .route("/take/{id}", get(take::take_form).post(take::take_step))
        .merge(owner_pages)
        .merge(proforma_routes);

    if state.config.tenancy == Tenancy::Multi {
        let auth_routes = Router::new()
            .route("/register", post(auth::register))
            .route("/login", post(auth::login))
            .route(
                "/me",
                get(auth::me)
                    .layer(middleware::from_fn_with_state(state.clone(), auth_middleware)),
            );
        app = app.nest("/api/auth", auth_routes);
    }

    app
        // Global Middleware (applied from outside in)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
