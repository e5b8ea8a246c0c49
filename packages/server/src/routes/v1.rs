use utoipa_axum::router::OpenApiRouter;
use utoipa_axum::routes;

use crate::config::AppConfig;
use crate::handlers;
use crate::state::AppState;

pub fn routes(config: &AppConfig) -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .merge(auth_routes())
        .merge(public_routes())
        .merge(admin_routes(config))
}

fn auth_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(handlers::auth::login))
        .routes(routes!(handlers::auth::logout))
        .routes(routes!(handlers::auth::session))
        .routes(routes!(handlers::auth::session_events))
}

fn public_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(handlers::media::list_videos))
        .routes(routes!(handlers::case_study::list_case_studies))
        .routes(routes!(handlers::case_study::get_case_study))
        .routes(routes!(handlers::showcase::list_showcase))
}

fn admin_routes(config: &AppConfig) -> OpenApiRouter<AppState> {
    let upload = OpenApiRouter::new()
        .routes(routes!(
            handlers::media::admin_list_videos,
            handlers::media::submit_video
        ))
        .layer(handlers::media::media_upload_body_limit(
            config.storage.max_upload_size,
        ));

    OpenApiRouter::new()
        .routes(routes!(handlers::case_study::create_case_study))
        .routes(routes!(handlers::showcase::create_showcase_item))
        .merge(upload)
}
