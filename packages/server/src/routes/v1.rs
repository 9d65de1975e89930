use utoipa_axum::router::OpenApiRouter;
use utoipa_axum::routes;

use crate::config::AppConfig;
use crate::handlers;
use crate::state::AppState;

pub fn routes(config: &AppConfig) -> OpenApiRouter<AppState> {
    OpenApiRouter::new().nest("/uploads", upload_routes(config))
}

fn upload_routes(config: &AppConfig) -> OpenApiRouter<AppState> {
    let intake = OpenApiRouter::new()
        .routes(routes!(handlers::upload::upload_file))
        .layer(handlers::upload::upload_body_limit(
            config.storage.max_upload_size,
        ));

    let retrieval = OpenApiRouter::new()
        .routes(routes!(handlers::upload::show_file))
        .routes(routes!(handlers::upload::download_file));

    intake.merge(retrieval)
}
