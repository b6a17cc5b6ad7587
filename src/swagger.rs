use actix_web::web;
use utoipa::OpenApi;
use utoipa::{
    Modify,
    openapi::security::{Http, HttpAuthScheme, SecurityScheme},
};
use utoipa_swagger_ui::SwaggerUi;

use crate::handlers;
use crate::models::*;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(Http::new(HttpAuthScheme::Bearer)),
            )
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::game::get_prizes,
        handlers::game::play,
        handlers::staff::scan,
        handlers::staff::redeem,
        handlers::staff::list_participants,
        handlers::staff::get_participant,
        handlers::staff::get_participant_token,
        handlers::staff::toggle_redeemed,
        handlers::staff::delete_participant,
        handlers::staff::list_prizes,
        handlers::staff::create_prize,
        handlers::staff::update_prize,
        handlers::staff::delete_prize,
        handlers::staff::get_stats,
    ),
    components(
        schemas(
            Prize,
            PublicPrizeResponse,
            WonPrize,
            CreatePrizeRequest,
            UpdatePrizeRequest,
            Identity,
            ParticipantEntry,
            PlayRequest,
            PlayResponse,
            RedeemRequest,
            RedemptionTokenResponse,
            ParticipantQuery,
            EstablishmentStats,
            ApiError,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "game", description = "Public prize draw API"),
        (name = "staff", description = "Staff redemption and prize management API"),
    ),
    info(
        title = "Kadeeo Backend API",
        version = "1.0.0",
        description = "Prize draw and redemption REST API documentation"
    ),
    servers(
        (url = "/api/v1", description = "Local server")
    )
)]
pub struct ApiDoc;

pub fn swagger_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        SwaggerUi::new("/swagger-ui/{_:.*}").url("/api-docs/openapi.json", ApiDoc::openapi()),
    )
    .route(
        "/swagger-ui",
        web::get().to(|| async {
            actix_web::HttpResponse::Found()
                .append_header(("Location", "/swagger-ui/"))
                .finish()
        }),
    );
}
