use crate::models::*;
use crate::services::{DrawService, PrizeService};
use actix_web::{HttpResponse, ResponseError, Result, web};

#[utoipa::path(
    get,
    path = "/establishments/{establishment_id}/prizes",
    tag = "game",
    params(
        ("establishment_id" = String, Path, description = "商户ID")
    ),
    responses(
        (status = 200, description = "获取奖品列表成功", body = [PublicPrizeResponse])
    )
)]
/// 游戏页奖品列表（仅有库存的奖品及中奖概率）
pub async fn get_prizes(
    service: web::Data<PrizeService>,
    path: web::Path<String>,
) -> Result<HttpResponse> {
    match service.public_board(&path.into_inner()).await {
        Ok(list) => Ok(HttpResponse::Ok().json(ApiResponse::success(list))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/establishments/{establishment_id}/play",
    tag = "game",
    params(
        ("establishment_id" = String, Path, description = "商户ID")
    ),
    request_body = PlayRequest,
    responses(
        (status = 200, description = "抽奖成功", body = PlayResponse),
        (status = 400, description = "邮箱 / 手机号格式错误"),
        (status = 409, description = "已参与过或奖品已抽完")
    )
)]
/// 顾客抽奖:
/// 1. 校验并规范化邮箱 / 手机号
/// 2. 无库存时返回 NO_PRIZES_AVAILABLE，已参与时返回 ALREADY_PARTICIPATED
/// 3. 按权重抽取奖品、扣减库存、生成奖品码与兑奖二维码载荷
pub async fn play(
    service: web::Data<DrawService>,
    path: web::Path<String>,
    body: web::Json<PlayRequest>,
) -> Result<HttpResponse> {
    let establishment_id = path.into_inner();
    let identity = match Identity::new(body.email.as_deref(), body.phone.as_deref()) {
        Ok(identity) => identity,
        Err(e) => return Ok(e.error_response()),
    };

    match service.play(&establishment_id, identity).await {
        Ok(outcome) => {
            let response = PlayResponse {
                prize: WonPrize::from(&outcome.prize),
                token: outcome.entry.redemption_token().to_string(),
                entry: outcome.entry,
            };
            Ok(HttpResponse::Ok().json(ApiResponse::success(response)))
        }
        Err(e) => Ok(e.error_response()),
    }
}

/// 路由配置
pub fn game_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/establishments")
            .route("/{establishment_id}/prizes", web::get().to(get_prizes))
            .route("/{establishment_id}/play", web::post().to(play)),
    );
}
