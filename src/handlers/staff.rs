use crate::error::AppError;
use crate::middlewares::current_staff;
use crate::models::*;
use crate::services::{ParticipationLedger, PrizeService, RedemptionService};
use actix_web::{HttpRequest, HttpResponse, ResponseError, Result, web};
use uuid::Uuid;

#[utoipa::path(
    post,
    path = "/staff/scan",
    tag = "staff",
    request_body = RedeemRequest,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "二维码有效，返回参与记录", body = ParticipantEntry),
        (status = 400, description = "不是本系统的兑奖二维码"),
        (status = 403, description = "属于其它商户"),
        (status = 404, description = "参与记录不存在"),
        (status = 409, description = "已兑奖")
    )
)]
/// 扫码预览：校验二维码并展示奖品与联系方式，不修改兑奖状态
pub async fn scan(
    service: web::Data<RedemptionService>,
    req: HttpRequest,
    body: web::Json<RedeemRequest>,
) -> Result<HttpResponse> {
    let staff = match current_staff(&req) {
        Ok(staff) => staff,
        Err(e) => return Ok(e.error_response()),
    };
    match service.inspect(&body.token, &staff.establishment_id).await {
        Ok(entry) => Ok(HttpResponse::Ok().json(ApiResponse::success(entry))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/staff/redeem",
    tag = "staff",
    request_body = RedeemRequest,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "兑奖成功", body = ParticipantEntry),
        (status = 400, description = "不是本系统的兑奖二维码"),
        (status = 403, description = "属于其它商户"),
        (status = 404, description = "参与记录不存在"),
        (status = 409, description = "已兑奖")
    )
)]
/// 确认兑奖（商户以令牌为准，不接受请求体中的商户ID）
pub async fn redeem(
    service: web::Data<RedemptionService>,
    req: HttpRequest,
    body: web::Json<RedeemRequest>,
) -> Result<HttpResponse> {
    let staff = match current_staff(&req) {
        Ok(staff) => staff,
        Err(e) => return Ok(e.error_response()),
    };
    match service.redeem(&body.token, &staff.establishment_id).await {
        Ok(entry) => Ok(HttpResponse::Ok()
            .json(ApiResponse::success_with_message(entry, "Prize redeemed"))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/staff/participants",
    tag = "staff",
    params(
        ("page" = Option<u32>, Query, description = "页码 (默认1)"),
        ("per_page" = Option<u32>, Query, description = "每页数量 (默认20)")
    ),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "分页获取参与记录成功"),
        (status = 401, description = "未授权")
    )
)]
/// 分页获取参与记录（倒序）
pub async fn list_participants(
    ledger: web::Data<ParticipationLedger>,
    req: HttpRequest,
    query: web::Query<ParticipantQuery>,
) -> Result<HttpResponse> {
    let staff = match current_staff(&req) {
        Ok(staff) => staff,
        Err(e) => return Ok(e.error_response()),
    };
    match ledger.list(&staff.establishment_id, &query.into_inner()).await {
        Ok(page) => Ok(HttpResponse::Ok().json(ApiResponse::success(page))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/staff/participants/{participant_id}",
    tag = "staff",
    params(
        ("participant_id" = Uuid, Path, description = "参与记录ID")
    ),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "获取参与记录成功", body = ParticipantEntry),
        (status = 404, description = "参与记录不存在")
    )
)]
pub async fn get_participant(
    ledger: web::Data<ParticipationLedger>,
    req: HttpRequest,
    path: web::Path<Uuid>,
) -> Result<HttpResponse> {
    let staff = match current_staff(&req) {
        Ok(staff) => staff,
        Err(e) => return Ok(e.error_response()),
    };
    match ledger.find(&staff.establishment_id, path.into_inner()).await {
        Ok(Some(entry)) => Ok(HttpResponse::Ok().json(ApiResponse::success(entry))),
        Ok(None) => Ok(AppError::NotFound("Participant not found".to_string()).error_response()),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/staff/participants/{participant_id}/token",
    tag = "staff",
    params(
        ("participant_id" = Uuid, Path, description = "参与记录ID")
    ),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "二维码载荷", body = RedemptionTokenResponse),
        (status = 404, description = "参与记录不存在")
    )
)]
/// 重新生成顾客的兑奖二维码载荷
pub async fn get_participant_token(
    ledger: web::Data<ParticipationLedger>,
    req: HttpRequest,
    path: web::Path<Uuid>,
) -> Result<HttpResponse> {
    let staff = match current_staff(&req) {
        Ok(staff) => staff,
        Err(e) => return Ok(e.error_response()),
    };
    match ledger.find(&staff.establishment_id, path.into_inner()).await {
        Ok(Some(entry)) => Ok(HttpResponse::Ok().json(ApiResponse::success(
            RedemptionTokenResponse {
                token: entry.redemption_token().to_string(),
            },
        ))),
        Ok(None) => Ok(AppError::NotFound("Participant not found".to_string()).error_response()),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/staff/participants/{participant_id}/toggle-redeemed",
    tag = "staff",
    params(
        ("participant_id" = Uuid, Path, description = "参与记录ID")
    ),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "兑奖状态已切换", body = ParticipantEntry),
        (status = 404, description = "参与记录不存在")
    )
)]
/// 店员纠错：切换兑奖状态
pub async fn toggle_redeemed(
    service: web::Data<RedemptionService>,
    req: HttpRequest,
    path: web::Path<Uuid>,
) -> Result<HttpResponse> {
    let staff = match current_staff(&req) {
        Ok(staff) => staff,
        Err(e) => return Ok(e.error_response()),
    };
    match service
        .toggle_redeemed(&staff.establishment_id, path.into_inner())
        .await
    {
        Ok(entry) => Ok(HttpResponse::Ok().json(ApiResponse::success(entry))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    delete,
    path = "/staff/participants/{participant_id}",
    tag = "staff",
    params(
        ("participant_id" = Uuid, Path, description = "参与记录ID")
    ),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "已删除，奖品库存加回", body = ParticipantEntry),
        (status = 404, description = "参与记录不存在")
    )
)]
/// 删除参与记录，该身份可再次参与
pub async fn delete_participant(
    ledger: web::Data<ParticipationLedger>,
    req: HttpRequest,
    path: web::Path<Uuid>,
) -> Result<HttpResponse> {
    let staff = match current_staff(&req) {
        Ok(staff) => staff,
        Err(e) => return Ok(e.error_response()),
    };
    match ledger.remove(&staff.establishment_id, path.into_inner()).await {
        Ok(entry) => Ok(HttpResponse::Ok().json(ApiResponse::success(entry))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/staff/prizes",
    tag = "staff",
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "获取奖品配置成功", body = [Prize])
    )
)]
pub async fn list_prizes(service: web::Data<PrizeService>, req: HttpRequest) -> Result<HttpResponse> {
    let staff = match current_staff(&req) {
        Ok(staff) => staff,
        Err(e) => return Ok(e.error_response()),
    };
    match service.list_prizes(&staff.establishment_id).await {
        Ok(list) => Ok(HttpResponse::Ok().json(ApiResponse::success(list))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/staff/prizes",
    tag = "staff",
    request_body = CreatePrizeRequest,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 201, description = "奖品已创建", body = Prize),
        (status = 400, description = "参数错误")
    )
)]
pub async fn create_prize(
    service: web::Data<PrizeService>,
    req: HttpRequest,
    body: web::Json<CreatePrizeRequest>,
) -> Result<HttpResponse> {
    let staff = match current_staff(&req) {
        Ok(staff) => staff,
        Err(e) => return Ok(e.error_response()),
    };
    match service
        .create_prize(&staff.establishment_id, body.into_inner())
        .await
    {
        Ok(prize) => Ok(HttpResponse::Created().json(ApiResponse::success(prize))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    put,
    path = "/staff/prizes/{prize_id}",
    tag = "staff",
    params(
        ("prize_id" = Uuid, Path, description = "奖品ID")
    ),
    request_body = UpdatePrizeRequest,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "奖品已更新", body = Prize),
        (status = 400, description = "参数错误或数量低于已抽中数量"),
        (status = 404, description = "奖品不存在")
    )
)]
/// 修改奖品；调整数量时已抽中的件数保持不变
pub async fn update_prize(
    service: web::Data<PrizeService>,
    req: HttpRequest,
    path: web::Path<Uuid>,
    body: web::Json<UpdatePrizeRequest>,
) -> Result<HttpResponse> {
    let staff = match current_staff(&req) {
        Ok(staff) => staff,
        Err(e) => return Ok(e.error_response()),
    };
    match service
        .update_prize(&staff.establishment_id, path.into_inner(), body.into_inner())
        .await
    {
        Ok(prize) => Ok(HttpResponse::Ok().json(ApiResponse::success(prize))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    delete,
    path = "/staff/prizes/{prize_id}",
    tag = "staff",
    params(
        ("prize_id" = Uuid, Path, description = "奖品ID")
    ),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "奖品已删除"),
        (status = 400, description = "已有顾客抽中该奖品"),
        (status = 404, description = "奖品不存在")
    )
)]
pub async fn delete_prize(
    service: web::Data<PrizeService>,
    req: HttpRequest,
    path: web::Path<Uuid>,
) -> Result<HttpResponse> {
    let staff = match current_staff(&req) {
        Ok(staff) => staff,
        Err(e) => return Ok(e.error_response()),
    };
    match service
        .delete_prize(&staff.establishment_id, path.into_inner())
        .await
    {
        Ok(()) => Ok(HttpResponse::Ok().json(ApiResponse::success_with_message((), "Prize deleted"))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/staff/stats",
    tag = "staff",
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "获取商户统计成功", body = EstablishmentStats)
    )
)]
/// 商户统计：库存、参与人数、兑奖率、奖品成本
pub async fn get_stats(service: web::Data<PrizeService>, req: HttpRequest) -> Result<HttpResponse> {
    let staff = match current_staff(&req) {
        Ok(staff) => staff,
        Err(e) => return Ok(e.error_response()),
    };
    match service.stats(&staff.establishment_id).await {
        Ok(stats) => Ok(HttpResponse::Ok().json(ApiResponse::success(stats))),
        Err(e) => Ok(e.error_response()),
    }
}

/// 路由配置
pub fn staff_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/staff")
            .route("/scan", web::post().to(scan))
            .route("/redeem", web::post().to(redeem))
            .route("/participants", web::get().to(list_participants))
            .route("/participants/{participant_id}", web::get().to(get_participant))
            .route("/participants/{participant_id}", web::delete().to(delete_participant))
            .route(
                "/participants/{participant_id}/token",
                web::get().to(get_participant_token),
            )
            .route(
                "/participants/{participant_id}/toggle-redeemed",
                web::post().to(toggle_redeemed),
            )
            .route("/prizes", web::get().to(list_prizes))
            .route("/prizes", web::post().to(create_prize))
            .route("/prizes/{prize_id}", web::put().to(update_prize))
            .route("/prizes/{prize_id}", web::delete().to(delete_prize))
            .route("/stats", web::get().to(get_stats)),
    );
}
