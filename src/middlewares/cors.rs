use actix_cors::Cors;

/// 游戏页与店员后台跨域访问，只用 Bearer 令牌，不携带 Cookie
pub fn create_cors() -> Cors {
    Cors::default()
        .allow_any_origin()
        .allowed_methods(vec!["GET", "POST", "PUT", "DELETE", "OPTIONS"])
        .allow_any_header()
        .max_age(3600)
}
