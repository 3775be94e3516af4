pub mod admin;
pub mod campaign;
pub mod cron;
pub mod lottery;
pub mod points;

pub use admin::admin_config;
pub use campaign::campaign_config;
pub use cron::cron_config;
pub use lottery::lottery_config;
pub use points::points_config;

use crate::error::{AppError, AppResult};
use crate::utils::AuthUser;
use actix_web::{HttpMessage, HttpRequest};

/// 从请求扩展中获取当前用户（中间件在鉴权后注入）
pub fn current_user(req: &HttpRequest) -> AppResult<AuthUser> {
    req.extensions()
        .get::<AuthUser>()
        .copied()
        .ok_or_else(|| AppError::AuthError("Missing access token".to_string()))
}

/// 管理接口要求 admin 角色
pub fn require_admin(req: &HttpRequest) -> AppResult<AuthUser> {
    let user = current_user(req)?;
    if !user.is_admin() {
        return Err(AppError::Forbidden);
    }
    Ok(user)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::UserRole;
    use actix_web::test::TestRequest;

    #[test]
    fn test_current_user_and_admin_guard() {
        let req = TestRequest::default().to_http_request();
        assert!(matches!(current_user(&req), Err(AppError::AuthError(_))));

        let req = TestRequest::default().to_http_request();
        req.extensions_mut().insert(AuthUser {
            id: 7,
            role: UserRole::User,
        });
        assert_eq!(current_user(&req).unwrap().id, 7);
        assert!(matches!(require_admin(&req), Err(AppError::Forbidden)));

        let req = TestRequest::default().to_http_request();
        req.extensions_mut().insert(AuthUser {
            id: 1,
            role: UserRole::Admin,
        });
        assert!(require_admin(&req).is_ok());
    }
}
