use actix_web::{HttpResponse, ResponseError, Result, web};
use serde_json::json;
use crate::models::*;
use crate::services::{AuthService, UserService};

#[utoipa::path(
    post,
    path = "/auth/signup",
    tag = "auth",
    request_body = SignupRequest,
    responses(
        (status = 201, description = "注册成功", body = UserResponse),
        (status = 400, description = "参数错误或邮箱已被使用", body = ApiErrorResponse)
    )
)]
pub async fn signup(
    user_service: web::Data<UserService>,
    request: web::Json<SignupRequest>,
) -> Result<HttpResponse> {
    match user_service.signup(request.into_inner()).await {
        Ok(user) => Ok(HttpResponse::Created().json(json!({
            "success": true,
            "data": user,
            "message": "Signup successful!"
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/auth/email/send-otp",
    tag = "auth",
    request_body = SendOtpRequest,
    responses(
        (status = 200, description = "验证码已发送", body = SendOtpResponse),
        (status = 400, description = "邮箱格式错误或账户不存在", body = ApiErrorResponse),
        (status = 429, description = "发送次数超限", body = ApiErrorResponse),
        (status = 502, description = "邮件投递失败", body = ApiErrorResponse)
    )
)]
pub async fn send_otp(
    auth_service: web::Data<AuthService>,
    request: web::Json<SendOtpRequest>,
) -> Result<HttpResponse> {
    match auth_service.send_email_code(&request.email).await {
        Ok(response) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": response,
            "message": "OTP sent successfully!"
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/auth/email/verify",
    tag = "auth",
    request_body = VerifyOtpRequest,
    responses(
        (status = 200, description = "验证成功", body = AuthResponse),
        (status = 400, description = "邮箱格式错误", body = ApiErrorResponse),
        (status = 401, description = "验证码无效、已过期或账户不存在", body = ApiErrorResponse)
    )
)]
pub async fn verify_otp(
    auth_service: web::Data<AuthService>,
    request: web::Json<VerifyOtpRequest>,
) -> Result<HttpResponse> {
    match auth_service
        .verify_email_code(&request.email, &request.otp)
        .await
    {
        Ok(response) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": response
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

pub fn auth_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/auth")
            .route("/signup", web::post().to(signup))
            .route("/email/send-otp", web::post().to(send_otp))
            .route("/email/verify", web::post().to(verify_otp)),
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::memory_pool;
    use actix_web::http::StatusCode;
    use actix_web::{App, test};

    #[actix_web::test]
    async fn test_signup_then_duplicate_is_rejected() {
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(UserService::new(memory_pool().await)))
                .service(web::scope("/api/v1").configure(auth_config)),
        )
        .await;

        let payload = json!({ "name": "Ravi", "email": "Ravi@Example.com", "role": "labour" });
        let req = test::TestRequest::post()
            .uri("/api/v1/auth/signup")
            .set_json(&payload)
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::CREATED);
        let body: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(body["data"]["email"], "ravi@example.com");
        assert_eq!(body["data"]["role"], "labour");

        let req = test::TestRequest::post()
            .uri("/api/v1/auth/signup")
            .set_json(&payload)
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(body["success"], false);
    }
}
