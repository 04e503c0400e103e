//! Request authorization policies.
//!
//! Both policies are stateless: they look only at the HTTP method, the caller
//! and, for object-level checks, the owner of the object.

use crate::auth::AuthenticatedUser;
use crate::config::Config;
use crate::errors::{ApiError, ApiResult};
use actix_web::body::{EitherBody, MessageBody};
use actix_web::dev::{Service, ServiceRequest, ServiceResponse};
use actix_web::http::Method;
use actix_web::{web, Error, ResponseError};
use std::future::Future;

pub fn is_safe_method(method: &Method) -> bool {
    matches!(*method, Method::GET | Method::HEAD | Method::OPTIONS)
}

/// Anyone may read; only authenticated callers may write.
pub fn authenticated_or_read_only(method: &Method, is_authenticated: bool) -> bool {
    is_safe_method(method) || is_authenticated
}

/// Anyone may read; only the author may modify the object.
pub fn author_or_read_only(method: &Method, user_id: Option<i32>, author_id: i32) -> bool {
    is_safe_method(method) || user_id == Some(author_id)
}

pub fn ensure_author(method: &Method, user_id: Option<i32>, author_id: i32) -> ApiResult<()> {
    if author_or_read_only(method, user_id, author_id) {
        Ok(())
    } else {
        Err(ApiError::forbidden())
    }
}

/// Scope middleware answering unsafe methods from anonymous callers with 401
/// before any extractor or handler runs.
pub fn require_auth_for_writes<S, B>(
    req: ServiceRequest,
    srv: &S,
) -> impl Future<Output = Result<ServiceResponse<EitherBody<B>>, Error>>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    B: MessageBody,
{
    let is_authenticated = req
        .app_data::<web::Data<Config>>()
        .map(|config| AuthenticatedUser::from_headers(req.headers(), config).is_ok())
        .unwrap_or(false);

    let call = if authenticated_or_read_only(req.method(), is_authenticated) {
        Ok(srv.call(req))
    } else {
        Err(req)
    };
    async move {
        match call {
            Ok(fut) => fut.await.map(ServiceResponse::map_into_left_body),
            Err(req) => {
                log::debug!("Rejected anonymous {} {}", req.method(), req.path());
                let response = ApiError::unauthorized().error_response();
                Ok(req.into_response(response).map_into_right_body())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::http::StatusCode;
    use actix_web::{test, App, HttpResponse};

    fn test_config() -> Config {
        Config {
            server: crate::config::ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 8080,
            },
            auth: crate::config::AuthConfig {
                jwt_secret: "secret".to_string(),
                jwt_expiration_hours: 1,
                bcrypt_cost: 4,
            },
            database: crate::config::DatabaseConfig {
                url: None,
                host: "localhost".to_string(),
                port: 3306,
                user: "root".to_string(),
                password: "password".to_string(),
                database: "foodgram".to_string(),
                max_connections: 1,
            },
            media: crate::config::MediaConfig {
                root: "media".into(),
                url: "/media/".to_string(),
            },
            site: crate::config::SiteConfig {
                url: "http://localhost".to_string(),
            },
            fixtures: Default::default(),
        }
    }

    #[actix_web::test]
    async fn anonymous_writes_get_a_401_response() {
        let app = test::init_service(
            App::new().app_data(web::Data::new(test_config())).service(
                web::scope("/items")
                    .wrap_fn(|req, srv| require_auth_for_writes(req, srv))
                    .route("/", web::get().to(|| async { HttpResponse::Ok().finish() }))
                    .route("/", web::post().to(|| async { HttpResponse::Created().finish() })),
            ),
        )
        .await;

        let req = test::TestRequest::get().uri("/items/").to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);

        let req = test::TestRequest::post().uri("/items/").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

        let token = crate::auth::create_token(&crate::auth::Claims::new(1, 1), "secret").unwrap();
        let req = test::TestRequest::post()
            .uri("/items/")
            .insert_header(("Authorization", format!("Bearer {}", token)))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::CREATED);
    }

    #[::core::prelude::v1::test]
    fn anonymous_callers_may_only_read() {
        assert!(authenticated_or_read_only(&Method::GET, false));
        assert!(authenticated_or_read_only(&Method::HEAD, false));
        assert!(!authenticated_or_read_only(&Method::POST, false));
        assert!(!authenticated_or_read_only(&Method::PATCH, false));
        assert!(!authenticated_or_read_only(&Method::DELETE, false));
        assert!(authenticated_or_read_only(&Method::POST, true));
    }

    #[::core::prelude::v1::test]
    fn only_the_author_may_modify() {
        assert!(author_or_read_only(&Method::GET, None, 1));
        assert!(author_or_read_only(&Method::GET, Some(2), 1));
        assert!(author_or_read_only(&Method::PATCH, Some(1), 1));
        assert!(!author_or_read_only(&Method::PATCH, Some(2), 1));
        assert!(!author_or_read_only(&Method::DELETE, None, 1));
    }

    #[::core::prelude::v1::test]
    fn ensure_author_maps_to_forbidden() {
        assert!(ensure_author(&Method::DELETE, Some(3), 3).is_ok());
        assert!(matches!(
            ensure_author(&Method::DELETE, Some(4), 3),
            Err(ApiError::Forbidden(_))
        ));
    }
}
