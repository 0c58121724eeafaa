use std::error::Error;

use crate::error::AppError;
use axum::{
    extract::{rejection::QueryRejection, FromRequestParts},
    http::StatusCode,
    response::IntoResponse,
};

/// `Query` whose rejection goes through [`AppError`].
#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(AppError))]
pub struct MyQuery<T>(pub T);

/// The error and all of its sources, joined with `: `.
pub fn error_chain(error: &dyn Error) -> String {
    let mut s = error.to_string();

    let mut source_ = error.source();
    while let Some(source) = source_ {
        s.push_str(&format!(": {}", source));
        source_ = source.source();
    }

    s
}

impl From<QueryRejection> for AppError {
    fn from(value: QueryRejection) -> Self {
        AppError::BadRequest(error_chain(&value))
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let status = match self {
            AppError::Gateway(_) => StatusCode::BAD_GATEWAY,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Template(_) | AppError::Config(_) | AppError::Io(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        let chain = error_chain(&self);
        if status.is_server_error() {
            tracing::error!(status = status.as_u16(), error = %chain, "request failed");
        } else {
            tracing::debug!(status = status.as_u16(), error = %chain, "request rejected");
        }

        let message = match self {
            AppError::BadRequest(detail) => detail,
            _ => status
                .canonical_reason()
                .unwrap_or("error")
                .to_string(),
        };

        (status, message).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::GatewayError;

    #[test]
    fn chain_includes_sources() {
        let error = AppError::from(GatewayError::Status {
            url: "https://cms/x".into(),
            status: 500,
        });
        assert_eq!(
            error_chain(&error),
            "cms gateway error: https://cms/x answered with status 500"
        );
    }

    #[test]
    fn gateway_errors_are_bad_gateway() {
        let response = AppError::from(GatewayError::NoMasterRef).into_response();
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    }

    #[test]
    fn bad_requests_keep_their_detail() {
        let response = AppError::BadRequest("page: invalid digit".into()).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
