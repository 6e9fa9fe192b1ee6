/// Success envelope shared by every endpoint
use actix_web::{http::StatusCode, HttpResponse};
use serde::Serialize;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiResponse<T> {
    pub status_code: u16,
    pub data: T,
    pub message: String,
    pub success: bool,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn new(status: StatusCode, data: T, message: impl Into<String>) -> Self {
        Self {
            status_code: status.as_u16(),
            data,
            message: message.into(),
            success: status.as_u16() < 400,
        }
    }

    pub fn into_response(self) -> HttpResponse {
        let status =
            StatusCode::from_u16(self.status_code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        HttpResponse::build(status).json(self)
    }
}

/// `200 OK` envelope
pub fn ok<T: Serialize>(data: T, message: impl Into<String>) -> HttpResponse {
    ApiResponse::new(StatusCode::OK, data, message).into_response()
}

/// `201 Created` envelope
pub fn created<T: Serialize>(data: T, message: impl Into<String>) -> HttpResponse {
    ApiResponse::new(StatusCode::CREATED, data, message).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn success_follows_status() {
        let value = serde_json::to_value(ApiResponse::new(StatusCode::CREATED, json!({}), "done"))
            .unwrap();
        assert_eq!(
            value,
            json!({"statusCode": 201, "data": {}, "message": "done", "success": true})
        );

        let failed = ApiResponse::new(StatusCode::NOT_FOUND, json!([]), "No liked videos found");
        assert!(!failed.success);
    }
}
