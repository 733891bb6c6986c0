use serde::Deserialize;

use crate::models::Notification;

#[derive(Debug, Deserialize)]
pub struct ApiErrorResponse {
    pub error: ApiErrorBody,
}

#[derive(Debug, Deserialize)]
pub struct ApiErrorBody {
    pub message: String,
}

#[derive(Debug, Deserialize)]
pub struct NotificationList {
    pub items: Vec<Notification>,
}
