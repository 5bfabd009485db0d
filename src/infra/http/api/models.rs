use serde::Deserialize;

use crate::application::repls::{CreateReplCommand, UpdateReplCommand};
use crate::domain::types::TriggerMode;

#[derive(Debug, Default, Deserialize)]
pub struct ReplCreateRequest {
    pub title: Option<String>,
    pub html: Option<String>,
    pub css: Option<String>,
    pub js: Option<String>,
}

impl From<ReplCreateRequest> for CreateReplCommand {
    fn from(request: ReplCreateRequest) -> Self {
        Self {
            title: request.title,
            html: request.html,
            css: request.css,
            js: request.js,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct ReplUpdateRequest {
    pub title: Option<String>,
    pub html: Option<String>,
    pub css: Option<String>,
    pub js: Option<String>,
}

impl ReplUpdateRequest {
    pub fn into_command(self, id: i64) -> UpdateReplCommand {
        UpdateReplCommand {
            id,
            title: self.title,
            html: self.html,
            css: self.css,
            js: self.js,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct SessionOpenRequest {
    pub mode: Option<TriggerMode>,
}

#[derive(Debug, Deserialize)]
pub struct FragmentUpdateRequest {
    pub content: String,
}

#[derive(Debug, Deserialize)]
pub struct ModeUpdateRequest {
    pub mode: TriggerMode,
}
