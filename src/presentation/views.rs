use crate::application::error::{ErrorReport, HttpError};
use crate::domain::entities::ReplRecord;
use crate::domain::types::FragmentKind;
use askama::{Error as AskamaError, Template};
use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use thiserror::Error;
use time::{OffsetDateTime, macros::format_description};

#[derive(Debug, Error)]
#[error("{public_message}")]
pub struct TemplateRenderError {
    pub(crate) source: &'static str,
    pub(crate) public_message: &'static str,
    #[source]
    pub(crate) error: AskamaError,
}

impl TemplateRenderError {
    pub fn new(source: &'static str, public_message: &'static str, error: AskamaError) -> Self {
        Self {
            source,
            public_message,
            error,
        }
    }
}

impl From<TemplateRenderError> for HttpError {
    fn from(err: TemplateRenderError) -> Self {
        let TemplateRenderError {
            source,
            public_message,
            error,
        } = err;

        HttpError::from_error(
            source,
            StatusCode::INTERNAL_SERVER_ERROR,
            public_message,
            &error,
        )
    }
}

pub fn render_template<T: Template>(template: T) -> Result<Html<String>, HttpError> {
    template.render().map(Html).map_err(|err| {
        TemplateRenderError::new(
            "presentation::views::render_template",
            "Template rendering failed",
            err,
        )
        .into()
    })
}

pub fn render_template_response<T: Template>(template: T, status: StatusCode) -> Response {
    match render_template(template) {
        Ok(html) => (status, html).into_response(),
        Err(err) => err.into_response(),
    }
}

pub fn render_not_found_response(message: impl Into<String>) -> Response {
    let message = message.into();
    let mut response = render_template_response(
        NotFoundTemplate {
            message: message.clone(),
        },
        StatusCode::NOT_FOUND,
    );
    ErrorReport::from_message(
        "presentation::views::render_not_found_response",
        StatusCode::NOT_FOUND,
        message,
    )
    .attach(&mut response);
    response
}

#[derive(Clone, Debug)]
pub struct ReplCardView {
    pub id: i64,
    pub title: String,
    pub href: String,
    pub last_edited: String,
}

impl ReplCardView {
    pub fn from_record(record: &ReplRecord, now: OffsetDateTime) -> Self {
        Self {
            id: record.id,
            title: record.title.clone(),
            href: format!("/repl/{}", record.id),
            last_edited: humanize_since(record.created_at, now),
        }
    }
}

#[derive(Template)]
#[template(path = "dashboard.html")]
pub struct DashboardTemplate {
    pub repls: Vec<ReplCardView>,
}

#[derive(Clone, Debug)]
pub struct FragmentEditorView {
    pub kind: &'static str,
    pub label: &'static str,
    pub content: String,
}

#[derive(Clone, Debug)]
pub struct EditorView {
    pub repl_id: i64,
    pub title: String,
    pub editors: Vec<FragmentEditorView>,
    pub auto_refresh: bool,
}

impl EditorView {
    pub fn new(record: &ReplRecord, auto_refresh: bool) -> Self {
        let fragments = record.fragments();
        let editors = FragmentKind::ALL
            .into_iter()
            .map(|kind| FragmentEditorView {
                kind: kind.as_str(),
                label: kind.label(),
                content: fragments.get(kind).to_string(),
            })
            .collect();

        Self {
            repl_id: record.id,
            title: record.title.clone(),
            editors,
            auto_refresh,
        }
    }
}

#[derive(Template)]
#[template(path = "editor.html")]
pub struct EditorTemplate {
    pub view: EditorView,
}

#[derive(Template)]
#[template(path = "not_found.html")]
pub struct NotFoundTemplate {
    pub message: String,
}

/// Relative, suffixed description of how long ago `then` was.
pub fn humanize_since(then: OffsetDateTime, now: OffsetDateTime) -> String {
    let elapsed = now - then;
    if elapsed.is_negative() || elapsed.whole_seconds() < 45 {
        return "less than a minute ago".to_string();
    }

    let minutes = elapsed.whole_minutes();
    if minutes < 60 {
        return plural(minutes.max(1), "minute");
    }

    let hours = elapsed.whole_hours();
    if hours < 24 {
        return plural(hours, "hour");
    }

    let days = elapsed.whole_days();
    if days < 30 {
        return plural(days, "day");
    }

    let format = format_description!("[month repr:short] [day padding:none], [year]");
    then.format(&format)
        .map(|date| format!("on {date}"))
        .unwrap_or_else(|_| plural(days, "day"))
}

fn plural(value: i64, unit: &str) -> String {
    if value == 1 {
        format!("1 {unit} ago")
    } else {
        format!("{value} {unit}s ago")
    }
}

#[cfg(test)]
mod tests {
    use time::{Duration, macros::datetime};

    use super::*;

    #[test]
    fn humanizes_recent_and_old_timestamps() {
        let now = datetime!(2025-03-10 12:00:00 UTC);

        assert_eq!(humanize_since(now, now), "less than a minute ago");
        assert_eq!(
            humanize_since(now - Duration::minutes(1), now),
            "1 minute ago"
        );
        assert_eq!(humanize_since(now - Duration::hours(5), now), "5 hours ago");
        assert_eq!(humanize_since(now - Duration::days(2), now), "2 days ago");
        assert_eq!(
            humanize_since(datetime!(2024-11-05 08:00:00 UTC), now),
            "on Nov 5, 2024"
        );
    }

    #[test]
    fn editor_view_lists_fragments_in_order() {
        let record = ReplRecord {
            id: 4,
            title: "Demo".to_string(),
            html: "<p>x</p>".to_string(),
            css: "p{}".to_string(),
            js: "1".to_string(),
            created_at: datetime!(2025-01-01 00:00:00 UTC),
        };

        let view = EditorView::new(&record, false);
        let kinds: Vec<_> = view.editors.iter().map(|editor| editor.kind).collect();
        assert_eq!(kinds, vec!["html", "css", "js"]);
        assert_eq!(view.editors[0].content, "<p>x</p>");
    }

    #[test]
    fn dashboard_escapes_titles() {
        let html = DashboardTemplate {
            repls: vec![ReplCardView {
                id: 1,
                title: "<script>alert(1)</script>".to_string(),
                href: "/repl/1".to_string(),
                last_edited: "1 day ago".to_string(),
            }],
        }
        .render()
        .unwrap();

        assert!(html.contains("&lt;script&gt;alert(1)&lt;/script&gt;"));
        assert!(html.contains("href=\"/repl/1\""));
    }

    #[test]
    fn editor_script_orders_session_requests() {
        let record = ReplRecord {
            id: 7,
            title: "Ordered".to_string(),
            html: String::new(),
            css: String::new(),
            js: String::new(),
            created_at: datetime!(2025-01-01 00:00:00 UTC),
        };

        let html = EditorTemplate {
            view: EditorView::new(&record, true),
        }
        .render()
        .unwrap();

        assert!(html.contains("queue = request.catch"));
        assert!(html.contains("sessionRequest(\"POST\", \"/run\")"));
        assert!(html.contains("sessionRequest(\"PUT\", \"/fragments/\""));
        assert!(!html.contains("jsonRequest(\"POST\", \"/api/sessions/"));
        assert!(html.contains("if (version === mountedVersion) return;"));
    }
}
