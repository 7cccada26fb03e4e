//! Navigation targets of the client

use chrono::NaiveDate;
use std::fmt;

const DATE_FORMAT: &str = "%Y-%m-%d";

/// A screen the user can navigate to
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    Login,
    Chat,
    History,
    HistoryDay(NaiveDate),
    Questions,
    Syllabus,
    NotFound(String),
}

impl Route {
    /// Parse a location path. Unknown paths and malformed dates map to
    /// [`Route::NotFound`].
    pub fn parse(path: &str) -> Self {
        let trimmed = path.trim();
        let path = trimmed
            .split(['?', '#'])
            .next()
            .unwrap_or_default()
            .trim_end_matches('/');

        match path {
            "" => Route::Login,
            "/chat" => Route::Chat,
            "/history" => Route::History,
            "/questions" => Route::Questions,
            "/syllabus" => Route::Syllabus,
            other => other
                .strip_prefix("/history/")
                .and_then(|date| NaiveDate::parse_from_str(date, DATE_FORMAT).ok())
                .map_or_else(|| Route::NotFound(trimmed.to_string()), Route::HistoryDay),
        }
    }

    pub fn path(&self) -> String {
        match self {
            Route::Login => "/".to_string(),
            Route::Chat => "/chat".to_string(),
            Route::History => "/history".to_string(),
            Route::HistoryDay(date) => format!("/history/{}", date.format(DATE_FORMAT)),
            Route::Questions => "/questions".to_string(),
            Route::Syllabus => "/syllabus".to_string(),
            Route::NotFound(path) => path.clone(),
        }
    }

    /// Whether visiting the route needs a logged-in user
    pub fn requires_session(&self) -> bool {
        !matches!(self, Route::Login | Route::NotFound(_))
    }

    /// Where navigation to `self` actually lands
    pub fn resolve(self, has_session: bool) -> Route {
        if self.requires_session() && !has_session {
            tracing::debug!(route = %self, "Redirecting to login");
            Route::Login
        } else {
            self
        }
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path())
    }
}
