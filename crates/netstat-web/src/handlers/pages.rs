//! Page handlers

use crate::{
    dashboard::Dashboard,
    range::{RangeEdit, RangeSelector},
    state::AppState,
    view::InstantAnimator,
};
use axum::{
    extract::{Query, State},
    response::Html,
};
use netstat_core::DateRange;
use serde::Deserialize;
use std::sync::Arc;
use tracing::debug;

/// Query string of the dashboard page
#[derive(Debug, Default, Deserialize)]
pub struct DashboardQuery {
    /// First day, `DD/MM/YYYY`
    pub start: Option<String>,
    /// Last day, `DD/MM/YYYY`
    pub end: Option<String>,
    /// Carousel slide to show
    pub slide: Option<usize>,
}

impl DashboardQuery {
    /// Range to display; anything unparsable keeps the default window
    #[must_use]
    pub fn range(&self, default: DateRange) -> DateRange {
        let mut selector = RangeSelector::with_range(default);
        if let (Some(start), Some(end)) = (&self.start, &self.end) {
            if let Err(e) = selector.commit(&RangeEdit::new(start.as_str(), end.as_str())) {
                debug!(error = %e, "Ignoring unparsable range");
            }
        }
        selector.range()
    }
}

/// Dashboard page, loaded for the requested range
pub async fn dashboard(
    State(state): State<Arc<AppState>>,
    Query(query): Query<DashboardQuery>,
) -> Html<String> {
    let default = DateRange::ending_at(state.today(), state.config.dashboard.default_window_days);
    let range = query.range(default);

    let mut dashboard = Dashboard::new(Arc::clone(&state.fetcher), InstantAnimator);
    dashboard.refresh(range).await;
    if let Some(slide) = query.slide {
        dashboard.change_slide(slide.min(1));
    }

    Html(dashboard.page().render_html())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;

    fn default_range() -> DateRange {
        DateRange::ending_at(NaiveDate::from_ymd_opt(2024, 1, 7).unwrap(), 7)
    }

    fn query(start: Option<&str>, end: Option<&str>) -> DashboardQuery {
        DashboardQuery {
            start: start.map(str::to_string),
            end: end.map(str::to_string),
            slide: None,
        }
    }

    #[test]
    fn test_missing_bounds_keep_default() {
        assert_eq!(query(None, None).range(default_range()), default_range());
        assert_eq!(
            query(Some("01/12/2023"), None).range(default_range()),
            default_range()
        );
    }

    #[test]
    fn test_explicit_range() {
        let range = query(Some("01/12/2023"), Some("15/12/2023")).range(default_range());
        assert_eq!(range.start, NaiveDate::from_ymd_opt(2023, 12, 1).unwrap());
        assert_eq!(range.day_count(), 15);
    }

    #[test]
    fn test_unparsable_range_keeps_default() {
        assert_eq!(
            query(Some("2023-12-01"), Some("15/12/2023")).range(default_range()),
            default_range()
        );
    }
}
