//! Server side model of the dashboard page

use crate::{
    chart::RenderedCharts,
    range::display_range,
    view::{DashboardSurface, Region},
};
use netstat_core::{DateRange, utils::format_display_date};
use std::{io, path::Path};

const TEMPLATE: &str = include_str!("../templates/dashboard.html");
const LOADING_TEXT: &str = "Chargement…";

/// What the spinner container currently holds
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Spinner {
    /// Removed after a successful load
    #[default]
    Hidden,
    /// Loading indicator
    Loading,
    /// Spinner text replaced by a message
    Message(String),
}

/// The dashboard's render targets, kept in memory and rendered to HTML
#[derive(Debug, Clone, Default)]
pub struct DashboardPage {
    range: Option<DateRange>,
    range_text: String,
    spinner: Spinner,
    users_label: Option<i64>,
    days_label: Option<i64>,
    global_chart: Option<String>,
    four_g_chart: Option<String>,
    chart_area_visible: bool,
    help_visible: bool,
    slider_inits: u32,
    charts_applied: u32,
    active_slide: usize,
}

impl DashboardPage {
    /// Empty page, nothing loaded
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Picker text
    #[must_use]
    pub fn range_text(&self) -> &str {
        &self.range_text
    }

    /// Spinner container content
    #[must_use]
    pub const fn spinner(&self) -> &Spinner {
        &self.spinner
    }

    /// Active users label, once set
    #[must_use]
    pub const fn users_label(&self) -> Option<i64> {
        self.users_label
    }

    /// Days in range label, once set
    #[must_use]
    pub const fn days_label(&self) -> Option<i64> {
        self.days_label
    }

    /// Global chart SVG, once drawn
    #[must_use]
    pub fn global_chart(&self) -> Option<&str> {
        self.global_chart.as_deref()
    }

    /// 4G chart SVG, once drawn
    #[must_use]
    pub fn four_g_chart(&self) -> Option<&str> {
        self.four_g_chart.as_deref()
    }

    /// Whether `region` is currently revealed
    #[must_use]
    pub const fn is_visible(&self, region: Region) -> bool {
        match region {
            Region::ChartArea => self.chart_area_visible,
            Region::HelpPanel => self.help_visible,
        }
    }

    /// Times the carousel was set up
    #[must_use]
    pub const fn slider_inits(&self) -> u32 {
        self.slider_inits
    }

    /// Times both charts were replaced
    #[must_use]
    pub const fn charts_applied(&self) -> u32 {
        self.charts_applied
    }

    /// Slide highlighted in the carousel
    #[must_use]
    pub const fn active_slide(&self) -> usize {
        self.active_slide
    }

    /// Highlight `slide` in the carousel
    pub fn set_active_slide(&mut self, slide: usize) {
        self.active_slide = slide;
    }

    /// Render the page as an HTML document
    ///
    /// Placeholders are filled in a single pass; only dates, numbers, fixed
    /// strings and drawn SVG reach the template.
    #[must_use]
    pub fn render_html(&self) -> String {
        let (start, end) = self.range.map_or_else(
            || (String::new(), String::new()),
            |range| (format_display_date(range.start), format_display_date(range.end)),
        );

        let (spinner_class, spinner_text) = match &self.spinner {
            Spinner::Hidden => (" hidden", String::new()),
            Spinner::Loading => ("", LOADING_TEXT.to_string()),
            Spinner::Message(message) => ("", escape_html(message)),
        };

        let slide_link = |slide: usize| format!("/?start={start}&end={end}&slide={slide}");
        let label = |value: Option<i64>| value.map_or_else(|| "-".to_string(), |v| v.to_string());
        let active = |slide: usize| if self.active_slide == slide { " active" } else { "" };
        let hidden = |visible: bool| if visible { "" } else { "hidden" };

        let values = [
            ("range_text", escape_html(&self.range_text)),
            ("start", escape_html(&start)),
            ("end", escape_html(&end)),
            ("active_slide", self.active_slide.to_string()),
            ("spinner_class", spinner_class.to_string()),
            ("spinner_text", spinner_text),
            ("chart_area_class", hidden(self.chart_area_visible).to_string()),
            ("help_class", hidden(self.help_visible).to_string()),
            ("users", label(self.users_label)),
            ("days", label(self.days_label)),
            ("slider_initialized", (self.slider_inits > 0).to_string()),
            ("global_active", active(0).to_string()),
            ("four_g_active", active(1).to_string()),
            ("global_link", escape_html(&slide_link(0))),
            ("four_g_link", escape_html(&slide_link(1))),
            ("chart_global", self.global_chart.clone().unwrap_or_default()),
            ("chart_4g", self.four_g_chart.clone().unwrap_or_default()),
        ];

        fill_template(TEMPLATE, |name| {
            values
                .iter()
                .find(|(key, _)| *key == name)
                .map(|(_, value)| value.as_str())
        })
    }

    /// Write `index.html`, plus `global.svg` and `4g.svg` when drawn, into `dir`
    ///
    /// # Errors
    ///
    /// Returns an error if the directory or a file cannot be written.
    pub async fn write_to(&self, dir: &Path) -> io::Result<()> {
        tokio::fs::create_dir_all(dir).await?;
        if let Some(svg) = &self.global_chart {
            tokio::fs::write(dir.join("global.svg"), svg).await?;
        }
        if let Some(svg) = &self.four_g_chart {
            tokio::fs::write(dir.join("4g.svg"), svg).await?;
        }
        tokio::fs::write(dir.join("index.html"), self.render_html()).await
    }
}

impl DashboardSurface for DashboardPage {
    fn set_range(&mut self, range: &DateRange) {
        self.range = Some(*range);
        self.range_text = display_range(range);
    }

    fn show_spinner(&mut self) {
        self.spinner = Spinner::Loading;
    }

    fn show_unavailable(&mut self, message: &str) {
        self.spinner = Spinner::Message(message.to_string());
    }

    fn remove_spinner(&mut self) {
        self.spinner = Spinner::Hidden;
    }

    fn apply(&mut self, charts: RenderedCharts) {
        self.global_chart = Some(charts.global_svg);
        self.four_g_chart = Some(charts.four_g_svg);
        self.users_label = Some(charts.global_users);
        self.days_label = Some(charts.days);
        self.active_slide = 0;
        self.charts_applied += 1;
    }

    fn set_users_label(&mut self, users: i64) {
        self.users_label = Some(users);
    }

    fn reveal(&mut self, region: Region) {
        match region {
            Region::ChartArea => self.chart_area_visible = true,
            Region::HelpPanel => self.help_visible = true,
        }
    }

    fn hide(&mut self, region: Region) {
        match region {
            Region::ChartArea => self.chart_area_visible = false,
            Region::HelpPanel => self.help_visible = false,
        }
    }

    fn clear_charts(&mut self) {
        self.global_chart = None;
        self.four_g_chart = None;
        self.users_label = None;
        self.days_label = None;
        self.active_slide = 0;
    }

    fn init_slider(&mut self) {
        self.slider_inits += 1;
    }
}

/// Replace each `{{name}}` in `template`; unknown names are kept verbatim
fn fill_template<'a>(template: &str, lookup: impl Fn(&str) -> Option<&'a str>) -> String {
    let mut html = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(open) = rest.find("{{") {
        html.push_str(&rest[..open]);
        let after = &rest[open + 2..];
        let Some(close) = after.find("}}") else {
            html.push_str(&rest[open..]);
            return html;
        };
        match lookup(&after[..close]) {
            Some(value) => html.push_str(value),
            None => html.push_str(&rest[open..open + close + 4]),
        }
        rest = &after[close + 2..];
    }
    html.push_str(rest);
    html
}

fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}
