//! Pie chart rendering

use crate::view::DashboardSurface;
use netstat_core::{DateRange, Error, FourGUsage, GlobalUsage, Result, UsageStats};
use plotters::prelude::*;
use std::io;

/// Orange roaming network
pub const ORANGE_COLOR: RGBColor = RGBColor(0xFF, 0x79, 0x00);
/// Free Mobile antennas
pub const FREE_MOBILE_COLOR: RGBColor = RGBColor(0xCD, 0x1E, 0x25);
/// Free Mobile femtocells
pub const FEMTOCELL_COLOR: RGBColor = RGBColor(0x3D, 0x3D, 0x3D);
/// Free Mobile 3G antennas
pub const FREE_MOBILE_3G_COLOR: RGBColor = RGBColor(0xE8, 0x7F, 0x84);
/// Free Mobile 4G antennas
pub const FREE_MOBILE_4G_COLOR: RGBColor = RGBColor(0x8E, 0x0F, 0x14);

/// Slice colours of the global chart, in category order
pub const GLOBAL_COLORS: [RGBColor; 3] = [ORANGE_COLOR, FREE_MOBILE_COLOR, FEMTOCELL_COLOR];

/// Slice colours of the 4G chart, in category order
pub const FOUR_G_COLORS: [RGBColor; 4] = [
    ORANGE_COLOR,
    FEMTOCELL_COLOR,
    FREE_MOBILE_3G_COLOR,
    FREE_MOBILE_4G_COLOR,
];

const FONT_FAMILY: &str = "sans-serif";
const NO_DATA_TEXT: &str = "Aucune donnée";

/// Layout shared by both charts
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChartOptions {
    /// Canvas width in pixels
    pub width: u32,
    /// Canvas height in pixels
    pub height: u32,
    /// Pie radius in pixels
    pub radius: f64,
    /// Draw category names next to each slice
    pub slice_labels: bool,
    /// Height of one legend row
    pub legend_row_height: i32,
    /// Legend text size
    pub font_size: u32,
    /// Slice colours, in category order
    pub colors: &'static [RGBColor],
}

impl ChartOptions {
    /// Base layout every chart derives from
    pub const BASE: Self = Self {
        width: 420,
        height: 380,
        radius: 120.0,
        slice_labels: false,
        legend_row_height: 22,
        font_size: 14,
        colors: &[],
    };

    /// Copy of these options with another palette
    #[must_use]
    pub const fn with_colors(self, colors: &'static [RGBColor]) -> Self {
        Self { colors, ..self }
    }

    #[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
    const fn center(&self, legend_rows: usize) -> (i32, i32) {
        let legend_height = self.legend_row_height * legend_rows as i32;
        (
            self.width as i32 / 2,
            (self.height as i32 - legend_height) / 2,
        )
    }
}

/// Which of the two dashboard charts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChartKind {
    /// Every device
    Global,
    /// 4G capable devices only
    FourG,
}

impl ChartKind {
    /// Carousel slide hosting this chart
    #[must_use]
    pub const fn slide_index(self) -> usize {
        match self {
            Self::Global => 0,
            Self::FourG => 1,
        }
    }
}

/// One pie category
#[derive(Debug, Clone, PartialEq)]
pub struct Slice {
    /// Category name
    pub label: &'static str,
    /// Time spent in the category, in ms
    pub value: i64,
    /// Fill colour
    pub color: RGBColor,
}

/// A pie chart ready to draw
#[derive(Debug, Clone, PartialEq)]
pub struct PieChart {
    kind: ChartKind,
    slices: Vec<Slice>,
    options: ChartOptions,
}

impl PieChart {
    /// Chart over every device: Orange, Free Mobile, Femtocell
    #[must_use]
    pub fn global(usage: &GlobalUsage) -> Self {
        let options = ChartOptions::BASE.with_colors(&GLOBAL_COLORS);
        Self::build(
            ChartKind::Global,
            options,
            &[
                ("Orange", usage.time_on_orange),
                ("Free Mobile", usage.time_on_free_mobile),
                ("Femtocell", usage.time_on_free_mobile_femtocell),
            ],
        )
    }

    /// Chart over 4G devices: Orange, Femtocell, 3G Free Mobile, 4G Free Mobile
    #[must_use]
    pub fn four_g(usage: &FourGUsage) -> Self {
        let options = ChartOptions::BASE.with_colors(&FOUR_G_COLORS);
        Self::build(
            ChartKind::FourG,
            options,
            &[
                ("Orange", usage.time_on_orange),
                ("Femtocell", usage.time_on_free_mobile_femtocell),
                ("3G Free Mobile", usage.time_on_free_mobile_3g),
                ("4G Free Mobile", usage.time_on_free_mobile_4g),
            ],
        )
    }

    fn build(kind: ChartKind, options: ChartOptions, values: &[(&'static str, i64)]) -> Self {
        let slices = values
            .iter()
            .zip(options.colors)
            .map(|(&(label, value), &color)| Slice {
                label,
                value,
                color,
            })
            .collect();
        Self {
            kind,
            slices,
            options,
        }
    }

    /// Which chart this is
    #[must_use]
    pub const fn kind(&self) -> ChartKind {
        self.kind
    }

    /// Categories in drawing order
    #[must_use]
    pub fn slices(&self) -> &[Slice] {
        &self.slices
    }

    /// Layout used to draw this chart
    #[must_use]
    pub const fn options(&self) -> &ChartOptions {
        &self.options
    }

    /// Draw the chart as a standalone SVG document
    ///
    /// # Errors
    ///
    /// Returns [`Error::Chart`] if plotters fails to draw.
    pub fn to_svg(&self) -> Result<String> {
        let mut svg = String::new();
        self.draw(&mut svg).map_err(|e| Error::Chart(e.to_string()))?;
        Ok(svg)
    }

    #[allow(
        clippy::cast_precision_loss,
        clippy::cast_possible_truncation,
        clippy::cast_possible_wrap
    )]
    fn draw(
        &self,
        buffer: &mut String,
    ) -> std::result::Result<(), DrawingAreaErrorKind<io::Error>> {
        let opts = &self.options;
        let root = SVGBackend::with_string(buffer, (opts.width, opts.height)).into_drawing_area();
        root.fill(&WHITE)?;

        let center = opts.center(self.slices.len());
        let text_style = (FONT_FAMILY, opts.font_size).into_font().color(&BLACK);

        let total: i64 = self.slices.iter().map(|s| s.value.max(0)).sum();
        if total == 0 {
            root.draw(&Circle::new(
                center,
                opts.radius as i32,
                ShapeStyle::from(&BLACK.mix(0.2)).stroke_width(1),
            ))?;
            root.draw(&Text::new(
                NO_DATA_TEXT,
                (center.0 - opts.radius as i32 / 2, center.1),
                text_style.clone(),
            ))?;
        } else {
            let sizes: Vec<f64> = self.slices.iter().map(|s| s.value.max(0) as f64).collect();
            let colors: Vec<RGBColor> = self.slices.iter().map(|s| s.color).collect();
            let labels: Vec<&str> = self
                .slices
                .iter()
                .map(|s| if opts.slice_labels { s.label } else { "" })
                .collect();

            let mut pie = Pie::new(&center, &opts.radius, &sizes, &colors, &labels);
            pie.start_angle(-90.0);
            pie.label_style(text_style.clone());
            root.draw(&pie)?;
        }

        let legend_top = opts.height as i32 - opts.legend_row_height * self.slices.len() as i32;
        let legend_left = opts.width as i32 / 6;
        for (row, slice) in self.slices.iter().enumerate() {
            let y = legend_top + opts.legend_row_height * row as i32;
            let swatch = opts.font_size as i32;
            root.draw(&Rectangle::new(
                [(legend_left, y), (legend_left + swatch, y + swatch)],
                slice.color.filled(),
            ))?;
            root.draw(&Text::new(
                format!("{} : {}", slice.label, format_duration(slice.value)),
                (legend_left + swatch + 8, y),
                text_style.clone(),
            ))?;
        }

        root.present()?;
        Ok(())
    }
}

/// Human readable duration of a millisecond counter, e.g. `3 h 05 min`
#[must_use]
pub fn format_duration(ms: i64) -> String {
    let minutes = ms.max(0) / 60_000;
    let (hours, minutes) = (minutes / 60, minutes % 60);
    if hours == 0 {
        format!("{minutes} min")
    } else {
        format!("{hours} h {minutes:02} min")
    }
}

/// Both charts and the labels that accompany them, from a single response
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedCharts {
    /// Global chart SVG
    pub global_svg: String,
    /// 4G chart SVG
    pub four_g_svg: String,
    /// Users shown alongside the global chart
    pub global_users: i64,
    /// Users shown alongside the 4G chart
    pub four_g_users: i64,
    /// Inclusive days in the range
    pub days: i64,
}

/// Draws both dashboard charts
#[derive(Debug, Default, Clone, Copy)]
pub struct ChartRenderer;

impl ChartRenderer {
    /// Draw both charts without touching any surface
    ///
    /// # Errors
    ///
    /// Returns [`Error::Chart`] if either chart fails to draw.
    pub fn draw(stats: &UsageStats, range: &DateRange) -> Result<RenderedCharts> {
        Ok(RenderedCharts {
            global_svg: PieChart::global(&stats.stats_global).to_svg()?,
            four_g_svg: PieChart::four_g(&stats.stats_4g).to_svg()?,
            global_users: stats.stats_global.users,
            four_g_users: stats.stats_4g.users,
            days: range.day_count(),
        })
    }

    /// Replace both charts on `surface` and set the users and days labels
    ///
    /// Nothing is written to the surface unless both charts drew.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Chart`] if either chart fails to draw.
    pub fn render<S: DashboardSurface + ?Sized>(
        &self,
        stats: &UsageStats,
        range: &DateRange,
        surface: &mut S,
    ) -> Result<()> {
        let charts = Self::draw(stats, range)?;
        surface.apply(charts);
        Ok(())
    }
}
