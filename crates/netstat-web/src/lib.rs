//! FreeMobile Netstat dashboard
//!
//! Pick a date range, fetch aggregated network usage from the statistics API
//! and show it as two pie charts: one over every device, one over 4G devices.

#![forbid(unsafe_code)]
#![warn(
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    missing_docs,
    rust_2018_idioms
)]

pub mod api_client;
pub mod chart;
pub mod dashboard;
pub mod handlers;
pub mod page;
pub mod range;
pub mod routes;
pub mod server;
pub mod state;
pub mod view;

pub use api_client::{FetchError, HttpUsageFetcher, UsageFetcher};
pub use chart::{ChartOptions, ChartRenderer, PieChart};
pub use dashboard::Dashboard;
pub use page::DashboardPage;
pub use range::{RangeEdit, RangeSelector};
pub use server::build_app;
pub use state::AppState;
pub use view::{DashboardSurface, ViewController};
