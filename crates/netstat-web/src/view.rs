//! Dashboard view state
//!
//! [`ViewController`] sequences what the page shows while usage is loaded:
//! a spinner, then either the unavailable message or the charts followed by
//! their animated reveal. Responses are matched against a [`RefreshTicket`]
//! so that only the latest request may touch the page.

use crate::chart::{ChartRenderer, RenderedCharts};
use async_trait::async_trait;
use netstat_core::{DateRange, UsageStats, config::DashboardConfig};
use std::time::Duration;
use tracing::{debug, warn};

/// Message replacing the spinner when usage cannot be loaded
pub const UNAVAILABLE_MESSAGE: &str = "Les statistiques ne sont pas disponibles pour le moment.";

/// Page regions the controller reveals
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Region {
    /// Wrapper around the chart carousel
    ChartArea,
    /// Explanations below the charts
    HelpPanel,
}

/// Reveal animations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Animation {
    /// Opacity transition
    FadeIn,
    /// Height transition
    SlideDown,
}

/// Render targets of the dashboard page
pub trait DashboardSurface: Send {
    /// Show the selected range in the picker
    fn set_range(&mut self, range: &DateRange);
    /// Replace the chart area with a spinner
    fn show_spinner(&mut self);
    /// Replace the spinner text with `message`
    fn show_unavailable(&mut self, message: &str);
    /// Remove the spinner
    fn remove_spinner(&mut self);
    /// Replace both charts and their labels at once
    fn apply(&mut self, charts: RenderedCharts);
    /// Set the active users label
    fn set_users_label(&mut self, users: i64);
    /// Make a hidden region visible
    fn reveal(&mut self, region: Region);
    /// Hide a region again
    fn hide(&mut self, region: Region);
    /// Drop both charts and their labels
    fn clear_charts(&mut self);
    /// Set up the chart carousel
    fn init_slider(&mut self);
}

/// Runs reveal animations to completion
#[async_trait]
pub trait Animator: Send + Sync {
    /// Resolve once `animation` has finished
    async fn animate(&self, animation: Animation);
}

/// [`Animator`] waiting for the configured transition durations
#[derive(Debug, Clone, Copy)]
pub struct TimedAnimator {
    fade_in: Duration,
    slide_down: Duration,
}

impl TimedAnimator {
    /// Durations taken from the dashboard configuration
    #[must_use]
    pub const fn new(config: &DashboardConfig) -> Self {
        Self {
            fade_in: Duration::from_millis(config.fade_in_ms),
            slide_down: Duration::from_millis(config.slide_down_ms),
        }
    }
}

#[async_trait]
impl Animator for TimedAnimator {
    async fn animate(&self, animation: Animation) {
        let duration = match animation {
            Animation::FadeIn => self.fade_in,
            Animation::SlideDown => self.slide_down,
        };
        tokio::time::sleep(duration).await;
    }
}

/// [`Animator`] completing immediately
#[derive(Debug, Default, Clone, Copy)]
pub struct InstantAnimator;

#[async_trait]
impl Animator for InstantAnimator {
    async fn animate(&self, _animation: Animation) {}
}

/// Proof that a refresh was started, carrying its generation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RefreshTicket {
    generation: u64,
}

impl RefreshTicket {
    /// Generation this ticket was issued for
    #[must_use]
    pub const fn generation(self) -> u64 {
        self.generation
    }
}

/// Where the view is in its refresh cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewState {
    /// Nothing requested yet
    Idle,
    /// Waiting for usage
    Loading,
    /// Usage could not be loaded
    Error,
    /// Charts are shown
    Ready {
        /// Carousel slide currently shown
        active_slide: usize,
    },
}

/// Outcome of handing a response to the controller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Applied {
    /// The page was updated
    Shown,
    /// A newer refresh was started; nothing changed
    Stale,
}

/// Loading, error and ready sequencing for one page
#[derive(Debug)]
pub struct ViewController {
    state: ViewState,
    generation: u64,
    slider_initialized: bool,
    stats: Option<UsageStats>,
    renderer: ChartRenderer,
}

impl Default for ViewController {
    fn default() -> Self {
        Self::new()
    }
}

impl ViewController {
    /// Controller for a freshly loaded page
    #[must_use]
    pub const fn new() -> Self {
        Self {
            state: ViewState::Idle,
            generation: 0,
            slider_initialized: false,
            stats: None,
            renderer: ChartRenderer,
        }
    }

    /// Current state
    #[must_use]
    pub const fn state(&self) -> ViewState {
        self.state
    }

    /// Whether the carousel has been set up
    #[must_use]
    pub const fn slider_initialized(&self) -> bool {
        self.slider_initialized
    }

    /// Statistics behind the charts on screen
    #[must_use]
    pub const fn stats(&self) -> Option<&UsageStats> {
        self.stats.as_ref()
    }

    /// Enter the loading state; only the returned ticket may complete it
    pub fn begin_loading<S: DashboardSurface + ?Sized>(&mut self, surface: &mut S) -> RefreshTicket {
        self.generation += 1;
        self.state = ViewState::Loading;
        surface.hide(Region::ChartArea);
        surface.hide(Region::HelpPanel);
        surface.show_spinner();
        debug!(generation = self.generation, "Loading usage");
        RefreshTicket {
            generation: self.generation,
        }
    }

    /// Whether `ticket` belongs to the latest refresh
    #[must_use]
    pub const fn is_current(&self, ticket: RefreshTicket) -> bool {
        ticket.generation == self.generation
    }

    /// Show the unavailable message in place of the spinner and charts
    pub fn fail<S: DashboardSurface + ?Sized>(
        &mut self,
        ticket: RefreshTicket,
        surface: &mut S,
    ) -> Applied {
        if !self.is_current(ticket) {
            debug!(generation = ticket.generation, "Discarding stale failure");
            return Applied::Stale;
        }
        self.show_error(surface);
        Applied::Shown
    }

    fn show_error<S: DashboardSurface + ?Sized>(&mut self, surface: &mut S) {
        self.state = ViewState::Error;
        self.stats = None;
        surface.clear_charts();
        surface.show_unavailable(UNAVAILABLE_MESSAGE);
    }

    /// Draw `stats` and reveal the charts
    ///
    /// The help panel slides down only once the chart area has faded in. The
    /// carousel is set up on the first success only.
    pub async fn succeed<S, A>(
        &mut self,
        ticket: RefreshTicket,
        stats: UsageStats,
        range: &DateRange,
        surface: &mut S,
        animator: &A,
    ) -> Applied
    where
        S: DashboardSurface + ?Sized,
        A: Animator + ?Sized,
    {
        if !self.is_current(ticket) {
            debug!(generation = ticket.generation, "Discarding stale response");
            return Applied::Stale;
        }

        if let Err(e) = self.renderer.render(&stats, range, surface) {
            warn!(error = %e, "Failed to draw usage charts");
            self.show_error(surface);
            return Applied::Shown;
        }
        self.stats = Some(stats);
        surface.remove_spinner();

        animator.animate(Animation::FadeIn).await;
        surface.reveal(Region::ChartArea);
        animator.animate(Animation::SlideDown).await;
        surface.reveal(Region::HelpPanel);

        if !self.slider_initialized {
            surface.init_slider();
            self.slider_initialized = true;
        }
        self.state = ViewState::Ready { active_slide: 0 };
        Applied::Shown
    }

    /// Carousel is about to show `next_slide`: swap the users label
    ///
    /// Ignored unless charts are shown. Returns whether the slide changed.
    pub fn slide_changing<S: DashboardSurface + ?Sized>(
        &mut self,
        next_slide: usize,
        surface: &mut S,
    ) -> bool {
        let (ViewState::Ready { active_slide }, Some(stats)) = (&mut self.state, self.stats) else {
            return false;
        };
        let users = if next_slide == 0 {
            stats.stats_global.users
        } else {
            stats.stats_4g.users
        };
        surface.set_users_label(users);
        *active_slide = next_slide;
        true
    }
}
