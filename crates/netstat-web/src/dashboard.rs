//! Refresh cycle wiring range changes to fetches and the page

use crate::{
    api_client::{FetchError, UsageFetcher},
    page::DashboardPage,
    view::{Animator, Applied, DashboardSurface, RefreshTicket, ViewController},
};
use futures::{StreamExt, future::BoxFuture, stream::FuturesUnordered};
use netstat_core::{DateRange, UsageStats};
use std::sync::Arc;
use tokio::sync::broadcast::{self, error::RecvError};
use tracing::{debug, info, warn};

type FetchOutcome = (RefreshTicket, DateRange, Result<UsageStats, FetchError>);

/// One dashboard page and the machinery refreshing it
#[derive(Debug)]
pub struct Dashboard<F, A> {
    fetcher: Arc<F>,
    animator: A,
    controller: ViewController,
    page: DashboardPage,
}

impl<F, A> Dashboard<F, A>
where
    F: UsageFetcher + 'static,
    A: Animator,
{
    /// Fresh page backed by `fetcher`
    pub fn new(fetcher: Arc<F>, animator: A) -> Self {
        Self {
            fetcher,
            animator,
            controller: ViewController::new(),
            page: DashboardPage::new(),
        }
    }

    /// Page as currently rendered
    pub const fn page(&self) -> &DashboardPage {
        &self.page
    }

    /// View state sequencing
    pub const fn controller(&self) -> &ViewController {
        &self.controller
    }

    /// Consume the dashboard, keeping the page
    pub fn into_page(self) -> DashboardPage {
        self.page
    }

    /// Run one full load cycle for `range`
    pub async fn refresh(&mut self, range: DateRange) -> Applied {
        let ticket = self.begin(range);
        let result = self.fetcher.fetch(range).await;
        self.complete(ticket, &range, result).await
    }

    /// Carousel is moving to `slide`; ignored unless charts are shown
    pub fn change_slide(&mut self, slide: usize) {
        if self.controller.slide_changing(slide, &mut self.page) {
            self.page.set_active_slide(slide);
        }
    }

    /// Refresh on every committed range until the selector goes away
    ///
    /// A new range does not wait for the previous fetch; whichever
    /// completes, only the latest request reaches the page.
    pub async fn run(&mut self, mut changes: broadcast::Receiver<DateRange>) {
        let mut in_flight: FuturesUnordered<BoxFuture<'static, FetchOutcome>> =
            FuturesUnordered::new();
        let mut open = true;

        loop {
            tokio::select! {
                change = changes.recv(), if open => match change {
                    Ok(range) => {
                        let ticket = self.begin(range);
                        let fetcher = Arc::clone(&self.fetcher);
                        in_flight.push(Box::pin(async move {
                            let result = fetcher.fetch(range).await;
                            (ticket, range, result)
                        }));
                    }
                    Err(RecvError::Lagged(skipped)) => {
                        warn!(skipped, "Dashboard fell behind range changes");
                    }
                    Err(RecvError::Closed) => {
                        debug!("Range selector dropped");
                        open = false;
                    }
                },
                Some((ticket, range, result)) = in_flight.next(), if !in_flight.is_empty() => {
                    self.complete(ticket, &range, result).await;
                }
                else => break,
            }
        }
        info!("Dashboard refresh loop stopped");
    }

    fn begin(&mut self, range: DateRange) -> RefreshTicket {
        self.page.set_range(&range);
        self.controller.begin_loading(&mut self.page)
    }

    async fn complete(
        &mut self,
        ticket: RefreshTicket,
        range: &DateRange,
        result: Result<UsageStats, FetchError>,
    ) -> Applied {
        match result {
            Ok(stats) => {
                self.controller
                    .succeed(ticket, stats, range, &mut self.page, &self.animator)
                    .await
            }
            Err(e) => {
                debug!(error = %e, "Showing unavailable usage");
                self.controller.fail(ticket, &mut self.page)
            }
        }
    }
}
