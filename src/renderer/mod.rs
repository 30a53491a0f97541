//! Browser boundary for paginated listing sources.
//!
//! Defines the `Renderer` and `ListingPage` traits that abstract over the
//! browser engine (currently Chromium via chromiumoxide). The collector only
//! ever talks to `ListingPage`, so tests can drive it with a scripted page.

pub mod chromium;

use crate::model::{NavigationOutcome, PageSnapshot};
use anyhow::Result;
use async_trait::async_trait;

/// Outcome of waiting for the row container to appear.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowsWait {
    Ready,
    TimedOut,
}

/// A browser engine that can open listing pages.
#[async_trait]
pub trait Renderer: Send + Sync {
    /// Create a new page context (tab).
    async fn new_page(&self) -> Result<Box<dyn ListingPage>>;
    /// Shut down the browser engine.
    async fn shutdown(&self) -> Result<()>;
}

/// One live page of a paginated listing.
///
/// The page is the single shared resource of a sweep: `advance` is the only
/// operation that moves it, and `snapshot` must never navigate.
#[async_trait]
pub trait ListingPage: Send + Sync {
    /// Navigate to the listing's entry URL.
    async fn open(&mut self, url: &str, timeout_ms: u64) -> Result<()>;
    /// Block until rows are present or the bound elapses.
    async fn wait_for_rows(&self, timeout_ms: u64) -> Result<RowsWait>;
    /// Read the rows and the further-page affordance off the current page.
    async fn snapshot(&self) -> Result<PageSnapshot>;
    /// Trigger a transition to the next page.
    ///
    /// Not assumed idempotent: a failed attempt may have partially
    /// progressed, which is why the collector bounds its retries instead of
    /// retrying unconditionally.
    async fn advance(&mut self) -> Result<NavigationOutcome>;
    /// Close this page.
    async fn close(self: Box<Self>) -> Result<()>;
}
