//! Chromium-based listing page using chromiumoxide.

use super::{ListingPage, Renderer, RowsWait};
use crate::model::{NavigationOutcome, PageSnapshot};
use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::page::Page;
use futures::StreamExt;
use std::path::PathBuf;
use std::time::Duration;

/// Interval between row-presence polls while waiting for the container.
const ROW_POLL_INTERVAL_MS: u64 = 100;

/// Upper bound on the in-page navigation wait after clicking the affordance.
const NAV_WAIT_TIMEOUT_MS: u64 = 15_000;

/// Find the Chromium binary path.
pub fn find_chromium() -> Option<PathBuf> {
    // 1. CHRONOSWEEP_CHROMIUM_PATH env
    if let Ok(p) = std::env::var("CHRONOSWEEP_CHROMIUM_PATH") {
        let path = PathBuf::from(&p);
        if path.exists() {
            return Some(path);
        }
    }

    // 2. ~/.chronosweep/chromium/
    if let Some(home) = dirs::home_dir() {
        let base = home.join(".chronosweep/chromium");
        let candidates = if cfg!(target_os = "macos") {
            vec![
                base.join("Google Chrome for Testing.app/Contents/MacOS/Google Chrome for Testing"),
                base.join("chrome"),
            ]
        } else {
            vec![base.join("chrome-linux64/chrome"), base.join("chrome")]
        };
        for c in candidates {
            if c.exists() {
                return Some(c);
            }
        }
    }

    // 3. System PATH
    for name in ["google-chrome", "google-chrome-stable", "chromium", "chromium-browser"] {
        if let Ok(path) = which::which(name) {
            return Some(path);
        }
    }

    // 4. Common macOS location
    if cfg!(target_os = "macos") {
        let common = PathBuf::from("/Applications/Google Chrome.app/Contents/MacOS/Google Chrome");
        if common.exists() {
            return Some(common);
        }
    }

    None
}

/// CSS selectors describing the shape of a listing source.
///
/// Defaults match the Hacker News `/newest` listing: ranked rows whose date
/// lives in an attribute on the row's sibling, plus a "More" link.
#[derive(Debug, Clone)]
pub struct ListingSelectors {
    /// One ranked row.
    pub row: String,
    /// Title anchor inside a row.
    pub title: String,
    /// Date element inside the row's following sibling.
    pub date: String,
    /// Attribute on the date element holding the ISO date string.
    pub date_attr: String,
    /// The further-page affordance.
    pub more: String,
}

impl Default for ListingSelectors {
    fn default() -> Self {
        Self {
            row: "tr.athing".to_string(),
            title: ".titleline a".to_string(),
            date: ".age".to_string(),
            date_attr: "title".to_string(),
            more: "a.morelink".to_string(),
        }
    }
}

const SNAPSHOT_JS: &str = r#"
(() => {
  const rows = Array.from(document.querySelectorAll(__ROW__))
    .map((row) => {
      const titleEl = row.querySelector(__TITLE__);
      const sibling = row.nextElementSibling;
      const dateEl = sibling ? sibling.querySelector(__DATE__) : null;
      const date = dateEl ? dateEl.getAttribute(__DATE_ATTR__) : null;
      if (!row.id || !date) return null;
      return { id: row.id, title: titleEl ? titleEl.innerText.trim() : null, date };
    })
    .filter(Boolean);
  const more = document.querySelector(__MORE__);
  return { rows, has_more: !!more, next_url: more ? more.href : null };
})()
"#;

impl ListingSelectors {
    /// Render the in-page extraction script for these selectors.
    fn snapshot_script(&self) -> String {
        SNAPSHOT_JS
            .replace("__ROW__", &js_string(&self.row))
            .replace("__TITLE__", &js_string(&self.title))
            .replace("__DATE__", &js_string(&self.date))
            .replace("__DATE_ATTR__", &js_string(&self.date_attr))
            .replace("__MORE__", &js_string(&self.more))
    }

    fn rows_present_script(&self) -> String {
        format!("document.querySelector({}) !== null", js_string(&self.row))
    }

    fn click_more_script(&self) -> String {
        format!(
            "(() => {{ const el = document.querySelector({}); if (!el) return false; el.click(); return true; }})()",
            js_string(&self.more)
        )
    }
}

/// Quote a selector as a JS string literal.
fn js_string(s: &str) -> String {
    serde_json::Value::String(s.to_string()).to_string()
}

/// Chromium-based renderer.
pub struct ChromiumRenderer {
    browser: Browser,
    selectors: ListingSelectors,
}

impl ChromiumRenderer {
    /// Create a new ChromiumRenderer, launching a headless Chromium instance.
    pub async fn new() -> Result<Self> {
        Self::with_selectors(ListingSelectors::default()).await
    }

    /// Launch with a non-default listing shape.
    pub async fn with_selectors(selectors: ListingSelectors) -> Result<Self> {
        let chrome_path = find_chromium()
            .context("Chromium not found. Run `chronosweep doctor` for setup hints.")?;

        let config = BrowserConfig::builder()
            .chrome_executable(chrome_path)
            .arg("--headless=new")
            .arg("--disable-gpu")
            .arg("--no-sandbox")
            .arg("--disable-dev-shm-usage")
            .arg("--disable-extensions")
            .arg("--disable-background-networking")
            .build()
            .map_err(|e| anyhow::anyhow!("failed to build browser config: {e}"))?;

        let (browser, mut handler) = Browser::launch(config)
            .await
            .context("failed to launch Chromium")?;

        // Spawn the handler task
        tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                let _ = event;
            }
        });

        Ok(Self { browser, selectors })
    }
}

#[async_trait]
impl Renderer for ChromiumRenderer {
    async fn new_page(&self) -> Result<Box<dyn ListingPage>> {
        let page = self
            .browser
            .new_page("about:blank")
            .await
            .context("failed to create new page")?;

        Ok(Box::new(ChromiumPage {
            page,
            selectors: self.selectors.clone(),
        }))
    }

    async fn shutdown(&self) -> Result<()> {
        // Browser is dropped when ChromiumRenderer is dropped
        Ok(())
    }
}

/// A single Chromium page holding the live listing.
pub struct ChromiumPage {
    page: Page,
    selectors: ListingSelectors,
}

#[async_trait]
impl ListingPage for ChromiumPage {
    async fn open(&mut self, url: &str, timeout_ms: u64) -> Result<()> {
        let result = tokio::time::timeout(
            Duration::from_millis(timeout_ms),
            self.page.goto(url),
        )
        .await;

        match result {
            Ok(Ok(_)) => {
                let _ = self.page.wait_for_navigation().await;
                Ok(())
            }
            Ok(Err(e)) => bail!("failed to open {url}: {e}"),
            Err(_) => bail!("opening {url} timed out after {timeout_ms}ms"),
        }
    }

    async fn wait_for_rows(&self, timeout_ms: u64) -> Result<RowsWait> {
        let script = self.selectors.rows_present_script();
        let poll = async {
            loop {
                let present = match self.page.evaluate(script.clone()).await {
                    Ok(result) => result.into_value::<bool>().unwrap_or(false),
                    // Evaluation can fail mid-navigation; keep polling.
                    Err(_) => false,
                };
                if present {
                    break;
                }
                tokio::time::sleep(Duration::from_millis(ROW_POLL_INTERVAL_MS)).await;
            }
        };

        match tokio::time::timeout(Duration::from_millis(timeout_ms), poll).await {
            Ok(()) => Ok(RowsWait::Ready),
            Err(_) => Ok(RowsWait::TimedOut),
        }
    }

    async fn snapshot(&self) -> Result<PageSnapshot> {
        let result = self
            .page
            .evaluate(self.selectors.snapshot_script())
            .await
            .context("listing extraction failed")?;

        result
            .into_value()
            .map_err(|e| anyhow::anyhow!("failed to decode listing snapshot: {e:?}"))
    }

    async fn advance(&mut self) -> Result<NavigationOutcome> {
        let clicked = self
            .page
            .evaluate(self.selectors.click_more_script())
            .await
            .context("failed to click next-page affordance")?
            .into_value::<bool>()
            .map_err(|e| anyhow::anyhow!("failed to decode click result: {e:?}"))?;

        if !clicked {
            return Ok(NavigationOutcome {
                ok: false,
                status: None,
                error: Some("next-page affordance not found".to_string()),
            });
        }

        let wait = tokio::time::timeout(
            Duration::from_millis(NAV_WAIT_TIMEOUT_MS),
            self.page.wait_for_navigation(),
        )
        .await;

        match wait {
            // chromiumoxide doesn't easily expose the response status here
            Ok(Ok(_)) => Ok(NavigationOutcome {
                ok: true,
                status: None,
                error: None,
            }),
            Ok(Err(e)) => Ok(NavigationOutcome {
                ok: false,
                status: None,
                error: Some(format!("navigation failed: {e}")),
            }),
            Err(_) => Ok(NavigationOutcome {
                ok: false,
                status: None,
                error: Some(format!("navigation timed out after {NAV_WAIT_TIMEOUT_MS}ms")),
            }),
        }
    }

    async fn close(self: Box<Self>) -> Result<()> {
        let _ = self.page.close().await;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_script_embeds_selectors() {
        let script = ListingSelectors::default().snapshot_script();
        assert!(script.contains(r#""tr.athing""#));
        assert!(script.contains(r#"".titleline a""#));
        assert!(script.contains(r#""a.morelink""#));
        assert!(!script.contains("__ROW__"));
    }

    #[test]
    fn test_js_string_escapes_quotes() {
        assert_eq!(js_string(r#"a[title="x"]"#), r#""a[title=\"x\"]""#);
    }

    #[tokio::test]
    #[ignore] // Requires Chromium to be installed
    async fn test_chromium_snapshot_of_static_listing() {
        let html = concat!(
            "<table>",
            "<tr class='athing' id='r1'><td><span class='titleline'><a href='#'>First</a></span></td></tr>",
            "<tr><td><span class='age' title='2026-01-01T00:02:00'>2 minutes ago</span></td></tr>",
            "<tr class='athing' id='r2'><td><span class='titleline'><a href='#'>Second</a></span></td></tr>",
            "<tr><td><span class='age' title='2026-01-01T00:01:00'>1 minute ago</span></td></tr>",
            "</table>",
        );

        let renderer = ChromiumRenderer::new().await.expect("failed to create renderer");
        let mut page = renderer.new_page().await.expect("failed to create page");

        page.open(&format!("data:text/html,{html}"), 10_000)
            .await
            .expect("open failed");

        let ready = page.wait_for_rows(5_000).await.expect("wait failed");
        assert_eq!(ready, RowsWait::Ready);

        let snap = page.snapshot().await.expect("snapshot failed");
        assert_eq!(snap.rows.len(), 2);
        assert_eq!(snap.rows[0].id, "r1");
        assert_eq!(snap.rows[0].title.as_deref(), Some("First"));
        assert_eq!(snap.rows[0].date, "2026-01-01T00:02:00");
        assert!(!snap.has_more);

        page.close().await.expect("close failed");
        renderer.shutdown().await.expect("shutdown failed");
    }
}
