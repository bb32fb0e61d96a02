use std::time::Duration;

use anyhow::{Context, Result};
use tracing::{debug, error, info, warn};

pub const SOURCE_URLS: &[&str] = &[
    "https://www.churchofjesuschrist.org/media/music/collections/hymns?lang=eng",
    "https://www.churchofjesuschrist.org/media/music/collections/hymns-for-home-and-church?lang=eng",
];

/// Hymn titles are the headings inside each collection card.
pub const HYMN_SELECTOR: &str = ".innerWrapper h4";

pub const WAIT_TIMEOUT: Duration = Duration::from_secs(10);

const PLACEHOLDER_LINES: &[&str] = &["1. The Morning Breaks", "2. The Spirit of God"];

/// A page-rendering backend the scraper can drive.
pub trait PageDriver {
    fn navigate(&mut self, url: &str) -> Result<()>;

    /// Block until at least one element matches, or fail after `timeout`.
    fn wait_for_elements(&mut self, selector: &str, timeout: Duration) -> Result<()>;

    /// One text read per matching element, in DOM order. A single element
    /// can fail to read (e.g. detached by a re-render) without losing the
    /// others.
    fn find_all(&mut self, selector: &str) -> Result<Vec<Result<String>>>;

    /// Release the underlying browser session.
    fn close(&mut self) -> Result<()>;
}

/// Lines gathered by one scrape, plus the error that cut it short, if any.
#[derive(Debug, Default)]
pub struct Extraction {
    pub lines: Vec<String>,
    pub failure: Option<anyhow::Error>,
}

impl Extraction {
    pub fn is_complete(&self) -> bool {
        self.failure.is_none()
    }
}

/// Owns the driver for the duration of a scrape; closes it on drop.
struct Session<D: PageDriver> {
    driver: D,
}

impl<D: PageDriver> Drop for Session<D> {
    fn drop(&mut self) {
        info!("Scraping finished. Closing browser...");
        match self.driver.close() {
            Ok(()) => info!("Browser closed."),
            Err(e) => warn!("Failed to close browser cleanly: {:?}", e),
        }
    }
}

/// Scrape every URL in order. Stops at the first failure and keeps what was
/// already collected. Without a driver, returns placeholder lines.
pub fn collect_hymn_lines<D: PageDriver>(driver: Option<D>, urls: &[&str]) -> Extraction {
    let Some(driver) = driver else {
        warn!("No driver provided, using placeholder data.");
        return Extraction {
            lines: PLACEHOLDER_LINES.iter().map(|s| s.to_string()).collect(),
            failure: None,
        };
    };

    info!("Scraping started.");
    let mut extraction = Extraction::default();
    {
        let mut session = Session { driver };
        if let Err(e) = scrape_urls(&mut session.driver, urls, &mut extraction.lines) {
            error!("An error occurred during scraping: {:?}", e);
            extraction.failure = Some(e);
        }
    }

    info!("Scraping complete. Total hymns found: {}", extraction.lines.len());
    extraction
}

fn scrape_urls<D: PageDriver>(driver: &mut D, urls: &[&str], lines: &mut Vec<String>) -> Result<()> {
    for url in urls {
        info!("Fetching URL: {}", url);
        driver
            .navigate(url)
            .with_context(|| format!("Failed to load {}", url))?;
        driver
            .wait_for_elements(HYMN_SELECTOR, WAIT_TIMEOUT)
            .with_context(|| format!("No `{}` elements on {}", HYMN_SELECTOR, url))?;

        let texts = driver
            .find_all(HYMN_SELECTOR)
            .with_context(|| format!("Failed to read hymn headings on {}", url))?;
        info!("Successfully scraped {} hymns from {}", texts.len(), url);

        for (i, text) in texts.into_iter().enumerate() {
            let text = text.with_context(|| format!("Failed to read hymn heading #{} on {}", i, url))?;
            let line = text.trim().to_string();
            debug!("Added hymn: {}", line);
            lines.push(line);
        }
    }
    Ok(())
}

// ── Tests ──

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::{Cell, RefCell};
    use std::rc::Rc;

    use anyhow::bail;

    /// Serves the same headings for every page. Can be told to fail loading
    /// the nth page, time out on the nth wait, or fail reading one element
    /// of one page.
    struct FakeDriver {
        headings: Vec<String>,
        fail_navigate_at: Option<usize>,
        fail_wait_at: Option<usize>,
        fail_read_at: Option<(usize, usize)>,
        waits: usize,
        visited: Rc<RefCell<Vec<String>>>,
        closes: Rc<Cell<usize>>,
    }

    impl FakeDriver {
        fn new(headings: &[&str]) -> Self {
            Self {
                headings: headings.iter().map(|s| s.to_string()).collect(),
                fail_navigate_at: None,
                fail_wait_at: None,
                fail_read_at: None,
                waits: 0,
                visited: Rc::default(),
                closes: Rc::default(),
            }
        }
    }

    impl PageDriver for FakeDriver {
        fn navigate(&mut self, url: &str) -> Result<()> {
            let n = self.visited.borrow().len();
            self.visited.borrow_mut().push(url.to_string());
            if self.fail_navigate_at == Some(n) {
                bail!("net::ERR_NAME_NOT_RESOLVED");
            }
            Ok(())
        }

        fn wait_for_elements(&mut self, selector: &str, timeout: Duration) -> Result<()> {
            assert_eq!(selector, HYMN_SELECTOR);
            assert_eq!(timeout, WAIT_TIMEOUT);
            let n = self.waits;
            self.waits += 1;
            if self.fail_wait_at == Some(n) {
                bail!("timed out after {:?}", timeout);
            }
            Ok(())
        }

        fn find_all(&mut self, _selector: &str) -> Result<Vec<Result<String>>> {
            let page = self.visited.borrow().len() - 1;
            Ok(self
                .headings
                .iter()
                .enumerate()
                .map(|(i, h)| match self.fail_read_at {
                    Some(at) if at == (page, i) => Err(anyhow::anyhow!("node is detached")),
                    _ => Ok(h.clone()),
                })
                .collect())
        }

        fn close(&mut self) -> Result<()> {
            self.closes.set(self.closes.get() + 1);
            Ok(())
        }
    }

    #[test]
    fn collects_all_pages_in_order() {
        let driver = FakeDriver::new(&["1. The Morning Breaks", "  2. The Spirit of God\n"]);
        let visited = Rc::clone(&driver.visited);
        let closes = Rc::clone(&driver.closes);

        let out = collect_hymn_lines(Some(driver), SOURCE_URLS);

        assert!(out.is_complete());
        assert_eq!(
            out.lines,
            vec![
                "1. The Morning Breaks",
                "2. The Spirit of God",
                "1. The Morning Breaks",
                "2. The Spirit of God",
            ]
        );
        assert_eq!(*visited.borrow(), SOURCE_URLS);
        assert_eq!(closes.get(), 1);
    }

    #[test]
    fn timeout_keeps_partial_lines() {
        let mut driver = FakeDriver::new(&["1. The Morning Breaks", "2. The Spirit of God"]);
        driver.fail_wait_at = Some(1);
        let closes = Rc::clone(&driver.closes);

        let out = collect_hymn_lines(Some(driver), SOURCE_URLS);

        assert!(!out.is_complete());
        assert_eq!(out.lines.len(), 2);
        let msg = format!("{:#}", out.failure.unwrap());
        assert!(msg.contains("hymns-for-home-and-church"));
        assert_eq!(closes.get(), 1);
    }

    #[test]
    fn first_page_timeout_yields_nothing() {
        let mut driver = FakeDriver::new(&["1. The Morning Breaks"]);
        driver.fail_wait_at = Some(0);
        let visited = Rc::clone(&driver.visited);
        let closes = Rc::clone(&driver.closes);

        let out = collect_hymn_lines(Some(driver), SOURCE_URLS);

        assert!(out.lines.is_empty());
        assert!(out.failure.is_some());
        // Second URL is never attempted
        assert_eq!(visited.borrow().len(), 1);
        assert_eq!(closes.get(), 1);
    }

    #[test]
    fn unreadable_element_keeps_earlier_ones() {
        let mut driver = FakeDriver::new(&["1. The Morning Breaks", "2. The Spirit of God"]);
        driver.fail_read_at = Some((1, 1));
        let closes = Rc::clone(&driver.closes);

        let out = collect_hymn_lines(Some(driver), SOURCE_URLS);

        assert_eq!(
            out.lines,
            vec![
                "1. The Morning Breaks",
                "2. The Spirit of God",
                "1. The Morning Breaks",
            ]
        );
        let msg = format!("{:#}", out.failure.unwrap());
        assert!(msg.contains("heading #1"));
        assert_eq!(closes.get(), 1);
    }

    #[test]
    fn navigation_error_keeps_earlier_page() {
        let mut driver = FakeDriver::new(&["1. The Morning Breaks", "2. The Spirit of God"]);
        driver.fail_navigate_at = Some(1);
        let visited = Rc::clone(&driver.visited);
        let closes = Rc::clone(&driver.closes);

        let out = collect_hymn_lines(Some(driver), SOURCE_URLS);

        assert_eq!(out.lines.len(), 2);
        let msg = format!("{:#}", out.failure.unwrap());
        assert!(msg.contains("Failed to load"));
        assert!(msg.contains("ERR_NAME_NOT_RESOLVED"));
        assert_eq!(visited.borrow().len(), 2);
        assert_eq!(closes.get(), 1);
    }

    #[test]
    fn no_driver_returns_placeholder() {
        let out = collect_hymn_lines(None::<FakeDriver>, SOURCE_URLS);
        assert!(out.is_complete());
        assert_eq!(out.lines, vec!["1. The Morning Breaks", "2. The Spirit of God"]);
    }

    #[test]
    fn empty_pages_still_close() {
        let driver = FakeDriver::new(&[]);
        let closes = Rc::clone(&driver.closes);

        let out = collect_hymn_lines(Some(driver), SOURCE_URLS);
        assert!(out.is_complete());
        assert!(out.lines.is_empty());
        assert_eq!(closes.get(), 1);
    }
}
