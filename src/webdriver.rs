use anyhow::{Context, Result};
use thirtyfour::error::WebDriverError;
use thirtyfour::{By, ChromiumLikeCapabilities, DesiredCapabilities, WebDriver, WebElement};

use crate::dom::{DomElement, DomPage};

/// A live browser page behind a WebDriver endpoint (chromedriver, selenium).
pub struct BrowserPage {
    driver: WebDriver,
}

impl BrowserPage {
    pub async fn connect(webdriver_url: &str, headless: bool) -> Result<Self> {
        let mut caps = DesiredCapabilities::chrome();
        if headless {
            caps.add_arg("--headless=new")
                .context("Failed to set headless capability")?;
            caps.add_arg("--window-size=1920,1080")
                .context("Failed to set window size capability")?;
        }

        let driver = WebDriver::new(webdriver_url, caps)
            .await
            .with_context(|| format!("Failed to start WebDriver session at {}", webdriver_url))?;

        if !headless {
            driver.maximize_window().await?;
        }

        Ok(BrowserPage { driver })
    }

    pub async fn navigate(&self, url: &str) -> Result<()> {
        self.driver
            .goto(url)
            .await
            .with_context(|| format!("Failed to navigate to {}", url))
    }

    pub async fn quit(self) -> Result<()> {
        self.driver.quit().await.context("Failed to end session")
    }
}

impl DomPage for BrowserPage {
    type Element = BrowserElement;

    async fn count_matching(&self, selector: &str) -> Result<usize> {
        let elements = self.driver.find_all(By::Css(selector)).await?;
        Ok(elements.len())
    }

    async fn current_scroll_height(&self) -> Result<u64> {
        let ret = self
            .driver
            .execute("return document.documentElement.scrollHeight;", vec![])
            .await?;
        // Some drivers report the height as a float.
        let height: f64 = ret.convert()?;
        Ok(height as u64)
    }

    async fn scroll_to_bottom(&self) -> Result<()> {
        self.driver
            .execute(
                "window.scrollTo(0, document.documentElement.scrollHeight);",
                vec![],
            )
            .await?;
        Ok(())
    }

    async fn query_all(&self, selector: &str) -> Result<Vec<Self::Element>> {
        let elements = self.driver.find_all(By::Css(selector)).await?;
        Ok(elements.into_iter().map(BrowserElement).collect())
    }
}

pub struct BrowserElement(WebElement);

impl DomElement for BrowserElement {
    async fn query(&self, selector: &str) -> Result<Option<Self>> {
        match self.0.find(By::Css(selector)).await {
            Ok(element) => Ok(Some(BrowserElement(element))),
            Err(WebDriverError::NoSuchElement(_)) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn text_content(&self) -> Result<Option<String>> {
        Ok(Some(self.0.text().await?))
    }

    async fn attribute(&self, name: &str) -> Result<Option<String>> {
        Ok(self.0.attr(name).await?)
    }

    async fn resolved_url(&self, name: &str) -> Result<Option<String>> {
        // Properties come back already resolved against the document base,
        // unlike the raw attribute.
        Ok(self.0.prop(name).await?)
    }
}
