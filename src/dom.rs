use anyhow::Result;

/// Element-level access into the rendered document. Handles do not survive
/// further scrolling.
#[allow(async_fn_in_trait)]
pub trait DomElement: Sized {
    /// First descendant matching `selector`; absence is `None`, not an error.
    async fn query(&self, selector: &str) -> Result<Option<Self>>;

    async fn text_content(&self) -> Result<Option<String>>;

    async fn attribute(&self, name: &str) -> Result<Option<String>>;

    /// URL property resolved against the document base.
    async fn resolved_url(&self, name: &str) -> Result<Option<String>>;
}

/// Capability set the pipeline needs from a rendered document; implemented
/// by the live WebDriver page and by the static snapshot backend.
#[allow(async_fn_in_trait)]
pub trait DomPage {
    type Element: DomElement;

    async fn count_matching(&self, selector: &str) -> Result<usize>;

    async fn current_scroll_height(&self) -> Result<u64>;

    async fn scroll_to_bottom(&self) -> Result<()>;

    async fn query_all(&self, selector: &str) -> Result<Vec<Self::Element>>;
}
