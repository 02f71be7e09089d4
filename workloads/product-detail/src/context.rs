//! Page context handed to the controller.

use storefront_dom::{share, DomError, Page, SharedPage};

use crate::ids::ProductId;

/// The page being controlled and the product it renders.
#[derive(Debug, Clone)]
pub struct PageContext {
    page: SharedPage,
    product_id: ProductId,
}

impl PageContext {
    pub fn new(page: SharedPage, product_id: impl Into<ProductId>) -> Self {
        Self {
            page,
            product_id: product_id.into(),
        }
    }

    /// Parse server-rendered markup into a fresh context.
    pub fn from_html(markup: &str, product_id: impl Into<ProductId>) -> Result<Self, DomError> {
        Ok(Self::new(share(Page::from_html(markup)?), product_id))
    }

    pub fn page(&self) -> &SharedPage {
        &self.page
    }

    pub fn product_id(&self) -> &ProductId {
        &self.product_id
    }
}

/// Find the product id from the first element whose id starts with
/// `prefix` (the main carousel), falling back to the first
/// `data-product-id` attribute on the page.
pub fn detect_product_id(page: &Page, prefix: &str) -> Option<ProductId> {
    let nodes = page.descendants(page.document());

    let from_carousel = nodes.iter().find_map(|&node| {
        page.attr(node, "id")
            .and_then(|id| id.strip_prefix(prefix))
            .filter(|rest| !rest.is_empty())
    });
    from_carousel
        .or_else(|| nodes.iter().find_map(|&node| page.attr(node, "data-product-id")))
        .map(ProductId::from)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_from_carousel_id() {
        let page = Page::from_html(
            r#"<body><button data-product-id="9"></button><div id="productCarousel-17"></div></body>"#,
        )
        .unwrap();
        assert_eq!(detect_product_id(&page, "productCarousel-"), Some(ProductId::new("17")));
    }

    #[test]
    fn test_detect_falls_back_to_data_attribute() {
        let page =
            Page::from_html(r#"<body><button data-product-id="9"></button></body>"#).unwrap();
        assert_eq!(detect_product_id(&page, "productCarousel-"), Some(ProductId::new("9")));
        assert_eq!(detect_product_id(&Page::new(), "productCarousel-"), None);
    }
}
