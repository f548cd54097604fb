use crate::model::ParserError;
use crate::parser::selector;
use ::scraper::Html;

const CARD_LINK: &str = ".lightblue-box .row .col-xl-2 a";
const NEXT_PAGE: &str = ".next.page-numbers";

/// One listing page: the detail links in card order plus the "next page" link, if any.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingPage {
    pub urls: Vec<String>,
    pub next_page: Option<String>,
}

pub fn parse_listing(html: &str) -> Result<ListingPage, ParserError> {
    let document = Html::parse_document(html);
    let card_selector = selector(CARD_LINK)?;
    let next_selector = selector(NEXT_PAGE)?;

    let urls = document
        .select(&card_selector)
        .filter_map(|a| a.value().attr("href"))
        .map(|href| href.to_string())
        .collect();

    let next_page = document
        .select(&next_selector)
        .next()
        .and_then(|a| a.value().attr("href"))
        .map(|href| href.to_string());

    Ok(ListingPage { urls, next_page })
}
