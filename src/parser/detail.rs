// Detail page extraction: nine positional fields out of the info box
use crate::model::{Candidate, ParserError, Species};
use crate::parser::selector;
use crate::utils::{after_first_period, second_line};
use ::scraper::Html;

const NAME: &str = ".info-box .col-lg-4:nth-child(2)";
const ID: &str = ".info-box .col-lg-4:nth-child(3)";
const PHOTO: &str = ".img-fluid";
const BREED: &str = ".info-box .box-body .col-lg-4:nth-child(1)";
const GENDER: &str = ".info-box .box-body .col-lg-4:nth-child(2)";
const BIRTHDAY: &str = ".info-box .box-body .col-lg-4:nth-child(3)";
const MICROCHIP: &str = ".info-box .box-body .col-lg-4:nth-child(4)";
const LOCATION: &str = ".info-box .box-body .col-lg-4:nth-child(6)";

/// Builds a `Candidate` from a detail page. Any absent field fails the whole page.
pub fn parse_detail(html: &str, url: &str, species: Species) -> Result<Candidate, ParserError> {
    let document = Html::parse_document(html);
    let missing = |field: &'static str| ParserError::MissingField {
        field,
        url: url.to_string(),
    };

    let name = text_of(&document, NAME)?
        .map(|t| t.trim().to_string())
        .ok_or_else(|| missing("name"))?;
    let id = text_of(&document, ID)?
        .and_then(|t| after_first_period(&t))
        .ok_or_else(|| missing("id"))?;
    let photo_url = attr_of(&document, PHOTO, "src")?
        .map(|src| src.trim().to_string())
        .ok_or_else(|| missing("photo_url"))?;
    let breed = block_value(&document, BREED)?.ok_or_else(|| missing("breed"))?;
    let gender = block_value(&document, GENDER)?.ok_or_else(|| missing("gender"))?;
    let birthday = block_value(&document, BIRTHDAY)?.ok_or_else(|| missing("birthday"))?;
    let microchip_no = block_value(&document, MICROCHIP)?.ok_or_else(|| missing("microchip_no"))?;
    let location = block_value(&document, LOCATION)?.ok_or_else(|| missing("location"))?;

    Ok(Candidate {
        id,
        species,
        url: url.to_string(),
        photo_url,
        name,
        breed,
        gender,
        birthday,
        location,
        microchip_no,
        is_notified_all: false,
        is_notified_cat: false,
    })
}

fn text_of(document: &Html, css: &str) -> Result<Option<String>, ParserError> {
    let sel = selector(css)?;
    Ok(document
        .select(&sel)
        .next()
        .map(|el| el.text().collect::<String>()))
}

fn attr_of(document: &Html, css: &str, attr: &str) -> Result<Option<String>, ParserError> {
    let sel = selector(css)?;
    Ok(document
        .select(&sel)
        .next()
        .and_then(|el| el.value().attr(attr))
        .map(|v| v.to_string()))
}

fn block_value(document: &Html, css: &str) -> Result<Option<String>, ParserError> {
    Ok(text_of(document, css)?.and_then(|t| second_line(&t)))
}
