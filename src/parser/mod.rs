// HTML parsing for the shelter site: listing pages and detail pages
pub mod detail;
pub mod listing;

pub use detail::parse_detail;
pub use listing::parse_listing;

use crate::model::ParserError;
use ::scraper::Selector;
use encoding_rs::{Encoding, UTF_8};

/// How far into the document a `<meta>` charset declaration is looked for.
const SNIFF_LIMIT: usize = 1024;

pub(crate) fn selector(css: &str) -> Result<Selector, ParserError> {
    Selector::parse(css).map_err(|e| ParserError::Selector(format!("{}: {}", css, e)))
}

/// Decodes a raw page body. A byte order mark wins, then a `<meta>` charset
/// in the document head; otherwise UTF-8. Undecodable bytes become U+FFFD.
pub fn decode_html(bytes: &[u8]) -> String {
    let encoding = Encoding::for_bom(bytes)
        .map(|(encoding, _)| encoding)
        .or_else(|| meta_charset(bytes))
        .unwrap_or(UTF_8);
    let (text, _, _) = encoding.decode(bytes);
    text.into_owned()
}

/// Finds `<meta charset="..">` or `<meta http-equiv=.. content="..; charset=..">`.
fn meta_charset(bytes: &[u8]) -> Option<&'static Encoding> {
    let head = &bytes[..bytes.len().min(SNIFF_LIMIT)];
    let head = String::from_utf8_lossy(head).to_ascii_lowercase();

    head.split("<meta").skip(1).find_map(|tag| {
        let tag = tag.split('>').next().unwrap_or(tag);
        let value = &tag[tag.find("charset=")? + "charset=".len()..];
        let label: String = value
            .trim_start_matches(['"', '\'', ' '])
            .chars()
            .take_while(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | ':' | '.'))
            .collect();
        Encoding::for_label(label.as_bytes())
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn with_body(head: &str, body: &[u8]) -> Vec<u8> {
        let mut page = format!("<html><head>{}</head><body>", head).into_bytes();
        page.extend_from_slice(body);
        page.extend_from_slice(b"</body></html>");
        page
    }

    #[test]
    fn defaults_to_utf8() {
        let page = with_body("", "觀塘".as_bytes());
        assert!(decode_html(&page).contains("觀塘"));
    }

    #[test]
    fn honours_meta_charset() {
        let page = with_body(r#"<meta charset="big5">"#, &[0xBF, 0xDF]);
        assert!(decode_html(&page).contains('貓'));
    }

    #[test]
    fn honours_http_equiv_content_type() {
        let page = with_body(
            r#"<META HTTP-EQUIV="Content-Type" CONTENT="text/html; charset=Big5">"#,
            &[0xBF, 0xDF],
        );
        assert!(decode_html(&page).contains('貓'));
    }

    #[test]
    fn bom_overrides_meta() {
        let mut page = vec![0xEF, 0xBB, 0xBF];
        page.extend(with_body(r#"<meta charset="big5">"#, "貓".as_bytes()));
        assert!(decode_html(&page).contains('貓'));
    }

    #[test]
    fn unknown_label_falls_back_to_utf8() {
        let page = with_body(r#"<meta charset="klingon">"#, "貓".as_bytes());
        assert!(decode_html(&page).contains('貓'));
    }
}
