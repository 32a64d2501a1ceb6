use scraper::{Html, Selector};

use crate::api::CSRF_FIELD_NAME;

/// Read the CSRF token from the hidden form field of a server-rendered page.
pub fn extract_csrf_token(html: &str) -> Option<String> {
    let selector = Selector::parse(&format!("input[name=\"{}\"]", CSRF_FIELD_NAME)).ok()?;
    let document = Html::parse_document(html);

    document
        .select(&selector)
        .find_map(|input| input.value().attr("value"))
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(str::to_owned)
}
