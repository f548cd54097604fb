use std::collections::HashSet;
use tracing::info;

/// URLs from `candidate_urls` that no known record carries, in input order.
/// Comparison is exact string equality.
pub fn filter_new_urls<'a, I>(known_urls: I, candidate_urls: &[String]) -> Vec<String>
where
    I: IntoIterator<Item = &'a str>,
{
    let known: HashSet<&str> = known_urls.into_iter().collect();
    let filtered: Vec<String> = candidate_urls
        .iter()
        .filter(|url| !known.contains(url.as_str()))
        .cloned()
        .collect();

    info!("{} NEW candidate(s) found.", filtered.len());
    filtered
}
