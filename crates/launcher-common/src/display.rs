//! Card display helpers derived from an entry's URL and name.

use url::Url;

const FAVICON_SERVICE: &str = "https://icons.duckduckgo.com/ip3";

/// Third-party favicon URL keyed by the entry's hostname.
pub fn favicon_url(raw: &str) -> Option<String> {
    let host = Url::parse(raw).ok()?.host_str()?.to_string();
    Some(format!("{}/{}.ico", FAVICON_SERVICE, host))
}

/// Hostname without a leading `www.`; the raw string if it does not parse.
pub fn display_domain(raw: &str) -> String {
    match Url::parse(raw).ok().and_then(|u| u.host_str().map(str::to_string)) {
        Some(host) => host.strip_prefix("www.").map(str::to_string).unwrap_or(host),
        None => raw.to_string(),
    }
}

/// Avatar fallback: first letters of up to two space-separated words.
pub fn initials(name: &str) -> String {
    name.split(' ')
        .filter_map(|word| word.chars().next())
        .flat_map(char::to_uppercase)
        .take(2)
        .collect()
}
