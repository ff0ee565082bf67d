use url::Url;

/// Last `n` characters of a URL's path, for compact display in report rows.
/// Falls back to the raw string when it does not parse as a URL.
pub fn url_path_tail(raw: &str, n: usize) -> String {
    match Url::parse(raw) {
        Ok(url) => string_tail(url.path(), n),
        Err(_) => string_tail(raw, n),
    }
}

pub fn string_tail(s: &str, n: usize) -> String {
    let chars: Vec<char> = s.chars().collect();
    if chars.len() <= n {
        return s.to_string();
    }
    let tail: String = chars[chars.len() - n..].iter().collect();
    format!("...{tail}")
}
