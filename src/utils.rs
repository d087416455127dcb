/// Keeps scheme and host, hides path and query (webhook tokens live there).
pub fn mask_url(url: &str) -> String {
    let Some(scheme_end) = url.find("://") else {
        return "***".to_string();
    };
    let rest = &url[scheme_end + 3..];
    let host_end = rest.find(['/', '?']).unwrap_or(rest.len());
    if host_end == 0 {
        return "***".to_string();
    }

    let base = &url[..scheme_end + 3 + host_end];
    if host_end == rest.len() {
        base.to_string()
    } else {
        format!("{base}/***/")
    }
}
