//! URL helper functions

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};

/// Everything but RFC 3986 unreserved characters
const COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// Generate a URL with the root path
///
/// # Examples
/// ```ignore
/// url_for("/blog/", "/post/hello") // -> "/blog/post/hello"
/// ```
pub fn url_for(root: &str, path: &str) -> String {
    let root = root.trim_end_matches('/');
    let path = path.trim_start_matches('/');

    if path.is_empty() {
        format!("{}/", root)
    } else {
        format!("{}/{}", root, path)
    }
}

/// Path of a post page
pub fn post_path(uid: &str) -> String {
    format!("/post/{}", encode_component(uid))
}

/// Percent-encode a value for use in a path segment or query string
pub fn encode_component(value: &str) -> String {
    utf8_percent_encode(value, COMPONENT).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_for() {
        assert_eq!(url_for("/", "/"), "/");
        assert_eq!(url_for("/", "post/a"), "/post/a");
        assert_eq!(url_for("/blog/", "/post/a"), "/blog/post/a");
        assert_eq!(url_for("/blog", ""), "/blog/");
    }

    #[test]
    fn test_post_path() {
        assert_eq!(post_path("como-utilizar-hooks"), "/post/como-utilizar-hooks");
        assert_eq!(post_path("a/b"), "/post/a%2Fb");
    }

    #[test]
    fn test_encode_component() {
        assert_eq!(
            encode_component("https://x.io/a?b=1"),
            "https%3A%2F%2Fx.io%2Fa%3Fb%3D1"
        );
    }
}
