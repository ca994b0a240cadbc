//! Paths of the site's pages, used for redirects.

/// An author's profile.
#[must_use]
pub fn profile(username: &str) -> String {
    format!("/profile/{}/", urlencoding::encode(username))
}

/// A single post.
#[must_use]
pub fn post_detail(post_id: &str) -> String {
    format!("/posts/{}/", urlencoding::encode(post_id))
}

/// The login page, returning to `next` afterwards.
#[must_use]
pub fn login(login_url: &str, next: &str) -> String {
    // Slashes stay readable in the query string.
    let next = urlencoding::encode(next).replace("%2F", "/");
    format!("{login_url}?next={next}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_paths() {
        assert_eq!(profile("leo"), "/profile/leo/");
        assert_eq!(post_detail("01abc"), "/posts/01abc/");
    }

    #[test]
    fn test_path_segments_are_encoded() {
        assert_eq!(profile("лев"), "/profile/%D0%BB%D0%B5%D0%B2/");
        assert_eq!(profile("leo.b@x+y"), "/profile/leo.b%40x%2By/");
        assert!(profile("лев").is_ascii());
    }

    #[test]
    fn test_login_keeps_next_path() {
        assert_eq!(
            login("/auth/login/", "/create/"),
            "/auth/login/?next=/create/"
        );
        assert_eq!(
            login("/auth/login/", "/follow/?page=2"),
            "/auth/login/?next=/follow/%3Fpage%3D2"
        );
    }
}
