//! Cache key definitions.
//!
//! Three key families cover every cached projection: the global post list,
//! one detail entry per post, and one comment list per post. Keys render to
//! stable strings so any string-keyed backend can hold them.

use std::fmt;

use uuid::Uuid;

/// A cache entry identity.
///
/// Variants map one-to-one onto the key families `posts_list`,
/// `post_detail_{id}` and `post_comments_{id}`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CacheKey {
    /// The public list envelope with comment counts.
    PostsList,
    /// One post's detail projection, nested comments included.
    PostDetail(Uuid),
    /// One post's comment list.
    PostComments(Uuid),
}

impl CacheKey {
    /// Family label without the identifying suffix; used for metrics and logs.
    pub fn family(&self) -> &'static str {
        match self {
            CacheKey::PostsList => "posts_list",
            CacheKey::PostDetail(_) => "post_detail",
            CacheKey::PostComments(_) => "post_comments",
        }
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CacheKey::PostsList => f.write_str("posts_list"),
            CacheKey::PostDetail(id) => write!(f, "post_detail_{id}"),
            CacheKey::PostComments(id) => write!(f, "post_comments_{id}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_render_their_family_strings() {
        let id = Uuid::nil();
        assert_eq!(CacheKey::PostsList.to_string(), "posts_list");
        assert_eq!(
            CacheKey::PostDetail(id).to_string(),
            format!("post_detail_{id}")
        );
        assert_eq!(
            CacheKey::PostComments(id).to_string(),
            format!("post_comments_{id}")
        );
    }

    #[test]
    fn keys_for_distinct_posts_do_not_collide() {
        let a = CacheKey::PostDetail(Uuid::new_v4());
        let b = CacheKey::PostDetail(Uuid::new_v4());
        assert_ne!(a, b);
        assert_ne!(a.to_string(), b.to_string());
    }

    #[test]
    fn detail_and_comments_families_are_disjoint() {
        let id = Uuid::new_v4();
        assert_ne!(
            CacheKey::PostDetail(id).to_string(),
            CacheKey::PostComments(id).to_string()
        );
    }
}
