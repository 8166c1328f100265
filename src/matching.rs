//! Tag matching
//!
//! Plain linear scans over user tag sets. Nothing here touches the
//! database; `services::user` feeds it candidate rows.

use std::collections::HashSet;

use crate::entity::user::{self, Gender};

/// Search token that filters on gender instead of tags
pub const TOKEN_MALE: &str = "男";
pub const TOKEN_FEMALE: &str = "女";

/// Trim, drop empties and de-duplicate while keeping first-seen order
pub fn normalize_tags<I, S>(tags: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut seen = HashSet::new();
    tags.into_iter()
        .map(|t| t.as_ref().trim().to_string())
        .filter(|t| !t.is_empty())
        .filter(|t| seen.insert(t.clone()))
        .collect()
}

/// True when the two tag sets share at least one tag
pub fn tags_overlap(a: &[String], b: &[String]) -> bool {
    let a: HashSet<&str> = a.iter().map(String::as_str).collect();
    b.iter().any(|t| a.contains(t.as_str()))
}

/// First `limit` candidates whose tags intersect `caller_tags`, in input order
pub fn select_matches(
    caller_tags: &[String],
    candidates: Vec<user::Model>,
    limit: usize,
) -> Vec<user::Model> {
    candidates
        .into_iter()
        .filter(|u| tags_overlap(caller_tags, &u.tag_list()))
        .take(limit)
        .collect()
}

/// Whether a single search token accepts this user
fn token_matches(token: &str, gender: Gender, tags: &[String]) -> bool {
    match token {
        TOKEN_MALE => gender == Gender::Male,
        TOKEN_FEMALE => gender == Gender::Female,
        tag => tags.iter().any(|t| t == tag),
    }
}

/// Every token must accept the user
pub fn matches_all_tokens(tokens: &[String], user: &user::Model) -> bool {
    let tags = user.tag_list();
    let gender = user.gender();
    tokens.iter().all(|t| token_matches(t, gender, &tags))
}
