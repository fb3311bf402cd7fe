// src/utils/html.rs

/// Sanitizes instructor-authored rich text (course descriptions, lesson bodies).
///
/// Whitelist based: formatting tags such as `<b>` and `<p>` survive, `<script>`
/// and `<iframe>` are dropped together with their content, event handler
/// attributes are stripped.
pub fn clean_html(input: &str) -> String {
    ammonia::clean(input)
}
