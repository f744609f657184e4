// src/utils/html.rs

/// Strips markup from admin-entered text (question prompts, options, subject names).
///
/// Whitelist-based: harmless inline tags survive, `<script>` and event
/// handler attributes are removed along with their content.
pub fn clean_html(input: &str) -> String {
    ammonia::clean(input)
}
