use crate::QueryError;
use lazy_static::lazy_static;
use regex::{Regex, RegexBuilder};

/// Somewhere the result list can be written.
pub trait Page {
    /// Replace the content of the element with id `element_id`.
    fn set_inner_html(&mut self, element_id: &str, html: &str) -> Result<(), QueryError>;
}

lazy_static! {
    // quoted attribute values may contain `>`
    static ref START_TAG: Regex =
        Regex::new(r#"<([A-Za-z][A-Za-z0-9-]*)((?:\s(?:[^>"']|"[^"]*"|'[^']*')*)?)>"#).expect("valid regex");
    // regions whose text is not markup
    static ref OPAQUE: Regex =
        Regex::new(r"(?is)<!--.*?-->|<script\b.*?</script\s*>|<style\b.*?</style\s*>").expect("valid regex");
    static ref ATTR: Regex =
        Regex::new(r#"([^\s=/>"']+)(?:\s*=\s*(?:"([^"]*)"|'([^']*)'|([^\s>"']+)))?"#).expect("valid regex");
}

/// An HTML document held as text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HtmlPage {
    source: String,
}

impl HtmlPage {
    pub fn new(source: impl Into<String>) -> Self {
        Self { source: source.into() }
    }

    pub fn as_str(&self) -> &str { &self.source }

    pub fn into_string(self) -> String { self.source }

    /// Byte range of the content of the element with id `element_id`.
    fn content_range(&self, element_id: &str) -> Option<(usize, usize)> {
        let markup = blank_opaque(&self.source);
        let (tag, content_start) = START_TAG.captures_iter(&markup).find_map(|caps| {
            let attrs = caps.get(2).map_or("", |m| m.as_str());
            if attrs.trim_end().ends_with('/') || !has_id(attrs, element_id) {
                return None;
            }
            let whole = caps.get(0)?;
            Some((caps[1].to_string(), whole.end()))
        })?;

        let same_tag = RegexBuilder::new(&format!(r#"<(/?){}\b(?:[^>"']|"[^"]*"|'[^']*')*>"#, regex::escape(&tag)))
            .case_insensitive(true)
            .build()
            .ok()?;
        let mut depth = 1usize;
        for caps in same_tag.captures_iter(&markup[content_start..]) {
            let whole = caps.get(0)?;
            if &caps[1] == "/" {
                depth -= 1;
                if depth == 0 {
                    return Some((content_start, content_start + whole.start()));
                }
            } else if !whole.as_str().ends_with("/>") {
                depth += 1;
            }
        }
        None
    }
}

/// Same text with comments, scripts and styles overwritten by spaces, so byte
/// offsets still line up with the original.
fn blank_opaque(source: &str) -> String {
    let mut out = String::with_capacity(source.len());
    let mut last = 0;
    for m in OPAQUE.find_iter(source) {
        out.push_str(&source[last..m.start()]);
        out.extend(std::iter::repeat(' ').take(m.len()));
        last = m.end();
    }
    out.push_str(&source[last..]);
    out
}

fn has_id(attrs: &str, element_id: &str) -> bool {
    ATTR.captures_iter(attrs).any(|caps| {
        caps[1].eq_ignore_ascii_case("id")
            && caps.get(2).or(caps.get(3)).or(caps.get(4)).map(|v| v.as_str()) == Some(element_id)
    })
}

impl Page for HtmlPage {
    fn set_inner_html(&mut self, element_id: &str, html: &str) -> Result<(), QueryError> {
        let (start, end) = self
            .content_range(element_id)
            .ok_or_else(|| QueryError::RenderTargetMissing(element_id.to_string()))?;
        self.source.replace_range(start..end, html);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn replaces_target_content() {
        let mut page = HtmlPage::new(r#"<body><ul id="search-result"><li>old</li></ul><p>after</p></body>"#);
        page.set_inner_html("search-result", "<li>new</li>").unwrap();
        assert_eq!(page.as_str(), r#"<body><ul id="search-result"><li>new</li></ul><p>after</p></body>"#);
    }

    #[test]
    fn accepts_unquoted_and_single_quoted_ids() {
        let mut page = HtmlPage::new("<div class=x id=search-result></div>");
        page.set_inner_html("search-result", "hit").unwrap();
        assert_eq!(page.as_str(), "<div class=x id=search-result>hit</div>");

        let mut page = HtmlPage::new("<div ID='search-result'>x</div>");
        page.set_inner_html("search-result", "y").unwrap();
        assert_eq!(page.as_str(), "<div ID='search-result'>y</div>");
    }

    #[test]
    fn respects_nested_elements_of_same_tag() {
        let mut page = HtmlPage::new(r#"<div id="search-result"><div>inner</div></div><div>keep</div>"#);
        page.set_inner_html("search-result", "").unwrap();
        assert_eq!(page.as_str(), r#"<div id="search-result"></div><div>keep</div>"#);
    }

    #[test]
    fn similar_ids_do_not_match() {
        let mut page = HtmlPage::new(r#"<ul id="search-results"></ul><ul data-id="search-result"></ul>"#);
        let err = page.set_inner_html("search-result", "x").unwrap_err();
        assert!(matches!(err, QueryError::RenderTargetMissing(ref id) if id == "search-result"));
    }

    #[test]
    fn quoted_angle_bracket_before_id() {
        let mut page = HtmlPage::new(r#"<ul data-x="a>b" id="search-result"><li>old</li></ul>"#);
        page.set_inner_html("search-result", "new").unwrap();
        assert_eq!(page.as_str(), r#"<ul data-x="a>b" id="search-result">new</ul>"#);
    }

    #[test]
    fn ignores_targets_in_comments_and_scripts() {
        let source = concat!(
            r#"<!-- <ul id="search-result"></ul> -->"#,
            r#"<script>var t = '<ul id="search-result">';</script>"#,
            r#"<ul id="search-result"></ul>"#,
        );
        let mut page = HtmlPage::new(source);
        page.set_inner_html("search-result", "<li>hit</li>").unwrap();
        assert!(page.as_str().starts_with(r#"<!-- <ul id="search-result"></ul> -->"#));
        assert!(page.as_str().ends_with(r#"<ul id="search-result"><li>hit</li></ul>"#));

        let mut only_commented = HtmlPage::new(r#"<!-- <ul id="search-result"></ul> -->"#);
        assert!(only_commented.set_inner_html("search-result", "x").is_err());
    }

    #[test]
    fn unclosed_target_is_missing() {
        let mut page = HtmlPage::new(r#"<ul id="search-result"><li>dangling"#);
        assert!(page.set_inner_html("search-result", "x").is_err());
    }
}
