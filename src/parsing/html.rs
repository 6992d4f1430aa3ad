//! Small helpers over `scraper` for export documents.

use scraper::{ElementRef, Node, Selector};

/// Compiles a CSS selector that is known to be valid.
///
/// Only used for the fixed selectors of the export parsers.
pub fn selector(css: &str) -> Selector {
    Selector::parse(css).unwrap_or_else(|e| panic!("invalid selector {css:?}: {e}"))
}

/// Visible text of an element.
///
/// Source-level whitespace collapses to single spaces, `<br>` becomes a line
/// break, and blank lines are dropped.
pub fn element_text(el: ElementRef<'_>) -> String {
    let mut raw = String::new();
    for node in el.descendants() {
        match node.value() {
            Node::Text(text) => {
                for ch in text.chars() {
                    raw.push(if ch == '\n' || ch == '\r' { ' ' } else { ch });
                }
            }
            Node::Element(e) if e.name() == "br" => raw.push('\n'),
            _ => {}
        }
    }

    raw.lines()
        .map(|line| line.split_whitespace().collect::<Vec<_>>().join(" "))
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Text of the first descendant matching `sel`, if it is non-empty.
pub fn first_text(scope: ElementRef<'_>, sel: &Selector) -> Option<String> {
    scope
        .select(sel)
        .next()
        .map(element_text)
        .filter(|t| !t.is_empty())
}

/// First direct child element of `scope` carrying `class`.
pub fn child_with_class<'a>(scope: ElementRef<'a>, class: &str) -> Option<ElementRef<'a>> {
    scope
        .children()
        .filter_map(ElementRef::wrap)
        .find(|child| has_class(*child, class))
}

/// Returns `true` if the element carries `class`.
pub fn has_class(el: ElementRef<'_>, class: &str) -> bool {
    el.value().classes().any(|c| c == class)
}

#[cfg(test)]
mod tests {
    use super::*;
    use scraper::Html;

    fn first(doc: &Html, css: &str) -> String {
        element_text(doc.select(&selector(css)).next().unwrap())
    }

    #[test]
    fn test_element_text_collapses_whitespace() {
        let doc = Html::parse_fragment("<div class=\"t\">\n   Hello\n      <b>big</b>   world  \n</div>");
        assert_eq!(first(&doc, ".t"), "Hello big world");
    }

    #[test]
    fn test_element_text_keeps_line_breaks() {
        let doc = Html::parse_fragment("<div class=\"t\">line one<br>line two<br><br></div>");
        assert_eq!(first(&doc, ".t"), "line one\nline two");
    }

    #[test]
    fn test_first_text_skips_empty() {
        let doc = Html::parse_fragment("<div class=\"m\"><span class=\"x\">  </span></div>");
        let m = doc.select(&selector(".m")).next().unwrap();
        assert!(first_text(m, &selector(".x")).is_none());
        assert!(first_text(m, &selector(".missing")).is_none());
    }

    #[test]
    fn test_child_with_class_ignores_nested() {
        let doc = Html::parse_fragment(
            "<div class=\"m\"><div class=\"inner\"><b class=\"x\">deep</b></div><i class=\"x\">top</i></div>",
        );
        let m = doc.select(&selector(".m")).next().unwrap();
        assert_eq!(element_text(child_with_class(m, "x").unwrap()), "top");
        assert!(child_with_class(m, "missing").is_none());
    }

    #[test]
    fn test_has_class() {
        let doc = Html::parse_fragment("<div class=\"message service\"></div>");
        let el = doc.select(&selector(".message")).next().unwrap();
        assert!(has_class(el, "service"));
        assert!(!has_class(el, "default"));
    }
}
