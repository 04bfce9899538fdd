use std::fmt;

/// Marks the element a click or fill should land on
pub(crate) const TARGET_ATTRIBUTE: &str = "data-linkpost-target";

const IS_VISIBLE_JS: &str =
    "el => !!(el.offsetWidth || el.offsetHeight || el.getClientRects().length)";

/// How a UI element is found on the page
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Locator {
    /// First visible element matching a CSS selector
    Css(String),
    /// First visible element matching `scope` whose rendered text contains `text`
    Text { scope: String, text: String },
}

impl Locator {
    pub fn css(selector: impl Into<String>) -> Self {
        Locator::Css(selector.into())
    }

    pub fn text(scope: impl Into<String>, text: impl Into<String>) -> Self {
        Locator::Text {
            scope: scope.into(),
            text: text.into(),
        }
    }

    /// JS expression evaluating to the matched element, or `undefined`
    pub(crate) fn finder_js(&self) -> String {
        let (selector, predicate) = match self {
            Locator::Css(selector) => (selector.as_str(), "true".to_string()),
            Locator::Text { scope, text } => (
                scope.as_str(),
                format!(
                    "(el.innerText || el.textContent || '').includes({})",
                    js_string(text)
                ),
            ),
        };

        format!(
            "(() => {{ const visible = {}; return Array.from(document.querySelectorAll({})).find(el => visible(el) && {}); }})()",
            IS_VISIBLE_JS,
            js_string(selector),
            predicate
        )
    }

    /// JS expression evaluating to `true` when the element is on screen
    pub(crate) fn visible_js(&self) -> String {
        format!("!!{}", self.finder_js())
    }

    /// JS expression tagging the matched element with `token`; evaluates to `false` if absent
    pub(crate) fn mark_js(&self, token: &str) -> String {
        format!(
            "(() => {{ const el = {}; if (!el) return false; el.setAttribute({}, {}); return true; }})()",
            self.finder_js(),
            js_string(TARGET_ATTRIBUTE),
            js_string(token)
        )
    }
}

/// CSS selector for an element tagged by [`Locator::mark_js`]
pub(crate) fn marked_selector(token: &str) -> String {
    format!("[{}=\"{}\"]", TARGET_ATTRIBUTE, token)
}

fn js_string(value: &str) -> String {
    serde_json::Value::String(value.to_string()).to_string()
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Locator::Css(selector) => write!(f, "{}", selector),
            Locator::Text { scope, text } => write!(f, "{}:has-text({:?})", scope, text),
        }
    }
}
