//! Strips the decorative markup the record pages nest inside data cells.
//!
//! Order matters: list items (repeated), then one list wrapper, then click
//! handlers (repeated), then trim. Each step can shift or merge the text the
//! next one scans, so the steps are never reordered.

const TAG_END: &str = "\">";
const ONCLICK: &str = " onclick=\"";

struct Element {
    open: &'static str,
    close: &'static str,
}

const LIST_ITEM: Element = Element {
    open: "<li style=\"",
    close: "</li>",
};

const LIST_WRAPPER: Element = Element {
    open: "<ul style=\"",
    close: "</ul>",
};

/// Run the full cleanup pipeline over raw cell content.
pub fn clean_cell(raw: &str) -> String {
    let text = until_stable(raw.to_string(), |s| remove_element(s, &LIST_ITEM));
    // Only one wrapper per cell is expected; a second one is left in place.
    let text = remove_element(&text, &LIST_WRAPPER);
    let text = until_stable(text, remove_onclick);
    text.trim().to_string()
}

/// Apply `step` until it stops shrinking the text.
fn until_stable(mut text: String, mut step: impl FnMut(&str) -> String) -> String {
    loop {
        let next = step(&text);
        if next.len() >= text.len() {
            return text;
        }
        text = next;
    }
}

/// Remove the first `el` element, content and closing tag included.
/// Unclosed elements lose only their opening tag. No match: unchanged.
fn remove_element(text: &str, el: &Element) -> String {
    let Some(start) = text.find(el.open) else {
        return text.to_string();
    };
    let attrs = start + el.open.len();
    let Some(tag_len) = text[attrs..].find(TAG_END) else {
        return text.to_string();
    };
    let body = attrs + tag_len + TAG_END.len();
    let end = match text[body..].find(el.close) {
        Some(i) => body + i + el.close.len(),
        None => body,
    };
    format!("{}{}", &text[..start], &text[end..])
}

/// Remove the first ` onclick="..."` attribute, keeping the tag's `>`.
fn remove_onclick(text: &str) -> String {
    let Some(start) = text.find(ONCLICK) else {
        return text.to_string();
    };
    let value = start + ONCLICK.len();
    let Some(quote) = text[value..].find(TAG_END) else {
        return text.to_string();
    };
    let bracket = value + quote + 1;
    format!("{}{}", &text[..start], &text[bracket..])
}
