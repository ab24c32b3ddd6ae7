use std::ops::Range;

const CELL_OPEN: &str = "<td ";
const CELL_CLOSE: &str = "</td>";

/// Byte range of the cell content that follows `label`.
///
/// The range starts right after the `>` closing the first `<td ...` tag found
/// at or after the label and ends at the first `</td>`. `None` when the label
/// is missing or the cell markers are absent or out of order.
pub fn locate_cell(markup: &str, label: &str) -> Option<Range<usize>> {
    let row = markup.find(label)?;
    let rest = &markup[row..];

    let open = rest.find(CELL_OPEN)?;
    let close = rest.find(CELL_CLOSE)?;
    if close <= open {
        return None;
    }

    let bracket = rest[open..close].find('>')?;
    let start = row + open + bracket + 1;
    let end = row + close;
    Some(start..end)
}

/// Raw (uncleaned) cell text for `label`, or empty when it cannot be found.
pub fn raw_cell<'a>(markup: &'a str, label: &str) -> &'a str {
    locate_cell(markup, label).map_or("", |r| &markup[r])
}
