/// Greedy word wrap at separator characters.
///
/// Each line holds at most `width` characters. When a line fills up, it is cut
/// after the last separator inside it; without one, it is cut hard at the width.
/// With `keep_separators == false` the separator at a cut is dropped.
pub fn wrap_custom(source: &str, separators: &[char], width: usize, keep_separators: bool) -> String {
    let chars: Vec<char> = source.chars().collect();
    let mut output: Vec<char> = Vec::with_capacity(chars.len() + chars.len() / width.max(1));

    let mut current_length = 0;
    let mut latest_separator: Option<usize> = None;
    let mut chunk_start = 0;
    let mut i = 0;

    while i < chars.len() {
        if separators.contains(&chars[i]) {
            latest_separator = Some(i);
        }
        output.push(chars[i]);
        current_length += 1;

        if current_length != width {
            i += 1;
            continue;
        }

        match latest_separator.filter(|&s| s >= chunk_start) {
            Some(sep) => {
                let mut cut = i - sep;
                if !keep_separators {
                    cut += 1;
                }
                output.truncate(output.len() - cut);
                output.push('\n');
                chunk_start = sep + 1;
                i = chunk_start;
            }
            None => {
                output.push('\n');
                chunk_start = i + 1;
                i += 1;
            }
        }
        current_length = 0;
    }

    if output.last() == Some(&'\n') {
        output.pop();
    }
    output.into_iter().collect()
}

/// Wraps an axis label at underscores and hyphens.
pub fn wrap_label(label: &str, width: usize) -> String {
    wrap_custom(label, &['_', '-'], width, true)
}
