use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

fn char_width(ch: char) -> usize {
    UnicodeWidthChar::width(ch).unwrap_or(0).max(1)
}

/// 按显示宽度折行（CJK 计 2），优先在空白处断行；超长单词按字符硬切。
///
/// 行数超过 `max_lines` 时，最后一行截断并追加省略号。
pub(crate) fn wrap_by_display_width(text: &str, max_width: usize, max_lines: usize) -> Vec<String> {
    if max_width == 0 || max_lines == 0 {
        return vec![text.to_string()];
    }

    let mut lines = Vec::<String>::new();
    let mut current = String::new();
    let mut current_w = 0usize;

    for paragraph in text.split('\n') {
        for word in paragraph.split_whitespace() {
            let word_w = word.width();
            let sep_w = usize::from(!current.is_empty());

            if current_w + sep_w + word_w <= max_width {
                if sep_w == 1 {
                    current.push(' ');
                }
                current.push_str(word);
                current_w += sep_w + word_w;
                continue;
            }

            if !current.is_empty() {
                lines.push(std::mem::take(&mut current));
                current_w = 0;
            }

            if word_w <= max_width {
                current.push_str(word);
                current_w = word_w;
                continue;
            }

            // 单词本身超宽：硬切
            for ch in word.chars() {
                let ch_w = char_width(ch);
                if current_w + ch_w > max_width && !current.is_empty() {
                    lines.push(std::mem::take(&mut current));
                    current_w = 0;
                }
                current.push(ch);
                current_w += ch_w;
            }
        }
        lines.push(std::mem::take(&mut current));
        current_w = 0;
    }

    while lines.len() > 1 && lines.last().is_some_and(String::is_empty) {
        lines.pop();
    }

    if lines.len() > max_lines {
        lines.truncate(max_lines);
        if let Some(last) = lines.last_mut() {
            let with_marker = format!("{last}…");
            *last = truncate_with_ellipsis(&with_marker, max_width);
        }
    }
    lines
}

/// 按显示宽度截断，超出时以省略号结尾（省略号宽度按 1 计）。
pub(crate) fn truncate_with_ellipsis(text: &str, max_width: usize) -> String {
    if max_width == 0 {
        return String::new();
    }
    if text.width() <= max_width {
        return text.to_string();
    }
    let target = max_width.saturating_sub(1);
    let mut acc = String::new();
    let mut w = 0usize;
    for ch in text.chars() {
        let ch_w = char_width(ch);
        if w + ch_w > target {
            break;
        }
        acc.push(ch);
        w += ch_w;
    }
    acc.push('…');
    acc
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wraps_on_word_boundaries() {
        let lines = wrap_by_display_width("the quick brown fox jumps", 10, 5);
        assert_eq!(lines, vec!["the quick", "brown fox", "jumps"]);
    }

    #[test]
    fn cjk_counts_double_width() {
        let lines = wrap_by_display_width("你好世界你好", 8, 5);
        assert_eq!(lines, vec!["你好世界", "你好"]);
    }

    #[test]
    fn overflowing_lines_end_with_ellipsis() {
        let lines = wrap_by_display_width("one two three four five six", 9, 2);
        assert_eq!(lines.len(), 2);
        assert!(lines[1].ends_with('…'), "{lines:?}");
    }

    #[test]
    fn explicit_newlines_are_kept() {
        let lines = wrap_by_display_width("a\nb", 10, 5);
        assert_eq!(lines, vec!["a", "b"]);
    }

    #[test]
    fn truncate_keeps_short_text() {
        assert_eq!(truncate_with_ellipsis("abc", 5), "abc");
        assert_eq!(truncate_with_ellipsis("abcdef", 4), "abc…");
    }
}
