/// 文本转义：把不可信文本嵌入 HTML 之前调用。
pub trait Sanitizer: Send + Sync {
    fn escape(&self, text: &str) -> String;
}

/// 基于 ammonia 的 HTML 转义。
///
/// `clean_text` 会转义所有可能改变 HTML 结构的字符（包括空白），
/// 结果只能作为文本节点内容使用。
#[derive(Debug, Clone, Copy, Default)]
pub struct HtmlSanitizer;

impl Sanitizer for HtmlSanitizer {
    fn escape(&self, text: &str) -> String {
        ammonia::clean_text(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escapes_markup() {
        let out = HtmlSanitizer.escape("<script>alert(\"x\")</script>");
        assert!(!out.contains('<'));
        assert!(!out.contains('>'));
        assert!(out.contains("&lt;script&gt;"));
        assert!(!out.contains('"'));
    }

    #[test]
    fn ampersand_is_escaped_once() {
        assert_eq!(HtmlSanitizer.escape("a&b"), "a&amp;b");
    }

    #[test]
    fn plain_text_survives() {
        assert_eq!(HtmlSanitizer.escape("layout"), "layout");
    }
}
