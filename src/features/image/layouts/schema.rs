use serde_json::{Map, Value};

use super::LayoutConfig;
use super::text::wrap_by_display_width;
use crate::error::AppError;
use crate::features::image::types::{QueryParams, QueryValue};

/// 文本折行参数：按显示宽度折行，额外生成 `<字段名>_lines` 供模板逐行输出。
#[derive(Debug, Clone, Copy)]
pub struct TextWrap {
    pub max_width: usize,
    pub max_lines: usize,
}

/// 字段类型
#[derive(Debug, Clone, Copy)]
pub enum FieldKind {
    Text {
        max_chars: usize,
        wrap: Option<TextWrap>,
    },
    /// 候选值（大小写不敏感，规范化为声明中的写法）
    Choice { options: &'static [&'static str] },
    Number { min: f64, max: f64 },
    /// `#rgb` / `#rrggbb`（`#` 可省略）
    Color,
}

/// 布局配置中的单个字段声明
#[derive(Debug, Clone, Copy)]
pub struct FieldSpec {
    pub name: &'static str,
    pub kind: FieldKind,
    pub required: bool,
    /// 缺省值（原始字符串形式，与请求值走同一套校验）
    pub default: Option<&'static str>,
}

impl FieldSpec {
    pub const fn required(name: &'static str, kind: FieldKind) -> Self {
        Self {
            name,
            kind,
            required: true,
            default: None,
        }
    }

    pub const fn optional(name: &'static str, kind: FieldKind) -> Self {
        Self {
            name,
            kind,
            required: false,
            default: None,
        }
    }

    pub const fn with_default(name: &'static str, kind: FieldKind, default: &'static str) -> Self {
        Self {
            name,
            kind,
            required: false,
            default: Some(default),
        }
    }
}

/// 按字段声明校验并规范化参数。未声明的参数忽略。
pub fn validate_config(
    layout: &str,
    fields: &[FieldSpec],
    params: &QueryParams,
) -> Result<LayoutConfig, AppError> {
    let invalid = |message: String| AppError::ConfigValidation {
        layout: layout.to_string(),
        message,
    };

    let mut out = Map::new();
    for field in fields {
        let raw = match params.get(field.name) {
            Some(QueryValue::One(v)) => Some(v.trim()),
            Some(QueryValue::Many(_)) => {
                return Err(invalid(format!(
                    "\"{}\" must be a single value, received an array",
                    field.name
                )));
            }
            None => None,
        };
        let raw = raw.or(field.default);

        let value = match raw {
            Some(raw) => normalize_value(field, raw).map_err(&invalid)?,
            None if field.required => {
                return Err(invalid(format!("\"{}\" is required", field.name)));
            }
            None => Value::Null,
        };

        if let FieldKind::Text {
            wrap: Some(wrap), ..
        } = field.kind
        {
            let lines = match value.as_str() {
                Some(s) => wrap_by_display_width(s, wrap.max_width, wrap.max_lines),
                None => Vec::new(),
            };
            out.insert(format!("{}_lines", field.name), Value::from(lines));
        }
        out.insert(field.name.to_string(), value);
    }
    Ok(LayoutConfig::from_map(out))
}

fn normalize_value(field: &FieldSpec, raw: &str) -> Result<Value, String> {
    let name = field.name;
    // 值最终写入 SVG 文本节点或属性，XML 1.0 不允许的字符会让整份 SVG 无法解析
    if let Some(c) = raw.chars().find(|c| !is_xml_char(*c)) {
        return Err(format!(
            "\"{name}\" contains a character not allowed in SVG: U+{:04X}",
            c as u32
        ));
    }
    match field.kind {
        FieldKind::Text { max_chars, .. } => {
            if raw.is_empty() && field.required {
                return Err(format!("\"{name}\" must not be empty"));
            }
            let len = raw.chars().count();
            if len > max_chars {
                return Err(format!(
                    "\"{name}\" must be at most {max_chars} characters, received {len}"
                ));
            }
            Ok(Value::from(raw))
        }
        FieldKind::Choice { options } => options
            .iter()
            .find(|opt| opt.eq_ignore_ascii_case(raw))
            .map(|opt| Value::from(*opt))
            .ok_or_else(|| {
                format!(
                    "\"{name}\" must be one of {}, received '{raw}'",
                    options
                        .iter()
                        .map(|o| format!("'{o}'"))
                        .collect::<Vec<_>>()
                        .join(" | ")
                )
            }),
        FieldKind::Number { min, max } => {
            let n: f64 = raw
                .parse()
                .ok()
                .filter(|n: &f64| n.is_finite())
                .ok_or_else(|| format!("\"{name}\" must be a number, received '{raw}'"))?;
            if n < min || n > max {
                return Err(format!(
                    "\"{name}\" must be between {min} and {max}, received {n}"
                ));
            }
            // 整数按整数输出，避免模板中出现 `96.0`
            if n.fract() == 0.0 {
                Ok(Value::from(n as i64))
            } else {
                Ok(Value::from(n))
            }
        }
        FieldKind::Color => normalize_color(raw)
            .map(Value::from)
            .ok_or_else(|| format!("\"{name}\" must be a hex color like #1a2b3c, received '{raw}'")),
    }
}

/// XML 1.0 `Char` 产生式（`char` 本身已排除代理区）
fn is_xml_char(c: char) -> bool {
    matches!(c, '\t' | '\n' | '\r' | '\u{20}'..='\u{FFFD}' | '\u{10000}'..='\u{10FFFF}')
}

fn normalize_color(raw: &str) -> Option<String> {
    let hex = raw.strip_prefix('#').unwrap_or(raw);
    if !matches!(hex.len(), 3 | 6) || !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }
    Some(format!("#{}", hex.to_ascii_lowercase()))
}

#[cfg(test)]
mod tests {
    use super::*;

    const FIELDS: &[FieldSpec] = &[
        FieldSpec::required(
            "title",
            FieldKind::Text {
                max_chars: 20,
                wrap: Some(TextWrap {
                    max_width: 10,
                    max_lines: 2,
                }),
            },
        ),
        FieldSpec::optional(
            "note",
            FieldKind::Text {
                max_chars: 20,
                wrap: None,
            },
        ),
        FieldSpec::with_default(
            "theme",
            FieldKind::Choice {
                options: &["light", "dark"],
            },
            "dark",
        ),
        FieldSpec::with_default("size", FieldKind::Number { min: 1.0, max: 10.0 }, "5"),
        FieldSpec::with_default("color", FieldKind::Color, "#ABC"),
    ];

    fn params(pairs: &[(&str, &str)]) -> QueryParams {
        QueryParams::from_pairs(pairs.iter().copied())
    }

    #[test]
    fn applies_defaults_and_normalizes() {
        let cfg = validate_config("t", FIELDS, &params(&[("title", " Hello world "), ("theme", "LIGHT")]))
            .expect("valid");
        assert_eq!(cfg.get("title"), Some(&Value::from("Hello world")));
        assert_eq!(cfg.get("theme"), Some(&Value::from("light")));
        assert_eq!(cfg.get("size"), Some(&Value::from(5)));
        assert_eq!(cfg.get("color"), Some(&Value::from("#abc")));
        assert_eq!(cfg.get("note"), Some(&Value::Null));
        assert_eq!(
            cfg.get("title_lines"),
            Some(&Value::from(vec!["Hello", "world"]))
        );
    }

    #[test]
    fn unknown_params_are_ignored() {
        let cfg = validate_config("t", FIELDS, &params(&[("title", "x"), ("other", "y")]))
            .expect("valid");
        assert!(cfg.get("other").is_none());
    }

    #[test]
    fn missing_required_field_is_reported() {
        let err = validate_config("t", FIELDS, &QueryParams::new()).unwrap_err();
        assert!(matches!(err, AppError::ConfigValidation { .. }));
        assert!(err.to_string().contains("\"title\" is required"));
    }

    #[test]
    fn out_of_range_and_malformed_values_fail() {
        for pairs in [
            &[("title", "x"), ("size", "11")][..],
            &[("title", "x"), ("size", "NaN")][..],
            &[("title", "x"), ("color", "#12345")][..],
            &[("title", "x"), ("theme", "blue")][..],
            &[("title", "this title is far too long to fit")][..],
            &[("title", "a"), ("title", "b")][..],
        ] {
            let err = validate_config("t", FIELDS, &params(pairs)).unwrap_err();
            assert!(
                matches!(err, AppError::ConfigValidation { .. }),
                "{pairs:?} -> {err}"
            );
        }
    }

    #[test]
    fn non_xml_characters_are_rejected() {
        for pairs in [
            &[("title", "a\u{1}b")][..],
            &[("title", "x"), ("note", "ta\u{b}b")][..],
            &[("title", "x"), ("note", "\u{FFFF}")][..],
            &[("title", "x"), ("theme", "da\u{0}rk")][..],
            &[("title", "x"), ("color", "#ab\u{1f}c")][..],
        ] {
            let err = validate_config("t", FIELDS, &params(pairs)).unwrap_err();
            assert!(
                matches!(err, AppError::ConfigValidation { .. }),
                "{pairs:?} -> {err}"
            );
            assert!(err.to_string().contains("not allowed in SVG"), "{err}");
        }
    }

    #[test]
    fn xml_whitespace_and_non_ascii_are_kept() {
        let cfg = validate_config("t", FIELDS, &params(&[("title", "a\tb"), ("note", "héllo 世界")]))
            .expect("valid");
        assert_eq!(cfg.get("title"), Some(&Value::from("a\tb")));
        assert_eq!(cfg.get("note"), Some(&Value::from("héllo 世界")));
    }

    #[test]
    fn fractional_numbers_are_kept() {
        let cfg = validate_config("t", FIELDS, &params(&[("title", "x"), ("size", "2.5")]))
            .expect("valid");
        assert_eq!(cfg.get("size"), Some(&Value::from(2.5)));
    }
}
