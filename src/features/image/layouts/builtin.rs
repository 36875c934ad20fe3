use std::collections::BTreeMap;
use std::sync::Arc;

use super::schema::{FieldKind, FieldSpec, TextWrap, validate_config};
use super::{Canvas, Layout, LayoutRegistry, ResolvedLayout};
use crate::error::AppError;
use crate::features::image::types::QueryParams;

/// Open Graph 常用尺寸
const OG_CANVAS: Canvas = Canvas {
    width: 1200,
    height: 630,
};

const THEME: FieldKind = FieldKind::Choice {
    options: &["light", "dark"],
};

/// 编译进二进制的模板：(模板名, 源码)
pub const BUILTIN_TEMPLATES: &[(&str, &str)] = &[
    (
        "simple.svg.jinja",
        include_str!("../../../../templates/layouts/simple.svg.jinja"),
    ),
    (
        "document.svg.jinja",
        include_str!("../../../../templates/layouts/document.svg.jinja"),
    ),
    (
        "banner.svg.jinja",
        include_str!("../../../../templates/layouts/banner.svg.jinja"),
    ),
];

/// 内置布局定义
#[derive(Debug)]
pub struct BuiltinLayout {
    name: &'static str,
    template: &'static str,
    canvas: Canvas,
    fields: &'static [FieldSpec],
}

impl Layout for BuiltinLayout {
    fn name(&self) -> &str {
        self.name
    }

    fn template_name(&self) -> &str {
        self.template
    }

    fn canvas(&self) -> Canvas {
        self.canvas
    }
}

const SIMPLE: BuiltinLayout = BuiltinLayout {
    name: "simple",
    template: "simple.svg.jinja",
    canvas: OG_CANVAS,
    fields: &[
        FieldSpec::required(
            "title",
            FieldKind::Text {
                max_chars: 200,
                wrap: Some(TextWrap {
                    max_width: 28,
                    max_lines: 3,
                }),
            },
        ),
        FieldSpec::optional(
            "description",
            FieldKind::Text {
                max_chars: 300,
                wrap: Some(TextWrap {
                    max_width: 56,
                    max_lines: 3,
                }),
            },
        ),
        FieldSpec::with_default("theme", THEME, "dark"),
    ],
};

const DOCUMENT: BuiltinLayout = BuiltinLayout {
    name: "document",
    template: "document.svg.jinja",
    canvas: OG_CANVAS,
    fields: &[
        FieldSpec::required(
            "title",
            FieldKind::Text {
                max_chars: 200,
                wrap: Some(TextWrap {
                    max_width: 30,
                    max_lines: 3,
                }),
            },
        ),
        FieldSpec::optional(
            "category",
            FieldKind::Text {
                max_chars: 40,
                wrap: None,
            },
        ),
        FieldSpec::optional(
            "author",
            FieldKind::Text {
                max_chars: 60,
                wrap: None,
            },
        ),
        FieldSpec::with_default("theme", THEME, "light"),
        FieldSpec::with_default("accent", FieldKind::Color, "#7c3aed"),
    ],
};

const BANNER: BuiltinLayout = BuiltinLayout {
    name: "banner",
    template: "banner.svg.jinja",
    canvas: OG_CANVAS,
    fields: &[
        FieldSpec::required(
            "text",
            FieldKind::Text {
                max_chars: 80,
                wrap: Some(TextWrap {
                    max_width: 20,
                    max_lines: 2,
                }),
            },
        ),
        FieldSpec::with_default(
            "fontSize",
            FieldKind::Number {
                min: 24.0,
                max: 160.0,
            },
            "96",
        ),
        FieldSpec::with_default("background", FieldKind::Color, "#111827"),
        FieldSpec::with_default("foreground", FieldKind::Color, "#f9fafb"),
    ],
};

/// 内置布局注册表
#[derive(Debug, Clone)]
pub struct BuiltinLayouts {
    layouts: BTreeMap<&'static str, Arc<BuiltinLayout>>,
}

impl Default for BuiltinLayouts {
    fn default() -> Self {
        Self::new()
    }
}

impl BuiltinLayouts {
    pub fn new() -> Self {
        let layouts = [SIMPLE, DOCUMENT, BANNER]
            .into_iter()
            .map(|l| (l.name, Arc::new(l)))
            .collect();
        Self { layouts }
    }

    /// 已注册的布局名（有序）
    pub fn names(&self) -> Vec<&'static str> {
        self.layouts.keys().copied().collect()
    }

    pub fn get(&self, name: &str) -> Option<&Arc<BuiltinLayout>> {
        self.layouts.get(name)
    }
}

impl LayoutRegistry for BuiltinLayouts {
    fn resolve(&self, name: &str, params: &QueryParams) -> Result<ResolvedLayout, AppError> {
        let layout = self.layouts.get(name).ok_or_else(|| {
            AppError::LayoutNotFound {
                name: name.to_string(),
                available: self.names().iter().map(|n| n.to_string()).collect(),
            }
        })?;
        let config = validate_config(layout.name, layout.fields, params)?;
        Ok(ResolvedLayout {
            layout: layout.clone(),
            config,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;

    fn params(pairs: &[(&str, &str)]) -> QueryParams {
        QueryParams::from_pairs(pairs.iter().copied())
    }

    #[test]
    fn lists_layouts_sorted() {
        assert_eq!(BuiltinLayouts::new().names(), vec!["banner", "document", "simple"]);
    }

    #[test]
    fn every_layout_has_a_bundled_template() {
        let registry = BuiltinLayouts::new();
        for name in registry.names() {
            let layout = registry.get(name).expect("registered");
            assert!(
                BUILTIN_TEMPLATES
                    .iter()
                    .any(|(t, _)| *t == layout.template_name()),
                "missing template for {name}"
            );
        }
    }

    #[test]
    fn resolves_known_layout_with_config() {
        let resolved = BuiltinLayouts::new()
            .resolve("banner", &params(&[("text", "Ship it"), ("fontSize", "120")]))
            .expect("resolve");
        assert_eq!(resolved.layout.name(), "banner");
        assert_eq!(resolved.layout.canvas(), OG_CANVAS);
        assert_eq!(resolved.config.get("fontSize"), Some(&Value::from(120)));
        assert_eq!(resolved.config.get("background"), Some(&Value::from("#111827")));
    }

    #[test]
    fn unknown_layout_is_distinguishable() {
        let err = BuiltinLayouts::new()
            .resolve("nope", &QueryParams::new())
            .unwrap_err();
        assert!(matches!(err, AppError::LayoutNotFound { .. }));
        assert!(err.to_string().contains("nope"));
        assert!(err.to_string().contains("simple"));
    }

    #[test]
    fn schema_failure_is_distinguishable() {
        let err = BuiltinLayouts::new()
            .resolve("simple", &params(&[("theme", "neon")]))
            .unwrap_err();
        assert!(matches!(err, AppError::ConfigValidation { .. }));
    }

    #[test]
    fn resolution_is_idempotent() {
        let registry = BuiltinLayouts::new();
        let p = params(&[("title", "Same"), ("description", "input")]);
        let a = registry.resolve("simple", &p).expect("a");
        let b = registry.resolve("simple", &p).expect("b");
        assert_eq!(a.config, b.config);
        assert_eq!(a.layout.name(), b.layout.name());
    }
}
