use minijinja::{AutoEscape, Environment, UndefinedBehavior};
use serde_json::Value;

use super::layouts::{BUILTIN_TEMPLATES, ResolvedLayout};
use crate::error::AppError;

/// SVG 生成器：由解析后的布局与配置生成 SVG 文本（纯 CPU，无 I/O）。
pub trait VectorRenderer: Send + Sync {
    fn render(&self, resolved: &ResolvedLayout) -> Result<String, AppError>;
}

/// 基于 minijinja 的 SVG 模板渲染器。
///
/// - 所有模板统一开启 HTML 转义，用户文本无法跳出 SVG 的文本节点或属性；
/// - 未定义变量视为错误（模板与布局字段不一致时尽早失败）。
pub struct TemplateRenderer {
    env: Environment<'static>,
}

impl TemplateRenderer {
    /// 使用内置布局模板构建
    pub fn new() -> Result<Self, AppError> {
        Self::with_templates(BUILTIN_TEMPLATES.iter().copied())
    }

    /// 使用给定模板集合构建；模板语法错误在此处即失败。
    pub fn with_templates<I>(templates: I) -> Result<Self, AppError>
    where
        I: IntoIterator<Item = (&'static str, &'static str)>,
    {
        let mut env = Environment::new();
        env.set_auto_escape_callback(|_| AutoEscape::Html);
        env.set_undefined_behavior(UndefinedBehavior::Strict);
        for (name, source) in templates {
            env.add_template(name, source).map_err(|e| {
                AppError::Render(format!("failed to load template ({name}): {e}"))
            })?;
        }
        Ok(Self { env })
    }
}

impl VectorRenderer for TemplateRenderer {
    fn render(&self, resolved: &ResolvedLayout) -> Result<String, AppError> {
        let layout = resolved.layout.as_ref();
        let template_name = layout.template_name();
        let tpl = self.env.get_template(template_name).map_err(|e| {
            AppError::Render(format!("failed to load template ({template_name}): {e}"))
        })?;

        let canvas = layout.canvas();
        let mut ctx = resolved.config.as_map().clone();
        ctx.insert("layout".to_string(), Value::from(layout.name()));
        ctx.insert("width".to_string(), Value::from(canvas.width));
        ctx.insert("height".to_string(), Value::from(canvas.height));

        tpl.render(&ctx).map_err(|e| {
            AppError::Render(format!("failed to render template ({template_name}): {e}"))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::image::layouts::{BuiltinLayouts, LayoutRegistry};
    use crate::features::image::types::QueryParams;

    fn resolve(name: &str, pairs: &[(&str, &str)]) -> ResolvedLayout {
        BuiltinLayouts::new()
            .resolve(name, &QueryParams::from_pairs(pairs.iter().copied()))
            .expect("resolve")
    }

    #[test]
    fn renders_every_builtin_layout() {
        let renderer = TemplateRenderer::new().expect("renderer");
        for (name, pairs) in [
            ("simple", &[("title", "Hello"), ("description", "World")][..]),
            ("document", &[("title", "Docs"), ("category", "guide"), ("author", "Team")][..]),
            ("banner", &[("text", "Launch day")][..]),
        ] {
            let svg = renderer.render(&resolve(name, pairs)).expect(name);
            assert!(svg.trim_start().starts_with("<svg"), "{name}: {svg}");
            assert!(svg.contains("width=\"1200\""), "{name}");
            assert!(svg.trim_end().ends_with("</svg>"), "{name}");
        }
    }

    #[test]
    fn user_text_is_escaped() {
        let renderer = TemplateRenderer::new().expect("renderer");
        let svg = renderer
            .render(&resolve("simple", &[("title", "<script>alert(1)</script> & co")]))
            .expect("render");
        assert!(!svg.contains("<script>"));
        assert!(svg.contains("&lt;script&gt;"));
        assert!(svg.contains("&amp;"));
    }

    #[test]
    fn theme_switches_palette() {
        let renderer = TemplateRenderer::new().expect("renderer");
        let dark = renderer
            .render(&resolve("simple", &[("title", "x"), ("theme", "dark")]))
            .expect("dark");
        let light = renderer
            .render(&resolve("simple", &[("title", "x"), ("theme", "light")]))
            .expect("light");
        assert!(dark.contains("#0b0d12"));
        assert!(light.contains("#ffffff"));
    }

    #[test]
    fn output_is_deterministic() {
        let renderer = TemplateRenderer::new().expect("renderer");
        let r = resolve("banner", &[("text", "same"), ("fontSize", "64")]);
        assert_eq!(
            renderer.render(&r).expect("a"),
            renderer.render(&r).expect("b")
        );
    }

    #[test]
    fn malformed_template_is_a_render_error() {
        let err = TemplateRenderer::with_templates([("broken.svg.jinja", "{% for x in %}")])
            .err()
            .expect("must fail");
        assert!(matches!(err, AppError::Render(_)));
    }

    #[test]
    fn missing_template_is_a_render_error() {
        let renderer = TemplateRenderer::with_templates([]).expect("empty env");
        let err = renderer
            .render(&resolve("simple", &[("title", "x")]))
            .unwrap_err();
        assert!(matches!(err, AppError::Render(_)));
    }
}
