use std::collections::BTreeMap;
use std::collections::btree_map::Entry;

use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// 布局名参数
pub const LAYOUT_NAME_PARAM: &str = "layoutName";
/// 输出格式参数
pub const FILE_TYPE_PARAM: &str = "fileType";

/// 单个查询参数的取值：同名参数出现多次时聚合为数组。
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum QueryValue {
    One(String),
    Many(Vec<String>),
}

impl QueryValue {
    /// 仅当参数只出现一次时返回其值
    pub fn as_single(&self) -> Option<&str> {
        match self {
            QueryValue::One(v) => Some(v),
            QueryValue::Many(_) => None,
        }
    }

    fn push(&mut self, value: String) {
        match self {
            QueryValue::One(first) => {
                let first = std::mem::take(first);
                *self = QueryValue::Many(vec![first, value]);
            }
            QueryValue::Many(values) => values.push(value),
        }
    }
}

/// 解码后的查询参数集合（键有序，便于得到确定性的输出）
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct QueryParams(BTreeMap<String, QueryValue>);

impl QueryParams {
    pub fn new() -> Self {
        Self::default()
    }

    /// 由 `key=value` 对构造；重复键聚合为 [`QueryValue::Many`]。
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut map: BTreeMap<String, QueryValue> = BTreeMap::new();
        for (k, v) in pairs {
            let v = v.into();
            match map.entry(k.into()) {
                Entry::Occupied(mut existing) => existing.get_mut().push(v),
                Entry::Vacant(slot) => {
                    slot.insert(QueryValue::One(v));
                }
            }
        }
        Self(map)
    }

    pub fn get(&self, key: &str) -> Option<&QueryValue> {
        self.0.get(key)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// 去掉指定键后的副本
    fn without(&self, keys: &[&str]) -> Self {
        Self(
            self.0
                .iter()
                .filter(|(k, _)| !keys.contains(&k.as_str()))
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
        )
    }
}

/// 输出格式
#[derive(Debug, Clone, Copy, Serialize, Deserialize, utoipa::ToSchema, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum FileType {
    /// 直接返回 SVG 文本
    Svg,
    /// 栅格化为 PNG
    Png,
}

impl FileType {
    /// 请求中使用的格式标签
    pub fn tag(self) -> &'static str {
        match self {
            FileType::Svg => "svg",
            FileType::Png => "png",
        }
    }

    fn parse(raw: &str) -> Option<Self> {
        match raw {
            "svg" => Some(FileType::Svg),
            "png" => Some(FileType::Png),
            _ => None,
        }
    }
}

/// 校验后的渲染请求
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderRequest {
    /// 小写化后的布局名
    pub layout_name: String,
    /// 输出格式（缺省时由响应封装决定）
    pub file_type: Option<FileType>,
    /// 其余参数，原样交给布局解析
    pub extra_params: QueryParams,
}

impl RenderRequest {
    /// 请求参数校验：`layoutName` 必填且非空（大小写不敏感），`fileType` 仅允许 svg/png。
    pub fn from_query(query: &QueryParams) -> Result<Self, AppError> {
        let layout_name = match query.get(LAYOUT_NAME_PARAM) {
            None => {
                return Err(AppError::Validation(format!(
                    "\"{LAYOUT_NAME_PARAM}\" is required"
                )));
            }
            Some(QueryValue::Many(_)) => {
                return Err(AppError::Validation(format!(
                    "\"{LAYOUT_NAME_PARAM}\" must be a single string, received an array"
                )));
            }
            Some(QueryValue::One(v)) => v.trim(),
        };
        if layout_name.is_empty() {
            return Err(AppError::Validation(format!(
                "\"{LAYOUT_NAME_PARAM}\" must not be empty"
            )));
        }

        let file_type = match query.get(FILE_TYPE_PARAM) {
            None => None,
            Some(QueryValue::Many(_)) => {
                return Err(AppError::Validation(format!(
                    "\"{FILE_TYPE_PARAM}\" must be a single value, received an array"
                )));
            }
            Some(QueryValue::One(raw)) => Some(FileType::parse(raw).ok_or_else(|| {
                AppError::Validation(format!(
                    "\"{FILE_TYPE_PARAM}\" must be one of 'svg' | 'png', received '{raw}'"
                ))
            })?),
        };

        Ok(Self {
            layout_name: layout_name.to_lowercase(),
            file_type,
            extra_params: query.without(&[LAYOUT_NAME_PARAM, FILE_TYPE_PARAM]),
        })
    }
}

/// 渲染产物：SVG 文本或栅格字节，由响应封装消费一次。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderedImage {
    Svg(String),
    Raster(Vec<u8>),
}

impl RenderedImage {
    pub fn into_bytes(self) -> Vec<u8> {
        match self {
            RenderedImage::Svg(s) => s.into_bytes(),
            RenderedImage::Raster(b) => b,
        }
    }
}
