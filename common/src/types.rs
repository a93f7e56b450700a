//! 解析結果と幾何の型定義
//!
//! - SemanticAnalysis: AI解析の正規化済みレコード
//! - Side: 切り抜き対象の側（左/右/中央）
//! - Dimensions: 検証済みの画像サイズ（0は不可）
//! - CropRectangle: 切り抜き領域（常に正方形）
//! - TargetSize: 出力サイズ（デフォルト 1080x1080）

use crate::error::{Error, Result};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Instagram推奨の正方形サイズ
pub const INSTAGRAM_SQUARE: u32 = 1080;

/// 切り抜き対象の側
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Left,
    Right,
    #[default]
    Center,
}

impl Side {
    /// AIの自由記述から側を判定する。判定できなければ中央
    pub fn parse_lenient(s: &str) -> Self {
        let s = s.trim().to_lowercase();
        if s.starts_with("left") || s.starts_with("izquierd") || s == "l" {
            Side::Left
        } else if s.starts_with("right") || s.starts_with("derech") || s == "r" {
            Side::Right
        } else {
            Side::Center
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Side::Left => "left",
            Side::Right => "right",
            Side::Center => "center",
        }
    }
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Side {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Ok(match value {
            Value::String(s) => Side::parse_lenient(&s),
            _ => Side::Center,
        })
    }
}

/// 正規化済みのAI解析結果
///
/// 記述フィールドはレポート用にそのまま渡され、切り抜き計算では参照しない。
/// フィールド名はcamelCase。旧形式（スペイン語キー）も受け付ける。
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SemanticAnalysis {
    #[serde(alias = "contenido_principal", deserialize_with = "lenient_string")]
    pub content_summary: String,

    #[serde(alias = "elementos_bordes", deserialize_with = "lenient_string")]
    pub border_elements: String,

    /// 2枚の写真を左右に並べた画像（ディプティク）か
    #[serde(alias = "imagen_dividida", deserialize_with = "lenient_bool")]
    pub is_split: bool,

    #[serde(alias = "lado_izquierdo", deserialize_with = "lenient_string")]
    pub left_description: String,

    #[serde(alias = "lado_derecho", deserialize_with = "lenient_string")]
    pub right_description: String,

    #[serde(alias = "personas_izquierda", deserialize_with = "lenient_bool")]
    pub left_has_people: bool,

    #[serde(alias = "personas_derecha", deserialize_with = "lenient_bool")]
    pub right_has_people: bool,

    /// AIの推奨（優先ルールで上書きされることがある）
    #[serde(alias = "lado_importante")]
    pub important_side: Side,

    #[serde(alias = "razon_lado_elegido", deserialize_with = "lenient_string")]
    pub side_rationale: String,

    #[serde(alias = "punto_focal", deserialize_with = "lenient_string")]
    pub focal_point: String,

    #[serde(alias = "texto_visible", deserialize_with = "lenient_string")]
    pub visible_text: String,

    #[serde(alias = "recomendacion_corte", deserialize_with = "lenient_string")]
    pub crop_recommendation: String,
}

impl SemanticAnalysis {
    /// 解析が得られなかった場合の既定レコード（中央切り抜き）
    pub fn fallback() -> Self {
        Self {
            content_summary: "general image".into(),
            border_elements: "not detected".into(),
            is_split: false,
            left_description: "not applicable".into(),
            right_description: "not applicable".into(),
            left_has_people: false,
            right_has_people: false,
            important_side: Side::Center,
            side_rationale: "image not split".into(),
            focal_point: "image center".into(),
            visible_text: "none".into(),
            crop_recommendation: "centered crop".into(),
        }
    }
}

fn lenient_bool<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<bool, D::Error> {
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::Bool(b) => b,
        Value::String(s) => matches!(
            s.trim().to_lowercase().as_str(),
            "true" | "yes" | "si" | "sí" | "1"
        ),
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        _ => false,
    })
}

fn lenient_string<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<String, D::Error> {
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::String(s) => s,
        Value::Null => String::new(),
        other => other.to_string(),
    })
}

/// 検証済みの画像サイズ
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Dimensions {
    width: u32,
    height: u32,
}

impl Dimensions {
    /// 幅・高さが0の画像は扱わない
    pub fn new(width: u32, height: u32) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(Error::InvalidGeometry(format!(
                "画像サイズが不正です: {}x{}",
                width, height
            )));
        }
        Ok(Self { width, height })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }
}

impl std::fmt::Display for Dimensions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// 切り抜き領域（左上原点、right/bottomは含まない）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CropRectangle {
    pub left: u32,
    pub top: u32,
    pub right: u32,
    pub bottom: u32,
}

impl CropRectangle {
    pub fn width(&self) -> u32 {
        self.right.saturating_sub(self.left)
    }

    pub fn height(&self) -> u32 {
        self.bottom.saturating_sub(self.top)
    }

    pub fn is_square(&self) -> bool {
        self.width() == self.height()
    }

    /// 空でなく、画像の範囲内に収まるか
    pub fn fits_within(&self, dims: Dimensions) -> bool {
        self.left < self.right
            && self.top < self.bottom
            && self.right <= dims.width()
            && self.bottom <= dims.height()
    }
}

impl std::fmt::Display for CropRectangle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {}, {}, {})", self.left, self.top, self.right, self.bottom)
    }
}

/// 出力画像サイズ
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetSize {
    pub width: u32,
    pub height: u32,
}

impl TargetSize {
    /// 一辺 `side` の正方形
    pub fn square(side: u32) -> Result<Self> {
        if side == 0 {
            return Err(Error::InvalidGeometry("出力サイズは1以上が必要です".into()));
        }
        Ok(Self { width: side, height: side })
    }
}

impl Default for TargetSize {
    fn default() -> Self {
        Self {
            width: INSTAGRAM_SQUARE,
            height: INSTAGRAM_SQUARE,
        }
    }
}
