//! 切り抜き領域の計算
//!
//! ディプティク（左右2枚組）の場合は人物の有無による優先ルールで
//! 実際に使う側を決め、その側の正方形を切り出す。それ以外は中央の正方形。
//!
//! 優先ルール:
//! - 左だけに人物 → 左
//! - 右だけに人物 → 右
//! - 両方に人物 → 左（AIの推奨や理由は見ない）
//! - どちらにもいない → AIの推奨（中央も可）

use crate::types::{CropRectangle, Dimensions, SemanticAnalysis, Side};
use serde::Serialize;

/// 実際の側を決めたルール
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum SideRule {
    /// 分割画像ではない
    NotSplit,
    OnlyLeftHasPeople,
    OnlyRightHasPeople,
    /// 両側に人物がいる場合は常に左
    BothHavePeople,
    /// 人物がいないのでAIの推奨に従う
    ModelChoice,
}

impl SideRule {
    pub fn description(&self) -> &'static str {
        match self {
            SideRule::NotSplit => "画像は分割されていないため中央で切り抜き",
            SideRule::OnlyLeftHasPeople => "左側だけに人物がいるため左側を選択",
            SideRule::OnlyRightHasPeople => "右側だけに人物がいるため右側を選択",
            SideRule::BothHavePeople => "両側に人物がいるため左側を選択",
            SideRule::ModelChoice => "人物がいないためAIの推奨側を使用",
        }
    }
}

/// 切り抜き計画
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CropPlan {
    pub rectangle: CropRectangle,
    pub effective_side: Side,
    pub rule: SideRule,
}

/// 優先ルールを適用して実際に使う側を決める
pub fn resolve_effective_side(analysis: &SemanticAnalysis) -> (Side, SideRule) {
    if !analysis.is_split {
        return (Side::Center, SideRule::NotSplit);
    }

    match (analysis.left_has_people, analysis.right_has_people) {
        (true, false) => (Side::Left, SideRule::OnlyLeftHasPeople),
        (false, true) => (Side::Right, SideRule::OnlyRightHasPeople),
        (true, true) => (Side::Left, SideRule::BothHavePeople),
        (false, false) => (analysis.important_side, SideRule::ModelChoice),
    }
}

/// 切り抜き計画を作成（側・ルール・領域）
pub fn plan_crop(dims: Dimensions, analysis: &SemanticAnalysis) -> CropPlan {
    let (width, height) = (dims.width(), dims.height());

    if analysis.is_split {
        tracing::info!(
            important_side = %analysis.important_side,
            left_has_people = analysis.left_has_people,
            right_has_people = analysis.right_has_people,
            rationale = %analysis.side_rationale,
            "分割画像を検出"
        );
    }

    let (side, rule) = resolve_effective_side(analysis);
    let rectangle = match side {
        Side::Left => {
            let size = side_crop_size(width, height);
            let top = (height - size) / 2;
            CropRectangle { left: 0, top, right: size, bottom: top + size }
        }
        Side::Right => {
            let size = side_crop_size(width, height);
            let top = (height - size) / 2;
            CropRectangle { left: width - size, top, right: width, bottom: top + size }
        }
        Side::Center => {
            let size = width.min(height);
            let left = (width - size) / 2;
            let top = (height - size) / 2;
            CropRectangle { left, top, right: left + size, bottom: top + size }
        }
    };

    tracing::info!(
        dimensions = %dims,
        side = %side,
        rule = rule.description(),
        rectangle = %rectangle,
        "切り抜き領域を計算"
    );

    CropPlan { rectangle, effective_side: side, rule }
}

/// 切り抜き領域を計算
pub fn compute_crop_area(dims: Dimensions, analysis: &SemanticAnalysis) -> CropRectangle {
    plan_crop(dims, analysis).rectangle
}

/// 左右どちらか半分の正方形の一辺。幅1pxの画像でも空にはしない
fn side_crop_size(width: u32, height: u32) -> u32 {
    (width / 2).min(height).max(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dims(width: u32, height: u32) -> Dimensions {
        Dimensions::new(width, height).unwrap()
    }

    fn split(left: bool, right: bool, side: Side) -> SemanticAnalysis {
        SemanticAnalysis {
            is_split: true,
            left_has_people: left,
            right_has_people: right,
            important_side: side,
            ..Default::default()
        }
    }

    const SIDES: [Side; 3] = [Side::Left, Side::Right, Side::Center];

    const SIZES: &[(u32, u32)] = &[
        (1, 1), (1, 7), (7, 1), (2, 3), (3, 2), (100, 100), (101, 99),
        (640, 480), (480, 640), (1080, 1080), (1200, 1600), (2000, 1000),
        (3000, 1000), (4032, 3024), (333, 1), (1, 333),
    ];

    // =============================================
    // シナリオ
    // =============================================

    #[test]
    fn test_split_left_people_scenario() {
        let rect = compute_crop_area(dims(2000, 1000), &split(true, false, Side::Center));
        assert_eq!(rect, CropRectangle { left: 0, top: 0, right: 1000, bottom: 1000 });
    }

    #[test]
    fn test_not_split_portrait_scenario() {
        let rect = compute_crop_area(dims(1200, 1600), &SemanticAnalysis::default());
        assert_eq!(rect, CropRectangle { left: 0, top: 200, right: 1200, bottom: 1400 });
    }

    #[test]
    fn test_split_right_side_scenario() {
        let rect = compute_crop_area(dims(2000, 1000), &split(false, true, Side::Left));
        assert_eq!(rect, CropRectangle { left: 1000, top: 0, right: 2000, bottom: 1000 });
    }

    #[test]
    fn test_side_crop_limited_by_half_width() {
        // 縦長の分割画像: 半分の幅が一辺になり、縦方向は中央寄せ
        let rect = compute_crop_area(dims(1000, 1200), &split(false, true, Side::Center));
        assert_eq!(rect, CropRectangle { left: 500, top: 350, right: 1000, bottom: 850 });
    }

    #[test]
    fn test_split_center_choice() {
        let rect = compute_crop_area(dims(3000, 1000), &split(false, false, Side::Center));
        assert_eq!(rect, CropRectangle { left: 1000, top: 0, right: 2000, bottom: 1000 });
    }

    #[test]
    fn test_odd_dimensions_floor_division() {
        let rect = compute_crop_area(dims(101, 99), &SemanticAnalysis::default());
        assert_eq!(rect, CropRectangle { left: 1, top: 0, right: 100, bottom: 99 });

        let rect = compute_crop_area(dims(2001, 1000), &split(false, true, Side::Center));
        assert_eq!(rect, CropRectangle { left: 1001, top: 0, right: 2001, bottom: 1000 });
    }

    #[test]
    fn test_one_pixel_wide_split_is_not_empty() {
        let rect = compute_crop_area(dims(1, 5), &split(true, false, Side::Center));
        assert_eq!(rect, CropRectangle { left: 0, top: 2, right: 1, bottom: 3 });

        let rect = compute_crop_area(dims(1, 5), &split(false, true, Side::Center));
        assert_eq!(rect, CropRectangle { left: 0, top: 2, right: 1, bottom: 3 });
    }

    // =============================================
    // 優先ルール
    // =============================================

    #[test]
    fn test_not_split_ignores_other_fields() {
        for side in SIDES {
            for (left, right) in [(true, false), (false, true), (true, true), (false, false)] {
                let analysis = SemanticAnalysis {
                    is_split: false,
                    left_has_people: left,
                    right_has_people: right,
                    important_side: side,
                    ..Default::default()
                };
                assert_eq!(resolve_effective_side(&analysis), (Side::Center, SideRule::NotSplit));
            }
        }
    }

    #[test]
    fn test_only_left_people_always_left() {
        for side in SIDES {
            assert_eq!(
                resolve_effective_side(&split(true, false, side)),
                (Side::Left, SideRule::OnlyLeftHasPeople)
            );
        }
    }

    #[test]
    fn test_only_right_people_always_right() {
        for side in SIDES {
            assert_eq!(
                resolve_effective_side(&split(false, true, side)),
                (Side::Right, SideRule::OnlyRightHasPeople)
            );
        }
    }

    #[test]
    fn test_both_people_always_left() {
        for side in SIDES {
            let mut analysis = split(true, true, side);
            analysis.side_rationale = "the right side is clearly better".into();
            assert_eq!(
                resolve_effective_side(&analysis),
                (Side::Left, SideRule::BothHavePeople)
            );
        }
    }

    #[test]
    fn test_no_people_follows_model_choice() {
        for side in SIDES {
            assert_eq!(
                resolve_effective_side(&split(false, false, side)),
                (side, SideRule::ModelChoice)
            );
        }
    }

    // =============================================
    // 不変条件
    // =============================================

    #[test]
    fn test_not_split_is_centered_square() {
        for &(w, h) in SIZES {
            let rect = compute_crop_area(dims(w, h), &SemanticAnalysis::default());
            let size = w.min(h);
            assert_eq!(rect.width(), size);
            assert_eq!(rect.height(), size);
            assert_eq!(rect.left, (w - size) / 2);
            assert_eq!(rect.top, (h - size) / 2);
        }
    }

    #[test]
    fn test_rectangle_always_square_and_in_bounds() {
        for &(w, h) in SIZES {
            let d = dims(w, h);
            for side in SIDES {
                for (left, right) in [(true, false), (false, true), (true, true), (false, false)] {
                    for analysis in [split(left, right, side), SemanticAnalysis::default()] {
                        let rect = compute_crop_area(d, &analysis);
                        assert!(rect.fits_within(d), "{}x{} -> {}", w, h, rect);
                        assert!(rect.is_square(), "{}x{} -> {}", w, h, rect);
                    }
                }
            }
        }
    }

    #[test]
    fn test_plan_is_idempotent() {
        let analysis = split(false, false, Side::Right);
        let first = plan_crop(dims(4032, 3024), &analysis);
        for _ in 0..10 {
            assert_eq!(plan_crop(dims(4032, 3024), &analysis), first);
        }
    }

    #[test]
    fn test_plan_reports_side_and_rule() {
        let plan = plan_crop(dims(2000, 1000), &split(true, true, Side::Right));
        assert_eq!(plan.effective_side, Side::Left);
        assert_eq!(plan.rule, SideRule::BothHavePeople);
        assert_eq!(plan.rectangle.left, 0);
    }
}
