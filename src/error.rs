//! # Error モジュール
//!
//! ミッション計画とシミュレーションで発生するエラーの分類を定義します。
//!
//! - 計画時エラー（`InsufficientCapacity`, `InvalidPath`）は呼び出し元へ同期的に返され、
//!   その操作を中断します。
//! - ティック処理中のデータ不整合（`MissingTargetReference`）はログ出力してスキップし、
//!   再生を止めません。

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum MissionError {
    /// 必要弾薬数の合計が機体の搭載容量の合計を超えている
    #[error("弾薬容量が不足しています: 必要 {required} / 利用可能 {available}")]
    InsufficientCapacity { required: u32, available: u32 },

    /// 空の経路、または時刻が単調非減少でない経路
    #[error("不正な飛行経路: {0}")]
    InvalidPath(String),

    /// 割り当て済みターゲットIDがターゲット一覧に存在しない
    #[error("ターゲット参照が見つかりません: 機体 {aircraft_id} -> ターゲット {target_id}")]
    MissingTargetReference {
        aircraft_id: String,
        target_id: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages_carry_context() {
        let err = MissionError::InsufficientCapacity {
            required: 7,
            available: 6,
        };
        let message = err.to_string();
        assert!(message.contains('7'));
        assert!(message.contains('6'));

        let err = MissionError::MissingTargetReference {
            aircraft_id: "AC1".to_string(),
            target_id: "TGT9".to_string(),
        };
        assert!(err.to_string().contains("TGT9"));
    }
}
