use serde::{Deserialize, Serialize};
use serde_json::Value;

/// ToDo の集計結果
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TodoStats {
    pub total: usize,
    pub completed: usize,
    pub pending: usize,
    /// 完了率（%、小数点以下 2 桁で丸め）。件数 0 のときは 0
    pub completion_rate: f64,
}

impl TodoStats {
    fn from_counts(total: usize, completed: usize) -> Self {
        let completion_rate = if total == 0 {
            0.0
        } else {
            round2(completed as f64 / total as f64 * 100.0)
        };

        Self {
            total,
            completed,
            pending: total.saturating_sub(completed),
            completion_rate,
        }
    }

    pub fn from_flags<I>(flags: I) -> Self
    where
        I: IntoIterator<Item = bool>,
    {
        let (total, completed) = flags
            .into_iter()
            .fold((0, 0), |(total, done), flag| (total + 1, done + usize::from(flag)));
        Self::from_counts(total, completed)
    }

    /// API から受け取った JSON レコード列から集計する。
    /// `completed` が欠けている・bool でないレコードは未完了として数える。
    pub fn from_records(records: &[Value]) -> Self {
        Self::from_flags(
            records
                .iter()
                .map(|record| record.get("completed").and_then(Value::as_bool).unwrap_or(false)),
        )
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
