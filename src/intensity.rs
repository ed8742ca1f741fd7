use crate::error::PhonologyError;
use std::fmt;
use std::str::FromStr;

/// 強度指標の共通トレイト
///
/// サンプル列（チャンネルはインターリーブのまま）から非負のスカラー値を求める。
/// 空のサンプル列は 0 とする。
pub trait IntensityMeasure: Send + Sync {
    fn measure(&self, samples: &[f64]) -> f64;

    /// 指標名
    fn name(&self) -> &'static str;
}

/// RMS (Root Mean Square) 振幅
#[derive(Debug, Default, Clone, Copy)]
pub struct Rms;

impl IntensityMeasure for Rms {
    fn measure(&self, samples: &[f64]) -> f64 {
        if samples.is_empty() {
            return 0.0;
        }

        let sum_of_squares: f64 = samples.iter().map(|&s| s * s).sum();
        (sum_of_squares / samples.len() as f64).sqrt()
    }

    fn name(&self) -> &'static str {
        "rms"
    }
}

/// 平均絶対振幅（整数に切り捨て）
#[derive(Debug, Default, Clone, Copy)]
pub struct MeanAbs;

impl IntensityMeasure for MeanAbs {
    fn measure(&self, samples: &[f64]) -> f64 {
        if samples.is_empty() {
            return 0.0;
        }

        let sum_of_abs: f64 = samples.iter().map(|s| s.abs()).sum();
        (sum_of_abs / samples.len() as f64).trunc()
    }

    fn name(&self) -> &'static str {
        "mean_abs"
    }
}

/// 強度指標の種類
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum IntensityMetric {
    /// RMS振幅（デフォルト）
    #[default]
    Rms,
    /// 平均絶対振幅
    MeanAbs,
}

impl IntensityMetric {
    /// 指標の実装を生成
    pub fn build(self) -> Box<dyn IntensityMeasure> {
        match self {
            IntensityMetric::Rms => Box::new(Rms),
            IntensityMetric::MeanAbs => Box::new(MeanAbs),
        }
    }
}

impl FromStr for IntensityMetric {
    type Err = PhonologyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "rms" => Ok(IntensityMetric::Rms),
            "mean_abs" => Ok(IntensityMetric::MeanAbs),
            other => Err(PhonologyError::Config(format!(
                "未知の強度指標です: {:?} (rms | mean_abs)",
                other
            ))),
        }
    }
}

impl fmt::Display for IntensityMetric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IntensityMetric::Rms => write!(f, "rms"),
            IntensityMetric::MeanAbs => write!(f, "mean_abs"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rms_of_constant_magnitude() {
        let samples: Vec<f64> = (0..300).map(|i| if i % 2 == 0 { 10.0 } else { -10.0 }).collect();
        assert_eq!(Rms.measure(&samples), 10.0);
    }

    #[test]
    fn test_rms_of_sine() {
        let samples: Vec<f64> = (0..16000)
            .map(|i| (i as f64 * 2.0 * std::f64::consts::PI * 440.0 / 16000.0).sin() * 1000.0)
            .collect();
        let rms = Rms.measure(&samples);
        assert!((rms - 1000.0 / 2f64.sqrt()).abs() < 1.0);
    }

    #[test]
    fn test_mean_abs_truncates() {
        // (1 + 2 + 2) / 3 = 1.666...
        assert_eq!(MeanAbs.measure(&[1.0, -2.0, 2.0]), 1.0);
        assert_eq!(MeanAbs.measure(&[-7.0, 7.0]), 7.0);
    }

    #[test]
    fn test_empty_range_measures_zero() {
        assert_eq!(Rms.measure(&[]), 0.0);
        assert_eq!(MeanAbs.measure(&[]), 0.0);
    }

    #[test]
    fn test_metric_from_str() {
        assert_eq!("rms".parse::<IntensityMetric>().unwrap(), IntensityMetric::Rms);
        assert_eq!(
            "mean_abs".parse::<IntensityMetric>().unwrap(),
            IntensityMetric::MeanAbs
        );

        let err = "peak".parse::<IntensityMetric>().unwrap_err();
        assert_eq!(err.kind(), "config");
    }

    #[test]
    fn test_build_matches_selection() {
        assert_eq!(IntensityMetric::Rms.build().name(), "rms");
        assert_eq!(IntensityMetric::MeanAbs.build().name(), "mean_abs");
        assert_eq!(IntensityMetric::default().to_string(), "rms");
    }
}
