use serde::Serialize;

use crate::derive::round_to;
use crate::error::Result;
use crate::table::{Table, Value};

/// Least-squares line `y = slope * x + intercept` between two numeric columns.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LinearFit {
    pub x: String,
    pub y: String,
    /// Rows where both cells held a value.
    pub pairs: usize,
    pub slope: f64,
    pub intercept: f64,
    /// Pearson correlation; `None` when `y` is constant.
    pub r: Option<f64>,
}

impl LinearFit {
    /// How `y` moves as `x` grows.
    pub fn direction(&self) -> &'static str {
        if self.slope > 0.0 {
            "increases"
        } else if self.slope < 0.0 {
            "decreases"
        } else {
            "stays flat"
        }
    }

    pub fn predict(&self, x: f64) -> f64 {
        self.slope * x + self.intercept
    }
}

/// Fit `y` against `x` over the rows where both are present, rounding the
/// coefficients to `precision`.
///
/// `None` with fewer than two pairs or when every `x` is the same.
pub fn linear_fit(table: &Table, x: &str, y: &str, precision: u32) -> Result<Option<LinearFit>> {
    let xi = table.numeric_column(x)?;
    let yi = table.numeric_column(y)?;

    let pairs: Vec<(f64, f64)> = table
        .rows()
        .iter()
        .filter_map(|r| {
            let xv = r.get(xi).and_then(Value::as_f64)?;
            let yv = r.get(yi).and_then(Value::as_f64)?;
            Some((xv, yv))
        })
        .collect();
    if pairs.len() < 2 {
        return Ok(None);
    }

    let n = pairs.len() as f64;
    let mean_x = pairs.iter().map(|p| p.0).sum::<f64>() / n;
    let mean_y = pairs.iter().map(|p| p.1).sum::<f64>() / n;
    let (mut sxx, mut sxy, mut syy) = (0.0, 0.0, 0.0);
    for (xv, yv) in &pairs {
        let (dx, dy) = (xv - mean_x, yv - mean_y);
        sxx += dx * dx;
        sxy += dx * dy;
        syy += dy * dy;
    }
    if sxx == 0.0 {
        return Ok(None);
    }

    let slope = sxy / sxx;
    Ok(Some(LinearFit {
        x: x.to_string(),
        y: y.to_string(),
        pairs: pairs.len(),
        slope: round_to(slope, precision),
        intercept: round_to(mean_y - slope * mean_x, precision),
        r: (syy > 0.0).then(|| round_to(sxy / (sxx * syy).sqrt(), precision)),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EngineError;
    use crate::load::{parse_table, LoadOptions};
    use crate::table::ColumnType;

    fn bmi_sleep(text: &str) -> Table {
        let opts = LoadOptions::new(0)
            .with_type("BMI", ColumnType::Float)
            .with_type("SleepTime", ColumnType::Integer);
        parse_table(text, &opts).unwrap()
    }

    #[test]
    fn exact_line_skipping_incomplete_rows() -> anyhow::Result<()> {
        let table = bmi_sleep("BMI,SleepTime\n1,3\n2,5\n,40\n3,7\n4,\n4,9\n");
        let fit = linear_fit(&table, "BMI", "SleepTime", 2)?.unwrap();
        assert_eq!(fit.pairs, 4);
        assert_eq!(fit.slope, 2.0);
        assert_eq!(fit.intercept, 1.0);
        assert_eq!(fit.r, Some(1.0));
        assert_eq!(fit.direction(), "increases");
        assert_eq!(fit.predict(10.0), 21.0);
        Ok(())
    }

    #[test]
    fn negative_and_noisy_slope() -> anyhow::Result<()> {
        let table = bmi_sleep("BMI,SleepTime\n1,9\n2,8\n3,8\n4,6\n");
        let fit = linear_fit(&table, "BMI", "SleepTime", 2)?.unwrap();
        assert_eq!(fit.slope, -0.9);
        assert_eq!(fit.intercept, 10.0);
        assert!(fit.r.unwrap() < -0.9);
        assert_eq!(fit.direction(), "decreases");
        Ok(())
    }

    #[test]
    fn degenerate_inputs_have_no_fit() -> anyhow::Result<()> {
        let one_pair = bmi_sleep("BMI,SleepTime\n1,3\n,4\n");
        assert_eq!(linear_fit(&one_pair, "BMI", "SleepTime", 2)?, None);

        let same_x = bmi_sleep("BMI,SleepTime\n2,3\n2,4\n");
        assert_eq!(linear_fit(&same_x, "BMI", "SleepTime", 2)?, None);

        let flat_y = bmi_sleep("BMI,SleepTime\n1,4\n2,4\n");
        let fit = linear_fit(&flat_y, "BMI", "SleepTime", 2)?.unwrap();
        assert_eq!((fit.slope, fit.r), (0.0, None));
        assert_eq!(fit.direction(), "stays flat");

        assert!(matches!(
            linear_fit(&flat_y, "BMI", "Age", 2),
            Err(EngineError::UnknownColumn(_))
        ));
        Ok(())
    }
}
