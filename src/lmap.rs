//! Literal weight tables and the LMAP format.
//!
//! An arithmetic circuit compiled from a PSDD refers to two kinds of
//! literals: indicators `±1..±n` for the model variables, and parameter
//! literals `n+1, n+2, ...` holding the PSDD weights. The LMAP file assigns a
//! weight to every one of them:
//!
//! ```text
//! cc$I$<lit>$<weight>$+$x<var>$<value>   # indicator
//! cc$C$<lit>$<weight>$I$                 # constant (parameter)
//! ```
//!
//! Literals that were never assigned a weight read as [`DEFAULT_WEIGHT`].

use std::collections::BTreeMap;
use std::fmt::Write as _;

/// Weight of any literal without an explicit entry.
pub const DEFAULT_WEIGHT: f64 = 1.0;

/// Mapping from literal to weight with an explicit default.
#[derive(Debug, Clone, PartialEq)]
pub struct WeightTable {
    weights: BTreeMap<i64, f64>,
    default: f64,
}

impl Default for WeightTable {
    fn default() -> Self {
        Self::with_default(DEFAULT_WEIGHT)
    }
}

impl WeightTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_default(default: f64) -> Self {
        Self {
            weights: BTreeMap::new(),
            default,
        }
    }

    pub fn set(&mut self, literal: i64, weight: f64) {
        self.weights.insert(literal, weight);
    }

    /// Weight of `literal`, or the default if it was never set.
    pub fn get(&self, literal: i64) -> f64 {
        self.weights.get(&literal).copied().unwrap_or(self.default)
    }

    pub fn contains(&self, literal: i64) -> bool {
        self.weights.contains_key(&literal)
    }

    pub fn default_weight(&self) -> f64 {
        self.default
    }

    /// Number of explicitly set literals.
    pub fn len(&self) -> usize {
        self.weights.len()
    }

    pub fn is_empty(&self) -> bool {
        self.weights.is_empty()
    }

    /// Explicit entries in ascending literal order.
    pub fn iter(&self) -> impl Iterator<Item = (i64, f64)> + '_ {
        self.weights.iter().map(|(&lit, &w)| (lit, w))
    }

    /// Renders the table as an LMAP for a circuit over `var_count` variables.
    ///
    /// Each variable gets a negative and a positive indicator record with the
    /// default weight; each positive parameter literal `p` gets constant
    /// records for `-p` and `p`.
    pub fn to_lmap_string(&self, var_count: u32) -> Result<String, std::fmt::Error> {
        let parameters: Vec<i64> = self.weights.keys().copied().filter(|&lit| lit > 0).collect();
        let mut out = String::new();

        writeln!(out, "c Following is the literal map:")?;
        writeln!(out, "c")?;
        writeln!(out, "cc$K$ALWAYS_SUM")?;
        writeln!(out, "cc$S$NORMAL")?;
        writeln!(out, "cc$N${}", var_count as usize + parameters.len())?;
        writeln!(out, "cc$v${}", var_count)?;
        for var in 0..var_count {
            writeln!(out, "cc$V$x{}$2", var)?;
        }
        writeln!(out, "cc$t$0")?;

        for var in 0..var_count {
            writeln!(out, "cc$I$-{}${:.1}$+$x{}$0", var + 1, DEFAULT_WEIGHT, var)?;
            writeln!(out, "cc$I${}${:.1}$+$x{}$1", var + 1, DEFAULT_WEIGHT, var)?;
        }
        for lit in parameters {
            writeln!(out, "cc$C$-{}${}$I$", lit, format_g(self.get(-lit), 8))?;
            writeln!(out, "cc$C${}${}$I$", lit, format_g(self.get(lit), 8))?;
        }

        Ok(out)
    }
}

/// Formats `value` like C's `%.<precision>g`.
pub fn format_g(value: f64, precision: usize) -> String {
    if value == 0.0 {
        return "0".to_string();
    }
    if !value.is_finite() {
        return value.to_string();
    }
    let precision = precision.max(1);

    let sci = format!("{:.*e}", precision - 1, value);
    let (mantissa, exp) = sci.split_once('e').unwrap_or((&sci, "0"));
    let exp: i32 = exp.parse().unwrap_or(0);

    if exp < -4 || exp >= precision as i32 {
        let sign = if exp < 0 { '-' } else { '+' };
        format!("{}e{}{:02}", trim_zeros(mantissa), sign, exp.abs())
    } else {
        let decimals = (precision as i32 - 1 - exp) as usize;
        trim_zeros(&format!("{:.*}", decimals, value)).to_string()
    }
}

fn trim_zeros(s: &str) -> &str {
    if s.contains('.') {
        s.trim_end_matches('0').trim_end_matches('.')
    } else {
        s
    }
}
