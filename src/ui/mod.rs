pub mod panels;
pub mod plot;
pub mod tables;
pub mod views;

/// Format an optional statistic; undefined values render as a dash.
pub fn fmt_opt(value: Option<f64>, decimals: usize) -> String {
    match value {
        Some(v) => format!("{v:.decimals$}"),
        None => "—".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn undefined_renders_as_dash() {
        assert_eq!(fmt_opt(Some(2.346), 2), "2.35");
        assert_eq!(fmt_opt(Some(3.0), 0), "3");
        assert_eq!(fmt_opt(None, 2), "—");
    }
}
