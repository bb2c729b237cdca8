//! Plain-text rendering of scan reports

use std::fmt;
use vrsi_core::{Decision, ScanResult};
use vrsi_scanner::ScanReport;
use vrsi_signal::index_series;

/// Ranked result table, optionally filtered and truncated
pub struct ResultTable<'a> {
    report: &'a ScanReport,
    filter: Option<Decision>,
    top: Option<usize>,
}

impl<'a> ResultTable<'a> {
    pub fn new(report: &'a ScanReport) -> Self {
        ResultTable {
            report,
            filter: None,
            top: None,
        }
    }

    pub fn with_filter(mut self, filter: Option<Decision>) -> Self {
        self.filter = filter;
        self
    }

    pub fn with_top(mut self, top: Option<usize>) -> Self {
        self.top = top;
        self
    }

    /// Rows in print order
    pub fn rows(&self) -> Vec<&'a ScanResult> {
        let ranked = match self.filter {
            Some(decision) => self.report.filter(decision),
            None => self.report.ranked(),
        };
        ranked
            .into_iter()
            .take(self.top.unwrap_or(usize::MAX))
            .collect()
    }
}

impl fmt::Display for ResultTable<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let derivatives = self.report.market.is_derivatives();

        write!(
            f,
            "{:>4}  {:<14} {:>16} {:>8} {:>7} {:>8}  {:<8}",
            "#", "SYMBOL", "PRICE", "CHG%", "V-RSI", "SIGNAL", "DECISION"
        )?;
        if derivatives {
            write!(f, " {:>10} {:>16} {:>8}", "FUNDING%", "OPEN INT", "OI CHG%")?;
        }
        writeln!(f)?;

        let rows = self.rows();
        if rows.is_empty() {
            return writeln!(f, "      (no results)");
        }

        for (rank, r) in rows.iter().enumerate() {
            write!(
                f,
                "{:>4}  {:<14} {:>16} {:>8} {:>7.2} {:>8.4}  {:<8}",
                rank + 1,
                r.symbol.as_str(),
                r.last_price.normalize().to_string(),
                r.percent_change.to_string(),
                r.raw_index,
                r.normalized_signal,
                r.decision.to_string()
            )?;
            if let Some(funding) = r.funding.filter(|_| derivatives) {
                let rate = (funding.funding_rate * rust_decimal::Decimal::ONE_HUNDRED).round_dp(4);
                write!(
                    f,
                    " {:>10} {:>16} {:>8}",
                    rate.normalize().to_string(),
                    funding.open_interest.round_dp(2).to_string(),
                    funding.open_interest_change_pct().to_string()
                )?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

/// One-line summary of a report
pub struct StatsLine<'a>(pub &'a ScanReport);

impl fmt::Display for StatsLine<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let report = self.0;
        let stats = report.stats();
        let progress = report.progress();

        write!(
            f,
            "{} {} {} | scanned {}/{}",
            report.exchange, report.market, report.interval, progress.completed, progress.total
        )?;
        if report.is_cancelled() {
            write!(f, " (cancelled)")?;
        }
        write!(
            f,
            " | LONG {} | SHORT {} | NEUTRAL {}",
            stats.long, stats.short, stats.neutral
        )?;

        let failures = report.failures;
        if failures.dropped() > 0 {
            write!(
                f,
                " | skipped {} (fetch {}, short history {})",
                failures.dropped(),
                failures.candle_fetch,
                failures.insufficient_data
            )?;
        }
        if failures.funding_fetch > 0 {
            write!(f, " | funding unavailable for {}", failures.funding_fetch)?;
        }
        Ok(())
    }
}

/// Rolling index of one symbol, newest last
pub struct IndexSeriesView<'a> {
    result: &'a ScanResult,
    period: usize,
    rows: usize,
}

impl<'a> IndexSeriesView<'a> {
    pub fn new(result: &'a ScanResult, period: usize) -> Self {
        IndexSeriesView {
            result,
            period,
            rows: 20,
        }
    }
}

impl fmt::Display for IndexSeriesView<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let series = index_series(&self.result.candles, self.period);
        writeln!(f, "{} V-RSI({})", self.result.symbol, self.period)?;
        let skip = series.len().saturating_sub(self.rows);
        for point in &series[skip..] {
            writeln!(
                f,
                "  {}  {:>16}  {:>6.2}",
                point.open_time.format("%Y-%m-%d %H:%M"),
                point.close.normalize().to_string(),
                point.index
            )?;
        }
        Ok(())
    }
}
