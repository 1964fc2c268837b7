//! Dashboard and report figures.
//!
//! Everything here is recomputed from the store on each call. Nothing is cached, so figures can
//! never drift from the records they summarise.

use crate::billing::Invoice;
use crate::diagnostics::ResultStatus;
use crate::settlement::InvoiceStatus;
use crate::store::EntityStore;
use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct DashboardCounters {
    pub patient_count: usize,
    pub pending_result_count: usize,
    /// Sum of every recorded payment.
    pub total_collected_revenue: Decimal,
}

/// Billed and collected figures for one calendar month.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct MonthlyFigures {
    pub billed: Decimal,
    /// Payments on invoices issued in the month, whenever they were made.
    pub collected: Decimal,
}

/// Total billed, grouped by derived invoice status.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct StatusBreakdown {
    pub paid: Decimal,
    pub partial: Decimal,
    pub unpaid: Decimal,
}

impl StatusBreakdown {
    pub fn get(&self, status: InvoiceStatus) -> Decimal {
        match status {
            InvoiceStatus::Paid => self.paid,
            InvoiceStatus::Partial => self.partial,
            InvoiceStatus::Unpaid => self.unpaid,
        }
    }

    fn slot_mut(&mut self, status: InvoiceStatus) -> &mut Decimal {
        match status {
            InvoiceStatus::Paid => &mut self.paid,
            InvoiceStatus::Partial => &mut self.partial,
            InvoiceStatus::Unpaid => &mut self.unpaid,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ReportTotals {
    pub patient_count: usize,
    pub total_billed: Decimal,
    pub total_collected: Decimal,
    /// Sum of balances still due; overpayments do not offset other invoices.
    pub total_outstanding: Decimal,
}

pub fn dashboard_counters(store: &EntityStore) -> DashboardCounters {
    DashboardCounters {
        patient_count: store.patient_count(),
        pending_result_count: store
            .diagnostic_results()
            .filter(|r| r.status == ResultStatus::Pending)
            .count(),
        total_collected_revenue: store.invoices().map(Invoice::paid_total).sum(),
    }
}

/// Invoice amounts summed by issue date, in ascending date order.
pub fn daily_revenue_series(store: &EntityStore) -> BTreeMap<NaiveDate, Decimal> {
    let mut series = BTreeMap::new();
    for invoice in store.invoices() {
        *series.entry(invoice.date).or_insert(Decimal::ZERO) += invoice.amount;
    }
    series
}

/// Billed and collected figures keyed by `YYYY-MM`, in ascending order.
pub fn monthly_financial_series(store: &EntityStore) -> BTreeMap<String, MonthlyFigures> {
    let mut series: BTreeMap<String, MonthlyFigures> = BTreeMap::new();
    for invoice in store.invoices() {
        let key = month_key(invoice.date);
        let figures = series.entry(key).or_default();
        figures.billed += invoice.amount;
        figures.collected += invoice.paid_total();
    }
    series
}

pub fn status_breakdown(store: &EntityStore) -> StatusBreakdown {
    let mut breakdown = StatusBreakdown::default();
    for invoice in store.invoices() {
        *breakdown.slot_mut(invoice.status()) += invoice.amount;
    }
    breakdown
}

pub fn report_totals(store: &EntityStore) -> ReportTotals {
    let mut totals = ReportTotals {
        patient_count: store.patient_count(),
        ..ReportTotals::default()
    };
    for invoice in store.invoices() {
        let settlement = invoice.settlement();
        totals.total_billed += invoice.amount;
        totals.total_collected += settlement.paid_total;
        totals.total_outstanding += settlement.balance_due;
    }
    totals
}

fn month_key(date: NaiveDate) -> String {
    format!("{:04}-{:02}", date.year(), date.month())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::baseline::{baseline_invoices, baseline_patients, baseline_results};
    use crate::billing::NewPayment;
    use crate::config::OverpaymentPolicy;
    use clinic_ids::{InvoiceId, PatientId};

    fn money(value: &str) -> Decimal {
        value.parse().expect("valid decimal")
    }

    fn baseline_store() -> EntityStore {
        EntityStore::from_snapshots(
            baseline_patients(),
            baseline_results(),
            baseline_invoices(),
            OverpaymentPolicy::Allow,
        )
    }

    #[test]
    fn test_empty_store_gives_zeroes() {
        let store = EntityStore::default();

        assert_eq!(dashboard_counters(&store), DashboardCounters::default());
        assert!(daily_revenue_series(&store).is_empty());
        assert!(monthly_financial_series(&store).is_empty());
        assert_eq!(status_breakdown(&store), StatusBreakdown::default());
        assert_eq!(report_totals(&store), ReportTotals::default());
    }

    #[test]
    fn test_dashboard_counters_on_baseline() {
        let counters = dashboard_counters(&baseline_store());

        assert_eq!(counters.patient_count, 3);
        assert_eq!(counters.pending_result_count, 1);
        assert_eq!(counters.total_collected_revenue, money("850"));
    }

    #[test]
    fn test_collected_revenue_follows_payments() {
        let mut store = baseline_store();
        store
            .record_payment(InvoiceId::new(5003), NewPayment::new(money("200.50")))
            .unwrap();

        let counters = dashboard_counters(&store);
        assert_eq!(counters.total_collected_revenue, money("1050.50"));
    }

    #[test]
    fn test_daily_series_is_sorted_and_summed() {
        let mut store = baseline_store();
        let today = store.create_invoice(PatientId::new(1002), money("75")).unwrap().date;
        store.create_invoice(PatientId::new(1003), money("25")).unwrap();

        let series = daily_revenue_series(&store);
        let dates: Vec<_> = series.keys().copied().collect();
        let mut sorted = dates.clone();
        sorted.sort();

        assert_eq!(dates, sorted);
        assert_eq!(series[&NaiveDate::from_ymd_opt(2025, 10, 10).unwrap()], money("500"));
        assert_eq!(series[&today], money("100"));
    }

    #[test]
    fn test_monthly_series() {
        let series = monthly_financial_series(&baseline_store());

        assert_eq!(series.len(), 1);
        let october = series["2025-10"];
        assert_eq!(october.billed, money("2050"));
        assert_eq!(october.collected, money("850"));
    }

    #[test]
    fn test_status_breakdown() {
        let mut store = baseline_store();
        store
            .record_payment(InvoiceId::new(5003), NewPayment::new(money("100")))
            .unwrap();

        let breakdown = status_breakdown(&store);
        assert_eq!(breakdown.paid, money("850"));
        assert_eq!(breakdown.partial, money("1200"));
        assert_eq!(breakdown.unpaid, Decimal::ZERO);
        assert_eq!(breakdown.get(InvoiceStatus::Partial), money("1200"));
    }

    #[test]
    fn test_report_totals() {
        let mut store = baseline_store();
        store
            .record_payment(InvoiceId::new(5003), NewPayment::new(money("200")))
            .unwrap();

        let totals = report_totals(&store);
        assert_eq!(totals.patient_count, 3);
        assert_eq!(totals.total_billed, money("2050"));
        assert_eq!(totals.total_collected, money("1050"));
        assert_eq!(totals.total_outstanding, money("1000"));
    }

    #[test]
    fn test_overpayment_does_not_reduce_outstanding_elsewhere() {
        let mut store = baseline_store();
        let small = store.create_invoice(PatientId::new(1002), money("100")).unwrap().id;
        store
            .record_payment(small, NewPayment::new(money("150")))
            .unwrap();

        let totals = report_totals(&store);
        assert_eq!(totals.total_outstanding, money("1200"));
        assert_eq!(totals.total_collected, money("1000"));
    }
}
