use prometheus::{Histogram, IntCounter, IntCounterVec, Registry};

#[derive(Clone)]
pub struct LedgerMetrics {
    pub registry: Registry,
    pub stock_adjustments_total: IntCounterVec,
    pub insufficient_stock_rejections: IntCounter,
    pub initializations_total: IntCounter,
    pub adjust_duration_seconds: Histogram,
    pub http_errors_total: IntCounterVec,
}

impl LedgerMetrics {
    pub fn new() -> Self {
        let registry = Registry::new();
        let stock_adjustments_total = IntCounterVec::new(
            prometheus::Opts::new(
                "stock_adjustments_total",
                "Committed stock adjustments by movement type",
            ),
            &["movement_type"],
        )
        .unwrap();
        let insufficient_stock_rejections = IntCounter::new(
            "insufficient_stock_rejections_total",
            "Adjustments rejected because stock would go negative",
        )
        .unwrap();
        let initializations_total = IntCounter::new(
            "inventory_initializations_total",
            "Stock records created via initialize",
        )
        .unwrap();
        let adjust_duration_seconds = Histogram::with_opts(
            prometheus::HistogramOpts::new(
                "stock_adjust_duration_seconds",
                "Duration of one adjust transaction (lock to commit)",
            )
            .buckets(vec![0.001, 0.005, 0.01, 0.05, 0.1, 0.25, 0.5, 1.0]),
        )
        .unwrap();
        let http_errors_total = IntCounterVec::new(
            prometheus::Opts::new(
                "http_errors_total",
                "Count of HTTP error responses emitted (status >= 400)",
            ),
            &["service", "code", "status"],
        )
        .unwrap();
        let _ = registry.register(Box::new(stock_adjustments_total.clone()));
        let _ = registry.register(Box::new(insufficient_stock_rejections.clone()));
        let _ = registry.register(Box::new(initializations_total.clone()));
        let _ = registry.register(Box::new(adjust_duration_seconds.clone()));
        let _ = registry.register(Box::new(http_errors_total.clone()));
        LedgerMetrics {
            registry,
            stock_adjustments_total,
            insufficient_stock_rejections,
            initializations_total,
            adjust_duration_seconds,
            http_errors_total,
        }
    }
}

impl Default for LedgerMetrics {
    fn default() -> Self {
        Self::new()
    }
}
