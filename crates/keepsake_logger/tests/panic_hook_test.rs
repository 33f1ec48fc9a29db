//! Tests for panic reporting through the logger.
//!
//! The panic hook is process-wide, so everything lives in one test.

use keepsake_core::Environment;
use keepsake_error::CollectorError;
use keepsake_logger::{
    Collector, CollectorEvent, Logger, SpanRecord, StructuredLog, install_panic_hook,
};
use parking_lot::Mutex;
use std::panic::catch_unwind;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

#[derive(Default)]
struct FlakyCollector {
    explode: AtomicBool,
    events: Mutex<Vec<CollectorEvent>>,
}

impl Collector for FlakyCollector {
    fn capture(&self, event: CollectorEvent) -> Result<(), CollectorError> {
        if self.explode.load(Ordering::SeqCst) {
            panic!("collector exploded");
        }
        self.events.lock().push(event);
        Ok(())
    }

    fn record_span(&self, _span: SpanRecord) -> Result<(), CollectorError> {
        Ok(())
    }
}

#[test]
fn test_panic_hook_reports_and_survives_collector_panics() {
    let collector = Arc::new(FlakyCollector::default());
    let logger: Arc<dyn StructuredLog> = Arc::new(Logger::new(
        Environment::Production,
        collector.clone(),
    ));
    install_panic_hook(logger);

    let caught = catch_unwind(|| panic!("application panic"));
    assert!(caught.is_err());

    let events = collector.events.lock().clone();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].message(), "Unhandled panic");
    assert_eq!(
        events[0].tags().get("panic").map(String::as_str),
        Some("application panic")
    );
    assert!(events[0].tags().contains_key("location"));

    // A collector that panics while the hook runs must not abort the process.
    collector.explode.store(true, Ordering::SeqCst);
    let caught = catch_unwind(|| panic!("second application panic"));
    assert!(caught.is_err());
    assert_eq!(collector.events.lock().len(), 1);

    collector.explode.store(false, Ordering::SeqCst);
    let caught = catch_unwind(|| panic!("third application panic"));
    assert!(caught.is_err());
    assert_eq!(collector.events.lock().len(), 2);
}
