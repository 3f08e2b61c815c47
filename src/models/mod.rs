// Domain models shared by the fetcher, store, reports and HTTP layer.

mod counter;
mod registry;
mod report;

pub use counter::{CounterReading, Counters, LatestCounter, Metric, NewReading};
pub use registry::{ClientAgent, NewClientAgent, NewPrinterSource, PrintJob, PrinterSource};
pub use report::{
    CounterEvent, DailyTotal, GroupBy, JobPrinterReading, ReportQuery, ReportRow, Window,
    WindowError,
};

/// Placeholder shown wherever no registry knows a value.
pub const UNDEFINED: &str = "Não definido";
