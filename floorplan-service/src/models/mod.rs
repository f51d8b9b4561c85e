pub mod records;

pub use records::{
    sort_newest_first, AnalysisRecord, HistoryEntry, ImageInfo, PlanRecord, RecordKind,
};
