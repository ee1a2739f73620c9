pub mod metrics;

pub use metrics::{
    evaluate, map_at_k, mar_at_k, precision_at_k, recall_at_k, retrieve_top_k,
    CutoffMetrics, EvaluationReport, RelevanceJudgments,
};
