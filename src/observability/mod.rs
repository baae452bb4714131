// Observability: metrics recorded by the crawler

pub mod metrics;
