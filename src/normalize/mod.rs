//! Result normalizer: reshapes query results into aligned, chart-ready series.

pub mod pipeline;
pub mod rules;

#[cfg(test)]
mod test_properties;
