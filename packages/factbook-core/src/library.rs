//! In-memory list shaping for the library views.
//!
//! The list pages fetch everything once and filter/sort/paginate locally, so
//! these helpers are pure functions over slices with no I/O.

use crate::api::types::{LlmLog, Strategy};

/// Strategy type → display label, as the library pages render them.
pub const STRATEGY_TYPE_LABELS: &[(&str, &str)] = &[
    ("tv-advertising", "TV Advertising Strategy"),
    ("performance-marketing", "Performance Marketing Strategy"),
    ("sns-content", "SNS Content Strategy"),
    ("influencer-marketing", "Influencer Marketing Strategy"),
    ("brand-positioning", "Brand Positioning Strategy"),
];

/// Display label for a strategy type, falling back to the raw type key.
pub fn strategy_type_label(strategy_type: &str) -> &str {
    STRATEGY_TYPE_LABELS
        .iter()
        .find(|(key, _)| *key == strategy_type)
        .map(|(_, label)| *label)
        .unwrap_or(strategy_type)
}

// ============================================================================
// Strategy filtering & sorting
// ============================================================================

/// Filter criteria for the strategy library.
#[derive(Debug, Clone, Default)]
pub struct StrategyFilter {
    /// Case-insensitive substring match over title, brand, creator and
    /// description.
    pub search: Option<String>,
    pub industry: Option<String>,
    pub strategy_type: Option<String>,
}

impl StrategyFilter {
    fn matches(&self, strategy: &Strategy) -> bool {
        if let Some(industry) = &self.industry {
            if strategy.industry.as_deref() != Some(industry.as_str()) {
                return false;
            }
        }
        if let Some(strategy_type) = &self.strategy_type {
            if strategy.strategy_type != *strategy_type {
                return false;
            }
        }
        if let Some(search) = &self.search {
            let query = search.to_lowercase();
            if query.is_empty() {
                return true;
            }
            let haystacks = [
                Some(strategy.title.as_str()),
                strategy.brand_name.as_deref(),
                Some(strategy.creator.as_str()),
                strategy.description.as_deref(),
            ];
            return haystacks
                .into_iter()
                .flatten()
                .any(|text| text.to_lowercase().contains(&query));
        }
        true
    }
}

/// Sort order for the strategy library.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StrategySort {
    /// Newest first. Rows without a timestamp sort last.
    #[default]
    Latest,
    /// Oldest first.
    Oldest,
    /// Alphabetical by brand name, then title.
    Name,
    /// Grouped by strategy type.
    Kind,
    /// Most viewed first.
    Views,
}

/// Filter and sort strategies for display.
///
/// Sorting is stable, so rows that compare equal keep their fetch order.
pub fn shape_strategies<'a>(
    strategies: &'a [Strategy],
    filter: &StrategyFilter,
    sort: StrategySort,
) -> Vec<&'a Strategy> {
    let mut shaped: Vec<&Strategy> = strategies.iter().filter(|s| filter.matches(s)).collect();

    match sort {
        StrategySort::Latest => {
            shaped.sort_by(|a, b| match (&a.created_at, &b.created_at) {
                (Some(a_at), Some(b_at)) => b_at.cmp(a_at),
                (Some(_), None) => std::cmp::Ordering::Less,
                (None, Some(_)) => std::cmp::Ordering::Greater,
                (None, None) => std::cmp::Ordering::Equal,
            });
        }
        StrategySort::Oldest => {
            shaped.sort_by(|a, b| match (&a.created_at, &b.created_at) {
                (Some(a_at), Some(b_at)) => a_at.cmp(b_at),
                (Some(_), None) => std::cmp::Ordering::Less,
                (None, Some(_)) => std::cmp::Ordering::Greater,
                (None, None) => std::cmp::Ordering::Equal,
            });
        }
        StrategySort::Name => {
            shaped.sort_by(|a, b| {
                let a_key = (a.brand_name.as_deref().unwrap_or(""), a.title.as_str());
                let b_key = (b.brand_name.as_deref().unwrap_or(""), b.title.as_str());
                a_key.cmp(&b_key)
            });
        }
        StrategySort::Kind => {
            shaped.sort_by(|a, b| a.strategy_type.cmp(&b.strategy_type));
        }
        StrategySort::Views => {
            shaped.sort_by(|a, b| b.views.cmp(&a.views));
        }
    }

    shaped
}

// ============================================================================
// Pagination
// ============================================================================

/// A window over an already-shaped list, as the activities feed loads it.
pub fn paginate<T>(items: &[T], offset: usize, limit: usize) -> &[T] {
    let start = offset.min(items.len());
    let end = start.saturating_add(limit).min(items.len());
    &items[start..end]
}

// ============================================================================
// LLM log filtering & stats
// ============================================================================

/// Filter criteria for the admin log view.
#[derive(Debug, Clone, Default)]
pub struct LogFilter {
    /// Case-insensitive substring match over prompt type, user id and error
    /// message.
    pub search: Option<String>,
    pub status: Option<String>,
    pub llm_type: Option<String>,
}

impl LogFilter {
    fn matches(&self, log: &LlmLog) -> bool {
        if let Some(status) = &self.status {
            if log.status != *status {
                return false;
            }
        }
        if let Some(llm_type) = &self.llm_type {
            if log.llm_type != *llm_type {
                return false;
            }
        }
        if let Some(search) = &self.search {
            let query = search.to_lowercase();
            if query.is_empty() {
                return true;
            }
            let haystacks = [
                Some(log.prompt_type.as_str()),
                log.user_id.as_deref(),
                log.error_message.as_deref(),
            ];
            return haystacks
                .into_iter()
                .flatten()
                .any(|text| text.to_lowercase().contains(&query));
        }
        true
    }
}

/// Filter logs for display, newest fetch order preserved.
pub fn filter_logs<'a>(logs: &'a [LlmLog], filter: &LogFilter) -> Vec<&'a LlmLog> {
    logs.iter().filter(|log| filter.matches(log)).collect()
}

/// Aggregates over a filtered log set, as the admin page's summary cards.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LogStats {
    pub total: usize,
    pub success: usize,
    pub failed: usize,
    pub total_input_tokens: i64,
    pub total_output_tokens: i64,
    pub total_tokens: i64,
    pub average_elapsed: f64,
}

impl LogStats {
    pub fn compute(logs: &[&LlmLog]) -> Self {
        let total = logs.len();
        let success = logs.iter().filter(|l| l.status == "success").count();
        let failed = logs.iter().filter(|l| l.status == "error").count();
        let total_input_tokens = logs.iter().filter_map(|l| l.prompt_length).sum();
        let total_output_tokens = logs.iter().filter_map(|l| l.completion_length).sum();
        let total_tokens = logs.iter().filter_map(|l| l.total_tokens).sum();
        let average_elapsed = if total == 0 {
            0.0
        } else {
            logs.iter().filter_map(|l| l.elapsed_time).sum::<f64>() / total as f64
        };

        Self {
            total,
            success,
            failed,
            total_input_tokens,
            total_output_tokens,
            total_tokens,
            average_elapsed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn strategy(id: i64, title: &str, strategy_type: &str, day: Option<u32>, views: i64) -> Strategy {
        Strategy {
            id,
            factbook_id: 1,
            creator: "minji".to_string(),
            strategy_type: strategy_type.to_string(),
            title: title.to_string(),
            description: None,
            problem: serde_json::Value::Null,
            insight: serde_json::Value::Null,
            goal_target: serde_json::Value::Null,
            direction: serde_json::Value::Null,
            execution: serde_json::Value::Null,
            brand_name: Some("Acme".to_string()),
            industry: Some("beverage".to_string()),
            views,
            created_at: day.map(|d| {
                NaiveDate::from_ymd_opt(2024, 6, d)
                    .unwrap()
                    .and_hms_opt(9, 0, 0)
                    .unwrap()
            }),
            updated_at: None,
        }
    }

    #[test]
    fn search_matches_across_fields_case_insensitively() {
        let strategies = vec![
            strategy(1, "Summer launch", "sns-content", Some(1), 5),
            strategy(2, "Winter push", "tv-advertising", Some(2), 9),
        ];

        let filter = StrategyFilter {
            search: Some("SUMMER".to_string()),
            ..Default::default()
        };
        let shaped = shape_strategies(&strategies, &filter, StrategySort::Latest);
        assert_eq!(shaped.len(), 1);
        assert_eq!(shaped[0].id, 1);

        // Creator matches too.
        let filter = StrategyFilter {
            search: Some("minji".to_string()),
            ..Default::default()
        };
        assert_eq!(shape_strategies(&strategies, &filter, StrategySort::Latest).len(), 2);
    }

    #[test]
    fn latest_sort_puts_missing_timestamps_last() {
        let strategies = vec![
            strategy(1, "a", "sns-content", Some(1), 0),
            strategy(2, "b", "sns-content", None, 0),
            strategy(3, "c", "sns-content", Some(5), 0),
        ];
        let shaped = shape_strategies(&strategies, &StrategyFilter::default(), StrategySort::Latest);
        let ids: Vec<i64> = shaped.iter().map(|s| s.id).collect();
        assert_eq!(ids, vec![3, 1, 2]);
    }

    #[test]
    fn views_sort_is_descending() {
        let strategies = vec![
            strategy(1, "a", "sns-content", Some(1), 3),
            strategy(2, "b", "sns-content", Some(2), 11),
            strategy(3, "c", "sns-content", Some(3), 7),
        ];
        let shaped = shape_strategies(&strategies, &StrategyFilter::default(), StrategySort::Views);
        let ids: Vec<i64> = shaped.iter().map(|s| s.id).collect();
        assert_eq!(ids, vec![2, 3, 1]);
    }

    #[test]
    fn type_filter_composes_with_search() {
        let strategies = vec![
            strategy(1, "Summer launch", "sns-content", Some(1), 0),
            strategy(2, "Summer rerun", "tv-advertising", Some(2), 0),
        ];
        let filter = StrategyFilter {
            search: Some("summer".to_string()),
            strategy_type: Some("tv-advertising".to_string()),
            ..Default::default()
        };
        let shaped = shape_strategies(&strategies, &filter, StrategySort::Latest);
        assert_eq!(shaped.len(), 1);
        assert_eq!(shaped[0].id, 2);
    }

    #[test]
    fn paginate_clamps_out_of_range_windows() {
        let items = vec![1, 2, 3, 4, 5];
        assert_eq!(paginate(&items, 0, 2), &[1, 2]);
        assert_eq!(paginate(&items, 4, 10), &[5]);
        assert!(paginate(&items, 9, 3).is_empty());
    }

    fn log(id: i64, status: &str, llm_type: &str, tokens: Option<i64>, elapsed: Option<f64>) -> LlmLog {
        LlmLog {
            id,
            created_at: None,
            user_id: Some("admin".to_string()),
            strategy_id: None,
            factbook_id: None,
            llm_type: llm_type.to_string(),
            prompt_type: "factbook-section".to_string(),
            prompt_length: Some(100),
            completion_length: Some(50),
            total_tokens: tokens,
            elapsed_time: elapsed,
            status: status.to_string(),
            error_message: None,
        }
    }

    #[test]
    fn log_stats_aggregate_filtered_rows() {
        let logs = vec![
            log(1, "success", "gpt-4o", Some(150), Some(2.0)),
            log(2, "error", "gpt-4o", None, Some(4.0)),
            log(3, "success", "gemini-2.5-pro", Some(300), None),
        ];

        let filtered = filter_logs(&logs, &LogFilter::default());
        let stats = LogStats::compute(&filtered);
        assert_eq!(stats.total, 3);
        assert_eq!(stats.success, 2);
        assert_eq!(stats.failed, 1);
        assert_eq!(stats.total_tokens, 450);
        assert!((stats.average_elapsed - 2.0).abs() < 1e-9);

        let filtered = filter_logs(
            &logs,
            &LogFilter {
                llm_type: Some("gpt-4o".to_string()),
                ..Default::default()
            },
        );
        assert_eq!(filtered.len(), 2);
    }

    #[test]
    fn labels_fall_back_to_raw_type() {
        assert_eq!(strategy_type_label("sns-content"), "SNS Content Strategy");
        assert_eq!(strategy_type_label("guerrilla"), "guerrilla");
    }
}
