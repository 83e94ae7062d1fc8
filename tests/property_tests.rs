//! Property-based tests for structured_logger using proptest

use proptest::prelude::*;
use structured_logger::platform::sanitize_query;
use structured_logger::prelude::*;
use structured_logger::writers::{ConsoleConfig, ConsoleWriter};

fn any_level() -> impl Strategy<Value = LogLevel> {
    prop_oneof![
        Just(LogLevel::Debug),
        Just(LogLevel::Info),
        Just(LogLevel::Warn),
        Just(LogLevel::Error),
        Just(LogLevel::Fatal),
    ]
}

fn scalar_value() -> impl Strategy<Value = FieldValue> {
    prop_oneof![
        Just(FieldValue::Null),
        any::<bool>().prop_map(FieldValue::Bool),
        any::<i64>().prop_map(FieldValue::Int),
        (-1.0e9f64..1.0e9f64).prop_map(FieldValue::Float),
        "[a-zA-Z0-9 ]{0,16}".prop_map(FieldValue::String),
    ]
}

// ============================================================================
// LogLevel Tests
// ============================================================================

proptest! {
    /// Level string conversions roundtrip
    #[test]
    fn test_log_level_str_roundtrip(level in any_level()) {
        let parsed: LogLevel = level.to_str().parse().unwrap();
        prop_assert_eq!(level, parsed);
        prop_assert_eq!(format!("{}", level), level.to_str());
    }

    /// Ordering agrees with numeric rank
    #[test]
    fn test_log_level_ordering(a in any_level(), b in any_level()) {
        prop_assert_eq!(a <= b, a.rank() <= b.rank());
        prop_assert_eq!(a < b, a.rank() < b.rank());
    }

    /// Parsing is case-insensitive
    #[test]
    fn test_log_level_case_insensitive(level in any_level(), upper in any::<bool>()) {
        let input = if upper {
            level.to_str().to_uppercase()
        } else {
            level.to_str().to_string()
        };
        prop_assert_eq!(input.parse::<LogLevel>(), Ok(level));
    }

    /// Writers see exactly the levels at or above the threshold, in call order
    #[test]
    fn test_level_filtering(threshold in any_level(), calls in prop::collection::vec(any_level(), 0..30)) {
        let memory = MemoryWriter::new();
        let logger = Logger::builder()
            .min_level(threshold)
            .writer(memory.clone())
            .build();

        for (i, level) in calls.iter().enumerate() {
            logger.log(*level, format!("{}", i));
        }

        let expected: Vec<(LogLevel, String)> = calls
            .iter()
            .enumerate()
            .filter(|(_, level)| **level >= threshold)
            .map(|(i, level)| (*level, i.to_string()))
            .collect();
        let actual: Vec<(LogLevel, String)> = memory
            .entries()
            .into_iter()
            .map(|e| (e.level, e.message))
            .collect();
        prop_assert_eq!(actual, expected);
    }
}

// ============================================================================
// Field hoisting
// ============================================================================

proptest! {
    /// Hoisted keys never stay in metadata, other keys are untouched
    #[test]
    fn test_hoisted_keys_leave_metadata(
        user_id in "[a-z0-9-]{1,12}",
        duration in 0.0f64..1.0e6,
        extra in prop::collection::btree_map("x[a-z]{0,7}", scalar_value(), 0..6)
    ) {
        let mut metadata: Metadata = extra
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        metadata.insert(keys::USER_ID, user_id.as_str());
        metadata.insert(keys::DURATION, duration);

        let entry = LogEntry::new(LogLevel::Info, LogSource::Server, "m", metadata);

        prop_assert_eq!(entry.user_id.as_deref(), Some(user_id.as_str()));
        prop_assert_eq!(entry.duration, Some(duration));
        match entry.metadata {
            None => prop_assert!(extra.is_empty()),
            Some(ref remaining) => {
                prop_assert!(!remaining.is_empty());
                prop_assert!(!remaining.contains_key(keys::USER_ID));
                prop_assert!(!remaining.contains_key(keys::DURATION));
                prop_assert_eq!(remaining.len(), extra.len());
            }
        }
    }

    /// Entries survive a JSON line roundtrip
    #[test]
    fn test_log_entry_json_roundtrip(
        message in ".*",
        level in any_level(),
        extra in prop::collection::btree_map("[a-z]{1,8}", scalar_value(), 0..4)
    ) {
        let metadata: Metadata = extra.into_iter().collect();
        let entry = LogEntry::new(level, LogSource::Auth, message, metadata);

        let line = entry.to_json_line().unwrap();
        prop_assert!(!line.contains('\n'));

        let parsed: LogEntry = serde_json::from_str(&line).unwrap();
        prop_assert_eq!(parsed.id, entry.id);
        prop_assert_eq!(parsed.level, entry.level);
        prop_assert_eq!(parsed.message, entry.message);
    }
}

// ============================================================================
// Output safety
// ============================================================================

proptest! {
    /// Console output keeps one entry on one line
    #[test]
    fn test_console_line_has_no_raw_newlines(message in "(?s).{0,60}") {
        let writer = ConsoleWriter::with_config(ConsoleConfig::default().with_colors(false));
        let entry = LogEntry::new(LogLevel::Info, LogSource::Server, message, Metadata::new());

        let line = writer.format_entry(&entry);
        prop_assert!(!line.contains('\n'));
        prop_assert!(!line.contains('\r'));
    }

    /// Quoted literal contents never reach the sanitized query
    #[test]
    fn test_sanitize_query_hides_literals(
        prefix in "SELECT [a-z]{1,10} FROM [a-z]{1,10} WHERE [a-z]{1,5} = ",
        secret in "[0-9@.]{6,20}"
    ) {
        let query = format!("{}'{}'", prefix, secret);
        let sanitized = sanitize_query(&query);

        prop_assert!(!sanitized.contains(&secret));
        prop_assert!(sanitized.ends_with("'[REDACTED]'"));
    }

    /// Sanitized queries are bounded and single-spaced
    #[test]
    fn test_sanitize_query_bounded(query in ".{0,400}") {
        let sanitized = sanitize_query(&query);

        prop_assert!(sanitized.chars().count() <= 203);
        prop_assert!(!sanitized.contains("  "));
        prop_assert!(!sanitized.contains('\n'));
    }
}
