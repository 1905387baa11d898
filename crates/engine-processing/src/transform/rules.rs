use engine_config::settings::entity::RecordRule;
use model::records::source::SourceRecord;

/// Whether `record` satisfies `rule`. A missing numeric value passes
/// `ExcludeNegative`, since it will be written as zero.
pub fn passes(rule: &RecordRule, record: &SourceRecord) -> bool {
    match rule {
        RecordRule::ExcludeNegative { field } => {
            record.get_f64(field).is_none_or(|value| value >= 0.0)
        }
        RecordRule::RequirePresent { field } => record.present(field).is_some(),
    }
}

/// First rule `record` fails, if any.
pub fn first_violation<'a>(rules: &'a [RecordRule], record: &SourceRecord) -> Option<&'a RecordRule> {
    rules.iter().find(|rule| !passes(rule, record))
}
