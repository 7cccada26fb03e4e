//! History view model
//!
//! Turns stored question/answer records into per-day groups for the history
//! list and into chat transcripts for replaying a single day.

use crate::gateway::HistoryRecord;
use crate::store::ChatMessage;
use chrono::NaiveDate;
use std::collections::BTreeMap;

/// Records that share a calendar day
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryDay {
    pub date: NaiveDate,
    /// Oldest first
    pub records: Vec<HistoryRecord>,
}

impl HistoryDay {
    pub fn count(&self) -> usize {
        self.records.len()
    }

    /// Distinct subjects in order of first appearance
    pub fn subjects(&self) -> Vec<&str> {
        let mut subjects: Vec<&str> = Vec::new();
        for subject in self.records.iter().filter_map(|r| r.subject.as_deref()) {
            if !subjects.contains(&subject) {
                subjects.push(subject);
            }
        }
        subjects
    }

    /// First question asked that day
    pub fn preview(&self) -> Option<&str> {
        self.records.first().map(|r| r.question.as_str())
    }
}

/// Group records by day, newest day first
pub fn group_by_date(records: &[HistoryRecord]) -> Vec<HistoryDay> {
    let mut days: BTreeMap<NaiveDate, Vec<HistoryRecord>> = BTreeMap::new();
    for record in records {
        days.entry(record.day()).or_default().push(record.clone());
    }

    days.into_iter()
        .rev()
        .map(|(date, mut records)| {
            records.sort_by_key(|r| r.created_at);
            HistoryDay { date, records }
        })
        .collect()
}

/// Replay records as alternating user and assistant messages.
///
/// Assistant messages keep their question so they can be explained again.
pub fn transcript(records: &[HistoryRecord]) -> Vec<ChatMessage> {
    records
        .iter()
        .flat_map(|r| {
            [
                ChatMessage::user(r.question.clone()),
                ChatMessage::answer(r.answer.clone(), r.question.clone()),
            ]
        })
        .collect()
}
