use serde::Serialize;
use std::collections::HashSet;

/// Progress of identifier paging over one remote collection.
///
/// `collected.len() == min(next_offset, total)` holds between pages as long
/// as the remote collection does not change during the run.
#[derive(Debug, Clone, Serialize)]
pub struct BatchCursor {
    pub total: u64,
    pub next_offset: u64,
    collected: Vec<i64>,
    #[serde(skip)]
    seen: HashSet<i64>,
    exhausted: bool,
}

impl BatchCursor {
    pub fn new(total: u64) -> Self {
        BatchCursor {
            total,
            next_offset: 0,
            collected: Vec::new(),
            seen: HashSet::new(),
            exhausted: total == 0,
        }
    }

    /// Records one page of identifiers and returns how many were accepted.
    ///
    /// The offset advances by the page length as returned. Identifiers already
    /// seen, or past `total`, are dropped. An empty page ends paging.
    pub fn advance(&mut self, page: &[i64]) -> usize {
        if page.is_empty() {
            self.exhausted = true;
            return 0;
        }

        self.next_offset += page.len() as u64;

        let mut accepted = 0;
        for id in page {
            if self.collected.len() as u64 >= self.total {
                break;
            }
            if self.seen.insert(*id) {
                self.collected.push(*id);
                accepted += 1;
            }
        }

        if self.next_offset >= self.total || self.collected.len() as u64 >= self.total {
            self.exhausted = true;
        }

        accepted
    }

    pub fn is_done(&self) -> bool {
        self.exhausted
    }

    pub fn collected(&self) -> &[i64] {
        &self.collected
    }

    pub fn into_ids(self) -> Vec<i64> {
        self.collected
    }
}
