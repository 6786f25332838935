use std::collections::HashMap;

use chrono::{Duration, NaiveDateTime};
use diesel::pg::PgConnection;
use diesel::prelude::*;
use uuid::Uuid;

use crate::models::Complaint;
use crate::schema::complaints;

pub const DEFAULT_WINDOW_HOURS: i64 = 24;
pub const DEFAULT_THRESHOLD: f64 = 0.8;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MatcherSettings {
    pub window: Duration,
    pub threshold: f64,
}

impl Default for MatcherSettings {
    fn default() -> Self {
        Self {
            window: Duration::hours(DEFAULT_WINDOW_HOURS),
            threshold: DEFAULT_THRESHOLD,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct DuplicateMatch<'a> {
    pub complaint: Option<&'a Complaint>,
    pub score: f64,
}

pub fn recent_history(
    conn: &mut PgConnection,
    submitter: Uuid,
    settings: &MatcherSettings,
    now: NaiveDateTime,
) -> QueryResult<Vec<Complaint>> {
    let since = now - settings.window;
    complaints::table
        .filter(complaints::user_id.eq(submitter))
        .filter(complaints::submitted_at.ge(since))
        .order(complaints::id.asc())
        .load(conn)
}

pub fn best_match<'a>(history: &'a [Complaint], candidate: &str, threshold: f64) -> DuplicateMatch<'a> {
    let mut best = DuplicateMatch {
        complaint: None,
        score: 0.0,
    };
    for complaint in history {
        let score = similarity_ratio(candidate, &complaint.content);
        // strict > keeps the lowest id on ties
        if score > threshold && score > best.score {
            best = DuplicateMatch {
                complaint: Some(complaint),
                score,
            };
        }
    }
    best
}

pub fn similarity_ratio(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.trim().to_lowercase().chars().collect();
    let b: Vec<char> = b.trim().to_lowercase().chars().collect();
    let total = a.len() + b.len();
    if total == 0 {
        return 1.0;
    }
    let matched = SequenceIndex::new(&b).matching_total(&a);
    2.0 * matched as f64 / total as f64
}

const POPULAR_MIN_LEN: usize = 200;

struct SequenceIndex<'b> {
    b: &'b [char],
    positions: HashMap<char, Vec<usize>>,
}

impl<'b> SequenceIndex<'b> {
    fn new(b: &'b [char]) -> Self {
        let mut positions: HashMap<char, Vec<usize>> = HashMap::new();
        for (j, ch) in b.iter().enumerate() {
            positions.entry(*ch).or_default().push(j);
        }
        if b.len() >= POPULAR_MIN_LEN {
            let limit = b.len() / 100 + 1;
            positions.retain(|_, indices| indices.len() <= limit);
        }
        Self { b, positions }
    }

    fn matching_total(&self, a: &[char]) -> usize {
        let mut total = 0;
        let mut run_lengths = HashMap::new();
        let mut next = HashMap::new();
        let mut pending = vec![(0, a.len(), 0, self.b.len())];
        while let Some((alo, ahi, blo, bhi)) = pending.pop() {
            let (i, j, size) =
                self.longest_match(a, (alo, ahi, blo, bhi), &mut run_lengths, &mut next);
            if size == 0 {
                continue;
            }
            total += size;
            if alo < i && blo < j {
                pending.push((alo, i, blo, j));
            }
            if i + size < ahi && j + size < bhi {
                pending.push((i + size, ahi, j + size, bhi));
            }
        }
        total
    }

    fn longest_match(
        &self,
        a: &[char],
        (alo, ahi, blo, bhi): (usize, usize, usize, usize),
        run_lengths: &mut HashMap<usize, usize>,
        next: &mut HashMap<usize, usize>,
    ) -> (usize, usize, usize) {
        let b = self.b;
        let (mut best_i, mut best_j, mut best_size) = (alo, blo, 0);

        // run_lengths[j + 1] = length of the match ending at a[i - 1], b[j]
        run_lengths.clear();
        for (i, ch) in a.iter().enumerate().take(ahi).skip(alo) {
            next.clear();
            if let Some(indices) = self.positions.get(ch) {
                for &j in indices {
                    if j < blo {
                        continue;
                    }
                    if j >= bhi {
                        break;
                    }
                    let k = run_lengths.get(&j).copied().unwrap_or(0) + 1;
                    next.insert(j + 1, k);
                    if k > best_size {
                        best_i = i + 1 - k;
                        best_j = j + 1 - k;
                        best_size = k;
                    }
                }
            }
            std::mem::swap(run_lengths, next);
        }

        // popular characters are not indexed but still extend a match
        while best_i > alo && best_j > blo && a[best_i - 1] == b[best_j - 1] {
            best_i -= 1;
            best_j -= 1;
            best_size += 1;
        }
        while best_i + best_size < ahi
            && best_j + best_size < bhi
            && a[best_i + best_size] == b[best_j + best_size]
        {
            best_size += 1;
        }

        (best_i, best_j, best_size)
    }
}
