use chrono::{NaiveTime, Timelike};

/// Half-open `[start, end)` span of wall-clock time within a single day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeInterval {
    pub start: NaiveTime,
    pub end: NaiveTime,
}

impl TimeInterval {
    pub fn overlaps(&self, other: &TimeInterval) -> bool {
        self.start < other.end && other.start < self.end
    }

    pub fn contains(&self, other: &TimeInterval) -> bool {
        self.start <= other.start && other.end <= self.end
    }
}

/// Sorts intervals and merges every overlapping or back-to-back pair, so
/// `[09:00,10:00)` and `[10:00,11:00)` collapse into `[09:00,11:00)`.
/// Empty or inverted inputs are dropped.
pub fn normalize(mut intervals: Vec<TimeInterval>) -> Vec<TimeInterval> {
    intervals.retain(|interval| interval.start < interval.end);
    intervals.sort_by(|a, b| a.start.cmp(&b.start).then(a.end.cmp(&b.end)));

    let mut merged: Vec<TimeInterval> = Vec::with_capacity(intervals.len());
    for interval in intervals {
        match merged.last_mut() {
            Some(last) if interval.start <= last.end => {
                if interval.end > last.end {
                    last.end = interval.end;
                }
            }
            _ => merged.push(interval),
        }
    }

    merged
}

/// Removes every `cuts` interval from `base`. A cut landing in the middle of
/// a base interval splits it in two; the result stays sorted and disjoint
/// when `base` is.
pub fn subtract(base: &[TimeInterval], cuts: &[TimeInterval]) -> Vec<TimeInterval> {
    let mut remaining: Vec<TimeInterval> = base.to_vec();

    for cut in cuts {
        if cut.start >= cut.end {
            continue;
        }

        let mut next = Vec::with_capacity(remaining.len() + 1);
        for piece in remaining {
            if !piece.overlaps(cut) {
                next.push(piece);
                continue;
            }
            if piece.start < cut.start {
                next.push(TimeInterval {
                    start: piece.start,
                    end: cut.start,
                });
            }
            if cut.end < piece.end {
                next.push(TimeInterval {
                    start: cut.end,
                    end: piece.end,
                });
            }
        }
        remaining = next;
    }

    remaining
}

/// Enumerates every slot start inside the free intervals, stepping by the
/// service duration. A start qualifies while `start + duration` still fits
/// inside its interval. Seconds-from-midnight arithmetic keeps the loop from
/// wrapping past midnight the way `NaiveTime + Duration` would.
pub fn enumerate_starts(free: &[TimeInterval], duration_minutes: i32) -> Vec<NaiveTime> {
    if duration_minutes <= 0 {
        return Vec::new();
    }
    let step = duration_minutes as u32 * 60;

    let mut starts = Vec::new();
    for interval in free {
        let end = interval.end.num_seconds_from_midnight();
        let mut cursor = interval.start.num_seconds_from_midnight();

        while cursor + step <= end {
            if let Some(start) = NaiveTime::from_num_seconds_from_midnight_opt(cursor, 0) {
                starts.push(start);
            }
            cursor += step;
        }
    }

    starts
}
