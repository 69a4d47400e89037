//! Calendar-month partitioning of a delinquency interval.
//!
//! Each month touched by `[start, end]` yields one segment clipped to the
//! interval. Days are counted on an Actual/365 basis:
//!
//! - **inclusive**: every segment counts both of its endpoints
//!   (`end - start + 1`).
//! - **exclusive**: the interval is treated as half-open `[start, end)`. Only
//!   the final segment drops its last day, so month boundaries never lose a
//!   day and the segment days always sum to `end - start`.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::MoraError;
use crate::types::YearMonth;
use crate::MoraResult;

/// One calendar-month slice of the delinquency interval.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthSegment {
    /// Chronological ordinal (1-based)
    pub index: u32,
    /// Calendar month the slice belongs to
    pub month: YearMonth,
    /// First day of the slice, clipped to the interval start
    pub start_date: NaiveDate,
    /// Last day of the slice, clipped to the interval end
    pub end_date: NaiveDate,
    /// Days accrued in this slice under the chosen inclusivity policy
    pub days: u32,
}

/// Total day count of `[start, end]` under the same policy used for segments.
pub fn count_days(start: NaiveDate, end: NaiveDate, inclusive: bool) -> MoraResult<u32> {
    if end < start {
        return Err(MoraError::InvalidRange { start, end });
    }
    let days = (end - start).num_days() as u32;
    Ok(if inclusive { days + 1 } else { days })
}

/// Split `[start, end]` into ordered, contiguous calendar-month segments.
pub fn partition_by_month(
    start: NaiveDate,
    end: NaiveDate,
    inclusive: bool,
) -> MoraResult<Vec<MonthSegment>> {
    if end < start {
        return Err(MoraError::InvalidRange { start, end });
    }

    let mut segments = Vec::new();
    let mut cursor = start;
    let mut index: u32 = 1;

    loop {
        let month = YearMonth::from_date(cursor);
        let segment_end = month.last_day()?.min(end);
        let is_final = segment_end == end;

        let span = (segment_end - cursor).num_days() as u32;
        let days = if is_final && !inclusive { span } else { span + 1 };

        segments.push(MonthSegment {
            index,
            month,
            start_date: cursor,
            end_date: segment_end,
            days,
        });

        if is_final {
            break;
        }
        cursor = month.succ().first_day()?;
        index += 1;
    }

    debug!(
        %start,
        %end,
        inclusive,
        segments = segments.len(),
        "partitioned interval by calendar month"
    );
    Ok(segments)
}
