//! Leaderboard ranking rules.
//!
//! Ranks are dense in the sense used throughout the rewards backend: a
//! user's rank is one more than the number of users with strictly more
//! points, so tied users share a rank and the next distinct total skips
//! ahead by the size of the tie.

use chrono::{DateTime, Datelike, Duration, NaiveTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use super::{DisplayName, UserId};

/// Start of the leaderboard week containing `now`: Monday 00:00 UTC.
///
/// # Examples
/// ```
/// use backend::domain::week_start;
/// use chrono::{TimeZone, Utc};
///
/// let sunday = Utc.with_ymd_and_hms(2024, 5, 12, 23, 59, 0).unwrap();
/// let monday = Utc.with_ymd_and_hms(2024, 5, 6, 0, 0, 0).unwrap();
/// assert_eq!(week_start(sunday), monday);
/// ```
pub fn week_start(now: DateTime<Utc>) -> DateTime<Utc> {
    let date = now.date_naive();
    let offset = Duration::days(i64::from(date.weekday().num_days_from_monday()));
    let monday = date
        .checked_sub_signed(offset)
        .unwrap_or(date)
        .and_time(NaiveTime::MIN);
    Utc.from_utc_datetime(&monday)
}

/// Rank for a points total given how many users hold strictly more.
pub fn rank_for(strictly_greater: u64) -> u64 {
    strictly_greater.saturating_add(1)
}

/// One leaderboard row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardEntry {
    /// Ranked user.
    pub user_id: UserId,
    /// Name shown on the board.
    pub display_name: DisplayName,
    /// All-time total or weekly sum, depending on the board.
    pub points: i64,
    /// Dense rank.
    pub rank: u64,
}

/// Unranked standing as loaded from storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Standing {
    /// User.
    pub user_id: UserId,
    /// Display name.
    pub display_name: DisplayName,
    /// Points on this board.
    pub points: i64,
}

/// Order standings by points descending and assign dense ranks.
///
/// Ties are ordered by display name then user id so output is stable. At most
/// `limit` rows are returned; ranks are computed over the full input.
pub fn rank_standings(mut standings: Vec<Standing>, limit: usize) -> Vec<LeaderboardEntry> {
    standings.sort_by(|a, b| {
        b.points
            .cmp(&a.points)
            .then_with(|| a.display_name.as_ref().cmp(b.display_name.as_ref()))
            .then_with(|| a.user_id.cmp(&b.user_id))
    });

    let mut ranked = Vec::with_capacity(standings.len().min(limit));
    let mut rank = 0_u64;
    let mut previous: Option<i64> = None;
    for (position, standing) in (0_u64..).zip(standings) {
        if ranked.len() >= limit {
            break;
        }
        if previous != Some(standing.points) {
            rank = rank_for(position);
            previous = Some(standing.points);
        }
        ranked.push(LeaderboardEntry {
            user_id: standing.user_id,
            display_name: standing.display_name,
            points: standing.points,
            rank,
        });
    }
    ranked
}
