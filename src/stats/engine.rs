//! Incremental statistics aggregation.

use crate::activity::{Activity, ActivityType};
use crate::stats::types::{
    MonthlyStats, PersonalRecord, RecordKind, StatsSnapshot, Streak, StreakType, TypeCount,
    UserStatistics,
};
use chrono::{DateTime, Datelike, NaiveDate, Utc};

/// Single writer for the [`UserStatistics`] aggregate and the streak
/// collection.
///
/// `apply_activity` must be called exactly once per finalized activity;
/// applying the same activity twice double-counts the totals. That
/// contract belongs to the caller — the engine does not deduplicate.
/// Deletions are not unwound incrementally; [`StatsEngine::rebuild`] over
/// the persisted history is the repair path.
pub struct StatsEngine {
    stats: UserStatistics,
    streaks: Vec<Streak>,
}

impl StatsEngine {
    /// Create an empty engine for an account created at the given time.
    pub fn new(account_created_at: DateTime<Utc>) -> Self {
        Self {
            stats: UserStatistics::new(account_created_at),
            streaks: Vec::new(),
        }
    }

    /// Restore an engine from a persisted snapshot.
    pub fn from_snapshot(snapshot: StatsSnapshot) -> Self {
        Self {
            stats: snapshot.statistics,
            streaks: snapshot.streaks,
        }
    }

    /// The current aggregate.
    pub fn statistics(&self) -> &UserStatistics {
        &self.stats
    }

    /// All streaks.
    pub fn streaks(&self) -> &[Streak] {
        &self.streaks
    }

    /// Immutable copy of the whole derived state, for readers and for
    /// persistence.
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            statistics: self.stats.clone(),
            streaks: self.streaks.clone(),
        }
    }

    /// Fold one finalized activity into the aggregate.
    pub fn apply_activity(&mut self, activity: &Activity) {
        let now = Utc::now();
        self.apply_activity_at(activity, now);
    }

    /// `apply_activity` with an explicit "now", used for the weekly-average
    /// denominator and the streak liveness flag.
    pub fn apply_activity_at(&mut self, activity: &Activity, now: DateTime<Utc>) {
        self.add_totals(activity);
        self.bump_favorite(activity.activity_type);
        self.update_records(activity);
        self.update_weekly_average(now);
        self.update_monthly(activity);
        self.update_streak(activity.start_time.date_naive(), now.date_naive());

        tracing::debug!(
            activity_id = %activity.id,
            total_activities = self.stats.total_activities,
            "applied activity to statistics"
        );
    }

    /// Recompute all derived state from the persisted history.
    ///
    /// This is the recovery path for aggregate corruption and the fallback
    /// after deletions; activities are applied in start-time order.
    pub fn rebuild(&mut self, history: &[Activity]) {
        let account_created_at = self.stats.account_created_at;
        self.stats = UserStatistics::new(account_created_at);
        self.streaks.clear();

        let mut ordered: Vec<&Activity> = history.iter().collect();
        ordered.sort_by_key(|a| a.start_time);

        let now = Utc::now();
        for activity in ordered {
            self.apply_activity_at(activity, now);
        }

        tracing::info!(
            activities = history.len(),
            "rebuilt statistics from history"
        );
    }

    fn add_totals(&mut self, activity: &Activity) {
        self.stats.total_activities += 1;
        self.stats.total_distance_m += activity.distance_m;
        self.stats.total_duration_secs += activity.duration_secs as u64;
        self.stats.total_calories += activity.calories as u64;
        if let Some(gain) = activity.elevation_gain {
            self.stats.total_elevation_gain_m += gain;
        }
    }

    fn bump_favorite(&mut self, activity_type: ActivityType) {
        self.stats.bump_seq += 1;
        let seq = self.stats.bump_seq;
        let entry = self
            .stats
            .type_counts
            .entry(activity_type)
            .or_insert_with(TypeCount::default);
        entry.count += 1;
        entry.last_bumped = seq;

        // Highest count wins; ties go to the most recently bumped type so
        // the result never depends on map iteration order.
        self.stats.favorite_activity_type = self
            .stats
            .type_counts
            .iter()
            .max_by_key(|(_, c)| (c.count, c.last_bumped))
            .map(|(t, _)| *t);
    }

    fn update_records(&mut self, activity: &Activity) {
        self.upsert_record(activity, RecordKind::LongestDistance, activity.distance_m);
        self.upsert_record(
            activity,
            RecordKind::LongestDuration,
            activity.duration_secs as f64,
        );
        if let Some(pace) = activity.pace_min_per_km() {
            self.upsert_record(activity, RecordKind::FastestPace, pace);
        }
        self.upsert_record(
            activity,
            RecordKind::MostCaloriesBurned,
            activity.calories as f64,
        );
        if let Some(gain) = activity.elevation_gain {
            if gain > 0.0 {
                self.upsert_record(activity, RecordKind::HighestElevationGain, gain);
            }
        }
    }

    fn upsert_record(&mut self, activity: &Activity, kind: RecordKind, value: f64) {
        let existing = self
            .stats
            .personal_records
            .iter_mut()
            .find(|r| r.activity_type == activity.activity_type && r.kind == kind);

        match existing {
            Some(record) => {
                let better = if kind.lower_is_better() {
                    value < record.value
                } else {
                    value > record.value
                };
                if better {
                    record.value = value;
                    record.achieved_at = activity.start_time;
                    record.activity_id = activity.id;
                }
            }
            None => self.stats.personal_records.push(PersonalRecord {
                activity_type: activity.activity_type,
                kind,
                value,
                achieved_at: activity.start_time,
                activity_id: activity.id,
            }),
        }
    }

    fn update_weekly_average(&mut self, now: DateTime<Utc>) {
        let days = (now - self.stats.account_created_at).num_days().max(0);
        let weeks = (days as f64 / 7.0).max(1.0);
        self.stats.average_workouts_per_week = self.stats.total_activities as f64 / weeks;
    }

    fn update_monthly(&mut self, activity: &Activity) {
        let month = activity.start_time.month();
        let year = activity.start_time.year();

        match self
            .stats
            .monthly_stats
            .iter_mut()
            .find(|m| m.month == month && m.year == year)
        {
            Some(entry) => {
                entry.total_activities += 1;
                entry.total_distance_m += activity.distance_m;
                entry.total_duration_secs += activity.duration_secs as u64;
                entry.total_calories += activity.calories as u64;
            }
            None => self.stats.monthly_stats.push(MonthlyStats {
                month,
                year,
                total_activities: 1,
                total_distance_m: activity.distance_m,
                total_duration_secs: activity.duration_secs as u64,
                total_calories: activity.calories as u64,
            }),
        }
    }

    fn update_streak(&mut self, activity_day: NaiveDate, today: NaiveDate) {
        match self
            .streaks
            .iter_mut()
            .find(|s| s.streak_type == StreakType::DailyWorkout)
        {
            Some(streak) => {
                let gap_days = (activity_day - streak.last_active).num_days();
                if gap_days == 1 {
                    streak.current_count += 1;
                    streak.longest_count = streak.longest_count.max(streak.current_count);
                } else if gap_days != 0 {
                    // Gap (or out-of-order day): a new streak window starts
                    streak.current_count = 1;
                    streak.start_date = activity_day;
                }
                streak.last_active = activity_day;
                streak.is_active = (today - activity_day).num_days() <= 1;
            }
            None => self.streaks.push(Streak {
                streak_type: StreakType::DailyWorkout,
                current_count: 1,
                longest_count: 1,
                start_date: activity_day,
                last_active: activity_day,
                is_active: (today - activity_day).num_days() <= 1,
            }),
        }

        if let Some(streak) = self
            .streaks
            .iter()
            .find(|s| s.streak_type == StreakType::DailyWorkout)
        {
            self.stats.current_streak = streak.current_count;
            self.stats.longest_streak = streak.longest_count;
        }
    }
}
