use chrono::{DateTime, Utc};
use common::{CompletedKeyPoint, Coordinates, KeyPoint, KeyPointId, TourExecution};

use crate::geo::haversine_distance;

/// What a single position evaluation did to an execution.
#[derive(Debug, Clone, PartialEq)]
pub enum ProgressOutcome {
    /// The next key point was within the threshold and has been recorded.
    Reached {
        key_point_id: KeyPointId,
        distance_meters: f64,
    },
    /// The next key point is still too far away.
    NotYet { distance_meters: f64 },
    /// Every key point has been reached already (or the tour has none).
    AllReached,
}

/// Evaluates `position` against the single next unreached key point.
///
/// Later key points are never considered, even when they are closer. The
/// execution's `last_activity` is bumped in every case.
pub fn advance(
    execution: &mut TourExecution,
    key_points: &[KeyPoint],
    position: Coordinates,
    threshold_meters: f64,
    now: DateTime<Utc>,
) -> ProgressOutcome {
    execution.last_activity = now;

    let Some(next) = key_points.get(execution.next_key_point_index()) else {
        return ProgressOutcome::AllReached;
    };

    let distance_meters = haversine_distance(position, next.position());
    // NaN compares false, so an undefined distance never counts as reached
    let within = distance_meters <= threshold_meters;
    if !within {
        return ProgressOutcome::NotYet { distance_meters };
    }

    execution.completed_key_points.push(CompletedKeyPoint {
        key_point_id: next.id.clone(),
        completion_time: now,
    });

    ProgressOutcome::Reached {
        key_point_id: next.id.clone(),
        distance_meters,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use common::{TourId, UserId};

    fn belgrade_points() -> Vec<KeyPoint> {
        vec![
            KeyPoint::new("kp-1", "Fortress", 44.7951, 20.4568),
            KeyPoint::new("kp-2", "Square", 44.7828, 20.4810),
        ]
    }

    fn fresh_execution() -> TourExecution {
        TourExecution::start(TourId::new("tour-1"), UserId::new("alice"), Utc::now())
    }

    #[test]
    fn records_next_key_point_within_threshold() {
        let mut execution = fresh_execution();
        let now = Utc::now() + Duration::seconds(5);

        let outcome = advance(
            &mut execution,
            &belgrade_points(),
            Coordinates::new(44.7951, 20.4568),
            50.0,
            now,
        );

        assert!(matches!(outcome, ProgressOutcome::Reached { .. }));
        assert_eq!(execution.completed_key_points.len(), 1);
        assert_eq!(execution.completed_key_points[0].completion_time, now);
        assert_eq!(execution.last_activity, now);
    }

    #[test]
    fn later_key_point_is_not_evaluated_before_the_next_one() {
        let mut execution = fresh_execution();

        let outcome = advance(
            &mut execution,
            &belgrade_points(),
            Coordinates::new(44.7828, 20.4810),
            50.0,
            Utc::now(),
        );

        match outcome {
            ProgressOutcome::NotYet { distance_meters } => assert!(distance_meters > 2_000.0),
            other => panic!("expected NotYet, got {other:?}"),
        }
        assert!(execution.completed_key_points.is_empty());
    }

    #[test]
    fn distance_exactly_at_threshold_counts() {
        let mut execution = fresh_execution();
        let points = belgrade_points();
        let position = Coordinates::new(44.7828, 20.4810);
        let exact = haversine_distance(position, points[0].position());

        let outcome = advance(&mut execution, &points, position, exact, Utc::now());

        assert!(matches!(outcome, ProgressOutcome::Reached { .. }));
    }

    #[test]
    fn antipodal_position_does_not_reach_key_point() {
        let mut execution = fresh_execution();
        let points = vec![KeyPoint::new(
            "kp-1",
            "Far away",
            69.51232454868148,
            86.5812282599507,
        )];

        let outcome = advance(
            &mut execution,
            &points,
            Coordinates::new(-69.51232454868148, -93.4187717400493),
            50.0,
            Utc::now(),
        );

        assert!(matches!(outcome, ProgressOutcome::NotYet { .. }));
        assert!(execution.completed_key_points.is_empty());
    }

    #[test]
    fn non_finite_threshold_never_reaches() {
        let mut execution = fresh_execution();
        let points = belgrade_points();

        let outcome = advance(
            &mut execution,
            &points,
            points[0].position(),
            f64::NAN,
            Utc::now(),
        );

        assert!(matches!(outcome, ProgressOutcome::NotYet { .. }));
        assert!(execution.completed_key_points.is_empty());
    }

    #[test]
    fn nothing_happens_once_all_points_are_reached() {
        let mut execution = fresh_execution();
        let points = belgrade_points();
        advance(&mut execution, &points, points[0].position(), 50.0, Utc::now());
        advance(&mut execution, &points, points[1].position(), 50.0, Utc::now());
        assert_eq!(execution.completed_key_points.len(), 2);

        let later = Utc::now() + Duration::minutes(1);
        let outcome = advance(&mut execution, &points, points[1].position(), 50.0, later);

        assert_eq!(outcome, ProgressOutcome::AllReached);
        assert_eq!(execution.completed_key_points.len(), 2);
        assert_eq!(execution.last_activity, later);
        assert!(execution.is_active());
    }

    #[test]
    fn tour_without_key_points_only_touches_activity() {
        let mut execution = fresh_execution();
        let outcome = advance(
            &mut execution,
            &[],
            Coordinates::new(0.0, 0.0),
            50.0,
            Utc::now(),
        );
        assert_eq!(outcome, ProgressOutcome::AllReached);
        assert!(execution.completed_key_points.is_empty());
    }
}
