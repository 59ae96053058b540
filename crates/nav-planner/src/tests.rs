//! Unit tests for nav-planner.
//!
//! Every collaborator is a hand-rolled double; the scorer double keys its
//! answers on route length so parallel batch scoring stays deterministic.

#[cfg(test)]
mod doubles {
    use std::collections::HashSet;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    use nav_core::{GeoPoint, NavError, NavResult};

    use crate::{
        Route, RouteCalculator, RouteLeg, RouteOptions, SafetyAssessment, SafetyData,
        SafetyScorer,
    };

    pub fn leg(id: &str, from_lat: f64, to_lat: f64) -> RouteLeg {
        RouteLeg {
            segment_id: id.to_owned(),
            path: vec![GeoPoint::new(from_lat, 127.0), GeoPoint::new(to_lat, 127.0)],
        }
    }

    /// The standard base route: segments s1 + s2, ~2224 m along a meridian.
    pub fn base_route() -> Route {
        Route::from_segments(vec![leg("s1", 37.50, 37.51), leg("s2", 37.51, 37.52)]).unwrap()
    }

    /// A path-shaped route of `delta_lat` degrees (~111.2 km per degree).
    pub fn path_route(delta_lat: f64) -> Route {
        Route::from_points(vec![
            GeoPoint::new(37.50, 127.0),
            GeoPoint::new(37.50 + delta_lat, 127.0),
        ])
        .unwrap()
    }

    // ── Route calculator ──────────────────────────────────────────────────

    pub struct StubCalculator {
        main: Route,
        alternate: Option<Route>,
        /// Avoid-set of the last `calculate_avoiding` call, if any.
        pub last_avoided: Arc<Mutex<Option<HashSet<String>>>>,
    }

    impl StubCalculator {
        pub fn new(main: Route, alternate: Option<Route>) -> Self {
            Self { main, alternate, last_avoided: Arc::default() }
        }
    }

    impl RouteCalculator for StubCalculator {
        fn calculate(
            &self,
            _start: GeoPoint,
            _end: GeoPoint,
            _options: &RouteOptions,
        ) -> NavResult<Route> {
            Ok(self.main.clone())
        }

        fn calculate_avoiding(
            &self,
            _start: GeoPoint,
            _end: GeoPoint,
            avoid: &HashSet<String>,
            _options: &RouteOptions,
        ) -> NavResult<Option<Route>> {
            *self.last_avoided.lock().unwrap() = Some(avoid.clone());
            Ok(self.alternate.clone())
        }
    }

    // ── Safety data ───────────────────────────────────────────────────────

    pub struct StubSafetyData {
        pub loaded: bool,
        pub init_ok: bool,
        pub init_errors: bool,
        pub flagged: HashSet<String>,
    }

    impl StubSafetyData {
        pub fn loaded_with(flagged: &[&str]) -> Self {
            Self {
                loaded: true,
                init_ok: true,
                init_errors: false,
                flagged: flagged.iter().map(|s| (*s).to_owned()).collect(),
            }
        }

        pub fn not_loaded() -> Self {
            Self { loaded: false, init_ok: true, init_errors: false, flagged: HashSet::new() }
        }
    }

    impl SafetyData for StubSafetyData {
        fn initialize(&self, _api_key: Option<&str>) -> NavResult<bool> {
            if self.init_errors {
                Err(NavError::SafetyDataError("stub initialization failure".to_owned()))
            } else {
                Ok(self.init_ok)
            }
        }

        fn is_data_loaded(&self) -> bool {
            self.loaded
        }

        fn is_accident_prone(&self, segment_id: &str) -> bool {
            self.flagged.contains(segment_id)
        }
    }

    // ── Scorer ────────────────────────────────────────────────────────────

    /// Scores keyed on route length (±0.5 m) so concurrent scoring is
    /// order-independent.  `None` entries simulate scoring failures.
    pub struct KeyedScorer {
        entries: Vec<(f64, Option<f64>)>,
        fallback: f64,
        pub calls: Arc<AtomicUsize>,
    }

    impl KeyedScorer {
        pub fn new(entries: Vec<(f64, Option<f64>)>) -> Self {
            Self { entries, fallback: 60.0, calls: Arc::default() }
        }

        pub fn constant(score: f64) -> Self {
            Self { entries: Vec::new(), fallback: score, calls: Arc::default() }
        }
    }

    impl SafetyScorer for KeyedScorer {
        fn route_safety_score(&self, points: &[GeoPoint]) -> NavResult<SafetyAssessment> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let length = nav_core::path_length_m(points).unwrap_or(f64::NAN);
            for (key, score) in &self.entries {
                if (length - key).abs() < 0.5 {
                    return match score {
                        Some(s) => Ok(SafetyAssessment { score: *s, factors: Vec::new() }),
                        None => Err(NavError::SafetyDataError(
                            "stub scoring failure".to_owned(),
                        )),
                    };
                }
            }
            Ok(SafetyAssessment { score: self.fallback, factors: Vec::new() })
        }
    }
}

// ── Route values ──────────────────────────────────────────────────────────────

#[cfg(test)]
mod route {
    use nav_core::{GeoPoint, NavError};

    use super::doubles::{base_route, leg};
    use crate::{Route, SafetyAssessment};

    #[test]
    fn segment_shape_flattens_in_order() {
        let route = base_route();
        let points = route.points().unwrap();
        assert_eq!(points.len(), 4);
        assert_eq!(points[0].lat, 37.50);
        assert_eq!(points[3].lat, 37.52);
        assert_eq!(route.segment_ids(), vec!["s1", "s2"]);
    }

    #[test]
    fn path_shape_has_no_segment_ids() {
        let route = Route::from_points(vec![
            GeoPoint::new(37.5, 127.0),
            GeoPoint::new(37.6, 127.0),
        ])
        .unwrap();
        assert!(route.segment_ids().is_empty());
        assert_eq!(route.points().unwrap().len(), 2);
    }

    #[test]
    fn empty_geometry_is_invalid_data() {
        let route = Route::from_segments(vec![]).unwrap();
        assert!(matches!(route.points(), Err(NavError::InvalidData(_))));
    }

    #[test]
    fn distance_is_sum_of_leg_lengths() {
        let route = base_route();
        // Two 0.01° latitude legs ≈ 2 × 1112 m.
        assert!((route.distance_m - 2_224.0).abs() < 5.0, "got {}", route.distance_m);
    }

    #[test]
    fn with_safety_clamps_and_keeps_geometry() {
        let route = base_route();
        let geometry = route.geometry.clone();

        let high = route.clone().with_safety(SafetyAssessment { score: 150.0, factors: vec![] });
        assert_eq!(high.safety_score(), Some(100.0));
        assert_eq!(high.geometry, geometry);

        let bad = route.with_safety(SafetyAssessment { score: f64::NAN, factors: vec![] });
        assert_eq!(bad.safety_score(), Some(SafetyAssessment::NEUTRAL));
    }

    #[test]
    fn nan_leg_rejected_at_construction() {
        let mut bad = leg("s1", 37.50, 37.51);
        bad.path[1].lon = f64::NAN;
        assert!(Route::from_segments(vec![bad]).is_err());
    }
}

// ── find_safe_route scenarios ─────────────────────────────────────────────────

#[cfg(test)]
mod find_safe_route {
    use std::sync::atomic::Ordering;

    use nav_core::{GeoPoint, NavError};

    use super::doubles::{base_route, path_route, KeyedScorer, StubCalculator, StubSafetyData};
    use crate::{RouteOptions, SafeRoutePlanner, SafetyAssessment, SafetyReadiness};

    fn endpoints() -> (GeoPoint, GeoPoint) {
        (GeoPoint::new(37.50, 127.0), GeoPoint::new(37.52, 127.0))
    }

    #[test]
    fn malformed_coordinates_rejected() {
        let planner = SafeRoutePlanner::new(
            StubCalculator::new(base_route(), None),
            StubSafetyData::loaded_with(&[]),
            KeyedScorer::constant(80.0),
        );
        let bad = GeoPoint::new(95.0, 127.0);
        let (_, end) = endpoints();
        let err = planner.find_safe_route(bad, end, &RouteOptions::default()).unwrap_err();
        assert!(matches!(err, NavError::InvalidLocation { .. }));
    }

    #[test]
    fn data_not_loaded_returns_unscored_base() {
        let scorer = KeyedScorer::constant(80.0);
        let calls = scorer.calls.clone();
        let planner = SafeRoutePlanner::new(
            StubCalculator::new(base_route(), None),
            StubSafetyData::not_loaded(),
            scorer,
        );
        let (start, end) = endpoints();
        let result = planner.find_safe_route(start, end, &RouteOptions::default()).unwrap();

        assert!(result.main.safety.is_none());
        assert!(result.alternative.is_none());
        assert_eq!(result.safer, result.main);
        assert_eq!(calls.load(Ordering::SeqCst), 0, "scorer must not be called");
    }

    #[test]
    fn no_flagged_segments_scores_base_only() {
        let calculator = StubCalculator::new(base_route(), None);
        let avoided = calculator.last_avoided.clone();
        let planner = SafeRoutePlanner::new(
            calculator,
            StubSafetyData::loaded_with(&[]),
            KeyedScorer::constant(82.0),
        );
        let (start, end) = endpoints();
        let result = planner.find_safe_route(start, end, &RouteOptions::default()).unwrap();

        assert_eq!(result.main.safety_score(), Some(82.0));
        assert!(result.alternative.is_none());
        assert_eq!(result.safer, result.main);
        assert!(avoided.lock().unwrap().is_none(), "no avoidance request expected");
    }

    #[test]
    fn flagged_but_no_alternate_keeps_scored_base() {
        let planner = SafeRoutePlanner::new(
            StubCalculator::new(base_route(), None),
            StubSafetyData::loaded_with(&["s1"]),
            KeyedScorer::constant(64.0),
        );
        let (start, end) = endpoints();
        let result = planner.find_safe_route(start, end, &RouteOptions::default()).unwrap();

        assert_eq!(result.main.safety_score(), Some(64.0));
        assert!(result.alternative.is_none());
        assert_eq!(result.safer, result.main);
    }

    #[test]
    fn long_detour_rejected() {
        // Base ≈ 2224 m; alternate ≈ 3114 m ≈ 140 % of base — over the bound.
        let alternate = path_route(0.028);
        let planner = SafeRoutePlanner::new(
            StubCalculator::new(base_route(), Some(alternate)),
            StubSafetyData::loaded_with(&["s1"]),
            KeyedScorer::constant(55.0),
        );
        let (start, end) = endpoints();
        let result = planner.find_safe_route(start, end, &RouteOptions::default()).unwrap();

        assert!(result.alternative.is_none());
        assert_eq!(result.safer, result.main);
        assert_eq!(result.main.safety_score(), Some(55.0));
    }

    #[test]
    fn slow_detour_rejected_on_time() {
        // Distance within the bound (~110 %), but 150 % of the base time.
        let base = base_route().with_estimated_time(600.0);
        let alternate = path_route(0.022).with_estimated_time(900.0);
        let planner = SafeRoutePlanner::new(
            StubCalculator::new(base, Some(alternate)),
            StubSafetyData::loaded_with(&["s2"]),
            KeyedScorer::constant(55.0),
        );
        let (start, end) = endpoints();
        let result = planner.find_safe_route(start, end, &RouteOptions::default()).unwrap();

        assert!(result.alternative.is_none());
        assert_eq!(result.safer, result.main);
    }

    #[test]
    fn strictly_safer_alternate_wins() {
        let base = base_route();
        let alternate = path_route(0.022);
        let calculator = StubCalculator::new(base.clone(), Some(alternate.clone()));
        let avoided = calculator.last_avoided.clone();
        let planner = SafeRoutePlanner::new(
            calculator,
            StubSafetyData::loaded_with(&["s1"]),
            KeyedScorer::new(vec![
                (base.distance_m, Some(40.0)),
                (alternate.distance_m, Some(80.0)),
            ]),
        );
        let (start, end) = endpoints();
        let result = planner.find_safe_route(start, end, &RouteOptions::default()).unwrap();

        assert_eq!(result.main.safety_score(), Some(40.0));
        let alt = result.alternative.as_ref().expect("alternate kept");
        assert_eq!(alt.safety_score(), Some(80.0));
        assert_eq!(&result.safer, alt);

        let avoided = avoided.lock().unwrap().clone().expect("avoidance requested");
        assert_eq!(avoided.len(), 1);
        assert!(avoided.contains("s1"));
    }

    #[test]
    fn equal_scores_keep_base() {
        let base = base_route();
        let alternate = path_route(0.022);
        let planner = SafeRoutePlanner::new(
            StubCalculator::new(base.clone(), Some(alternate.clone())),
            StubSafetyData::loaded_with(&["s1"]),
            KeyedScorer::new(vec![
                (base.distance_m, Some(70.0)),
                (alternate.distance_m, Some(70.0)),
            ]),
        );
        let (start, end) = endpoints();
        let result = planner.find_safe_route(start, end, &RouteOptions::default()).unwrap();
        assert_eq!(result.safer, result.main);
    }

    #[test]
    fn scoring_failure_substitutes_neutral() {
        let base = base_route();
        let planner = SafeRoutePlanner::new(
            StubCalculator::new(base.clone(), None),
            StubSafetyData::loaded_with(&[]),
            KeyedScorer::new(vec![(base.distance_m, None)]),
        );
        let (start, end) = endpoints();
        let result = planner.find_safe_route(start, end, &RouteOptions::default()).unwrap();
        assert_eq!(result.main.safety_score(), Some(SafetyAssessment::NEUTRAL));
    }

    #[test]
    fn initialization_failure_degrades_gracefully() {
        let planner = SafeRoutePlanner::new(
            StubCalculator::new(base_route(), None),
            StubSafetyData {
                loaded: false,
                init_ok: true,
                init_errors: true,
                flagged: Default::default(),
            },
            KeyedScorer::constant(80.0),
        );
        assert_eq!(planner.readiness(), SafetyReadiness::NotReady);

        let (start, end) = endpoints();
        let result = planner.find_safe_route(start, end, &RouteOptions::default()).unwrap();
        assert_eq!(result.safer, result.main);
        assert_eq!(planner.readiness(), SafetyReadiness::DegradedReady);
    }

    #[test]
    fn successful_initialization_is_ready() {
        let planner = SafeRoutePlanner::new(
            StubCalculator::new(base_route(), None),
            StubSafetyData::loaded_with(&[]),
            KeyedScorer::constant(80.0),
        );
        let (start, end) = endpoints();
        planner.find_safe_route(start, end, &RouteOptions::default()).unwrap();
        assert_eq!(planner.readiness(), SafetyReadiness::Ready);
    }
}

// ── Batch ranking ─────────────────────────────────────────────────────────────

#[cfg(test)]
mod rank_by_safety {
    use std::sync::atomic::Ordering;

    use super::doubles::{base_route, path_route, KeyedScorer, StubCalculator, StubSafetyData};
    use crate::{SafeRoutePlanner, SafetyAssessment};

    fn planner_with(scorer: KeyedScorer) -> SafeRoutePlanner<StubCalculator, StubSafetyData, KeyedScorer> {
        SafeRoutePlanner::new(
            StubCalculator::new(base_route(), None),
            StubSafetyData::loaded_with(&[]),
            scorer,
        )
    }

    #[test]
    fn sorts_descending_with_neutral_for_failures() {
        let (short, medium, long) = (path_route(0.01), path_route(0.02), path_route(0.03));
        let scorer = KeyedScorer::new(vec![
            (short.distance_m, Some(20.0)),
            (medium.distance_m, None), // scoring failure → neutral 50
            (long.distance_m, Some(90.0)),
        ]);
        let planner = planner_with(scorer);

        let ranked = planner.rank_by_safety(vec![short, medium, long]);
        let scores: Vec<f64> = ranked.iter().filter_map(|r| r.safety_score()).collect();
        assert_eq!(scores, vec![90.0, SafetyAssessment::NEUTRAL, 20.0]);
    }

    #[test]
    fn single_route_returned_unchanged_without_scoring() {
        let scorer = KeyedScorer::constant(80.0);
        let calls = scorer.calls.clone();
        let planner = planner_with(scorer);

        let only = path_route(0.01);
        let ranked = planner.rank_by_safety(vec![only.clone()]);
        assert_eq!(ranked, vec![only]);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn empty_input_is_empty() {
        let planner = planner_with(KeyedScorer::constant(80.0));
        assert!(planner.rank_by_safety(Vec::new()).is_empty());
    }
}
