use super::{CoverageTracker, Deadline};
use anyhow::Result;
use log::{debug, info, warn};
use logging_timer::time;
use std::collections::{BTreeMap, BTreeSet};
use std::time::Duration;
use vpt_challenges::viewpoint_coverage::{Challenge, Solution};
use vpt_challenges::ChallengeError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    FullyCovered,
    AllPlaced,
    NoFeasibleCandidate,
    TimedOut,
}

impl Termination {
    pub fn as_str(&self) -> &'static str {
        match self {
            Termination::FullyCovered => "fully_covered",
            Termination::AllPlaced => "all_placed",
            Termination::NoFeasibleCandidate => "no_feasible_candidate",
            Termination::TimedOut => "timed_out",
        }
    }
}

#[derive(Debug, Clone)]
pub struct BuildOutcome {
    pub solution: Solution,
    pub termination: Termination,
    pub elapsed: Duration,
    pub budget: Option<Duration>,
}

impl BuildOutcome {
    /// The recoverable timeout, if the budget cut construction short.
    pub fn timeout_error(&self) -> Option<ChallengeError> {
        match self.termination {
            Termination::TimedOut => Some(ChallengeError::TimedOut {
                budget_ms: self.budget.map_or(0, |b| b.as_millis() as u64),
                elapsed_ms: self.elapsed.as_millis() as u64,
                tour_len: self.solution.route.len(),
            }),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Insertion {
    position: usize,
    delta: f64,
    /// Whether the edge into the successor is permitted as well.
    closes: bool,
}

/// Greedy coverage-driven tour construction.
///
/// Starting from the mandatory viewpoint, each round inserts the viewpoint that
/// still helps the most unsatisfied sample points, at its cheapest
/// adjacency-respecting position. `save_solution` receives the seed tour and a
/// snapshot after every insertion.
#[time]
pub fn solve_challenge(
    challenge: &Challenge,
    deadline: &Deadline,
    save_solution: &dyn Fn(&Solution) -> Result<()>,
) -> Result<BuildOutcome> {
    let mandatory = challenge.mandatory_index()?;
    let num_viewpoints = challenge.num_viewpoints();

    let mut coverage = CoverageTracker::new(challenge);
    let mut tour = vec![mandatory];
    let mut in_tour = vec![false; num_viewpoints];
    in_tour[mandatory] = true;
    let mut selected_angles = BTreeMap::new();
    select(challenge, &mut coverage, &mut selected_angles, mandatory);

    save_solution(&to_solution(challenge, &tour, &selected_angles, false)?)?;

    let termination = loop {
        if coverage.is_fully_covered() {
            break Termination::FullyCovered;
        }
        if tour.len() == num_viewpoints {
            break Termination::AllPlaced;
        }
        if deadline.is_expired() {
            break Termination::TimedOut;
        }

        // (candidate, benefit, insertion); ties keep the earliest candidate
        let mut best: Option<(usize, usize, Insertion)> = None;
        for candidate in 0..num_viewpoints {
            if in_tour[candidate] {
                continue;
            }
            let benefit = coverage.remaining_benefit(candidate);
            if benefit == 0 || best.is_some_and(|(_, b, _)| benefit <= b) {
                continue;
            }
            if let Some(insertion) = find_best_insertion(challenge, &tour, candidate) {
                best = Some((candidate, benefit, insertion));
            }
        }

        let Some((winner, benefit, insertion)) = best else {
            break Termination::NoFeasibleCandidate;
        };

        tour.insert(insertion.position, winner);
        in_tour[winner] = true;
        select(challenge, &mut coverage, &mut selected_angles, winner);
        debug!(
            "Inserted '{}' at {} (benefit {}, delta {:.3}{}), {}/{} sample points covered",
            challenge.viewpoints[winner].id,
            insertion.position,
            benefit,
            insertion.delta,
            if insertion.closes { "" } else { ", open wrap edge" },
            coverage.num_covered(),
            challenge.sample_points.len()
        );
        save_solution(&to_solution(challenge, &tour, &selected_angles, false)?)?;
    };

    let time_limited = termination == Termination::TimedOut;
    let solution = to_solution(challenge, &tour, &selected_angles, time_limited)?;
    if time_limited {
        warn!(
            "Time budget exhausted after {:?}, returning partial tour of {} viewpoints",
            deadline.elapsed(),
            tour.len()
        );
        save_solution(&solution)?;
    }
    info!(
        "Tour construction finished ({}): {} viewpoints, {}/{} sample points covered, distance {:.3}, precision {:.3}",
        termination.as_str(),
        tour.len(),
        coverage.num_covered(),
        challenge.sample_points.len(),
        solution.total_distance,
        solution.total_precision
    );

    Ok(BuildOutcome {
        solution,
        termination,
        elapsed: deadline.elapsed(),
        budget: deadline.budget(),
    })
}

fn select(
    challenge: &Challenge,
    coverage: &mut CoverageTracker,
    selected_angles: &mut BTreeMap<String, BTreeSet<String>>,
    viewpoint: usize,
) {
    let angles = coverage.apply_selection(viewpoint);
    if !angles.is_empty() {
        selected_angles
            .entry(challenge.viewpoints[viewpoint].id.clone())
            .or_insert_with(BTreeSet::new)
            .extend(angles);
    }
}

/// Cheapest position at which `candidate` can be spliced into the cyclic
/// tour. Position 0 always holds the mandatory viewpoint. A position needs both
/// edges permitted. While the wrap edge back to the mandatory viewpoint is not
/// yet permitted, the tail position only needs the edge from the last
/// viewpoint, and is ranked behind any position that keeps every edge
/// permitted. A closed tour is never reopened.
fn find_best_insertion(challenge: &Challenge, tour: &[usize], candidate: usize) -> Option<Insertion> {
    let adjacency = &challenge.adjacency;
    let len = tour.len();
    let wrap_open = len == 1 || !adjacency.can_connect_idx(tour[len - 1], tour[0]);

    let mut best: Option<Insertion> = None;
    for position in 1..=len {
        let pred = tour[position - 1];
        let succ = tour[position % len];
        if !adjacency.can_connect_idx(pred, candidate) {
            continue;
        }
        let closes = adjacency.can_connect_idx(candidate, succ);
        if !closes && !(wrap_open && position == len) {
            continue;
        }

        let mut delta = challenge.distance(pred, candidate) + challenge.distance(candidate, succ);
        if len > 1 {
            delta -= challenge.distance(pred, succ);
        }

        let better = match best {
            None => true,
            Some(b) => (closes && !b.closes) || (closes == b.closes && delta < b.delta),
        };
        if better {
            best = Some(Insertion {
                position,
                delta,
                closes,
            });
        }
    }
    best
}

fn to_solution(
    challenge: &Challenge,
    tour: &[usize],
    selected_angles: &BTreeMap<String, BTreeSet<String>>,
    time_limited: bool,
) -> Result<Solution> {
    let mut solution = Solution {
        route: tour
            .iter()
            .map(|&v| challenge.viewpoints[v].id.clone())
            .collect(),
        selected_angles: selected_angles.clone(),
        time_limited,
        ..Solution::new()
    };
    solution.total_distance = challenge.calc_route_distance(tour);
    solution.total_precision = challenge.calc_total_precision(&solution)?;
    Ok(solution)
}
