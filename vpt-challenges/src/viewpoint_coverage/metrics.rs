use super::{Challenge, Solution};
use anyhow::{anyhow, Result};

impl Challenge {
    /// Closed-tour length including the wrap edge back to the first viewpoint.
    pub fn calc_total_distance(&self, route: &[String]) -> Result<f64> {
        let route = route
            .iter()
            .map(|id| {
                self.viewpoint_index(id)
                    .ok_or_else(|| anyhow!("Route contains unknown viewpoint '{}'", id))
            })
            .collect::<Result<Vec<usize>>>()?;
        Ok(self.calc_route_distance(&route))
    }

    pub fn calc_route_distance(&self, route: &[usize]) -> f64 {
        if route.len() < 2 {
            return 0.0;
        }
        route
            .windows(2)
            .map(|w| self.distance(w[0], w[1]))
            .sum::<f64>()
            + self.distance(route[route.len() - 1], route[0])
    }

    /// Sum of the precision scores of the angles selected at each toured viewpoint.
    pub fn calc_total_precision(&self, solution: &Solution) -> Result<f64> {
        let mut total_precision = 0.0;
        for viewpoint_id in solution.route.iter() {
            let idx = self
                .viewpoint_index(viewpoint_id)
                .ok_or_else(|| anyhow!("Route contains unknown viewpoint '{}'", viewpoint_id))?;
            let viewpoint = &self.viewpoints[idx];
            if let Some(angles) = solution.selected_angles.get(viewpoint_id) {
                for angle_id in angles {
                    total_precision += viewpoint.precision.get(angle_id).ok_or_else(|| {
                        anyhow!(
                            "Angle '{}' is not declared by viewpoint '{}'",
                            angle_id,
                            viewpoint_id
                        )
                    })?;
                }
            }
        }
        Ok(total_precision)
    }

    /// Fills in total distance and total precision.
    pub fn calc_metrics(&self, solution: &mut Solution) -> Result<()> {
        solution.total_distance = self.calc_total_distance(&solution.route)?;
        solution.total_precision = self.calc_total_precision(solution)?;
        Ok(())
    }
}
