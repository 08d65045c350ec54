use super::Analysis;
use std::fmt;

/// A human readable summary of an [`Analysis`].
///
/// Lists the parameters, the simulated distance matrix with two decimals,
/// and then either each collision or a line saying there are none.
#[derive(Debug, Clone, Copy)]
pub struct Report<'a> {
    /// The analysis to summarize.
    analysis: &'a Analysis,
}

impl<'a> Report<'a> {
    /// Creates a new [`Report`] for `analysis`.
    #[must_use]
    pub const fn new(analysis: &'a Analysis) -> Self {
        Self { analysis }
    }
}

impl fmt::Display for Report<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Analysis { params, distances, collisions, .. } = self.analysis;

        writeln!(
            f,
            "Clusters: {}, CVD: {}, severity: {}, threshold: {}",
            params.clusters, params.deficiency, params.severity, params.threshold,
        )?;

        writeln!(f, "ΔE2000 matrix under CVD (approx.):")?;
        for row in distances.rows() {
            for d in row {
                write!(f, "{d:7.2}")?;
            }
            writeln!(f)?;
        }

        if collisions.is_empty() {
            writeln!(f, "No collisions below the threshold.")
        } else {
            writeln!(f, "Collisions detected (i, j, ΔE):")?;
            for c in collisions {
                writeln!(f, "  {} -- {}  ΔE={:.2}", c.i, c.j, c.distance)?;
            }
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::{tests::*, CollisionPipeline, LabImage};

    fn image(left: (u8, u8, u8), right: (u8, u8, u8)) -> LabImage {
        let left = srgb_lab(left.0, left.1, left.2);
        let right = srgb_lab(right.0, right.1, right.2);
        let pixels = (0..16).map(|i| if i % 4 < 2 { left } else { right }).collect();
        LabImage::new(pixels, 4, 4).unwrap()
    }

    #[test]
    fn report_lists_collisions() {
        let image = image((180, 80, 40), (110, 130, 40));
        let analysis = CollisionPipeline::new(&image)
            .cluster_count(2.into())
            .run()
            .unwrap();

        let report = analysis.report().to_string();
        let lines = report.lines().collect::<Vec<_>>();
        assert_eq!(lines[0], "Clusters: 2, CVD: deutan, severity: 1, threshold: 8");
        assert_eq!(lines[1], "ΔE2000 matrix under CVD (approx.):");
        assert!(lines[2].starts_with("   0.00"));
        assert_eq!(lines[4], "Collisions detected (i, j, ΔE):");
        assert!(lines[5].starts_with("  0 -- 1  ΔE="));
        assert_eq!(lines.len(), 6);
    }

    #[test]
    fn report_says_when_there_are_no_collisions() {
        let image = image((0, 0, 255), (255, 255, 0));
        let analysis = CollisionPipeline::new(&image)
            .cluster_count(2.into())
            .run()
            .unwrap();

        let report = analysis.report().to_string();
        assert_eq!(report.lines().last(), Some("No collisions below the threshold."));
        assert_eq!(report.lines().count(), 5);
    }
}
