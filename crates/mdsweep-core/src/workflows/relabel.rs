use crate::core::io::traits::{TrajectoryFile, TrajectoryReader, TrajectoryWriter};
use crate::core::job::{Job, RELABELED_TRAJECTORY_FILE, TRAJECTORY_FILE};
use crate::core::statepoint::StatePointError;
use crate::engine::config::RelabelConfig;
use crate::engine::error::EngineError;
use crate::engine::progress::{Progress, ProgressReporter};
use serde::Serialize;
use std::ops::Range;
use std::path::PathBuf;
use tracing::{info, instrument};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RelabelSummary {
    pub frames_written: usize,
    pub windows: CenterWindows,
    pub output: PathBuf,
}

/// Particle index windows of `2k + 1` beads centered on each of `count` molecules of
/// `length` beads stored back to back.
///
/// Molecule `i` owns indices `[length * i, length * (i + 1))` and its window is centered on
/// `length * i + length / 2`, so every window stays inside its own molecule. Windows are
/// produced on demand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CenterWindows {
    length: usize,
    count: usize,
    beads_from_center: usize,
}

impl CenterWindows {
    pub fn len(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Number of beads in each window.
    pub fn width(&self) -> usize {
        2 * self.beads_from_center + 1
    }

    /// Total number of particles the molecules span.
    pub fn particles(&self) -> usize {
        self.length * self.count
    }

    pub fn get(&self, molecule: usize) -> Option<Range<usize>> {
        if molecule >= self.count {
            return None;
        }
        let center = self.length * molecule + self.length / 2;
        Some(center - self.beads_from_center..center + self.beads_from_center + 1)
    }

    pub fn iter(&self) -> impl Iterator<Item = Range<usize>> + '_ {
        (0..self.count).filter_map(|i| self.get(i))
    }
}

/// Validates the window geometry. All later index arithmetic is bounded by `length * count`,
/// which is checked here.
pub fn center_windows(
    length: usize,
    count: usize,
    beads_from_center: usize,
) -> Result<CenterWindows, EngineError> {
    let window = beads_from_center
        .checked_mul(2)
        .and_then(|w| w.checked_add(1))
        .ok_or(EngineError::InvalidWindow {
            window: usize::MAX,
            length,
        })?;
    if window > length {
        return Err(EngineError::InvalidWindow { window, length });
    }
    if length.checked_mul(count).is_none() {
        return Err(StatePointError::InvalidMetadata {
            key: "chains".to_string(),
            reason: format!("{} molecules of {} beads exceed the addressable range", count, length),
        }
        .into());
    }
    Ok(CenterWindows {
        length,
        count,
        beads_from_center,
    })
}

fn positive(job: &Job, key: &str) -> Result<usize, StatePointError> {
    let value = job.statepoint().get_usize(key)?;
    if value == 0 {
        return Err(StatePointError::InvalidMetadata {
            key: key.to_string(),
            reason: "must be positive".to_string(),
        });
    }
    Ok(value)
}

/// Copies the selected frames of the job's production trajectory into a new trajectory in
/// which the center beads of every molecule carry an additional particle type.
///
/// The molecule length and count come from the `lengths` and `chains` state-point
/// parameters. The input trajectory is only read; the output is always created fresh.
#[instrument(skip_all, name = "relabel_workflow", fields(job_id = %job.id()))]
pub fn relabel_center_beads<T: TrajectoryFile>(
    job: &Job,
    config: &RelabelConfig,
    reporter: &ProgressReporter,
) -> Result<RelabelSummary, EngineError> {
    let length = positive(job, "lengths")?;
    let count = positive(job, "chains")?;
    let windows = center_windows(length, count, config.beads_from_center)?;
    let expected = windows.particles();

    let mut reader = T::open(&job.path_of(TRAJECTORY_FILE))?;
    let indices: Vec<usize> = config.frames.indices(reader.len()).collect();
    info!(
        "Relabeling {} of {} frames: {} molecules of {} beads, window of {}.",
        indices.len(),
        reader.len(),
        count,
        length,
        windows.width()
    );

    let output = job.path_of(RELABELED_TRAJECTORY_FILE);
    let mut writer = T::create(&output)?;

    reporter.report(Progress::TaskStart {
        total_steps: indices.len() as u64,
    });
    for &index in &indices {
        let mut frame = reader.frame(index)?;
        let found = frame.particles.len();
        if found < expected {
            return Err(EngineError::ParticleCount {
                frame: index,
                found,
                expected,
            });
        }

        let new_id = frame.particles.add_type(config.new_type.as_str());
        for window in windows.iter() {
            for particle in window {
                frame.particles.typeid[particle] = new_id;
            }
        }
        writer.append(&frame)?;
        reporter.report(Progress::TaskIncrement);
    }
    writer.finish()?;
    reporter.report(Progress::TaskFinish);

    Ok(RelabelSummary {
        frames_written: indices.len(),
        windows,
        output,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::io::frame::{Frame, Particles};
    use crate::core::io::stream::FrameStreamFile;
    use crate::core::project::Project;
    use crate::core::statepoint::StatePoint;
    use crate::engine::config::RelabelConfigBuilder;
    use std::fs;
    use tempfile::{TempDir, tempdir};

    const LENGTH: usize = 20;
    const CHAINS: usize = 50;

    fn frame(step: u64, particles: usize) -> Frame {
        Frame {
            step,
            particles: Particles {
                types: vec!["A".to_string()],
                typeid: vec![0; particles],
                ..Default::default()
            },
            ..Default::default()
        }
    }

    fn job_with_trajectory(frames: usize, particles: usize) -> (TempDir, Job) {
        let dir = tempdir().unwrap();
        let project = Project::init(dir.path(), "md").unwrap();
        let (job, _) = project
            .init_job(
                StatePoint::new()
                    .with("lengths", LENGTH as u64)
                    .with("chains", CHAINS as u64),
            )
            .unwrap();
        let mut writer = FrameStreamFile::create(&job.path_of(TRAJECTORY_FILE)).unwrap();
        for i in 0..frames {
            writer.append(&frame(i as u64 * 10_000, particles)).unwrap();
        }
        writer.finish().unwrap();
        (dir, job)
    }

    fn config() -> RelabelConfigBuilder {
        RelabelConfigBuilder::new().beads_from_center(2).new_type("B")
    }

    fn read_all(job: &Job) -> Vec<Frame> {
        let mut reader = FrameStreamFile::open(&job.path_of(RELABELED_TRAJECTORY_FILE)).unwrap();
        (0..reader.len()).map(|i| reader.frame(i).unwrap()).collect()
    }

    #[test]
    fn windows_for_twenty_bead_chains() {
        let windows = center_windows(LENGTH, CHAINS, 2).unwrap();
        assert_eq!(windows.len(), CHAINS);
        assert_eq!(windows.get(0), Some(8..13));
        assert_eq!(windows.get(CHAINS), None);
        let windows: Vec<_> = windows.iter().collect();
        for (i, window) in windows.iter().enumerate() {
            assert_eq!(window.len(), 5);
            assert!(window.start >= LENGTH * i);
            assert!(window.end <= LENGTH * (i + 1));
        }
        for pair in windows.windows(2) {
            assert!(pair[0].end <= pair[1].start);
        }
    }

    #[test]
    fn odd_lengths_keep_windows_inside_molecules() {
        let windows: Vec<_> = center_windows(5, 3, 2).unwrap().iter().collect();
        assert_eq!(windows, vec![0..5, 5..10, 10..15]);
    }

    #[test]
    fn oversized_inputs_are_errors_not_overflows() {
        assert!(matches!(
            center_windows(LENGTH, CHAINS, usize::MAX / 2 + 1),
            Err(EngineError::InvalidWindow {
                window: usize::MAX,
                length: LENGTH
            })
        ));
        assert!(matches!(
            center_windows(usize::MAX, 1, usize::MAX / 2 + 1),
            Err(EngineError::InvalidWindow { .. })
        ));
        assert!(matches!(
            center_windows(LENGTH, usize::MAX / 2, 2),
            Err(EngineError::Metadata(StatePointError::InvalidMetadata { .. }))
        ));

        let huge = center_windows(LENGTH, usize::MAX / LENGTH, 2).unwrap();
        assert_eq!(huge.len(), usize::MAX / LENGTH);
        assert_eq!(huge.get(1), Some(28..33));
    }

    #[test]
    fn absurd_chain_count_fails_on_the_first_frame() {
        let dir = tempdir().unwrap();
        let project = Project::init(dir.path(), "md").unwrap();
        let (job, _) = project
            .init_job(
                StatePoint::new()
                    .with("lengths", LENGTH as u64)
                    .with("chains", (usize::MAX / LENGTH) as u64),
            )
            .unwrap();
        let mut writer = FrameStreamFile::create(&job.path_of(TRAJECTORY_FILE)).unwrap();
        writer.append(&frame(0, LENGTH * CHAINS)).unwrap();
        writer.finish().unwrap();

        let result = relabel_center_beads::<FrameStreamFile>(
            &job,
            &config().build().unwrap(),
            &ProgressReporter::new(),
        );
        assert!(matches!(
            result,
            Err(EngineError::ParticleCount { frame: 0, found: 1000, .. })
        ));
    }

    #[test]
    fn oversized_bead_count_is_an_invalid_window() {
        let (_dir, job) = job_with_trajectory(1, LENGTH * CHAINS);
        let config = config().beads_from_center(usize::MAX).build().unwrap();
        let result =
            relabel_center_beads::<FrameStreamFile>(&job, &config, &ProgressReporter::new());
        assert!(matches!(result, Err(EngineError::InvalidWindow { .. })));
        assert!(!job.path_of(RELABELED_TRAJECTORY_FILE).exists());
    }

    #[test]
    fn binary_trajectory_is_rejected_before_output_is_created() {
        let (_dir, job) = job_with_trajectory(0, 0);
        let mut bytes = 0x65DF_65DF_65DF_65DF_u64.to_le_bytes().to_vec();
        bytes.extend_from_slice(&[0x01, 0x00, 0xff, 0xfe]);
        fs::write(job.path_of(TRAJECTORY_FILE), bytes).unwrap();

        let result = relabel_center_beads::<FrameStreamFile>(
            &job,
            &config().build().unwrap(),
            &ProgressReporter::new(),
        );
        assert!(matches!(
            result,
            Err(EngineError::Trajectory(
                crate::core::io::traits::TrajectoryError::UnsupportedFormat { .. }
            ))
        ));
        assert!(!job.path_of(RELABELED_TRAJECTORY_FILE).exists());
    }

    #[test]
    fn window_wider_than_molecule_is_rejected() {
        assert!(matches!(
            center_windows(4, 10, 2),
            Err(EngineError::InvalidWindow {
                window: 5,
                length: 4
            })
        ));
    }

    #[test]
    fn relabels_every_frame_by_default() {
        let (_dir, job) = job_with_trajectory(6, LENGTH * CHAINS);
        let input_before = fs::read(job.path_of(TRAJECTORY_FILE)).unwrap();

        let summary = relabel_center_beads::<FrameStreamFile>(
            &job,
            &config().build().unwrap(),
            &ProgressReporter::new(),
        )
        .unwrap();

        assert_eq!(summary.frames_written, 6);
        assert_eq!(summary.windows.len(), CHAINS);
        let frames = read_all(&job);
        assert_eq!(frames.len(), 6);
        for frame in &frames {
            assert_eq!(frame.particles.types, vec!["A", "B"]);
            let relabeled = frame.particles.typeid.iter().filter(|&&t| t == 1).count();
            assert_eq!(relabeled, 5 * CHAINS);
            assert_eq!(frame.particles.typeid[10], 1);
            assert_eq!(frame.particles.typeid[7], 0);
            assert_eq!(frame.particles.typeid[13], 0);
        }
        assert_eq!(fs::read(job.path_of(TRAJECTORY_FILE)).unwrap(), input_before);
    }

    #[test]
    fn frame_slice_is_honored() {
        let (_dir, job) = job_with_trajectory(10, LENGTH * CHAINS);
        let config = config().start(1).stop(Some(8)).stride(3).build().unwrap();

        let summary =
            relabel_center_beads::<FrameStreamFile>(&job, &config, &ProgressReporter::new())
                .unwrap();

        assert_eq!(summary.frames_written, 3);
        let steps: Vec<u64> = read_all(&job).iter().map(|f| f.step).collect();
        assert_eq!(steps, vec![10_000, 40_000, 70_000]);
    }

    #[test]
    fn stale_output_is_replaced() {
        let (_dir, job) = job_with_trajectory(2, LENGTH * CHAINS);
        fs::write(job.path_of(RELABELED_TRAJECTORY_FILE), "stale\nstale\nstale\n").unwrap();

        relabel_center_beads::<FrameStreamFile>(
            &job,
            &config().build().unwrap(),
            &ProgressReporter::new(),
        )
        .unwrap();
        assert_eq!(read_all(&job).len(), 2);
    }

    #[test]
    fn short_frame_is_rejected() {
        let (_dir, job) = job_with_trajectory(1, LENGTH * CHAINS - 1);
        let result = relabel_center_beads::<FrameStreamFile>(
            &job,
            &config().build().unwrap(),
            &ProgressReporter::new(),
        );
        assert!(matches!(
            result,
            Err(EngineError::ParticleCount {
                frame: 0,
                expected: 1000,
                ..
            })
        ));
    }

    #[test]
    fn missing_chain_count_fails_fast() {
        let dir = tempdir().unwrap();
        let project = Project::init(dir.path(), "md").unwrap();
        let (job, _) = project
            .init_job(StatePoint::new().with("lengths", 20))
            .unwrap();

        let result = relabel_center_beads::<FrameStreamFile>(
            &job,
            &config().build().unwrap(),
            &ProgressReporter::new(),
        );
        assert!(matches!(
            result,
            Err(EngineError::Metadata(StatePointError::MissingMetadata { .. }))
        ));
        assert!(!job.path_of(RELABELED_TRAJECTORY_FILE).exists());
    }

    #[test]
    fn zero_length_is_invalid_metadata() {
        let dir = tempdir().unwrap();
        let project = Project::init(dir.path(), "md").unwrap();
        let (job, _) = project
            .init_job(StatePoint::new().with("lengths", 0).with("chains", 50))
            .unwrap();

        let result = relabel_center_beads::<FrameStreamFile>(
            &job,
            &config().build().unwrap(),
            &ProgressReporter::new(),
        );
        assert!(matches!(
            result,
            Err(EngineError::Metadata(StatePointError::InvalidMetadata { .. }))
        ));
    }
}
