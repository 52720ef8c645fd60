//! Backup generation shifting for log rotation.
//!
//! When the active file is retired, every existing backup generation
//! moves up by one: `log_0.txt` becomes `log_1.txt` and so on, the
//! oldest generation (`log_{max_backups - 1}.txt`) is deleted, and the
//! just-closed active file takes the vacated `log_0.txt` slot.
//!
//! Planning is split from execution: [`shift_plan`] is a pure function
//! from the set of existing generations to an ordered operation list, so
//! the collision-freedom of the shuffle is unit-testable without touching
//! a filesystem. [`shift_backups`] applies a plan to a directory.

use std::io;
use std::path::{Path, PathBuf};

use tokio::fs;

use crate::constants::backup_file_name;

/// One step of a generation shift.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum BackupOp {
    /// Delete the backup at this generation index.
    Delete(usize),
    /// Rename the backup at `from` to generation `to`.
    Rename { from: usize, to: usize },
}

/// Computes the ordered operations that shift every existing generation
/// up by one, deleting the oldest when it occupies the last slot.
///
/// Operations are emitted highest index first so no rename target ever
/// collides with a file that has not moved yet. `existing` lists the
/// generation indices currently present; indices at or beyond
/// `max_backups` are ignored (stale files from an earlier, larger cap
/// are left alone rather than silently deleted).
pub(crate) fn shift_plan(existing: &[usize], max_backups: usize) -> Vec<BackupOp> {
    let mut ops = Vec::new();
    for generation in (0..max_backups).rev() {
        if !existing.contains(&generation) {
            continue;
        }
        if generation == max_backups - 1 {
            ops.push(BackupOp::Delete(generation));
        } else {
            ops.push(BackupOp::Rename {
                from: generation,
                to: generation + 1,
            });
        }
    }
    ops
}

/// Scans `dir` for existing backup generations below `max_backups`.
pub(crate) async fn existing_generations(dir: &Path, max_backups: usize) -> Vec<usize> {
    let mut found = Vec::new();
    for generation in 0..max_backups {
        if fs::try_exists(backup_path(dir, generation))
            .await
            .unwrap_or(false)
        {
            found.push(generation);
        }
    }
    found
}

/// Shifts every existing backup generation in `dir` up by one.
///
/// Stops at the first failing operation; the caller decides how to
/// degrade (the writer keeps appending to the oversized active file).
pub(crate) async fn shift_backups(dir: &Path, max_backups: usize) -> io::Result<()> {
    let existing = existing_generations(dir, max_backups).await;
    for op in shift_plan(&existing, max_backups) {
        match op {
            BackupOp::Delete(generation) => {
                fs::remove_file(backup_path(dir, generation)).await?;
            }
            BackupOp::Rename { from, to } => {
                fs::rename(backup_path(dir, from), backup_path(dir, to)).await?;
            }
        }
    }
    Ok(())
}

/// Full path of the backup file for `generation` inside `dir`.
pub(crate) fn backup_path(dir: &Path, generation: usize) -> PathBuf {
    dir.join(backup_file_name(generation))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_set_needs_no_operations() {
        assert!(shift_plan(&[], 5).is_empty());
    }

    #[test]
    fn single_newest_generation_shifts_up() {
        assert_eq!(
            shift_plan(&[0], 5),
            vec![BackupOp::Rename { from: 0, to: 1 }]
        );
    }

    #[test]
    fn full_set_deletes_oldest_then_shifts_rest() {
        assert_eq!(
            shift_plan(&[0, 1, 2], 3),
            vec![
                BackupOp::Delete(2),
                BackupOp::Rename { from: 1, to: 2 },
                BackupOp::Rename { from: 0, to: 1 },
            ]
        );
    }

    #[test]
    fn gaps_are_preserved_without_inventing_files() {
        // Only generations 0 and 2 exist out of a cap of 4.
        assert_eq!(
            shift_plan(&[0, 2], 4),
            vec![
                BackupOp::Rename { from: 2, to: 3 },
                BackupOp::Rename { from: 0, to: 1 },
            ]
        );
    }

    #[test]
    fn cap_of_one_deletes_the_only_backup() {
        assert_eq!(shift_plan(&[0], 1), vec![BackupOp::Delete(0)]);
    }

    #[test]
    fn cap_of_zero_plans_nothing() {
        assert!(shift_plan(&[0, 1], 0).is_empty());
    }

    #[test]
    fn rename_targets_never_collide_with_unmoved_sources() {
        let existing = [0, 1, 2, 3];
        let plan = shift_plan(&existing, 5);

        let mut present: Vec<usize> = existing.to_vec();
        for op in plan {
            match op {
                BackupOp::Delete(generation) => {
                    assert!(present.contains(&generation));
                    present.retain(|&g| g != generation);
                }
                BackupOp::Rename { from, to } => {
                    assert!(present.contains(&from));
                    assert!(!present.contains(&to), "rename onto an occupied slot");
                    present.retain(|&g| g != from);
                    present.push(to);
                }
            }
        }
        // After the shuffle, slot 0 is free for the retiring active file.
        assert!(!present.contains(&0));
        assert_eq!(present.len(), existing.len());
    }

    #[tokio::test]
    async fn shift_backups_rolls_files_on_disk() {
        let dir = tempfile::tempdir().expect("tempdir");
        for generation in 0..3 {
            std::fs::write(backup_path(dir.path(), generation), format!("gen {generation}"))
                .expect("seed backup");
        }

        shift_backups(dir.path(), 3).await.expect("shift");

        assert!(!backup_path(dir.path(), 0).exists());
        assert_eq!(
            std::fs::read_to_string(backup_path(dir.path(), 1)).expect("gen 1"),
            "gen 0"
        );
        assert_eq!(
            std::fs::read_to_string(backup_path(dir.path(), 2)).expect("gen 2"),
            "gen 1"
        );
    }
}
