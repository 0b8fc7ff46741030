//! Subprocess spawning and /proc ancestry lookup.

use std::fs;

use log::warn;

/// External process launcher. The chord machine asks it to fork a terminal
/// on select release; tests substitute a recording fake.
pub trait Spawner {
    /// Spawns `exec flag app_id`, returning the child pid when known.
    fn spawn_terminal(&mut self, exec: &str, flag: &str, app_id: &str) -> Option<i32>;
}

/// Spawner backed by `std::process::Command`.
#[derive(Debug, Default)]
pub struct ProcessSpawner;

impl Spawner for ProcessSpawner {
    fn spawn_terminal(&mut self, exec: &str, flag: &str, app_id: &str) -> Option<i32> {
        if exec.is_empty() {
            return None;
        }
        match std::process::Command::new(exec).arg(flag).arg(app_id).spawn() {
            Ok(child) => Some(child.id() as i32),
            Err(err) => {
                warn!("Failed to spawn '{}': {}", exec, err);
                None
            }
        }
    }
}

/// Parent pid of `pid` from `/proc/<pid>/stat`, or `None` when unknown.
///
/// The comm field may contain spaces and parentheses; the ppid is the
/// second field after the last closing paren.
pub fn parent_pid(pid: i32) -> Option<i32> {
    let stat = fs::read_to_string(format!("/proc/{}/stat", pid)).ok()?;
    let rest = &stat[stat.rfind(')')? + 1..];
    let mut fields = rest.split_whitespace();
    let _state = fields.next()?;
    fields.next()?.parse().ok()
}
