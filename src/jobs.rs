use log::{info, warn};
use std::process::{Child, ExitStatus};

/// A background process the interpreter launched but has not reaped yet.
#[derive(Debug)]
pub struct Job {
    pub program: String,
    child: Child,
}

impl Job {
    pub fn pid(&self) -> u32 {
        self.child.id()
    }
}

/// Background processes, collected with a non-blocking pass.
///
/// Nothing ever waits on a job. [`Jobs::reap`] polls every entry with
/// `try_wait` and drops the ones that terminated, so finished children do not
/// linger as zombies for the lifetime of the interpreter.
#[derive(Debug, Default)]
pub struct Jobs {
    running: Vec<Job>,
}

impl Jobs {
    /// Take ownership of a freshly spawned background child.
    pub fn launch(&mut self, program: impl Into<String>, child: Child) {
        let job = Job {
            program: program.into(),
            child,
        };
        info!("[bg] {} started with pid {}", job.program, job.pid());
        self.running.push(job);
    }

    /// Collect every job that already terminated, without blocking.
    ///
    /// Returns the reaped programs with their exit status.
    pub fn reap(&mut self) -> Vec<(String, ExitStatus)> {
        let mut finished = Vec::new();
        self.running.retain_mut(|job| match job.child.try_wait() {
            Ok(Some(status)) => {
                info!("[bg] {} (pid {}) exited: {}", job.program, job.pid(), status);
                finished.push((job.program.clone(), status));
                false
            }
            Ok(None) => true,
            Err(e) => {
                warn!("[bg] can't poll {} (pid {}): {}", job.program, job.pid(), e);
                false
            }
        });
        finished
    }

    /// Number of jobs still believed to be running.
    pub fn len(&self) -> usize {
        self.running.len()
    }

    pub fn is_empty(&self) -> bool {
        self.running.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::process::Command;
    use std::thread;
    use std::time::{Duration, Instant};

    #[test]
    fn test_reap_collects_finished_child() {
        let mut jobs = Jobs::default();
        jobs.launch("true", Command::new("true").spawn().unwrap());
        assert_eq!(jobs.len(), 1);

        let deadline = Instant::now() + Duration::from_secs(5);
        let mut reaped = Vec::new();
        while reaped.is_empty() && Instant::now() < deadline {
            reaped = jobs.reap();
            thread::sleep(Duration::from_millis(10));
        }

        assert_eq!(reaped.len(), 1);
        assert_eq!(reaped[0].0, "true");
        assert!(reaped[0].1.success());
        assert!(jobs.is_empty());
    }

    #[test]
    fn test_reap_leaves_running_child() {
        let mut jobs = Jobs::default();
        jobs.launch("sleep", Command::new("sleep").arg("5").spawn().unwrap());

        assert!(jobs.reap().is_empty());
        assert_eq!(jobs.len(), 1);
        assert_eq!(jobs.running[0].program, "sleep");

        for job in jobs.running.iter_mut() {
            let _ = job.child.kill();
            let _ = job.child.wait();
        }
    }
}
