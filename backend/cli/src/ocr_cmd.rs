//! CLI OCR Command
//!
//! Loads an image, runs the selected engine and prints the extracted text.

use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use scanchat_agent::{JobSnapshot, JobState, JobWatch, Workbench};

use crate::terminal_output::{note_error, note_warn, render_progress, stream_write};

/// Load `image` into the workbench while rendering job progress on stderr.
pub async fn load_with_progress(workbench: &Arc<Workbench>, image: PathBuf) -> Result<Option<JobSnapshot>> {
    let mut jobs = workbench.watch_jobs();
    let _ = jobs.borrow_and_update();
    let renderer = tokio::spawn(watch_progress(jobs, std::io::stderr()));
    let loader = {
        let workbench = workbench.clone();
        tokio::spawn(async move { workbench.load_image_file(&image).await })
    };

    let outcome = loader.await?;
    renderer.abort();
    let mut stderr = std::io::stderr();
    let _ = stream_write(&mut stderr, "\n");
    Ok(outcome?)
}

/// Wait for the next job to be announced, then redraw its bar on every
/// report until it reaches 100.
async fn watch_progress<W: Write>(mut jobs: JobWatch, mut out: W) -> W {
    let mut progress = loop {
        if jobs.changed().await.is_err() {
            return out;
        }
        if let Some(progress) = jobs.borrow_and_update().clone() {
            break progress;
        }
    };
    loop {
        let percent = *progress.borrow_and_update();
        let _ = stream_write(&mut out, &format!("\r{}", render_progress(percent)));
        if percent >= 100 || progress.changed().await.is_err() {
            return out;
        }
    }
}

/// Print a settled job. Returns whether it succeeded.
pub fn print_job(job: &JobSnapshot) -> bool {
    match &job.state {
        JobState::Succeeded { result, recognized: true } => {
            println!("{result}");
            true
        }
        JobState::Succeeded { result, recognized: false } => {
            note_warn(result);
            true
        }
        JobState::Failed { error } => {
            note_error(error);
            false
        }
        JobState::Idle | JobState::Running => false,
    }
}

pub async fn run(workbench: Workbench, image: PathBuf) -> Result<()> {
    let workbench = Arc::new(workbench);
    match load_with_progress(&workbench, image).await? {
        Some(job) => {
            if !print_job(&job) {
                anyhow::bail!("text recognition failed");
            }
        }
        None => note_warn("Recognition was superseded"),
    }
    Ok(())
}
