/*
    Developer blog:
    - Each function here used to be a button or a widget on the page. They all take the accessor
        from the context, never the store itself, so they can only do what a component could.
    - Output is plain text for the terminal. Return Err only for bad input, storage trouble is
        reported through the notice.
*/
use crate::models::{error::AppError, job::Job, page::Page};
use saved::{Notice, SavedItems, SavedItemsContext};

/// The bookmark button: save if missing, remove if present.
pub fn toggle_job(saved: &SavedItems<Job>, job: Job) -> Result<String, AppError> {
    job.validate()?;
    describe(saved.toggle(job))
}

/// Save only. Saving something already saved leaves it where it is.
pub fn save_job(saved: &SavedItems<Job>, job: Job) -> Result<String, AppError> {
    job.validate()?;
    if saved.is_saved(&job.id) {
        return Ok(format!("Job {} is already saved", job.id));
    }
    describe(saved.toggle(job))
}

/// Remove by id, using the snapshot we already hold.
pub fn remove_job(saved: &SavedItems<Job>, id: &str) -> Result<String, AppError> {
    match saved.get(id) {
        Some(job) => describe(saved.toggle(job)),
        None => Ok(format!("Job {id} is not saved")),
    }
}

pub fn is_job_saved(saved: &SavedItems<Job>, id: &str) -> String {
    if saved.is_saved(id) {
        format!("Job {id} is saved")
    } else {
        format!("Job {id} is not saved")
    }
}

pub fn count_saved_jobs(saved: &SavedItems<Job>) -> String {
    match saved.count() {
        1 => "1 saved job".to_owned(),
        n => format!("{n} saved jobs"),
    }
}

/// Most recently saved first, one line per job.
pub fn list_saved_jobs(saved: &SavedItems<Job>, page: Page) -> String {
    let jobs = saved.list();
    if jobs.is_empty() {
        return "No saved jobs yet".to_owned();
    }
    let total = jobs.len();
    let mut lines: Vec<String> = page
        .slice(jobs)
        .iter()
        .map(|job| {
            let budget = job
                .budget
                .map(|b| format!("${b:.2}"))
                .unwrap_or_else(|| "-".to_owned());
            let client = job.client.as_deref().unwrap_or("-");
            format!("{:<12} {:<40} {:>12} {}", job.id, job.title, budget, client)
        })
        .collect();
    lines.push(format!(
        "page {} of {} ({total} total)",
        page.page,
        page.total_pages(total)
    ));
    lines.join("\n")
}

pub fn clear_saved_jobs(context: &SavedItemsContext<Job>) -> String {
    let store = context.store();
    let count = store.count();
    store.clear();
    format!("Cleared {count} saved job(s)")
}

fn describe(notice: Option<Notice>) -> Result<String, AppError> {
    // validate() already rejects jobs without id, so None means something upstream changed.
    notice
        .map(|notice| format!("{notice} ({})", notice.id()))
        .ok_or_else(|| AppError::BadInput("job has no id".to_owned()))
}
