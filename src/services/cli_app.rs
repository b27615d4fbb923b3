/*
    Feature request:
    - `watch` is the closest thing we have to a second tab. Run it in one terminal, toggle from another,
        and it follows along. Would be nice to render the list live instead of just the count.
*/
use crate::models::{app_state::AppState, error::AppError, job::Job, page::Page};
use crate::routes::saved_jobs::*;
use clap::{Args, Subcommand};
use tracing::{info, warn};

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Save a job, or remove it if it is already saved
    Toggle(JobArgs),
    /// Save a job if it isn't saved yet
    Save(JobArgs),
    /// Remove a saved job by id
    Remove { id: String },
    /// Check whether a job is saved
    IsSaved { id: String },
    /// List saved jobs, most recent first
    List {
        #[arg(long, default_value_t = 1)]
        page: usize,
        #[arg(long, default_value_t = crate::models::page::DEFAULT_PER_PAGE)]
        per_page: usize,
    },
    /// Number of saved jobs
    Count,
    /// Forget every saved job
    Clear,
    /// Follow changes made by other sessions until ctrl-c
    Watch,
}

#[derive(Debug, Args)]
pub struct JobArgs {
    #[arg(long)]
    pub id: Option<String>,
    #[arg(long)]
    pub title: Option<String>,
    #[arg(long)]
    pub budget: Option<f64>,
    #[arg(long)]
    pub client: Option<String>,
    /// Full job as json, as the api returned it. Flags above override its fields.
    #[arg(long)]
    pub json: Option<String>,
}

impl JobArgs {
    pub fn into_job(self) -> Result<Job, AppError> {
        let mut job = match self.json {
            Some(raw) => serde_json::from_str::<Job>(&raw)
                .map_err(|e| AppError::BadInput(format!("invalid job json: {e}")))?,
            None => Job::new(String::new(), String::new()),
        };
        if let Some(id) = self.id {
            job.id = id;
        }
        if let Some(title) = self.title {
            job.title = title;
        }
        if self.budget.is_some() {
            job.budget = self.budget;
        }
        if self.client.is_some() {
            job.client = self.client;
        }
        Ok(job)
    }
}

pub struct CliApp {
    state: AppState,
}

impl CliApp {
    pub fn new(state: AppState) -> Self {
        Self { state }
    }

    pub async fn run(self, command: Commands) -> Result<(), AppError> {
        let saved = self.state.saved_jobs.use_saved_items();
        let output = match command {
            Commands::Toggle(args) => toggle_job(&saved, args.into_job()?)?,
            Commands::Save(args) => save_job(&saved, args.into_job()?)?,
            Commands::Remove { id } => remove_job(&saved, &id)?,
            Commands::IsSaved { id } => is_job_saved(&saved, &id),
            Commands::List { page, per_page } => list_saved_jobs(&saved, Page::new(page, per_page)),
            Commands::Count => count_saved_jobs(&saved),
            Commands::Clear => clear_saved_jobs(&self.state.saved_jobs),
            Commands::Watch => {
                self.watch().await;
                String::new()
            }
        };
        if !output.is_empty() {
            println!("{output}");
        }

        // last chance for a write that failed earlier.
        let store = self.state.saved_jobs.store();
        if store.is_dirty() {
            store.flush()?;
        }
        Ok(())
    }

    async fn watch(&self) {
        let store = self.state.saved_jobs.store();
        let listener = store.listen();
        let watcher = self.state.file_watcher().spawn();

        let saved = self.state.saved_jobs.use_saved_items();
        let subscription = saved.on_change(|change| {
            println!(
                "{:?}: {} saved job(s)",
                change.cause,
                change.snapshot.len()
            );
        });

        info!(
            "Watching {} in {:?}",
            self.state.config.storage_key, self.state.config.data_dir
        );
        println!("{}", count_saved_jobs(&saved));

        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("Unable to listen for ctrl-c: {e}");
        }

        saved.unsubscribe(subscription);
        watcher.abort();
        if let Some(listener) = listener {
            listener.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use saved::config::StoreConfig;

    fn state(dir: &std::path::Path) -> AppState {
        AppState::new(StoreConfig {
            data_dir: dir.to_path_buf(),
            ..StoreConfig::default()
        })
        .unwrap()
    }

    #[test]
    fn job_args_merge_json_and_flags() {
        let args = JobArgs {
            id: None,
            title: Some("Fix kitchen sink".to_owned()),
            budget: None,
            client: None,
            json: Some(r#"{"id":"42","title":"Fix sink","budget":120.0}"#.to_owned()),
        };
        let job = args.into_job().unwrap();
        assert_eq!(job.id, "42");
        assert_eq!(job.title, "Fix kitchen sink");
        assert_eq!(job.budget, Some(120.0));
    }

    #[test]
    fn job_args_accept_numeric_api_id() {
        let args = JobArgs {
            id: None,
            title: None,
            budget: None,
            client: None,
            json: Some(r#"{"id":42,"title":"Fix sink"}"#.to_owned()),
        };
        let job = args.into_job().unwrap();
        assert_eq!(job.id, "42");
        assert_eq!(job.validate(), Ok(()));
    }

    #[test]
    fn job_args_reject_bad_json() {
        let args = JobArgs {
            id: None,
            title: None,
            budget: None,
            client: None,
            json: Some("{".to_owned()),
        };
        assert!(matches!(args.into_job(), Err(AppError::BadInput(_))));
    }

    #[tokio::test]
    async fn commands_persist_between_runs() {
        let dir = tempfile::tempdir().unwrap();
        let args = JobArgs {
            id: Some("7".to_owned()),
            title: Some("Paint fence".to_owned()),
            budget: Some(300.0),
            client: None,
            json: None,
        };
        CliApp::new(state(dir.path()))
            .run(Commands::Save(args))
            .await
            .unwrap();

        let next = state(dir.path());
        assert!(next.saved_jobs.use_saved_items().is_saved("7"));

        CliApp::new(next)
            .run(Commands::Remove { id: "7".to_owned() })
            .await
            .unwrap();
        assert_eq!(state(dir.path()).saved_jobs.use_saved_items().count(), 0);
    }
}
