//! Model-driven analysis over stored messages.
//!
//! Three flows share one [`Analyzer`]:
//!
//! - **bulk**: tasks over a chat-wide sample, one profile per participant,
//!   then patterns over a chat-wide sample
//! - **single person**: profile plus commitments for one participant, who
//!   is then marked as analyzed
//! - **behavior alerts**: per explicitly selected participant, skipping
//!   anyone with too few messages
//!
//! Extraction failures never stop a flow; persistence failures do. An empty
//! sample never reaches the model.

use std::sync::Arc;
use std::sync::mpsc::Sender;

use serde::{Deserialize, Serialize};
use tracing::info;

use super::worker::{Worker, WorkerEvent};
use crate::config::{AppConfig, SamplingConfig};
use crate::core::filter::MessageFilter;
use crate::core::sampler::sample_messages;
use crate::error::{ChatminerError, Result};
use crate::extract::{BehaviorAlert, CommunicationPattern, ExtractedTask, Extractor, PersonProfile};
use crate::llm::LlmClient;
use crate::message::RawMessage;
use crate::progress::Progress;
use crate::store::{Id, PersonRecord, SqliteStore, Store};

/// Profile produced for one participant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersonAnalysis {
    pub name: String,
    pub profile: PersonProfile,
}

/// Alerts kept for one participant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersonAlerts {
    pub name: String,
    pub alerts: Vec<BehaviorAlert>,
}

/// Typed results of one analysis run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalysisOutcome {
    pub tasks: Vec<ExtractedTask>,
    pub profiles: Vec<PersonAnalysis>,
    pub patterns: Vec<CommunicationPattern>,
    pub alerts: Vec<PersonAlerts>,
    /// Participants left out (no messages, or below the alert minimum)
    pub skipped: Vec<String>,
}

/// Events emitted by an analysis worker.
#[derive(Debug, Clone, PartialEq)]
pub enum AnalysisEvent {
    Progress(Progress),
    Finished(AnalysisOutcome),
    Error(String),
}

impl WorkerEvent for AnalysisEvent {
    type Output = AnalysisOutcome;

    fn finished(output: AnalysisOutcome) -> Self {
        AnalysisEvent::Finished(output)
    }

    fn failed(message: String) -> Self {
        AnalysisEvent::Error(message)
    }

    fn into_outcome(self) -> std::result::Result<std::result::Result<AnalysisOutcome, String>, Self> {
        match self {
            AnalysisEvent::Finished(outcome) => Ok(Ok(outcome)),
            AnalysisEvent::Error(message) => Ok(Err(message)),
            progress @ AnalysisEvent::Progress(_) => Err(progress),
        }
    }
}

/// Runs the analysis flows against one store and one model.
pub struct Analyzer<'a> {
    store: &'a dyn Store,
    extractor: &'a Extractor,
    sampling: SamplingConfig,
    min_alert_messages: usize,
    filter: MessageFilter,
}

impl<'a> Analyzer<'a> {
    /// Creates an analyzer with the caps from `config`.
    pub fn new(store: &'a dyn Store, extractor: &'a Extractor, config: &AppConfig) -> Self {
        Self {
            store,
            extractor,
            sampling: config.sampling,
            min_alert_messages: config.alerts.min_messages,
            filter: MessageFilter::new(),
        }
    }

    /// Restricts every flow to messages passing `filter`.
    #[must_use]
    pub fn with_filter(mut self, filter: MessageFilter) -> Self {
        self.filter = filter;
        self
    }

    /// Tasks, per-person profiles and patterns for the whole store.
    pub fn run_bulk(&self, progress: &dyn Fn(Progress)) -> Result<AnalysisOutcome> {
        let messages = self.filter.apply(&self.store.all_messages()?);
        let persons: Vec<PersonRecord> = self
            .store
            .persons()?
            .into_iter()
            .filter(|p| p.total_messages > 0)
            .collect();
        let total = persons.len() + 2;
        let mut step = 0;
        let mut outcome = AnalysisOutcome::default();

        progress(Progress::new(step, total, "Extracting tasks"));
        if messages.is_empty() {
            info!("no messages in range, skipping tasks and patterns");
        } else {
            let sample = sample_messages(&messages, self.sampling.chat_tasks);
            outcome.tasks = self.extractor.extract_tasks(&sample);
            for task in &outcome.tasks {
                self.store.insert_task(task)?;
            }
        }
        step += 1;

        for person in &persons {
            progress(Progress::new(step, total, format!("Analyzing {}", person.name)));
            step += 1;

            let own: Vec<RawMessage> = messages
                .iter()
                .filter(|m| m.is_from(&person.name))
                .cloned()
                .collect();
            if own.is_empty() {
                info!(person = %person.name, "no messages in range, skipping profile");
                outcome.skipped.push(person.name.clone());
                continue;
            }

            let sample = sample_messages(&own, self.sampling.person_profile);
            let profile = self
                .extractor
                .profile_person(&person.name, &sample, person.is_me);
            self.save_profile(person.id, &person.name, &profile)?;
            outcome.profiles.push(PersonAnalysis {
                name: person.name.clone(),
                profile,
            });
        }

        progress(Progress::new(step, total, "Detecting patterns"));
        if !messages.is_empty() {
            let names: Vec<&str> = persons.iter().map(|p| p.name.as_str()).collect();
            let sample = sample_messages(&messages, self.sampling.patterns);
            outcome.patterns = self.extractor.detect_patterns(&sample, &names);
            for pattern in &outcome.patterns {
                self.store.insert_pattern(pattern)?;
            }
        }

        progress(Progress::new(total, total, "Analysis complete"));
        info!(
            tasks = outcome.tasks.len(),
            profiles = outcome.profiles.len(),
            patterns = outcome.patterns.len(),
            "bulk analysis complete"
        );
        Ok(outcome)
    }

    /// Profile with commitments for `name`, who is then marked analyzed.
    ///
    /// With no messages in range the person is reported as skipped and left
    /// untouched.
    pub fn run_person(&self, name: &str, progress: &dyn Fn(Progress)) -> Result<AnalysisOutcome> {
        const STEPS: usize = 3;
        let person = self.require_person(name)?;

        progress(Progress::new(0, STEPS, format!("Loading messages of {name}")));
        let own = self.filter.apply(&self.store.person_messages(person.id)?);
        if own.is_empty() {
            info!(person = %name, "no messages in range, skipping analysis");
            progress(Progress::new(STEPS, STEPS, "Nothing to analyze"));
            return Ok(AnalysisOutcome {
                skipped: vec![name.to_string()],
                ..AnalysisOutcome::default()
            });
        }
        let sample = sample_messages(&own, self.sampling.single_person);

        progress(Progress::new(
            1,
            STEPS,
            format!("Analyzing {name} ({} messages)", sample.len()),
        ));
        let profile = self
            .extractor
            .profile_with_commitments(name, &sample, person.is_me);

        progress(Progress::new(2, STEPS, "Saving profile"));
        self.save_profile(person.id, name, &profile)?;
        self.store.mark_person_analyzed(person.id)?;

        progress(Progress::new(STEPS, STEPS, "Analysis complete"));
        Ok(AnalysisOutcome {
            profiles: vec![PersonAnalysis {
                name: name.to_string(),
                profile,
            }],
            ..AnalysisOutcome::default()
        })
    }

    /// Behavior alerts for each of `names`.
    ///
    /// Every name must be known; people with fewer messages than the
    /// configured minimum are skipped without a model call.
    pub fn run_alerts(&self, names: &[String], progress: &dyn Fn(Progress)) -> Result<AnalysisOutcome> {
        let persons = names
            .iter()
            .map(|n| self.require_person(n))
            .collect::<Result<Vec<_>>>()?;
        let total = persons.len();
        let mut outcome = AnalysisOutcome::default();

        for (step, person) in persons.iter().enumerate() {
            progress(Progress::new(step, total, format!("Reviewing {}", person.name)));

            let own = self.filter.apply(&self.store.person_messages(person.id)?);
            if own.is_empty() || own.len() < self.min_alert_messages {
                info!(
                    person = %person.name,
                    messages = own.len(),
                    minimum = self.min_alert_messages,
                    "too few messages, skipping alerts"
                );
                outcome.skipped.push(person.name.clone());
                continue;
            }

            let sample = sample_messages(&own, self.sampling.behavior_alerts);
            let alerts: Vec<BehaviorAlert> = self
                .extractor
                .detect_behavior_alerts(&person.name, &sample)
                .into_iter()
                .filter(BehaviorAlert::passes_gate)
                .collect();
            for alert in &alerts {
                self.store.upsert_alert(person.id, alert)?;
            }
            outcome.alerts.push(PersonAlerts {
                name: person.name.clone(),
                alerts,
            });
        }

        progress(Progress::new(total, total, "Review complete"));
        Ok(outcome)
    }

    fn require_person(&self, name: &str) -> Result<PersonRecord> {
        self.store
            .find_person(name)?
            .ok_or_else(|| ChatminerError::unknown_person(name))
    }

    fn save_profile(&self, person_id: Id, name: &str, profile: &PersonProfile) -> Result<()> {
        if profile.is_empty() {
            info!(person = %name, "empty profile, keeping stored values");
            return Ok(());
        }
        self.store.update_person_profile(person_id, profile)?;
        for skill in &profile.skills {
            let skill_id = self.store.get_or_create_skill(&skill.name, skill.category)?;
            self.store
                .upsert_person_skill(person_id, skill_id, skill.score, &skill.evidence)?;
        }
        for commitment in &profile.commitments {
            self.store.upsert_commitment(person_id, commitment)?;
        }
        Ok(())
    }
}

/// Which flow a spawned analysis runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnalysisJob {
    Bulk,
    Person(String),
    Alerts(Vec<String>),
}

/// Starts `job` on a background thread.
///
/// The worker opens its own connection to the configured database.
pub fn spawn_analysis(
    config: AppConfig,
    client: Arc<dyn LlmClient>,
    filter: MessageFilter,
    job: AnalysisJob,
) -> Result<Worker<AnalysisEvent>> {
    let name = match &job {
        AnalysisJob::Bulk => "analysis",
        AnalysisJob::Person(_) => "analysis-person",
        AnalysisJob::Alerts(_) => "analysis-alerts",
    };

    Worker::spawn(name, move |tx: &Sender<AnalysisEvent>| {
        let store = SqliteStore::open(&config.database.path)?;
        let extractor = Extractor::new(client);
        let analyzer = Analyzer::new(&store, &extractor, &config).with_filter(filter);
        let report = |p: Progress| {
            let _ = tx.send(AnalysisEvent::Progress(p));
        };
        match &job {
            AnalysisJob::Bulk => analyzer.run_bulk(&report),
            AnalysisJob::Person(name) => analyzer.run_person(name, &report),
            AnalysisJob::Alerts(names) => analyzer.run_alerts(names, &report),
        }
    })
}
