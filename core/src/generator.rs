//! # Task Generation
//!
//! Combines the resolved targets with the command templates, `repeat` times.
//!
//! Generation is two-phase: [`TaskGenerator::len`] gives the exact number of
//! tasks up front, then [`Tasks`] yields them lazily in a fixed order:
//! repeat index, then target, then command template. Tasks are built on
//! demand from their position, so memory does not grow with the task count.

use std::sync::Arc;

use interlace_common::config::Config;
use interlace_common::error::ValidationError;
use interlace_common::target::{TargetExpander, TargetSet, TargetSpec};
use interlace_common::debug;

use crate::template::{self, SubstitutionContext};

/// One fully substituted, ready-to-run command.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Task {
    /// Position in generation order, starting at 0.
    pub id: usize,
    pub command: String,
    pub target: Arc<str>,
    pub template: Arc<str>,
    pub repeat_index: usize,
}

/// The cartesian product of repeats × targets × command templates.
#[derive(Debug)]
pub struct TaskGenerator {
    targets: Vec<Arc<str>>,
    templates: Vec<Arc<str>>,
    context: SubstitutionContext,
    repeat: usize,
}

impl TaskGenerator {
    pub fn new(
        targets: TargetSet,
        templates: Vec<String>,
        context: SubstitutionContext,
        repeat: usize,
    ) -> Self {
        Self {
            targets: targets.into_iter().map(Arc::from).collect(),
            templates: templates.into_iter().map(Arc::from).collect(),
            context,
            repeat,
        }
    }

    /// Resolves every input named by `cfg` and builds the generator.
    ///
    /// All list files are read and all targets expanded here, so any
    /// validation error surfaces before a single task exists.
    pub fn from_config(cfg: &Config) -> Result<Self, ValidationError> {
        let target_lines = cfg.targets.entries()?;
        if target_lines.is_empty() {
            return Err(ValidationError::EmptyInput("target list"));
        }
        let targets = TargetSpec::from_lines(&target_lines)?;

        let exclusions = match &cfg.exclusions {
            Some(source) => Some(TargetSpec::from_lines(&source.entries()?)?),
            None => None,
        };

        let mut expander = TargetExpander::new(cfg.cidr_expansion);
        if !cfg.candidates.is_empty() {
            expander = expander.with_candidates(&cfg.candidates);
        }
        let target_set = expander.resolve(&targets, exclusions.as_ref())?;

        let templates = cfg.commands.entries()?;
        if templates.is_empty() {
            return Err(ValidationError::EmptyInput("command list"));
        }

        let context = SubstitutionContext::from_config(cfg)?;
        if let Some(proxies) = &context.proxies {
            debug!("Loaded {} proxies", proxies.len());
        }
        if let Some(random) = &context.random {
            debug!("Loaded {} random files", random.file_count());
        }

        debug!(
            "{} targets × {} commands × {} repeats",
            target_set.len(),
            templates.len(),
            cfg.repeat
        );
        Ok(Self::new(target_set, templates, context, cfg.repeat))
    }

    /// Tasks per repeat iteration.
    fn batch_len(&self) -> usize {
        self.targets.len().saturating_mul(self.templates.len())
    }

    /// The exact number of tasks [`Tasks`] will yield.
    pub fn len(&self) -> usize {
        self.batch_len().saturating_mul(self.repeat)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn targets(&self) -> impl Iterator<Item = &str> {
        self.targets.iter().map(|target| &**target)
    }

    fn task_at(&self, id: usize) -> Task {
        let batch = self.batch_len();
        let repeat_index = id / batch;
        let within = id % batch;
        let target = &self.targets[within / self.templates.len()];
        let template = &self.templates[within % self.templates.len()];

        Task {
            id,
            command: template::substitute(template, &self.context, target),
            target: target.clone(),
            template: template.clone(),
            repeat_index,
        }
    }
}

impl IntoIterator for TaskGenerator {
    type Item = Task;
    type IntoIter = Tasks;

    fn into_iter(self) -> Tasks {
        Tasks {
            total: self.len(),
            next: 0,
            generator: self,
        }
    }
}

/// Lazy iterator over the tasks of a [`TaskGenerator`].
#[derive(Debug)]
pub struct Tasks {
    generator: TaskGenerator,
    next: usize,
    total: usize,
}

impl Tasks {
    /// The total task count, fixed before the first task is produced.
    pub fn total(&self) -> usize {
        self.total
    }
}

impl Iterator for Tasks {
    type Item = Task;

    fn next(&mut self) -> Option<Task> {
        if self.next >= self.total {
            return None;
        }
        let task = self.generator.task_at(self.next);
        self.next += 1;
        Some(task)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.total - self.next;
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for Tasks {}

impl std::iter::FusedIterator for Tasks {}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
